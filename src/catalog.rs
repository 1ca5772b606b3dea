use crate::models::{Exercise, WorkoutEntry};
use serde::Deserialize;

pub const ALL_CATEGORIES: &str = "All";

/// "All" followed by each category in first-seen order.
pub fn categories(exercises: &[Exercise]) -> Vec<String> {
    let mut categories = vec![ALL_CATEGORIES.to_string()];
    for exercise in exercises {
        if !categories.contains(&exercise.category) {
            categories.push(exercise.category.clone());
        }
    }
    categories
}

pub fn find(exercises: &[Exercise], id: i64) -> Option<&Exercise> {
    exercises.iter().find(|exercise| exercise.id == id)
}

/// Copies the catalog name and image onto an entry for display.
pub fn annotate(entry: &mut WorkoutEntry, exercises: &[Exercise]) {
    if let Some(exercise) = find(exercises, entry.exercise_id) {
        entry.exercise_name = Some(exercise.name.clone());
        entry.exercise_image = exercise.image.clone();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "q")]
    pub search: String,
}

impl ExerciseFilter {
    pub fn selected_category(&self) -> &str {
        self.category
            .as_deref()
            .filter(|category| !category.is_empty())
            .unwrap_or(ALL_CATEGORIES)
    }

    pub fn matches(&self, exercise: &Exercise) -> bool {
        let category = self.selected_category();
        let matches_category = category == ALL_CATEGORIES || exercise.category == category;

        let term = self.search.trim().to_lowercase();
        let matches_search = term.is_empty()
            || exercise.name.to_lowercase().contains(&term)
            || exercise
                .muscle
                .as_deref()
                .is_some_and(|muscle| muscle.to_lowercase().contains(&term));

        matches_category && matches_search
    }

    pub fn apply<'a>(&self, exercises: &'a [Exercise]) -> Vec<&'a Exercise> {
        exercises.iter().filter(|exercise| self.matches(exercise)).collect()
    }
}
