//! Client-side form checks. A draft that fails here never reaches the network.

use crate::models::{
    Credentials, Exercise, NewExercise, NewWorkout, Registration, WorkoutEntry, timestamp,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select an exercise.")]
    MissingExercise,
    #[error("Exercise #{0} is not in the catalog.")]
    UnknownExercise(i64),
    #[error("Sets must be a whole number greater than zero.")]
    InvalidSets,
    #[error("Reps must be a whole number greater than zero.")]
    InvalidReps,
    #[error("Weight must be a number of kilograms, zero or more.")]
    InvalidWeight,
    #[error("Please provide a workout name.")]
    MissingName,
    #[error("Add at least one exercise to the workout.")]
    NoEntries,
    #[error("Duration must be a whole number of minutes, zero or more.")]
    InvalidDuration,
    #[error("Please provide an exercise name.")]
    MissingExerciseName,
    #[error("Please enter a username.")]
    MissingUsername,
    #[error("Passwords need at least 6 characters.")]
    ShortPassword,
}

/// An entry as submitted, before range checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySubmission {
    pub exercise_id: i64,
    pub sets: i64,
    pub reps: i64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<EntrySubmission>,
}

/// Raw fields of the "add exercise to workout" form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub exercise_id: String,
    #[serde(default)]
    pub sets: String,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveWorkoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub muscle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl EntryForm {
    pub fn parse(&self) -> Result<EntrySubmission, ValidationError> {
        let exercise_id = self
            .exercise_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::MissingExercise)?;
        let sets = self.sets.trim().parse().map_err(|_| ValidationError::InvalidSets)?;
        let reps = self.reps.trim().parse().map_err(|_| ValidationError::InvalidReps)?;
        let weight = match self.weight.trim() {
            "" => None,
            raw => Some(raw.parse().map_err(|_| ValidationError::InvalidWeight)?),
        };

        Ok(EntrySubmission {
            exercise_id,
            sets,
            reps,
            weight,
            notes: non_empty(&self.notes),
        })
    }
}

impl SaveWorkoutForm {
    pub fn duration(&self) -> Result<Option<i64>, ValidationError> {
        match self.duration.trim() {
            "" => Ok(None),
            raw => raw
                .parse()
                .map(Some)
                .map_err(|_| ValidationError::InvalidDuration),
        }
    }
}

pub fn validate_entry(entry: &EntrySubmission) -> Result<WorkoutEntry, ValidationError> {
    let sets = positive(entry.sets).ok_or(ValidationError::InvalidSets)?;
    let reps = positive(entry.reps).ok_or(ValidationError::InvalidReps)?;
    if let Some(weight) = entry.weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ValidationError::InvalidWeight);
        }
    }

    Ok(WorkoutEntry {
        exercise_id: entry.exercise_id,
        exercise_name: None,
        exercise_image: None,
        sets,
        reps,
        weight: entry.weight,
        notes: entry.notes.as_deref().and_then(non_empty),
    })
}

/// Checks a JSON workout. A submitted date wins over `default_date`; with
/// neither, the payload carries no date.
pub fn validate_workout(
    submission: &WorkoutSubmission,
    default_date: Option<DateTime<Utc>>,
) -> Result<NewWorkout, ValidationError> {
    let entries = submission
        .exercises
        .iter()
        .map(validate_entry)
        .collect::<Result<Vec<_>, _>>()?;
    let date = submission.date.or(default_date);
    finish_workout(&submission.name, submission.duration, entries, date)
}

/// Final checks before a workout is saved.
pub fn finish_workout(
    name: &str,
    duration: Option<i64>,
    entries: Vec<WorkoutEntry>,
    date: Option<DateTime<Utc>>,
) -> Result<NewWorkout, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if entries.is_empty() {
        return Err(ValidationError::NoEntries);
    }
    let duration = match duration {
        None => None,
        Some(minutes) => {
            Some(u32::try_from(minutes).map_err(|_| ValidationError::InvalidDuration)?)
        }
    };

    Ok(NewWorkout {
        name: name.to_string(),
        date,
        duration,
        exercises: entries,
    })
}

/// Rejects entries whose exercise is missing from `catalog`.
pub fn check_catalog(
    entries: &[WorkoutEntry],
    catalog: &[Exercise],
) -> Result<(), ValidationError> {
    match entries
        .iter()
        .find(|entry| !catalog.iter().any(|exercise| exercise.id == entry.exercise_id))
    {
        Some(entry) => Err(ValidationError::UnknownExercise(entry.exercise_id)),
        None => Ok(()),
    }
}

pub fn validate_exercise(form: &ExerciseForm) -> Result<NewExercise, ValidationError> {
    let name = non_empty(&form.name).ok_or(ValidationError::MissingExerciseName)?;
    Ok(NewExercise {
        name,
        category: non_empty(&form.category).unwrap_or_else(|| "Other".to_string()),
        muscle: form.muscle.trim().to_string(),
        description: form.description.trim().to_string(),
        image: non_empty(&form.image).unwrap_or_else(|| "💪".to_string()),
    })
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationError> {
    check_account(&credentials.username, &credentials.password)
}

pub fn validate_registration(registration: &Registration) -> Result<Registration, ValidationError> {
    check_account(&registration.username, &registration.password)?;
    Ok(Registration {
        username: registration.username.trim().to_string(),
        email: registration.email.as_deref().and_then(non_empty),
        password: registration.password.clone(),
    })
}

fn check_account(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::MissingUsername);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::ShortPassword);
    }
    Ok(())
}

fn positive(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|value| *value > 0)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
