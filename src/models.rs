use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub muscle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Exercise {
    pub fn image_is_url(&self) -> bool {
        self.image
            .as_deref()
            .is_some_and(|image| image.starts_with("http://") || image.starts_with("https://"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExercise {
    pub name: String,
    pub category: String,
    pub muscle: String,
    pub description: String,
    pub image: String,
}

/// One exercise performed within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEntry {
    pub exercise_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_image: Option<String>,
    pub sets: u32,
    pub reps: u32,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub exercises: Vec<WorkoutEntry>,
}

impl Workout {
    /// Logged duration in minutes, zero when none was recorded.
    pub fn duration_minutes(&self) -> u64 {
        self.duration.map(u64::from).unwrap_or(0)
    }

    pub fn entry_count(&self) -> usize {
        self.exercises.len()
    }
}

/// Validated payload for creating or replacing a workout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkout {
    pub name: String,
    /// Left out on updates so the backend keeps the stored date.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::serialize_opt"
    )]
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<u32>,
    pub exercises: Vec<WorkoutEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_workouts: usize,
    pub this_week: usize,
    pub total_entries: usize,
    pub total_duration: u64,
    pub recent: Vec<Workout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressTotals {
    pub total_workouts: usize,
    pub total_entries: usize,
    pub total_duration: u64,
    pub average_duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityBucket {
    pub start: NaiveDate,
    pub workouts: usize,
    pub entries: usize,
    pub duration: u64,
}

impl ActivityBucket {
    pub fn empty(start: NaiveDate) -> Self {
        Self {
            start,
            workouts: 0,
            entries: 0,
            duration: 0,
        }
    }
}

/// Bar heights in percent of the busiest bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledBucket {
    #[serde(flatten)]
    pub bucket: ActivityBucket,
    pub workouts_pct: f64,
    pub entries_pct: f64,
    pub duration_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProgressReport {
    pub period: Period,
    pub totals: ProgressTotals,
    pub activity: Vec<ScaledBucket>,
    pub top_exercises: Vec<ExerciseCount>,
}

/// Workout timestamps: RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn serialize_opt<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
