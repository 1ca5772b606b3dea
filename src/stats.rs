use crate::models::{
    ActivityBucket, DashboardSummary, Exercise, ExerciseCount, Period, ProgressReport,
    ProgressTotals, ScaledBucket, Workout, WorkoutEntry,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

pub const RECENT_WORKOUTS: usize = 5;
pub const DAILY_BUCKETS: usize = 14;
pub const WEEKLY_BUCKETS: usize = 8;
pub const TOP_EXERCISES: usize = 5;

pub fn dashboard_summary(workouts: &[Workout]) -> DashboardSummary {
    dashboard_summary_at(Utc::now(), workouts, RECENT_WORKOUTS)
}

pub fn dashboard_summary_at(
    now: DateTime<Utc>,
    workouts: &[Workout],
    recent: usize,
) -> DashboardSummary {
    let week_ago = now - Duration::days(7);
    let this_week = workouts.iter().filter(|workout| workout.date >= week_ago).count();
    let totals = progress_totals(workouts);

    let mut ordered: Vec<&Workout> = workouts.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));

    DashboardSummary {
        total_workouts: totals.total_workouts,
        this_week,
        total_entries: totals.total_entries,
        total_duration: totals.total_duration,
        recent: ordered.into_iter().take(recent).cloned().collect(),
    }
}

pub fn progress_totals(workouts: &[Workout]) -> ProgressTotals {
    let total_workouts = workouts.len();
    let total_entries = workouts.iter().map(Workout::entry_count).sum();
    let total_duration: u64 = workouts.iter().map(Workout::duration_minutes).sum();

    ProgressTotals {
        total_workouts,
        total_entries,
        total_duration,
        average_duration: average_minutes(total_duration, total_workouts),
    }
}

fn average_minutes(total: u64, count: usize) -> u64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u64
}

/// Most recent days with activity, newest first.
pub fn daily_activity<Tz: TimeZone>(workouts: &[Workout], tz: &Tz) -> Vec<ActivityBucket> {
    bucket_by(workouts, tz, |day| day, DAILY_BUCKETS)
}

/// Most recent Sunday-based weeks with activity, newest first.
pub fn weekly_activity<Tz: TimeZone>(workouts: &[Workout], tz: &Tz) -> Vec<ActivityBucket> {
    bucket_by(workouts, tz, week_start, WEEKLY_BUCKETS)
}

pub fn activity<Tz: TimeZone>(
    workouts: &[Workout],
    tz: &Tz,
    period: Period,
) -> Vec<ActivityBucket> {
    match period {
        Period::Daily => daily_activity(workouts, tz),
        Period::Weekly => weekly_activity(workouts, tz),
    }
}

fn bucket_by<Tz, F>(workouts: &[Workout], tz: &Tz, key: F, limit: usize) -> Vec<ActivityBucket>
where
    Tz: TimeZone,
    F: Fn(NaiveDate) -> NaiveDate,
{
    let mut buckets: BTreeMap<NaiveDate, ActivityBucket> = BTreeMap::new();
    for workout in workouts {
        let start = key(workout.date.with_timezone(tz).date_naive());
        let bucket = buckets
            .entry(start)
            .or_insert_with(|| ActivityBucket::empty(start));
        bucket.workouts += 1;
        bucket.entries += workout.entry_count();
        bucket.duration += workout.duration_minutes();
    }

    buckets.into_values().rev().take(limit).collect()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

pub fn scale_bars(buckets: &[ActivityBucket]) -> Vec<ScaledBucket> {
    let max_workouts = buckets.iter().map(|b| b.workouts as u64).max().unwrap_or(0);
    let max_entries = buckets.iter().map(|b| b.entries as u64).max().unwrap_or(0);
    let max_duration = buckets.iter().map(|b| b.duration).max().unwrap_or(0);

    buckets
        .iter()
        .map(|bucket| ScaledBucket {
            bucket: bucket.clone(),
            workouts_pct: percent(bucket.workouts as u64, max_workouts),
            entries_pct: percent(bucket.entries as u64, max_entries),
            duration_pct: percent(bucket.duration, max_duration),
        })
        .collect()
}

fn percent(value: u64, max: u64) -> f64 {
    value as f64 / max.max(1) as f64 * 100.0
}

/// Counts entries per exercise name; ties keep first-seen order.
pub fn exercise_frequency(
    workouts: &[Workout],
    catalog: &[Exercise],
    top: usize,
) -> Vec<ExerciseCount> {
    let names: HashMap<i64, &str> = catalog
        .iter()
        .map(|exercise| (exercise.id, exercise.name.as_str()))
        .collect();

    let mut counts: Vec<ExerciseCount> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for entry in workouts.iter().flat_map(|workout| &workout.exercises) {
        let name = entry_name(entry, &names);
        match slots.get(name) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                slots.insert(name, counts.len());
                counts.push(ExerciseCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top);
    counts
}

fn entry_name<'a>(entry: &'a WorkoutEntry, names: &HashMap<i64, &'a str>) -> &'a str {
    entry
        .exercise_name
        .as_deref()
        .or_else(|| names.get(&entry.exercise_id).copied())
        .unwrap_or("Unknown")
}

pub fn progress_report<Tz: TimeZone>(
    workouts: &[Workout],
    catalog: &[Exercise],
    period: Period,
    tz: &Tz,
) -> ProgressReport {
    ProgressReport {
        period,
        totals: progress_totals(workouts),
        activity: scale_bars(&activity(workouts, tz, period)),
        top_exercises: exercise_frequency(workouts, catalog, TOP_EXERCISES),
    }
}
