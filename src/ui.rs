use crate::catalog::ExerciseFilter;
use crate::models::{
    DashboardSummary, Exercise, Period, ProgressReport, User, Workout, WorkoutEntry,
};
use crate::notices::Notice;
use chrono::FixedOffset;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Dashboard,
    Workout,
    Exercises,
    Progress,
    None,
}

const NAV_LINKS: [(Nav, &str, &str); 4] = [
    (Nav::Dashboard, "/", "Dashboard"),
    (Nav::Workout, "/workout", "Workout"),
    (Nav::Exercises, "/exercises", "Exercises"),
    (Nav::Progress, "/progress", "Progress"),
];

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_page(
    title: &str,
    active: Nav,
    user: Option<&User>,
    notices: &[Notice],
    body: &str,
) -> String {
    let mut nav = String::new();
    if let Some(user) = user {
        for (item, href, label) in NAV_LINKS {
            let class = if item == active {
                " class=\"active\""
            } else {
                ""
            };
            let _ = write!(nav, "<a href=\"{href}\"{class}>{label}</a>");
        }
        let _ = write!(
            nav,
            "<form method=\"post\" action=\"/logout\" class=\"inline\"><span class=\"who\">{}</span><button type=\"submit\" class=\"link\">Sign out</button></form>",
            escape(&user.username)
        );
    }

    PAGE_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", &nav)
        .replace("{{NOTICES}}", &render_notices(notices))
        .replace("{{BODY}}", body)
}

fn render_notices(notices: &[Notice]) -> String {
    let mut out = String::new();
    for notice in notices {
        let _ = write!(
            out,
            "<div class=\"notice {}\" role=\"status\">{}</div>",
            notice.level.as_str(),
            escape(&notice.message)
        );
    }
    out
}

pub fn render_loading() -> String {
    let body = r#"<section class="card center">
  <h1>Checking your session…</h1>
  <p class="subtitle">This page refreshes on its own.</p>
  <meta http-equiv="refresh" content="1" />
</section>"#;
    render_page("Loading", Nav::None, None, &[], body)
}

pub fn render_login(notices: &[Notice]) -> String {
    let body = r#"<section class="card narrow">
  <h1>💪 Fitness Tracker</h1>
  <h2>Welcome Back</h2>
  <form method="post" action="/login" class="stack">
    <label>Username <input name="username" required /></label>
    <label>Password <input name="password" type="password" minlength="6" required /></label>
    <button type="submit">Sign In</button>
  </form>
  <h2>Create Account</h2>
  <form method="post" action="/register" class="stack">
    <label>Username <input name="username" required /></label>
    <label>Email (Optional) <input name="email" type="email" /></label>
    <label>Password <input name="password" type="password" minlength="6" required /></label>
    <button type="submit">Sign Up</button>
  </form>
</section>"#;
    render_page("Sign in", Nav::None, None, notices, body)
}

fn local_date(workout: &Workout, offset: &FixedOffset) -> String {
    workout.date.with_timezone(offset).format("%b %-d, %Y").to_string()
}

pub fn render_dashboard(
    user: &User,
    summary: &DashboardSummary,
    offset: &FixedOffset,
    notices: &[Notice],
) -> String {
    let mut body = format!(
        "<h1>Welcome to Your Fitness Journey! 🏋️</h1>\
         <p class=\"subtitle\">Track your progress and achieve your goals</p>\
         <section class=\"stats\">{}{}{}{}</section>",
        stat("📊", "Total Workouts", summary.total_workouts),
        stat("📅", "This Week", summary.this_week),
        stat("💪", "Exercises Done", summary.total_entries),
        stat("⏱️", "Total Minutes", summary.total_duration),
    );

    body.push_str("<section class=\"card\"><h2>Recent Workouts</h2>");
    if summary.recent.is_empty() {
        body.push_str(
            "<p class=\"empty\">No workouts yet. Start your first workout to see it here!</p>",
        );
    } else {
        body.push_str("<div class=\"list\">");
        for workout in &summary.recent {
            body.push_str(&workout_card(workout, offset));
        }
        body.push_str("</div>");
    }
    body.push_str("</section>");

    body.push_str(
        "<section class=\"card\"><h2>Quick Actions</h2><div class=\"actions\">\
         <a class=\"button\" href=\"/workout\">➕ Start New Workout</a>\
         <a class=\"button secondary\" href=\"/exercises\">📚 Browse Exercises</a>\
         <a class=\"button secondary\" href=\"/progress\">📈 View Progress</a></div></section>",
    );

    render_page("Dashboard", Nav::Dashboard, Some(user), notices, &body)
}

fn stat(icon: &str, label: &str, value: impl std::fmt::Display) -> String {
    format!(
        "<div class=\"stat\"><span class=\"icon\">{icon}</span><span class=\"value\">{value}</span><span class=\"label\">{label}</span></div>"
    )
}

fn workout_card(workout: &Workout, offset: &FixedOffset) -> String {
    let duration = workout
        .duration
        .map(|minutes| format!("<span>{minutes} minutes</span>"))
        .unwrap_or_default();
    format!(
        "<a class=\"workout\" href=\"/workouts/{id}\"><strong>{name}</strong><span class=\"date\">{date}</span><span>{count} exercises</span>{duration}</a>",
        id = workout.id,
        name = escape(&workout.name),
        date = local_date(workout, offset),
        count = workout.entry_count(),
    )
}

fn entry_row(entry: &WorkoutEntry) -> String {
    let mut row = format!(
        "{image}<strong>{name}</strong> <span>{sets} sets × {reps} reps</span>",
        image = entry
            .exercise_image
            .as_deref()
            .map(|image| format!("<span class=\"glyph\">{}</span>", escape(image)))
            .unwrap_or_default(),
        name = escape(entry.exercise_name.as_deref().unwrap_or("Unknown")),
        sets = entry.sets,
        reps = entry.reps,
    );
    if let Some(weight) = entry.weight {
        let _ = write!(row, " <span>{weight} kg</span>");
    }
    if let Some(notes) = &entry.notes {
        let _ = write!(row, "<p class=\"notes\">{}</p>", escape(notes));
    }
    row
}

pub fn render_workout_logger(
    user: &User,
    exercises: &[Exercise],
    draft: &[WorkoutEntry],
    notices: &[Notice],
) -> String {
    let mut options = String::from("<option value=\"\">Select exercise</option>");
    for exercise in exercises {
        let _ = write!(
            options,
            "<option value=\"{}\">{}</option>",
            exercise.id,
            escape(&exercise.name)
        );
    }

    let mut body = format!(
        r#"<h1>Track Your Workout 💪</h1>
<section class="card">
  <h2>Add Exercise</h2>
  <form method="post" action="/workout/entries" class="grid">
    <label>Exercise <select name="exercise_id">{options}</select></label>
    <label>Sets <input name="sets" type="number" placeholder="3" /></label>
    <label>Reps <input name="reps" type="number" placeholder="10" /></label>
    <label>Weight (kg) <input name="weight" type="number" step="any" placeholder="Optional" /></label>
    <label class="wide">Notes <textarea name="notes" rows="2" placeholder="Optional notes..."></textarea></label>
    <button type="submit">Add to Workout</button>
  </form>
</section>"#
    );

    body.push_str("<section class=\"card\"><h2>Exercises</h2>");
    if draft.is_empty() {
        body.push_str("<p class=\"empty\">No exercises added yet.</p>");
    } else {
        body.push_str("<ul class=\"entries\">");
        for (index, entry) in draft.iter().enumerate() {
            let _ = write!(
                body,
                "<li>{}<form method=\"post\" action=\"/workout/entries/{index}/remove\" class=\"inline\"><button type=\"submit\" class=\"link\">✕</button></form></li>",
                entry_row(entry)
            );
        }
        body.push_str("</ul>");
    }
    body.push_str(
        r#"<form method="post" action="/workout" class="grid">
    <label>Workout Name <input name="name" placeholder="e.g., Upper Body, Leg Day, Full Body" /></label>
    <label>Duration (minutes) <input name="duration" type="number" placeholder="Optional" /></label>
    <button type="submit">💾 Save Workout</button>
  </form>
</section>"#,
    );

    render_page("Workout", Nav::Workout, Some(user), notices, &body)
}

pub fn render_workout_detail(
    user: &User,
    workout: &Workout,
    offset: &FixedOffset,
    notices: &[Notice],
) -> String {
    let mut body = format!(
        "<h1>{}</h1><p class=\"subtitle\">{}{}</p><section class=\"card\"><ul class=\"entries\">",
        escape(&workout.name),
        local_date(workout, offset),
        workout
            .duration
            .map(|minutes| format!(" · {minutes} minutes"))
            .unwrap_or_default(),
    );
    for entry in &workout.exercises {
        let _ = write!(body, "<li>{}</li>", entry_row(entry));
    }
    let _ = write!(
        body,
        "</ul><form method=\"post\" action=\"/workouts/{}/delete\"><button type=\"submit\" class=\"danger\">Delete Workout</button></form></section>",
        workout.id
    );
    render_page(&workout.name, Nav::Dashboard, Some(user), notices, &body)
}

fn exercise_image(exercise: &Exercise) -> String {
    match exercise.image.as_deref() {
        Some(url) if exercise.image_is_url() => format!(
            "<img src=\"{}\" alt=\"{}\" />",
            escape(url),
            escape(&exercise.name)
        ),
        Some(glyph) => format!("<span class=\"glyph\">{}</span>", escape(glyph)),
        None => String::new(),
    }
}

pub fn render_exercises(
    user: &User,
    exercises: &[&Exercise],
    categories: &[String],
    filter: &ExerciseFilter,
    notices: &[Notice],
) -> String {
    let selected = filter.selected_category();
    let mut body = format!(
        "<h1>Exercise Library 📚</h1><p class=\"subtitle\">Browse and learn about different exercises</p>\
         <form method=\"get\" action=\"/exercises\" class=\"filters\">\
         <input name=\"q\" placeholder=\"Search exercises...\" value=\"{}\" />",
        escape(&filter.search)
    );
    for category in categories {
        let class = if category == selected {
            "chip active"
        } else {
            "chip"
        };
        let _ = write!(
            body,
            "<button type=\"submit\" name=\"category\" value=\"{value}\" class=\"{class}\">{value}</button>",
            value = escape(category)
        );
    }
    body.push_str("</form><section class=\"grid-cards\">");

    for exercise in exercises {
        let _ = write!(
            body,
            "<a class=\"exercise\" href=\"/exercises/{id}\">{image}<h3>{name}</h3><span class=\"tag\">{category}</span>\
             <p><strong>Target Muscles:</strong> {muscle}</p><p>{description}</p></a>",
            id = exercise.id,
            image = exercise_image(exercise),
            name = escape(&exercise.name),
            category = escape(&exercise.category),
            muscle = escape(exercise.muscle.as_deref().unwrap_or("")),
            description = escape(exercise.description.as_deref().unwrap_or("")),
        );
    }
    body.push_str("</section>");
    if exercises.is_empty() {
        body.push_str("<p class=\"empty\">No exercises found matching your search.</p>");
    }

    body.push_str(
        r#"<section class="card">
  <h2>Add Exercise</h2>
  <form method="post" action="/exercises" class="grid">
    <label>Name <input name="name" required /></label>
    <label>Category <input name="category" placeholder="Other" /></label>
    <label>Target Muscles <input name="muscle" /></label>
    <label>Image <input name="image" placeholder="💪 or https://…" /></label>
    <label class="wide">Description <textarea name="description" rows="2"></textarea></label>
    <button type="submit">Add Exercise</button>
  </form>
</section>"#,
    );

    render_page("Exercises", Nav::Exercises, Some(user), notices, &body)
}

pub fn render_exercise_detail(user: &User, exercise: &Exercise, notices: &[Notice]) -> String {
    let body = format!(
        "<section class=\"card\">{image}<h1>{name}</h1><span class=\"tag\">{category}</span>\
         <p><strong>Target Muscles:</strong> {muscle}</p><p>{description}</p>\
         <a href=\"/exercises\">← Back to library</a></section>",
        image = exercise_image(exercise),
        name = escape(&exercise.name),
        category = escape(&exercise.category),
        muscle = escape(exercise.muscle.as_deref().unwrap_or("")),
        description = escape(exercise.description.as_deref().unwrap_or("")),
    );
    render_page(&exercise.name, Nav::Exercises, Some(user), notices, &body)
}

pub fn render_progress(user: &User, report: &ProgressReport, notices: &[Notice]) -> String {
    let totals = &report.totals;
    let mut body = format!(
        "<h1>Your Progress 📈</h1><p class=\"subtitle\">Track your fitness journey and achievements</p>\
         <section class=\"stats\">{}{}{}{}</section>",
        stat("🏋️", "Total Workouts", totals.total_workouts),
        stat("💪", "Exercises Completed", totals.total_entries),
        stat("⏱️", "Total Minutes", totals.total_duration),
        stat("📊", "Avg Duration (min)", totals.average_duration),
    );

    let (title, daily_class, weekly_class) = match report.period {
        Period::Daily => ("Daily Activity (Last 14 Days)", "chip active", "chip"),
        Period::Weekly => ("Weekly Activity (Last 8 Weeks)", "chip", "chip active"),
    };
    let _ = write!(
        body,
        "<section class=\"card\"><div class=\"row\"><h2>{title}</h2>\
         <nav class=\"tabs\"><a class=\"{daily_class}\" href=\"/progress?view=daily\">Daily</a>\
         <a class=\"{weekly_class}\" href=\"/progress?view=weekly\">Weekly</a></nav></div>"
    );

    if report.activity.is_empty() {
        body.push_str(
            "<p class=\"empty\">No workout data yet. Start logging workouts to see your progress!</p>",
        );
    } else {
        body.push_str("<div class=\"chart\">");
        for bar in &report.activity {
            let bucket = &bar.bucket;
            let _ = write!(
                body,
                "<div class=\"bar-group\"><div class=\"bars\">\
                 <div class=\"bar workouts\" style=\"height: {w:.0}%\" title=\"{wc} workouts\">{wl}</div>\
                 <div class=\"bar entries\" style=\"height: {e:.0}%\" title=\"{ec} exercises\">{el}</div>\
                 </div><span class=\"bar-label\">{label}</span></div>",
                w = bar.workouts_pct,
                wc = bucket.workouts,
                wl = bar_value(bucket.workouts),
                e = bar.entries_pct,
                ec = bucket.entries,
                el = bar_value(bucket.entries),
                label = bucket.start.format("%b %-d"),
            );
        }
        body.push_str("</div>");
    }
    body.push_str("</section>");

    if !report.top_exercises.is_empty() {
        body.push_str("<section class=\"card\"><h2>Most Used Exercises</h2><ol class=\"ranking\">");
        for exercise in &report.top_exercises {
            let _ = write!(
                body,
                "<li><span>{}</span><span>{} times</span></li>",
                escape(&exercise.name),
                exercise.count
            );
        }
        body.push_str("</ol></section>");
    }

    render_page("Progress", Nav::Progress, Some(user), notices, &body)
}

fn bar_value(value: usize) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Fitness Tracker</title>
  <style>
    :root {
      --bg: #f4f7fb;
      --ink: #1b262c;
      --accent: #0f4c75;
      --accent-2: #3282b8;
      --pink: #ff6b9d;
      --card: #ffffff;
      --shadow: 0 16px 40px rgba(15, 76, 117, 0.12);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Trebuchet MS", sans-serif;
    }

    header.nav {
      display: flex;
      align-items: center;
      gap: 18px;
      padding: 14px 28px;
      background: var(--accent);
    }

    header.nav a, header.nav .who, header.nav .link { color: white; text-decoration: none; }
    header.nav a.active { border-bottom: 2px solid var(--pink); }
    header.nav .logo { font-weight: 700; margin-right: auto; }

    main { width: min(960px, 100%); margin: 0 auto; padding: 28px 18px 48px; display: grid; gap: 22px; }
    h1 { margin: 0; }
    .subtitle { margin: 0; color: #5f6b73; }

    .card { background: var(--card); border-radius: 18px; box-shadow: var(--shadow); padding: 22px; }
    .card.narrow { width: min(420px, 100%); margin: 0 auto; }
    .card.center { text-align: center; }

    .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 14px; }
    .stat { background: var(--card); border-radius: 16px; padding: 16px; border-top: 4px solid var(--accent-2); display: grid; gap: 4px; }
    .stat .value { font-size: 1.8rem; font-weight: 600; color: var(--accent); }
    .stat .label { text-transform: uppercase; letter-spacing: 0.1em; font-size: 0.8rem; color: #7b868c; }

    .list, .grid-cards { display: grid; gap: 12px; }
    .grid-cards { grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); }
    .workout, .exercise { display: grid; gap: 4px; padding: 14px; border-radius: 14px; border: 1px solid #e3e9ef; color: inherit; text-decoration: none; background: var(--card); }
    .exercise img { width: 100%; border-radius: 10px; }
    .glyph { font-size: 2rem; }
    .tag { color: var(--accent-2); font-size: 0.85rem; }

    .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 12px; align-items: end; }
    .grid .wide { grid-column: 1 / -1; }
    .stack { display: grid; gap: 12px; }
    label { display: grid; gap: 6px; font-size: 0.9rem; }
    input, select, textarea { padding: 10px; border-radius: 10px; border: 1px solid #cfd8df; font: inherit; }

    button, .button { appearance: none; border: none; border-radius: 999px; padding: 10px 18px; font: inherit; font-weight: 600; cursor: pointer; background: var(--accent); color: white; text-decoration: none; }
    .button.secondary { background: var(--accent-2); }
    button.danger { background: #c0392b; }
    button.link { background: none; padding: 0 6px; color: inherit; }
    form.inline { display: inline-flex; align-items: center; gap: 8px; }
    .actions, .filters, .tabs, .row { display: flex; flex-wrap: wrap; gap: 10px; align-items: center; }
    .row { justify-content: space-between; }
    .chip { background: #e3e9ef; color: var(--ink); border-radius: 999px; padding: 6px 12px; text-decoration: none; font-weight: 600; }
    .chip.active { background: var(--accent); color: white; }

    .entries { list-style: none; padding: 0; display: grid; gap: 10px; }
    .notes { margin: 4px 0 0; color: #5f6b73; }
    .empty { color: #7b868c; }

    .chart { display: flex; gap: 10px; align-items: flex-end; height: 220px; overflow-x: auto; }
    .bar-group { display: grid; grid-template-rows: 1fr auto; height: 100%; min-width: 44px; }
    .bars { display: flex; gap: 3px; align-items: flex-end; }
    .bar { width: 18px; border-radius: 6px 6px 0 0; color: white; font-size: 0.7rem; text-align: center; }
    .bar.workouts { background: var(--accent); }
    .bar.entries { background: var(--pink); }
    .bar-label { font-size: 0.75rem; color: #7b868c; text-align: center; }
    .ranking li { display: flex; justify-content: space-between; padding: 6px 0; }

    .notice { padding: 12px 16px; border-radius: 12px; font-weight: 600; }
    .notice.info { background: #e3f2fd; }
    .notice.success { background: #e6f4ea; color: #1e7b34; }
    .notice.warning { background: #fff4e5; color: #9a5b00; }
    .notice.error { background: #fdecea; color: #b3261e; }
  </style>
</head>
<body>
  <header class="nav"><span class="logo">💪 Fitness Tracker</span>{{NAV}}</header>
  <main>
    {{NOTICES}}
    {{BODY}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DashboardSummary, Workout};
    use crate::notices::NoticeLevel;
    use chrono::{TimeZone, Utc};

    fn user() -> User {
        User {
            id: 1,
            username: "alex".into(),
            email: None,
        }
    }

    #[test]
    fn empty_dashboard_shows_zeroes_and_hint() {
        let summary = DashboardSummary {
            total_workouts: 0,
            this_week: 0,
            total_entries: 0,
            total_duration: 0,
            recent: Vec::new(),
        };
        let html = render_dashboard(&user(), &summary, &FixedOffset::east_opt(0).unwrap(), &[]);
        assert_eq!(html.matches("<span class=\"value\">0</span>").count(), 4);
        assert!(html.contains("No workouts yet"));
        assert!(!html.contains("class=\"workout\""));
    }

    #[test]
    fn user_content_is_escaped() {
        let workout = Workout {
            id: 9,
            name: "<script>alert(1)</script>".into(),
            date: Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap(),
            duration: Some(20),
            exercises: Vec::new(),
        };
        let summary = DashboardSummary {
            total_workouts: 1,
            this_week: 1,
            total_entries: 0,
            total_duration: 20,
            recent: vec![workout],
        };
        let html = render_dashboard(&user(), &summary, &FixedOffset::east_opt(0).unwrap(), &[]);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Apr 2, 2026"));
        assert!(html.contains("20 minutes"));
    }

    #[test]
    fn notices_render_once_per_entry() {
        let notices = vec![Notice {
            level: NoticeLevel::Warning,
            message: "Your session expired. Please sign in again.".into(),
        }];
        let html = render_login(&notices);
        assert_eq!(html.matches("notice warning").count(), 1);
    }
}
