use crate::auth;
use crate::cache::CachedData;
use crate::catalog::{self, ExerciseFilter};
use crate::errors::{AppError, ClientError};
use crate::models::{
    Created, Credentials, DashboardSummary, Exercise, Period, ProgressReport, Registration, User,
};
use crate::notices::{Notice, NoticeLevel};
use crate::session::SessionState;
use crate::state::AppState;
use crate::stats::{dashboard_summary, progress_report};
use crate::ui;
use crate::validation::{
    EntryForm, ExerciseForm, SaveWorkoutForm, ValidationError, WorkoutSubmission, check_catalog,
    finish_workout, validate_credentials, validate_entry, validate_exercise, validate_registration,
    validate_workout,
};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

const INVALID_LOGIN: &str = "Invalid username or password.";

#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    #[serde(default)]
    pub view: Period,
}

type Page = Result<Html<String>, Response>;
type Action = Result<Redirect, Response>;

// Pages

/// The signed-in user, or the response to send instead.
async fn page_user(state: &AppState) -> Result<User, Response> {
    match state.session.snapshot().await {
        SessionState::Authenticated(session) => Ok(session.user),
        SessionState::Authenticating { .. } => Err(Html(ui::render_loading()).into_response()),
        SessionState::Unauthenticated => Err(Redirect::to("/login").into_response()),
    }
}

/// Loads the user's data. Other failures fall back to what is cached.
async fn load_page_data(state: &AppState, user: &User) -> Result<CachedData, Response> {
    match state.data_for(user).await {
        Ok(data) => Ok(data),
        Err(err) => {
            failed(state, "load your workouts", &err).await;
            if err.is_unauthorized() {
                return Err(Redirect::to("/login").into_response());
            }
            Ok(state.cache.snapshot().await)
        }
    }
}

/// Logs and announces a failed call. After a rejected token, data cached
/// for the expired user is dropped.
async fn failed(state: &AppState, operation: &str, err: &ClientError) {
    if err.is_unauthorized() {
        if state.session.current_user().await.is_none() {
            state.forget_user_data().await;
        }
    } else {
        state.report(operation, err).await;
    }
}

async fn failed_action(
    state: &AppState,
    operation: &str,
    err: &ClientError,
    back: &str,
) -> Redirect {
    failed(state, operation, err).await;
    if err.is_unauthorized() {
        Redirect::to("/login")
    } else {
        Redirect::to(back)
    }
}

async fn warn_invalid(state: &AppState, err: ValidationError) {
    state.notices.push(NoticeLevel::Warning, err.to_string()).await;
}

async fn notices(state: &AppState) -> Vec<Notice> {
    state.notices.drain().await
}

pub async fn dashboard(State(state): State<AppState>) -> Page {
    let user = page_user(&state).await?;
    let data = load_page_data(&state, &user).await?;
    let summary = dashboard_summary(&data.workouts);
    let notices = notices(&state).await;
    Ok(Html(ui::render_dashboard(&user, &summary, &state.utc_offset, &notices)))
}

pub async fn workout_page(State(state): State<AppState>) -> Page {
    let user = page_user(&state).await?;
    let data = load_page_data(&state, &user).await?;
    let draft = state.draft.lock().await.clone();
    let notices = notices(&state).await;
    Ok(Html(ui::render_workout_logger(&user, &data.exercises, &draft, &notices)))
}

pub async fn add_entry(State(state): State<AppState>, Form(form): Form<EntryForm>) -> Action {
    page_user(&state).await?;
    let exercises = state.cache.snapshot().await.exercises;

    let staged = form.parse().and_then(|submission| {
        let mut entry = validate_entry(&submission)?;
        check_catalog(std::slice::from_ref(&entry), &exercises)?;
        catalog::annotate(&mut entry, &exercises);
        Ok(entry)
    });

    match staged {
        Ok(entry) => state.draft.lock().await.push(entry),
        Err(err) => warn_invalid(&state, err).await,
    }
    Ok(Redirect::to("/workout"))
}

pub async fn remove_entry(State(state): State<AppState>, Path(index): Path<usize>) -> Action {
    page_user(&state).await?;
    let mut draft = state.draft.lock().await;
    if index < draft.len() {
        draft.remove(index);
    }
    Ok(Redirect::to("/workout"))
}

pub async fn save_workout(
    State(state): State<AppState>,
    Form(form): Form<SaveWorkoutForm>,
) -> Action {
    page_user(&state).await?;
    let entries = state.draft.lock().await.clone();

    let workout = match form
        .duration()
        .and_then(|duration| finish_workout(&form.name, duration, entries, Some(Utc::now())))
    {
        Ok(workout) => workout,
        Err(err) => {
            warn_invalid(&state, err).await;
            return Ok(Redirect::to("/workout"));
        }
    };

    match state.client.create_workout(&workout).await {
        Ok(created) => {
            info!(id = created.id, "workout saved");
            state.cache.invalidate().await;
            state.draft.lock().await.clear();
            state
                .notices
                .push(NoticeLevel::Success, "Workout saved successfully! 🎉")
                .await;
            Ok(Redirect::to("/"))
        }
        Err(err) => Ok(failed_action(&state, "save the workout", &err, "/workout").await),
    }
}

pub async fn workout_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Page {
    let user = page_user(&state).await?;
    match state.client.workout(id).await {
        Ok(mut workout) => {
            let exercises = state.cache.snapshot().await.exercises;
            for entry in workout.exercises.iter_mut().filter(|e| e.exercise_name.is_none()) {
                catalog::annotate(entry, &exercises);
            }
            let notices = notices(&state).await;
            Ok(Html(ui::render_workout_detail(&user, &workout, &state.utc_offset, &notices)))
        }
        Err(err) => Err(failed_action(&state, "load the workout", &err, "/")
            .await
            .into_response()),
    }
}

pub async fn delete_workout(State(state): State<AppState>, Path(id): Path<i64>) -> Action {
    page_user(&state).await?;
    match state.client.delete_workout(id).await {
        Ok(_) => {
            info!(id, "workout deleted");
            state.cache.invalidate().await;
            state.notices.push(NoticeLevel::Success, "Workout deleted.").await;
            Ok(Redirect::to("/"))
        }
        Err(err) => Ok(failed_action(&state, "delete the workout", &err, "/").await),
    }
}

pub async fn exercises_page(
    State(state): State<AppState>,
    Query(filter): Query<ExerciseFilter>,
) -> Page {
    let user = page_user(&state).await?;
    let data = load_page_data(&state, &user).await?;
    let categories = catalog::categories(&data.exercises);
    let shown = filter.apply(&data.exercises);
    let notices = notices(&state).await;
    Ok(Html(ui::render_exercises(&user, &shown, &categories, &filter, &notices)))
}

pub async fn exercise_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Page {
    let user = page_user(&state).await?;
    let cached = state.cache.snapshot().await;
    let exercise = match catalog::find(&cached.exercises, id) {
        Some(exercise) => exercise.clone(),
        None => match state.client.exercise(id).await {
            Ok(exercise) => exercise,
            Err(err) => {
                return Err(failed_action(&state, "load the exercise", &err, "/exercises")
                    .await
                    .into_response());
            }
        },
    };
    let notices = notices(&state).await;
    Ok(Html(ui::render_exercise_detail(&user, &exercise, &notices)))
}

pub async fn create_exercise(
    State(state): State<AppState>,
    Form(form): Form<ExerciseForm>,
) -> Action {
    page_user(&state).await?;
    let exercise = match validate_exercise(&form) {
        Ok(exercise) => exercise,
        Err(err) => {
            warn_invalid(&state, err).await;
            return Ok(Redirect::to("/exercises"));
        }
    };

    match state.client.create_exercise(&exercise).await {
        Ok(created) => {
            info!(id = created.id, name = %exercise.name, "exercise added");
            state.cache.invalidate().await;
            state.notices.push(NoticeLevel::Success, "Exercise added.").await;
            Ok(Redirect::to("/exercises"))
        }
        Err(err) => Ok(failed_action(&state, "add the exercise", &err, "/exercises").await),
    }
}

pub async fn progress_page(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Page {
    let user = page_user(&state).await?;
    let data = load_page_data(&state, &user).await?;
    let report = progress_report(&data.workouts, &data.exercises, query.view, &state.utc_offset);
    let notices = notices(&state).await;
    Ok(Html(ui::render_progress(&user, &report, &notices)))
}

pub async fn login_page(State(state): State<AppState>) -> Response {
    if state.session.current_user().await.is_some() {
        return Redirect::to("/").into_response();
    }
    let notices = notices(&state).await;
    Html(ui::render_login(&notices)).into_response()
}

pub async fn login_submit(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Redirect {
    if let Err(err) = validate_credentials(&credentials) {
        warn_invalid(&state, err).await;
        return Redirect::to("/login");
    }

    state.sign_out().await;
    match auth::login(&state.client, &state.session, &credentials).await {
        Ok(_) => Redirect::to("/"),
        Err(ClientError::Unauthorized) => {
            state.notices.push(NoticeLevel::Error, INVALID_LOGIN).await;
            Redirect::to("/login")
        }
        Err(err) => {
            state.report("sign in", &err).await;
            Redirect::to("/login")
        }
    }
}

pub async fn register_submit(
    State(state): State<AppState>,
    Form(registration): Form<Registration>,
) -> Redirect {
    let registration = match validate_registration(&registration) {
        Ok(registration) => registration,
        Err(err) => {
            warn_invalid(&state, err).await;
            return Redirect::to("/login");
        }
    };

    state.sign_out().await;
    match auth::register(&state.client, &state.session, &registration).await {
        Ok(user) => {
            state
                .notices
                .push(NoticeLevel::Success, format!("Welcome, {}!", user.username))
                .await;
            Redirect::to("/")
        }
        Err(err) => {
            state.report("create your account", &err).await;
            Redirect::to("/login")
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.sign_out().await;
    Redirect::to("/login")
}

// JSON API

async fn api_user(state: &AppState) -> Result<User, AppError> {
    match state.session.snapshot().await {
        SessionState::Authenticated(session) => Ok(session.user),
        SessionState::Authenticating { .. } => {
            Err(AppError::unavailable("stored credentials are still being checked"))
        }
        SessionState::Unauthenticated => Err(AppError::unauthorized("sign in first")),
    }
}

async fn api_failure(state: &AppState, operation: &str, err: ClientError) -> AppError {
    failed(state, operation, &err).await;
    err.into()
}

async fn api_data(state: &AppState, user: &User) -> Result<CachedData, AppError> {
    match state.data_for(user).await {
        Ok(data) => Ok(data),
        Err(err) => Err(api_failure(state, "load your workouts", err).await),
    }
}

pub async fn api_session(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.session.snapshot().await;
    Json(json!({
        "state": snapshot.label(),
        "user": snapshot.user(),
    }))
}

pub async fn api_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<User>, AppError> {
    validate_credentials(&credentials)?;
    state.sign_out().await;
    match auth::login(&state.client, &state.session, &credentials).await {
        Ok(user) => Ok(Json(user)),
        Err(ClientError::Unauthorized) => Err(AppError::unauthorized(INVALID_LOGIN)),
        Err(err) => Err(api_failure(&state, "sign in", err).await),
    }
}

pub async fn api_register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let registration = validate_registration(&registration)?;
    state.sign_out().await;
    match auth::register(&state.client, &state.session, &registration).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(err) => Err(api_failure(&state, "create your account", err).await),
    }
}

pub async fn api_logout(State(state): State<AppState>) -> StatusCode {
    state.sign_out().await;
    StatusCode::NO_CONTENT
}

pub async fn api_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, AppError> {
    let user = api_user(&state).await?;
    let data = api_data(&state, &user).await?;
    Ok(Json(dashboard_summary(&data.workouts)))
}

pub async fn api_progress(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressReport>, AppError> {
    let user = api_user(&state).await?;
    let data = api_data(&state, &user).await?;
    Ok(Json(progress_report(
        &data.workouts,
        &data.exercises,
        query.view,
        &state.utc_offset,
    )))
}

pub async fn api_exercises(
    State(state): State<AppState>,
    Query(filter): Query<ExerciseFilter>,
) -> Result<Json<Vec<Exercise>>, AppError> {
    let user = api_user(&state).await?;
    let data = api_data(&state, &user).await?;
    Ok(Json(filter.apply(&data.exercises).into_iter().cloned().collect()))
}

pub async fn api_create_workout(
    State(state): State<AppState>,
    Json(submission): Json<WorkoutSubmission>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let user = api_user(&state).await?;
    let workout = validate_workout(&submission, Some(Utc::now()))?;
    if let Some(cached) = state.cache.get(user.id).await {
        check_catalog(&workout.exercises, &cached.exercises)?;
    }
    match state.client.create_workout(&workout).await {
        Ok(created) => {
            info!(id = created.id, "workout saved");
            state.cache.invalidate().await;
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(err) => Err(api_failure(&state, "save the workout", err).await),
    }
}

pub async fn api_update_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(submission): Json<WorkoutSubmission>,
) -> Result<Json<Value>, AppError> {
    let user = api_user(&state).await?;
    let workout = validate_workout(&submission, None)?;
    if let Some(cached) = state.cache.get(user.id).await {
        check_catalog(&workout.exercises, &cached.exercises)?;
    }
    match state.client.update_workout(id, &workout).await {
        Ok(body) => {
            info!(id, "workout updated");
            state.cache.invalidate().await;
            Ok(Json(body))
        }
        Err(err) => Err(api_failure(&state, "update the workout", err).await),
    }
}

pub async fn api_delete_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    api_user(&state).await?;
    match state.client.delete_workout(id).await {
        Ok(_) => {
            info!(id, "workout deleted");
            state.cache.invalidate().await;
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => Err(api_failure(&state, "delete the workout", err).await),
    }
}

pub async fn api_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(notices(&state).await)
}

pub async fn api_health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state
        .client
        .health()
        .await
        .map(Json)
        .map_err(AppError::from)
}
