use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/workout", get(handlers::workout_page).post(handlers::save_workout))
        .route("/workout/entries", post(handlers::add_entry))
        .route("/workout/entries/:index/remove", post(handlers::remove_entry))
        .route("/workouts/:id", get(handlers::workout_detail))
        .route("/workouts/:id/delete", post(handlers::delete_workout))
        .route("/exercises", get(handlers::exercises_page).post(handlers::create_exercise))
        .route("/exercises/:id", get(handlers::exercise_detail))
        .route("/progress", get(handlers::progress_page))
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route("/register", post(handlers::register_submit))
        .route("/logout", post(handlers::logout))
        .route("/api/session", get(handlers::api_session))
        .route("/api/login", post(handlers::api_login))
        .route("/api/register", post(handlers::api_register))
        .route("/api/logout", post(handlers::api_logout))
        .route("/api/dashboard", get(handlers::api_dashboard))
        .route("/api/progress", get(handlers::api_progress))
        .route("/api/exercises", get(handlers::api_exercises))
        .route("/api/workouts", post(handlers::api_create_workout))
        .route(
            "/api/workouts/:id",
            put(handlers::api_update_workout).delete(handlers::api_delete_workout),
        )
        .route("/api/notices", get(handlers::api_notices))
        .route("/api/health", get(handlers::api_health))
        .with_state(state)
}
