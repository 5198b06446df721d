// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{attempt, quiz, session},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Every `/api` route sits behind the bearer-token middleware.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, evaluator, config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Static segments win over `{id}`, so `/attempts` and `/course/..` never reach get_quiz.
    let quiz_routes = Router::new()
        .route("/", post(quiz::create_quiz).get(quiz::list_all_quizzes))
        .route("/course/{course_id}", get(quiz::list_course_quizzes))
        .route("/attempts", get(attempt::list_attempts))
        .route("/attempt/{id}/report", get(attempt::get_report))
        .route("/{id}", get(quiz::get_quiz).delete(quiz::delete_quiz))
        .route("/{id}/questions", post(quiz::add_question))
        .route("/{id}/submit", post(attempt::submit_attempt));

    let api_routes = Router::new()
        .route("/session", get(session::current_session))
        .nest("/quiz", quiz_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(session::health))
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
