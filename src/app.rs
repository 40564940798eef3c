#![cfg(feature = "web")]
use axum::{
    Json, Router,
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, State},
    http::{StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::auth::{TokenIssuer, bearer_token, generate_secret};
use crate::config::{ServerConfig, check_ttl};
use crate::downloader;
use crate::error::{Result, TrackerError};
use crate::graph::{ChartOptions, render_progress_chart};
use crate::login::{UserCredentials, UserDirectory};
use crate::progress::{ExerciseChart, group_by_exercise, progress_charts};
use crate::saving::WorkoutStore;
use crate::workout::{Workout, WorkoutForm};

/// Shared server state: accounts, workout logs and the token issuer
pub struct AppState {
    pub users: UserDirectory,
    pub workouts: WorkoutStore,
    pub tokens: TokenIssuer,
}

impl AppState {
    /// State rooted at `config.data_dir`, creating the users file if needed
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let ttl = Duration::try_minutes(check_ttl(config.token_ttl_minutes)?)
            .ok_or_else(|| TrackerError::Config("token lifetime out of range".to_string()))?;

        let users = UserDirectory::new(&config.data_dir);
        users.init()?;

        let secret = match &config.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                log::warn!("no JWT secret configured; issued tokens will not survive a restart");
                generate_secret()
            }
        };

        Ok(AppState {
            users,
            workouts: WorkoutStore::new(&config.data_dir),
            tokens: TokenIssuer::new(&secret, ttl),
        })
    }
}

#[derive(Serialize)]
struct MessageResponse {
    msg: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Serialize)]
struct LoggedResponse {
    msg: String,
    workout: Workout,
}

/// Username of the caller, taken from a verified bearer token
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = TrackerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens.verify(token)?;
        Ok(AuthUser(claims.sub))
    }
}

/// JSON request body whose rejections are reported as `{"msg": ...}`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(TrackerError))]
pub struct JsonBody<T>(pub T);

/// Run blocking work (password hashing, log files, chart rendering) off the
/// async workers
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| TrackerError::Internal(format!("blocking task failed: {}", e)))?
}

/// Build the application router over the given state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/login", get(serve_login_page))
        .route("/register", get(serve_register_page))
        .route("/auth/register", post(handle_register))
        .route("/auth/login", post(handle_login))
        .route("/workouts", get(list_workouts).post(log_workout))
        .route("/workouts/progress", get(get_progress))
        .route("/workouts/progress/:exercise/chart.png", get(get_progress_chart))
        .route("/workouts/export.csv", get(export_csv))
        .route("/workouts/export.xlsx", get(export_xlsx))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server and serve until the process is stopped
pub async fn run(config: ServerConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_config(&config)?);
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    log::info!(
        "listening on http://{} (data in {})",
        config.bind_addr,
        config.data_dir.display()
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn serve_login_page() -> Html<&'static str> {
    Html(include_str!("./static/login.html"))
}

async fn serve_register_page() -> Html<&'static str> {
    Html(include_str!("./static/register.html"))
}

/// Handle user registration
///
/// # Returns
/// * `201 {"msg": "User created"}` on success
/// * `400` for missing or malformed fields, `409` for a taken username or email
async fn handle_register(
    State(state): State<Arc<AppState>>,
    JsonBody(credentials): JsonBody<UserCredentials>,
) -> Result<impl IntoResponse> {
    blocking(move || {
        state.users.register_user(
            credentials.username.trim(),
            credentials.email.trim(),
            &credentials.password,
        )
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            msg: "User created".to_string(),
        }),
    ))
}

/// Handle user login, returning an access token for valid credentials
async fn handle_login(
    State(state): State<Arc<AppState>>,
    JsonBody(credentials): JsonBody<UserCredentials>,
) -> Result<Json<LoginResponse>> {
    let username = credentials.username.trim().to_string();
    let verified = {
        let state = state.clone();
        let username = username.clone();
        blocking(move || state.users.verify_user(&username, &credentials.password)).await?
    };
    if !verified {
        log::warn!("failed login for {:?}", username);
        return Err(TrackerError::InvalidCredentials);
    }

    let access_token = state.tokens.issue(&username)?;
    log::info!("user {} logged in", username);
    Ok(Json(LoginResponse { access_token }))
}

async fn log_workout(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
    JsonBody(form): JsonBody<WorkoutForm>,
) -> Result<impl IntoResponse> {
    let workout = Workout::record(&username, form.validate()?);
    {
        let workout = workout.clone();
        let username = username.clone();
        blocking(move || state.workouts.append(&username, workout)).await?;
    }

    log::info!(
        "{} logged {} {}x{} @ {}kg",
        username,
        workout.exercise,
        workout.sets,
        workout.reps,
        workout.weight
    );
    Ok((
        StatusCode::CREATED,
        Json(LoggedResponse {
            msg: "Workout logged successfully".to_string(),
            workout,
        }),
    ))
}

async fn history(state: Arc<AppState>, username: String) -> Result<Vec<Workout>> {
    blocking(move || state.workouts.list(&username)).await
}

async fn list_workouts(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
) -> Result<Json<Vec<Workout>>> {
    Ok(Json(history(state, username).await?))
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
) -> Result<Json<Vec<ExerciseChart>>> {
    let workouts = history(state, username).await?;
    Ok(Json(progress_charts(&workouts)))
}

async fn get_progress_chart(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
    Path(exercise): Path<String>,
) -> Result<Response> {
    let workouts = history(state, username).await?;
    let progress = group_by_exercise(&workouts)
        .into_iter()
        .find(|p| p.exercise == exercise)
        .ok_or_else(|| TrackerError::NotFound(format!("No workouts logged for {}", exercise)))?;

    let png = blocking(move || {
        render_progress_chart(&progress, &ChartOptions::for_exercise(&progress))
    })
    .await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
) -> Result<Response> {
    let workouts = history(state, username).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"workouts.csv\"",
            ),
        ],
        downloader::to_csv(&workouts),
    )
        .into_response())
}

async fn export_xlsx(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
) -> Result<Response> {
    let workouts = history(state, username).await?;
    let bytes = downloader::to_xlsx(&workouts)?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"workouts.xlsx\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
