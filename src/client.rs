#![cfg(feature = "web")]
//! Client side of the tracker: API access, token storage and view state
//!
//! [`Dashboard`] holds the state of the main view (token, history, form,
//! error message) and implements the submit -> append -> regroup flow.
//! [`LoginPage`] and [`RegisterPage`] hold the two account forms.

use crate::error::{Result, TrackerError};
use crate::progress::{ExerciseChart, ExerciseProgress, group_by_exercise, progress_charts};
use crate::workout::{Workout, WorkoutForm};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Shown when the server refuses or fails a workout submission
pub const LOG_FAILED: &str = "Failed to log workout. Please try again.";

/// Shown when login is refused
pub const LOGIN_FAILED: &str = "Invalid username or password";

/// Shown when registration is refused
pub const REGISTER_FAILED: &str = "Failed to register. Please try again.";

/// Operations the client needs from the tracker API
#[async_trait]
pub trait TrackerApi: Send + Sync {
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<()>;

    /// Exchange credentials for an access token
    async fn login(&self, username: &str, password: &str) -> Result<String>;

    async fn fetch_workouts(&self, token: &str) -> Result<Vec<Workout>>;

    /// Submit a workout form; returns the workout as recorded by the server
    async fn log_workout(&self, token: &str, form: &WorkoutForm) -> Result<Workout>;
}

/// [`TrackerApi`] over HTTP
pub struct HttpTrackerApi {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
}

#[derive(Deserialize)]
struct LoggedBody {
    workout: Workout,
}

#[derive(Deserialize)]
struct MessageBody {
    msg: String,
}

fn transport_error(e: reqwest::Error) -> TrackerError {
    TrackerError::Http(e.to_string())
}

/// Turn a non-success response into `TrackerError::Api`
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<MessageBody>(&text)
        .map(|body| body.msg)
        .unwrap_or(text);
    Err(TrackerError::Api {
        status: status.as_u16(),
        msg,
    })
}

impl HttpTrackerApi {
    pub fn new(base_url: &str) -> Self {
        HttpTrackerApi {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Download one of the history exports, e.g. `export.csv`
    pub async fn download_export(&self, token: &str, file: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.url(&format!("/workouts/{}", file)))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let bytes = check(response).await?.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TrackerApi for HttpTrackerApi {
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await?;
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;
        let body: TokenBody = check(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(body.access_token)
    }

    async fn fetch_workouts(&self, token: &str) -> Result<Vec<Workout>> {
        let response = self
            .http
            .get(self.url("/workouts"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await?.json().await.map_err(transport_error)
    }

    async fn log_workout(&self, token: &str, form: &WorkoutForm) -> Result<Workout> {
        let response = self
            .http
            .post(self.url("/workouts"))
            .bearer_auth(token)
            .json(form)
            .send()
            .await
            .map_err(transport_error)?;
        let body: LoggedBody = check(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(body.workout)
    }
}

/// File-backed storage for the access token between runs
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token, if any
    pub fn load(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    /// Forget the token; a missing file is not an error
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Routing guard: the stored token, or an error asking the user to log in
pub fn require_token(store: &TokenStore) -> Result<String> {
    store.load().ok_or(TrackerError::MissingToken)
}

/// State of the main tracker view
pub struct Dashboard<A: TrackerApi> {
    api: A,
    pub token: Option<String>,
    pub workouts: Vec<Workout>,
    pub form: WorkoutForm,
    pub error: Option<String>,
}

impl<A: TrackerApi> Dashboard<A> {
    pub fn new(api: A, token: Option<String>) -> Self {
        Dashboard {
            api,
            token,
            workouts: Vec::new(),
            form: WorkoutForm::default(),
            error: None,
        }
    }

    /// Reload the history from the server; does nothing without a token
    ///
    /// On failure the current list is kept and the error is returned.
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(token) = self.token.as_deref() else {
            return Ok(());
        };
        match self.api.fetch_workouts(token).await {
            Ok(workouts) => {
                self.workouts = workouts;
                Ok(())
            }
            Err(e) => {
                log::warn!("could not load workouts: {}", e);
                Err(e)
            }
        }
    }

    /// Submit the current form
    ///
    /// Validation failures set the error message without contacting the
    /// server. A successful submission appends the recorded workout, clears
    /// the form and the error. Returns whether the workout was logged.
    pub async fn submit(&mut self) -> bool {
        if let Err(e) = self.form.validate() {
            self.error = Some(e.to_string());
            return false;
        }

        let result = match self.token.as_deref() {
            Some(token) => self.api.log_workout(token, &self.form).await,
            None => Err(TrackerError::MissingToken),
        };

        match result {
            Ok(workout) => {
                self.workouts.push(workout);
                self.form.clear();
                self.error = None;
                true
            }
            Err(e) => {
                log::warn!("logging workout failed: {}", e);
                self.error = Some(LOG_FAILED.to_string());
                false
            }
        }
    }

    pub fn history(&self) -> &[Workout] {
        &self.workouts
    }

    /// History grouped by exercise
    pub fn progress(&self) -> Vec<ExerciseProgress> {
        group_by_exercise(&self.workouts)
    }

    /// One line chart per exercise
    pub fn charts(&self) -> Vec<ExerciseChart> {
        progress_charts(&self.workouts)
    }
}

/// State of the login form
#[derive(Debug, Default)]
pub struct LoginPage {
    pub username: String,
    pub password: String,
    pub error: Option<String>,
}

impl LoginPage {
    /// Log in and store the token; returns whether the user may proceed
    pub async fn submit<A: TrackerApi>(&mut self, api: &A, store: &TokenStore) -> bool {
        let token = match api.login(&self.username, &self.password).await {
            Ok(token) if !token.is_empty() => token,
            Ok(_) | Err(_) => {
                self.error = Some(LOGIN_FAILED.to_string());
                return false;
            }
        };

        if let Err(e) = store.save(&token) {
            log::error!("could not store token in {}: {}", store.path().display(), e);
            self.error = Some(e.to_string());
            return false;
        }

        self.error = None;
        true
    }
}

/// State of the registration form
#[derive(Debug, Default)]
pub struct RegisterPage {
    pub username: String,
    pub email: String,
    pub password: String,
    pub error: Option<String>,
}

impl RegisterPage {
    /// Register the account; returns whether the user should go on to log in
    pub async fn submit<A: TrackerApi>(&mut self, api: &A) -> bool {
        match api.register(&self.username, &self.email, &self.password).await {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(e) => {
                log::warn!("registration failed: {}", e);
                self.error = Some(REGISTER_FAILED.to_string());
                false
            }
        }
    }
}
