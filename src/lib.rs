/*!
# Gym Progress Tracker

A small web application for logging gym workouts and following progress per
exercise, built in Rust.

## Overview

Users register, log in and receive a bearer token. With that token they log
workouts (exercise, sets, reps, weight, date), see their history as a table
and get one weight-over-time line chart per exercise.

## Architecture

### Frontend Layer
- **Technologies**: HTML, CSS, JavaScript (bundled pages served by the backend)
- A terminal client (`gym-cli`) drives the same flow through [`client::Dashboard`]

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Workout form validation - Turns raw form text into typed workouts
  - Progress grouping - Groups the history by exercise, in first-seen order
  - Chart rendering - Chart.js-shaped JSON and server-side PNG line charts
  - Accounts - Argon2 password hashes in a JSON users file
  - Tokens - HS256 bearer tokens with a short lifetime

### Data Persistence Layer
- `users.json` holding every account
- One gzip-compressed bincode log of workouts per user
- CSV and XLSX export of the history

## Modules

- **workout**: Form state, validation and workout records
- **progress**: Grouping by exercise and chart data
- **graph**: PNG chart rendering
- **downloader**: CSV/XLSX export
- **saving**: Workout log persistence
- **login**: Account registration and password verification
- **auth**: Bearer token issuing and verification
- **app**: REST routes and server startup
- **client**: HTTP client, token storage and view state
- **config**: Environment-driven settings
- **error**: Error type shared by every module

## REST API Endpoints

- `POST /auth/register` - Creates an account
- `POST /auth/login` - Returns `{"access_token": ...}`
- `POST /workouts`, `GET /workouts` - Log a workout / list the history
- `GET /workouts/progress` - Chart data per exercise
- `GET /workouts/progress/{exercise}/chart.png` - Rendered progress chart
- `GET /workouts/export.csv`, `GET /workouts/export.xlsx` - History export
*/

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod downloader;
pub mod error;
pub mod graph;
pub mod login;
pub mod progress;
pub mod saving;
pub mod workout;

pub use error::{Result, TrackerError};
pub use progress::{ChartData, ExerciseProgress, group_by_exercise};
pub use workout::{NewWorkout, Workout, WorkoutForm};
