#![cfg(not(tarpaulin_include))]

use clap::{Parser, Subcommand};
use gym_tracker::client::{
    Dashboard, HttpTrackerApi, LoginPage, RegisterPage, TokenStore, require_token,
};
use gym_tracker::config::ClientConfig;
use gym_tracker::graph::{ChartOptions, chart_file_name, save_progress_chart};
use gym_tracker::workout::WorkoutForm;
use std::path::PathBuf;

/// Terminal client for the gym progress tracker
#[derive(Parser, Debug)]
#[command(name = "gym-cli", version, about)]
struct Cli {
    /// Base URL of the tracker API (overrides GYM_TRACKER_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// File holding the access token (overrides GYM_TRACKER_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Log in and remember the access token
    Login { username: String, password: String },
    /// Forget the stored access token
    Logout,
    /// Log a workout
    Log {
        exercise: String,
        sets: String,
        reps: String,
        /// Weight in kg
        weight: String,
        /// Date as YYYY-MM-DD
        date: String,
    },
    /// Print the workout history
    History,
    /// Print best and latest weight per exercise
    Progress,
    /// Render one PNG progress chart per exercise
    Charts {
        #[arg(long, default_value = "charts")]
        out_dir: PathBuf,
    },
    /// Download the history as CSV or XLSX
    Export {
        #[arg(value_parser = ["csv", "xlsx"])]
        format: String,
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if let Some(path) = cli.token_file {
        config.token_file = path;
    }

    let api = HttpTrackerApi::new(&config.base_url);
    let store = TokenStore::new(&config.token_file);

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let mut page = RegisterPage {
                username,
                email,
                password,
                error: None,
            };
            if !page.submit(&api).await {
                return Err(page.error.unwrap_or_default().into());
            }
            println!("Account created. Log in with `gym-cli login`.");
        }
        Command::Login { username, password } => {
            let mut page = LoginPage {
                username,
                password,
                error: None,
            };
            if !page.submit(&api, &store).await {
                return Err(page.error.unwrap_or_default().into());
            }
            println!("Logged in. Token saved to {}", store.path().display());
        }
        Command::Logout => {
            store.clear()?;
            println!("Logged out.");
        }
        Command::Log {
            exercise,
            sets,
            reps,
            weight,
            date,
        } => {
            let token = logged_in(&store)?;
            let mut dashboard = Dashboard::new(api, Some(token));
            dashboard.form = WorkoutForm::new(&exercise, &sets, &reps, &weight, &date);
            if !dashboard.submit().await {
                return Err(dashboard.error.unwrap_or_default().into());
            }
            println!("Workout logged successfully");
        }
        Command::History => {
            let mut dashboard = Dashboard::new(api, Some(logged_in(&store)?));
            dashboard.refresh().await?;

            println!(
                "{:<24} {:>5} {:>5} {:>12}  {}",
                "Exercise", "Sets", "Reps", "Weight (kg)", "Date"
            );
            for w in dashboard.history() {
                println!(
                    "{:<24} {:>5} {:>5} {:>12}  {}",
                    w.exercise,
                    w.sets,
                    w.reps,
                    w.weight,
                    w.date_label()
                );
            }
        }
        Command::Progress => {
            let mut dashboard = Dashboard::new(api, Some(logged_in(&store)?));
            dashboard.refresh().await?;

            for progress in dashboard.progress() {
                let best = progress.personal_best();
                let latest = progress.latest();
                println!(
                    "{}: {} sessions, best {} kg ({}), latest {} kg ({})",
                    progress.exercise,
                    progress.points.len(),
                    best.map(|p| p.weight).unwrap_or_default(),
                    best.map(|p| p.date.as_str()).unwrap_or("-"),
                    latest.map(|p| p.weight).unwrap_or_default(),
                    latest.map(|p| p.date.as_str()).unwrap_or("-"),
                );
            }
        }
        Command::Charts { out_dir } => {
            let mut dashboard = Dashboard::new(api, Some(logged_in(&store)?));
            dashboard.refresh().await?;

            std::fs::create_dir_all(&out_dir)?;
            for (index, progress) in dashboard.progress().iter().enumerate() {
                let path = out_dir.join(chart_file_name(index, &progress.exercise));
                save_progress_chart(progress, &ChartOptions::for_exercise(progress), &path)?;
                println!("Created {} chart at {}", progress.exercise, path.display());
            }
        }
        Command::Export { format, output } => {
            let token = logged_in(&store)?;
            let bytes = api
                .download_export(&token, &format!("export.{}", format))
                .await?;
            std::fs::write(&output, bytes)?;
            println!("History exported to {}", output.display());
        }
    }

    Ok(())
}

fn logged_in(store: &TokenStore) -> Result<String, Box<dyn std::error::Error>> {
    require_token(store)
        .map_err(|_| "Not logged in. Run `gym-cli login <username> <password>` first.".into())
}
