use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

use crate::error::{Result, TrackerError};
use crate::workout::Workout;

/// File name of a user's workout log inside their directory
pub const WORKOUT_LOG_FILE: &str = "workouts.bin.gz";

/// Saves workouts to a gzip-compressed bincode file
///
/// The log is written to a temporary file next to `path` and then renamed
/// over it, so readers see either the old log or the new one, never a
/// partial stream.
///
/// # Arguments
///
/// * `workouts` - The workouts to store, in logging order
/// * `path` - Destination file; its parent directory must exist
///
/// # Returns
///
/// * `Result<()>` - Success or the I/O / serialization error
pub fn save_workouts(workouts: &[Workout], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir)?;
    let encoder = GzEncoder::new(temp, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, workouts)?;

    let encoder = writer
        .into_inner()
        .map_err(|e| TrackerError::Storage(e.into_error()))?;
    let mut temp = encoder.finish()?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| TrackerError::Storage(e.error))?;

    Ok(())
}

/// Loads workouts from a file written by [`save_workouts`]
pub fn load_workouts(path: impl AsRef<Path>) -> Result<Vec<Workout>> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let workouts: Vec<Workout> = deserialize_from(&mut reader)?;

    Ok(workouts)
}

/// Per-user workout logs under a data directory
///
/// Each user's history lives in `<root>/<username>/workouts.bin.gz`.
/// Appends rewrite the whole log under the write half of a lock; reads take
/// the read half.
pub struct WorkoutStore {
    root: PathBuf,
    lock: RwLock<()>,
}

fn poisoned<T>(_: T) -> TrackerError {
    TrackerError::Internal("workout store lock poisoned".to_string())
}

impl WorkoutStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkoutStore {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    fn log_path(&self, username: &str) -> PathBuf {
        self.root.join(username).join(WORKOUT_LOG_FILE)
    }

    fn read_log(&self, username: &str) -> Result<Vec<Workout>> {
        let path = self.log_path(username);
        if !path.exists() {
            return Ok(Vec::new());
        }
        load_workouts(&path)
    }

    /// A user's history in logging order; empty if nothing was logged yet
    pub fn list(&self, username: &str) -> Result<Vec<Workout>> {
        let _guard = self.lock.read().map_err(poisoned)?;
        self.read_log(username)
    }

    /// Append one workout to a user's log
    pub fn append(&self, username: &str, workout: Workout) -> Result<()> {
        let _guard = self.lock.write().map_err(poisoned)?;

        let mut workouts = self.read_log(username)?;
        workouts.push(workout);

        let path = self.log_path(username);
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        save_workouts(&workouts, &path)?;

        log::debug!(
            "saved {} workouts for {} to {}",
            workouts.len(),
            username,
            path.display()
        );
        Ok(())
    }
}
