use crate::error::{Result, TrackerError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Message shown when any form field is left blank
pub const ALL_FIELDS_REQUIRED: &str = "All fields are required.";

/// Longest exercise name accepted by the form
pub const MAX_EXERCISE_LEN: usize = 100;

/// Date format used by the form, the API and every export
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw state of the workout logging form
///
/// Every field is kept as text, exactly as typed, until the form is submitted
/// and validated. When received over the API, numbers are accepted for
/// `sets`, `reps` and `weight` as well as strings, and missing fields are
/// treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutForm {
    /// Exercise name, e.g. "Deadlift"
    #[serde(default, deserialize_with = "text_or_number")]
    pub exercise: String,

    /// Number of sets
    #[serde(default, deserialize_with = "text_or_number")]
    pub sets: String,

    /// Repetitions per set
    #[serde(default, deserialize_with = "text_or_number")]
    pub reps: String,

    /// Weight lifted in kilograms
    #[serde(default, deserialize_with = "text_or_number")]
    pub weight: String,

    /// Date of the session, `YYYY-MM-DD`
    #[serde(default, deserialize_with = "text_or_number")]
    pub date: String,
}

/// A validated workout, ready to be recorded
///
/// Produced only by [`WorkoutForm::validate`]; the numbers are already
/// checked and the exercise name is trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkout {
    /// Trimmed exercise name, at most [`MAX_EXERCISE_LEN`] characters
    pub exercise: String,

    /// Number of sets, at least one
    pub sets: u32,

    /// Repetitions per set, at least one
    pub reps: u32,

    /// Weight lifted in kilograms, finite and non-negative
    pub weight: f64,

    /// Day the workout took place
    pub date: NaiveDate,
}

/// A workout entry stored in a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier assigned when the workout is recorded
    pub id: Uuid,

    /// Owner of the entry
    pub username: String,

    /// Exercise name as entered, trimmed
    pub exercise: String,

    pub sets: u32,
    pub reps: u32,

    /// Weight lifted in kilograms
    pub weight: f64,

    /// Day the workout took place
    pub date: NaiveDate,

    /// When the entry was recorded by the server
    pub logged_at: DateTime<Utc>,
}

fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string or a number, found {}",
            other
        ))),
    }
}

impl WorkoutForm {
    /// Build a form from already-known values (used by the CLI)
    ///
    /// # Arguments
    ///
    /// * `exercise` - Exercise name
    /// * `sets` - Number of sets, as text
    /// * `reps` - Repetitions per set, as text
    /// * `weight` - Weight in kilograms, as text
    /// * `date` - Session date as `YYYY-MM-DD`
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_tracker::workout::WorkoutForm;
    ///
    /// let form = WorkoutForm::new("Squat", "3", "5", "100", "2024-01-01");
    /// assert!(form.is_complete());
    /// ```
    pub fn new(exercise: &str, sets: &str, reps: &str, weight: &str, date: &str) -> Self {
        WorkoutForm {
            exercise: exercise.to_string(),
            sets: sets.to_string(),
            reps: reps.to_string(),
            weight: weight.to_string(),
            date: date.to_string(),
        }
    }

    /// True when no field is blank
    pub fn is_complete(&self) -> bool {
        [
            &self.exercise,
            &self.sets,
            &self.reps,
            &self.weight,
            &self.date,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    /// Reset every field to empty, as after a successful submission
    pub fn clear(&mut self) {
        *self = WorkoutForm::default();
    }

    /// Validate the form and convert it into a [`NewWorkout`]
    ///
    /// # Returns
    ///
    /// * `Result<NewWorkout>` - The typed workout; surrounding whitespace in
    ///   every field is ignored
    ///
    /// # Errors
    /// * `TrackerError::Validation` with [`ALL_FIELDS_REQUIRED`] if any field is blank
    /// * `TrackerError::Validation` if a number or the date cannot be parsed
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_tracker::workout::{ALL_FIELDS_REQUIRED, WorkoutForm};
    ///
    /// let workout = WorkoutForm::new(" Squat ", "3", "5", "102.5", "2024-01-01")
    ///     .validate()
    ///     .unwrap();
    /// assert_eq!(workout.exercise, "Squat");
    /// assert_eq!(workout.weight, 102.5);
    ///
    /// let err = WorkoutForm::default().validate().unwrap_err();
    /// assert_eq!(err.to_string(), ALL_FIELDS_REQUIRED);
    /// ```
    pub fn validate(&self) -> Result<NewWorkout> {
        if !self.is_complete() {
            return Err(TrackerError::Validation(ALL_FIELDS_REQUIRED.to_string()));
        }

        let exercise = self.exercise.trim();
        if exercise.chars().count() > MAX_EXERCISE_LEN {
            return Err(TrackerError::Validation(format!(
                "Exercise name must be at most {} characters.",
                MAX_EXERCISE_LEN
            )));
        }

        let sets = parse_count(&self.sets, "Sets")?;
        let reps = parse_count(&self.reps, "Reps")?;

        let weight = match self.weight.trim().parse::<f64>() {
            Ok(w) if w.is_finite() && w >= 0.0 => w,
            _ => {
                return Err(TrackerError::Validation(
                    "Weight must be a non-negative number.".to_string(),
                ));
            }
        };

        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            TrackerError::Validation("Date must be in YYYY-MM-DD format.".to_string())
        })?;

        Ok(NewWorkout {
            exercise: exercise.to_string(),
            sets,
            reps,
            weight,
            date,
        })
    }
}

fn parse_count(value: &str, field: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(TrackerError::Validation(format!(
            "{} must be a positive whole number.",
            field
        ))),
    }
}

impl Workout {
    /// Record a validated workout for `username`, assigning an id and timestamp
    ///
    /// # Arguments
    ///
    /// * `username` - Owner of the new entry
    /// * `new` - Output of [`WorkoutForm::validate`]
    ///
    /// # Returns
    ///
    /// * `Workout` - The entry with a fresh v4 id and `logged_at` set to now
    pub fn record(username: &str, new: NewWorkout) -> Self {
        Workout {
            id: Uuid::new_v4(),
            username: username.to_string(),
            exercise: new.exercise,
            sets: new.sets,
            reps: new.reps,
            weight: new.weight,
            date: new.date,
            logged_at: Utc::now(),
        }
    }

    /// Date formatted the way it was entered
    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}
