use crate::workout::Workout;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label of the single dataset drawn in every progress chart
pub const WEIGHT_DATASET_LABEL: &str = "Weight Lifted (kg)";

/// Line colour of the progress charts
pub const CHART_BORDER_COLOR: &str = "rgb(75, 192, 192)";

/// Bezier tension of the progress line
pub const CHART_TENSION: f64 = 0.1;

/// One point of an exercise's progress line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Kilograms
    pub weight: f64,
}

/// All logged points for one exercise, in history order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    /// Exercise name shared by every point
    pub exercise: String,
    pub points: Vec<ProgressPoint>,
}

impl ExerciseProgress {
    /// Heaviest weight logged for this exercise
    pub fn personal_best(&self) -> Option<&ProgressPoint> {
        self.points
            .iter()
            .fold(None, |best: Option<&ProgressPoint>, p| match best {
                Some(b) if b.weight >= p.weight => Some(b),
                _ => Some(p),
            })
    }

    /// Most recently logged point
    pub fn latest(&self) -> Option<&ProgressPoint> {
        self.points.last()
    }
}

/// Group a workout history by exercise name
///
/// Groups are returned in the order their exercise first appears in the
/// history, and each group's points keep the history order. Exercise names
/// are compared exactly.
///
/// # Arguments
///
/// * `workouts` - A user's history in logging order
///
/// # Returns
///
/// * `Vec<ExerciseProgress>` - One group per distinct exercise name
///
/// # Examples
/// ```
/// use gym_tracker::progress::group_by_exercise;
/// use gym_tracker::workout::{Workout, WorkoutForm};
///
/// let history: Vec<Workout> = [("Squat", "100"), ("Bench", "60"), ("Squat", "105")]
///     .iter()
///     .map(|(exercise, weight)| {
///         let form = WorkoutForm::new(exercise, "3", "5", weight, "2024-01-01");
///         Workout::record("alice", form.validate().unwrap())
///     })
///     .collect();
///
/// let grouped = group_by_exercise(&history);
/// assert_eq!(grouped.len(), 2);
/// assert_eq!(grouped[0].exercise, "Squat");
/// assert_eq!(grouped[0].points.len(), 2);
/// assert!(group_by_exercise(&[]).is_empty());
/// ```
pub fn group_by_exercise(workouts: &[Workout]) -> Vec<ExerciseProgress> {
    let mut groups: Vec<ExerciseProgress> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for workout in workouts {
        let slot = *index.entry(workout.exercise.as_str()).or_insert_with(|| {
            groups.push(ExerciseProgress {
                exercise: workout.exercise.clone(),
                points: Vec::new(),
            });
            groups.len() - 1
        });

        groups[slot].points.push(ProgressPoint {
            date: workout.date_label(),
            weight: workout.weight,
        });
    }

    groups
}

/// A single line dataset in Chart.js layout
///
/// Serialized with camelCase keys (`borderColor`) so a browser chart library
/// can take it as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Legend text, [`WEIGHT_DATASET_LABEL`] for progress charts
    pub label: String,

    /// One value per chart label
    pub data: Vec<f64>,

    /// Whether the area under the line is filled
    pub fill: bool,

    /// CSS colour of the line
    pub border_color: String,

    /// Curve smoothing, 0 draws straight segments
    pub tension: f64,
}

/// Line chart description in Chart.js layout: one label per point plus datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// X-axis labels, the workout dates
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// Weight-over-time chart for one exercise
    ///
    /// # Arguments
    ///
    /// * `progress` - The exercise's points in history order
    ///
    /// # Returns
    ///
    /// * `ChartData` - Dates as labels and a single unfilled weight dataset
    pub fn for_exercise(progress: &ExerciseProgress) -> Self {
        ChartData {
            labels: progress.points.iter().map(|p| p.date.clone()).collect(),
            datasets: vec![Dataset {
                label: WEIGHT_DATASET_LABEL.to_string(),
                data: progress.points.iter().map(|p| p.weight).collect(),
                fill: false,
                border_color: CHART_BORDER_COLOR.to_string(),
                tension: CHART_TENSION,
            }],
        }
    }
}

/// Chart for a named exercise, as served by the progress endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseChart {
    /// Exercise the chart belongs to
    pub exercise: String,

    /// Chart.js data for that exercise
    pub chart: ChartData,
}

/// One chart per exercise in the history
///
/// Charts come in the same order as [`group_by_exercise`] returns groups.
pub fn progress_charts(workouts: &[Workout]) -> Vec<ExerciseChart> {
    group_by_exercise(workouts)
        .iter()
        .map(|progress| ExerciseChart {
            exercise: progress.exercise.clone(),
            chart: ChartData::for_exercise(progress),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::WorkoutForm;

    fn logged(exercise: &str, weight: &str, date: &str) -> Workout {
        let form = WorkoutForm::new(exercise, "3", "5", weight, date);
        Workout::record("alice", form.validate().unwrap())
    }

    fn history() -> Vec<Workout> {
        vec![
            logged("Squat", "100", "2024-01-01"),
            logged("Bench", "60", "2024-01-02"),
            logged("Squat", "105", "2024-01-08"),
            logged("Bench", "62.5", "2024-01-09"),
            logged("Squat", "110", "2024-01-05"),
        ]
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let grouped = group_by_exercise(&history());
        let names: Vec<&str> = grouped.iter().map(|g| g.exercise.as_str()).collect();
        assert_eq!(names, vec!["Squat", "Bench"]);
    }

    #[test]
    fn points_keep_history_order() {
        let grouped = group_by_exercise(&history());
        let squat: Vec<(&str, f64)> = grouped[0]
            .points
            .iter()
            .map(|p| (p.date.as_str(), p.weight))
            .collect();
        assert_eq!(
            squat,
            vec![("2024-01-01", 100.0), ("2024-01-08", 105.0), ("2024-01-05", 110.0)]
        );
    }

    #[test]
    fn names_are_compared_exactly() {
        let grouped = group_by_exercise(&[
            logged("squat", "80", "2024-01-01"),
            logged("Squat", "90", "2024-01-02"),
        ]);
        assert_eq!(grouped.len(), 2);
    }

    #[test]
    fn chart_data_uses_line_style() {
        let grouped = group_by_exercise(&history());
        let chart = ChartData::for_exercise(&grouped[1]);
        assert_eq!(chart.labels, vec!["2024-01-02", "2024-01-09"]);
        assert_eq!(chart.datasets.len(), 1);

        let dataset = &chart.datasets[0];
        assert_eq!(dataset.label, WEIGHT_DATASET_LABEL);
        assert_eq!(dataset.data, vec![60.0, 62.5]);
        assert!(!dataset.fill);
        assert_eq!(dataset.border_color, CHART_BORDER_COLOR);
    }

    #[test]
    fn chart_json_is_chartjs_shaped() {
        let charts = progress_charts(&history());
        let json = serde_json::to_value(&charts[0]).unwrap();
        assert_eq!(json["exercise"], "Squat");
        assert_eq!(json["chart"]["datasets"][0]["borderColor"], CHART_BORDER_COLOR);
        assert_eq!(json["chart"]["datasets"][0]["tension"], 0.1);
    }

    #[test]
    fn best_and_latest() {
        let grouped = group_by_exercise(&history());
        assert_eq!(grouped[0].personal_best().unwrap().weight, 110.0);
        assert_eq!(grouped[0].latest().unwrap().date, "2024-01-05");
        assert_eq!(grouped[1].personal_best().unwrap().weight, 62.5);
    }
}
