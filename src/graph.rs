#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use crate::error::{Result, TrackerError};
use crate::progress::{ExerciseProgress, WEIGHT_DATASET_LABEL};
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};
use plotters::prelude::*;
use std::path::Path;

/// Line colour of the progress chart, rgb(75, 192, 192)
const PROGRESS_COLOR: RGBColor = RGBColor(75, 192, 192);

/// Configuration options for chart rendering
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    /// 800x600 chart with the weight dataset label on the Y-axis
    fn default() -> Self {
        Self {
            title: "Progress".to_string(),
            x_label: "Date".to_string(),
            y_label: WEIGHT_DATASET_LABEL.to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl ChartOptions {
    /// Default options titled with the exercise name
    pub fn for_exercise(progress: &ExerciseProgress) -> Self {
        Self {
            title: progress.exercise.clone(),
            ..Self::default()
        }
    }
}

fn chart_error<E: std::fmt::Display>(e: E) -> TrackerError {
    TrackerError::Internal(format!("chart rendering failed: {}", e))
}

/// Renders an exercise's weight-over-time line chart as PNG bytes
///
/// Points are placed on the X-axis in history order and labelled with their
/// dates; each point is marked with a small circle.
///
/// # Errors
/// * `Validation` if the exercise has no points
/// * `Internal` if drawing or PNG encoding fails
pub fn render_progress_chart(
    progress: &ExerciseProgress,
    options: &ChartOptions,
) -> Result<Vec<u8>> {
    if progress.points.is_empty() {
        return Err(TrackerError::Validation(format!(
            "No workouts logged for {}",
            progress.exercise
        )));
    }

    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    if let Err(e) = draw_into(&mut pixels, progress, options, true) {
        // Hosts without a usable font still get the line and its points
        log::warn!("{}; drawing {} chart without labels", e, progress.exercise);
        pixels.fill(0);
        draw_into(&mut pixels, progress, options, false)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, ColorType::Rgb8)
        .map_err(chart_error)?;

    Ok(png)
}

/// Renders the chart and writes the PNG to `path`
pub fn save_progress_chart(
    progress: &ExerciseProgress,
    options: &ChartOptions,
    path: impl AsRef<Path>,
) -> Result<()> {
    let png = render_progress_chart(progress, options)?;
    std::fs::write(path, png)?;
    Ok(())
}

/// File name for the `index`-th exercise chart written to a directory
///
/// The exercise name is reduced to lowercase ASCII letters and digits; the
/// one-based index keeps names that reduce to the same text apart.
///
/// # Examples
///
/// ```
/// use gym_tracker::graph::chart_file_name;
///
/// assert_eq!(chart_file_name(0, "Bench Press"), "01_bench_press.png");
/// assert_eq!(chart_file_name(1, "bench-press"), "02_bench_press.png");
/// ```
pub fn chart_file_name(index: usize, exercise: &str) -> String {
    let name: String = exercise
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{:02}_{}.png", index + 1, name)
}

fn draw_into(
    pixels: &mut [u8],
    progress: &ExerciseProgress,
    options: &ChartOptions,
    with_text: bool,
) -> Result<()> {
    let root =
        BitMapBackend::with_buffer(pixels, (options.width, options.height)).into_drawing_area();
    draw_progress(&root, progress, options, with_text)?;
    root.present().map_err(chart_error)
}

fn draw_progress<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    progress: &ExerciseProgress,
    options: &ChartOptions,
    with_text: bool,
) -> Result<()> {
    root.fill(&WHITE).map_err(chart_error)?;

    let labels: Vec<&str> = progress.points.iter().map(|p| p.date.as_str()).collect();
    let weights: Vec<f64> = progress.points.iter().map(|p| p.weight).collect();

    let max_y = weights.iter().cloned().fold(0.0_f64, f64::max);
    let y_range = 0.0..(max_y * 1.1).max(1.0);
    // One slot per point, padded by half a slot on both sides
    let x_range = -0.5..(labels.len() as f64 - 0.5);

    let mut builder = ChartBuilder::on(root);
    builder.margin(10);
    if with_text {
        builder
            .caption(&options.title, ("sans-serif", 30).into_font())
            .x_label_area_size(40)
            .y_label_area_size(50);
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_error)?;

    let label_for = |x: &f64| {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels
            .get(rounded as usize)
            .map(|s| s.to_string())
            .unwrap_or_default()
    };

    if with_text {
        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(labels.len().min(12))
            .x_label_formatter(&label_for)
            .draw()
            .map_err(chart_error)?;
    }

    let series: Vec<(f64, f64)> = weights
        .iter()
        .enumerate()
        .map(|(i, w)| (i as f64, *w))
        .collect();

    chart
        .draw_series(LineSeries::new(series.iter().copied(), &PROGRESS_COLOR))
        .map_err(chart_error)?;
    chart
        .draw_series(
            series
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, PROGRESS_COLOR.filled())),
        )
        .map_err(chart_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressPoint;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn squat() -> ExerciseProgress {
        ExerciseProgress {
            exercise: "Squat".to_string(),
            points: vec![
                ProgressPoint {
                    date: "2024-01-01".to_string(),
                    weight: 100.0,
                },
                ProgressPoint {
                    date: "2024-01-08".to_string(),
                    weight: 107.5,
                },
            ],
        }
    }

    #[test]
    fn renders_png_bytes() {
        let options = ChartOptions {
            width: 320,
            height: 240,
            ..ChartOptions::for_exercise(&squat())
        };
        let png = render_progress_chart(&squat(), &options).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn saves_chart_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("squat.png");
        save_progress_chart(&squat(), &ChartOptions::default(), &path).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn chart_file_names_do_not_collide() {
        let names: Vec<String> = ["Bench Press", "bench-press", "Squat"]
            .iter()
            .enumerate()
            .map(|(i, exercise)| chart_file_name(i, exercise))
            .collect();
        assert_eq!(
            names,
            ["01_bench_press.png", "02_bench_press.png", "03_squat.png"]
        );
    }

    #[test]
    fn empty_progress_is_rejected() {
        let progress = ExerciseProgress {
            exercise: "Squat".to_string(),
            points: Vec::new(),
        };
        assert!(matches!(
            render_progress_chart(&progress, &ChartOptions::default()),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn options_are_titled_by_exercise() {
        let progress = ExerciseProgress {
            exercise: "Deadlift".to_string(),
            points: Vec::new(),
        };
        let options = ChartOptions::for_exercise(&progress);
        assert_eq!(options.title, "Deadlift");
        assert_eq!(options.y_label, WEIGHT_DATASET_LABEL);
        assert_eq!((options.width, options.height), (800, 600));
    }
}
