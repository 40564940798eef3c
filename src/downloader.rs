use crate::workout::Workout;

/// Column headers of the workout history table
pub const HISTORY_HEADERS: [&str; 5] = ["Exercise", "Sets", "Reps", "Weight (kg)", "Date"];

/// Convert a workout history to CSV format
///
/// The first row holds the column headers, then one row per workout in
/// history order. Fields containing commas, quotes or newlines are quoted.
///
/// # Examples
/// ```
/// use gym_tracker::downloader::to_csv;
///
/// let csv = to_csv(&[]);
/// assert_eq!(csv, "Exercise,Sets,Reps,Weight (kg),Date\n");
/// ```
pub fn to_csv(workouts: &[Workout]) -> String {
    let mut csv_content = HISTORY_HEADERS.join(",");
    csv_content.push('\n');

    for workout in workouts {
        let row = [
            escape_field(&workout.exercise),
            workout.sets.to_string(),
            workout.reps.to_string(),
            workout.weight.to_string(),
            workout.date_label(),
        ];
        csv_content.push_str(&row.join(","));
        csv_content.push('\n');
    }

    csv_content
}

fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Convert a workout history to XLSX format
///
/// Same table as [`to_csv`], with numeric columns written as numbers.
#[cfg(feature = "web")]
pub fn to_xlsx(workouts: &[Workout]) -> crate::error::Result<Vec<u8>> {
    use crate::error::TrackerError;
    use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

    fn build(workouts: &[Workout]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let mut worksheet = Worksheet::new();
        worksheet.set_name("History")?;

        for (c, header) in HISTORY_HEADERS.iter().enumerate() {
            worksheet.write_string(0, c as u16, *header)?;
        }

        for (i, workout) in workouts.iter().enumerate() {
            let row = (i + 1) as u32;
            worksheet.write_string(row, 0, &workout.exercise)?;
            worksheet.write_number(row, 1, workout.sets)?;
            worksheet.write_number(row, 2, workout.reps)?;
            worksheet.write_number(row, 3, workout.weight)?;
            worksheet.write_string(row, 4, &workout.date_label())?;
        }

        workbook.push_worksheet(worksheet);
        workbook.save_to_buffer()
    }

    build(workouts).map_err(|e| TrackerError::Internal(format!("XLSX export failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::WorkoutForm;

    fn workout(exercise: &str, weight: &str) -> Workout {
        let form = WorkoutForm::new(exercise, "3", "10", weight, "2024-05-06");
        Workout::record("dave", form.validate().unwrap())
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = to_csv(&[workout("Curl", "12.5"), workout("Squat", "100")]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Exercise,Sets,Reps,Weight (kg),Date");
        assert_eq!(lines[1], "Curl,3,10,12.5,2024-05-06");
        assert_eq!(lines[2], "Squat,3,10,100,2024-05-06");
    }

    #[test]
    fn csv_quotes_special_characters() {
        let csv = to_csv(&[workout("Press, \"strict\"", "40")]);
        assert!(csv.contains("\"Press, \"\"strict\"\"\",3,10,40,2024-05-06"));
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_is_a_zip_archive() {
        let bytes = to_xlsx(&[workout("Curl", "12.5")]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
