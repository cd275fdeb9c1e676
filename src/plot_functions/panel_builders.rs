// src/plot_functions/panel_builders.rs

use chrono::NaiveDate;
use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

use crate::constants::{COL_X, COL_Y, COL_Z, LINE_CYCLE};
use crate::data_input::time_frame::TimeFrame;
use crate::error::{PlotError, Result};
use crate::output::{OutputFormat, OutputTarget};
use crate::plot_framework::{calculate_range, Figure, Panel, PlotSeries};
use crate::time_axis::day_title;

/// Acceleration columns of a single-device frame, in plotting order.
pub const ACCELERATION_COLUMNS: [&str; 3] = [COL_Y, COL_X, COL_Z];
pub const ACCELERATION_LABELS: [&str; 3] = ["Y", "X", "Z"];

/// Adds one line per column, labelled with `labels` and colored from `colors` in order.
/// Missing values are dropped.
pub fn add_lines(
    panel: &mut Panel,
    frame: &TimeFrame,
    columns: &[&str],
    labels: &[&str],
    colors: &[RGBColor],
) -> Result<()> {
    for (i, column) in columns.iter().enumerate() {
        let label = labels.get(i).copied().unwrap_or(*column);
        let color = colors.get(i).copied().unwrap_or(LINE_CYCLE[i % LINE_CYCLE.len()]);
        panel.plot(PlotSeries::new(label, frame.series(column)?, color));
    }
    Ok(())
}

/// Y, X and Z lines in the default line cycle.
pub fn add_acceleration_lines(panel: &mut Panel, frame: &TimeFrame, columns: &[&str; 3]) -> Result<()> {
    add_lines(panel, frame, columns, &ACCELERATION_LABELS, &LINE_CYCLE)
}

/// Frame split into calendar days; an empty frame is an error.
pub fn day_groups(frame: &TimeFrame) -> Result<Vec<(NaiveDate, TimeFrame)>> {
    let days = frame.split_by_day();
    if days.is_empty() {
        return Err(PlotError::EmptySeries("activity data".to_string()));
    }
    Ok(days)
}

pub fn require_rows(frame: &TimeFrame, name: &str) -> Result<()> {
    if frame.is_empty() {
        Err(PlotError::EmptySeries(name.to_string()))
    } else {
        Ok(())
    }
}

/// "<PREFIX> 2016-03-01 Tuesday" from the first timestamp of `frame`.
pub fn dated_title(prefix: &str, frame: &TimeFrame) -> String {
    match frame.first_timestamp() {
        Some(first) if prefix.is_empty() => day_title(first),
        Some(first) => format!("{prefix} {}", day_title(first)),
        None => prefix.to_string(),
    }
}

/// Gives the listed panels one common y range covering all of their data.
pub fn share_y_range(figure: &mut Figure, indices: &[usize]) -> Result<()> {
    let mut shared: Option<(f64, f64)> = None;
    for &index in indices {
        if let Some(extent) = figure.panel(index)?.data_y_extent() {
            shared = Some(match shared {
                None => (extent.start, extent.end),
                Some((lo, hi)) => (lo.min(extent.start), hi.max(extent.end)),
            });
        }
    }
    if let Some((lo, hi)) = shared {
        let (lo, hi) = calculate_range(lo, hi);
        for &index in indices {
            figure.panel_mut(index)?.set_ylim(lo, hi);
        }
    }
    Ok(())
}

/// Saves `figure` as `<plot_folder>/<file_stem>.<ext>`.
pub fn save_figure(
    figure: &Figure,
    plot_folder: &Path,
    file_stem: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    figure.save(&OutputTarget::new(plot_folder, file_stem, format))
}

/// Python-style `str.title()`: first letter of each word upper case, the rest lower.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PanelGrid;
    use chrono::NaiveDate;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hecht-3 accuracy"), "Hecht-3 Accuracy");
        assert_eq!(title_case("CHOI f1"), "Choi F1");
    }

    #[test]
    fn test_share_y_range() {
        let mut figure = Figure::new(PanelGrid::column(2), (100, 100));
        figure
            .panel_mut(0)
            .unwrap()
            .plot(PlotSeries::new("a", vec![(0.0, 0.0), (1.0, 10.0)], LINE_CYCLE[0]));
        figure
            .panel_mut(1)
            .unwrap()
            .plot(PlotSeries::new("b", vec![(0.0, -10.0), (1.0, 0.0)], LINE_CYCLE[0]));
        share_y_range(&mut figure, &[0, 1]).unwrap();
        assert_eq!(figure.panel(0).unwrap().y_range, Some(-13.0..13.0));
        assert_eq!(figure.panel(0).unwrap().y_range, figure.panel(1).unwrap().y_range);
    }

    #[test]
    fn test_dated_title() {
        let t = NaiveDate::from_ymd_opt(2016, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let frame = TimeFrame::new(vec![t]).unwrap();
        assert_eq!(dated_title("VMU", &frame), "VMU 2016-03-01 Tuesday");
        assert_eq!(dated_title("", &frame), "2016-03-01 Tuesday");
        assert_eq!(dated_title("VMU", &TimeFrame::default()), "VMU");
    }
}
