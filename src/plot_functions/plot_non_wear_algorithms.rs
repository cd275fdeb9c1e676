// src/plot_functions/plot_non_wear_algorithms.rs

use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

use crate::constants::{
    ACCELERATION_RANGE, ACTIGRAPH_SAMPLING_HZ, ALGORITHM_TRACK_BASE_Y, CANDIDATE_EPISODE_TRACK_Y,
    COLOR_NON_WEAR_CHOI, COLOR_NON_WEAR_HECHT, COLOR_NON_WEAR_HEES, COLOR_NON_WEAR_TROIANO,
    COLOR_NON_WEAR_TRUE, COLOR_SCENARIO, COL_ACTIGRAPH_AXES, COL_ACTIWAVE_AXES,
    COL_CANDIDATE_EPISODE, COL_CHOI_NON_WEAR, COL_EPOCH_60_VMU, COL_HEART_RATE,
    COL_HECHT_NON_WEAR, COL_HEES_NON_WEAR, COL_INFERRED_NW_TIME, COL_TROIANO_NON_WEAR,
    COL_TRUE_NON_WEAR, COL_TRUE_NW_TIME, EPOCH_VMU_TRACK_Y, FONT_SIZE_ANNOTATION,
    HEART_RATE_RANGE, LINE_CYCLE, PLOT_HEIGHT, PLOT_WIDTH, SCENARIO_ACCELERATION_RANGE,
    SCENARIO_HEART_RATE_RANGE, STRIDE_CANDIDATE_EPISODE, STRIDE_INFERRED_NON_WEAR,
    STRIDE_RAW_NON_WEAR,
};
use crate::data_input::episodes::{episodes_from_mask, EpisodeLabel};
use crate::data_input::time_frame::TimeFrame;
use crate::error::Result;
use crate::layout::{allocate_panels, Arrangement, PanelGrid};
use crate::output::OutputFormat;
use crate::overlay::{
    draw_episode_markers, draw_mask_track, draw_mask_tracks, EpisodeTrack, MaskTrack,
    SentinelPolarity,
};
use crate::plot_framework::{
    stacked_figure_size, Figure, LegendPosition, Panel, PlotSeries, TextAnnotation,
};
use crate::plot_functions::panel_builders::{
    add_acceleration_lines, add_lines, dated_title, require_rows, save_figure,
    ACCELERATION_COLUMNS, ACCELERATION_LABELS,
};
use crate::time_axis::{format_time_panels, to_plot_x, TimeAxisFormat};

/// Flags of one algorithm's non-wear column: zero marks non-wear.
fn algorithm_track(column: &str, y_offset: f64, color: RGBColor) -> MaskTrack {
    MaskTrack::new(column, SentinelPolarity::ZeroIsFlagged, ACTIGRAPH_SAMPLING_HZ)
        .with_stride(1)
        .with_offset(y_offset)
        .with_color(color)
}

/// Ground truth followed by the four detection algorithms, bottom to top.
pub fn algorithm_tracks() -> Vec<MaskTrack> {
    vec![
        algorithm_track(COL_TRUE_NON_WEAR, ALGORITHM_TRACK_BASE_Y, COLOR_NON_WEAR_TRUE)
            .with_stride(STRIDE_RAW_NON_WEAR),
        algorithm_track(COL_HECHT_NON_WEAR, -4.6, COLOR_NON_WEAR_HECHT),
        algorithm_track(COL_TROIANO_NON_WEAR, -4.4, COLOR_NON_WEAR_TROIANO),
        algorithm_track(COL_CHOI_NON_WEAR, -4.2, COLOR_NON_WEAR_CHOI),
        algorithm_track(COL_HEES_NON_WEAR, -4.0, COLOR_NON_WEAR_HEES),
    ]
}

/// ActiGraph acceleration with every algorithm's non-wear track, ActiWave acceleration,
/// 60 s epoch VMU with the HECHT-3 track, and heart rate.
pub fn build_non_wear_algorithms(data: &TimeFrame, subject: &str) -> Result<Figure> {
    require_rows(data, "non-wear algorithm data")?;
    let tracks = algorithm_tracks();
    let mut columns: Vec<&str> = COL_ACTIGRAPH_AXES.to_vec();
    columns.extend(COL_ACTIWAVE_AXES);
    columns.extend([COL_EPOCH_60_VMU, COL_HEART_RATE]);
    columns.extend(tracks.iter().map(|t| t.column.as_str()));
    data.require_columns(&columns)?;

    let grid = PanelGrid::column(4);
    let mut figure = Figure::new(grid, stacked_figure_size(grid.rows)).with_title(subject);

    let actigraph = figure.panel_mut(0)?;
    actigraph.title = dated_title(&format!("ACTIGRAPH ACCELERATION ({subject}) -"), data);
    add_acceleration_lines(actigraph, data, &COL_ACTIGRAPH_AXES)?;
    actigraph.set_ylim(ACCELERATION_RANGE.0, ACCELERATION_RANGE.1);
    draw_mask_tracks(actigraph, data, &tracks)?;

    let actiwave = figure.panel_mut(1)?;
    actiwave.title = "ACTIWAVE ACCELERATION".to_string();
    add_acceleration_lines(actiwave, data, &COL_ACTIWAVE_AXES)?;
    actiwave.set_ylim(ACCELERATION_RANGE.0, ACCELERATION_RANGE.1);

    let epoch = figure.panel_mut(2)?;
    epoch.plot(PlotSeries::new(COL_EPOCH_60_VMU, data.series(COL_EPOCH_60_VMU)?, LINE_CYCLE[0]));
    draw_mask_track(
        epoch,
        data,
        &algorithm_track(COL_HECHT_NON_WEAR, EPOCH_VMU_TRACK_Y, COLOR_NON_WEAR_HECHT),
    )?;

    let heart_rate = figure.panel_mut(3)?;
    heart_rate.title = "ACTIWAVE HEART RATE".to_string();
    heart_rate.plot(PlotSeries::new(COL_HEART_RATE, data.series(COL_HEART_RATE)?, LINE_CYCLE[0]));
    heart_rate.set_ylim(HEART_RATE_RANGE.0, HEART_RATE_RANGE.1);

    let format = TimeAxisFormat::default().with_legend(Some(LegendPosition::UpperLeft));
    format_time_panels(figure.panels_mut(), &format);
    Ok(figure)
}

pub fn plot_non_wear_algorithms(
    data: &TimeFrame,
    subject: &str,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_non_wear_algorithms(data, subject)?;
    save_figure(&figure, plot_folder, &format!("{subject}_opt"), format)
}

/// Acceleration with the true and CNN-inferred non-wear time; one marks non-wear.
pub fn build_cnn_inferred_nw_time(data: &TimeFrame, subject: &str) -> Result<Figure> {
    require_rows(data, "inferred non-wear data")?;
    let mut columns = ACCELERATION_COLUMNS.to_vec();
    columns.extend([COL_TRUE_NW_TIME, COL_INFERRED_NW_TIME]);
    data.require_columns(&columns)?;

    let mut figure = Figure::new(PanelGrid::column(1), stacked_figure_size(1)).with_title(subject);
    let panel = figure.panel_mut(0)?;
    add_acceleration_lines(panel, data, &ACCELERATION_COLUMNS)?;
    panel.set_ylim(ACCELERATION_RANGE.0, ACCELERATION_RANGE.1);
    let tracks = [
        MaskTrack::new(COL_TRUE_NW_TIME, SentinelPolarity::OneIsFlagged, ACTIGRAPH_SAMPLING_HZ)
            .with_stride(STRIDE_INFERRED_NON_WEAR)
            .with_offset(ALGORITHM_TRACK_BASE_Y)
            .with_color(COLOR_NON_WEAR_TRUE),
        MaskTrack::new(COL_INFERRED_NW_TIME, SentinelPolarity::OneIsFlagged, ACTIGRAPH_SAMPLING_HZ)
            .with_stride(STRIDE_INFERRED_NON_WEAR)
            .with_offset(-4.5)
            .with_color(COLOR_NON_WEAR_TROIANO),
    ];
    draw_mask_tracks(panel, data, &tracks)?;

    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    Ok(figure)
}

pub fn plot_cnn_inferred_nw_time(
    subject: &str,
    data: &TimeFrame,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_cnn_inferred_nw_time(data, subject)?;
    save_figure(&figure, plot_folder, subject, format)
}

/// Rows of the scenario grid, top to bottom.
const SCENARIO_ROWS: usize = 3;
const SCENARIO_TITLES: [&str; 3] = ["(a)", "(b)", "(c)"];

/// Text centered near the top of a panel with a fixed y range.
fn inner_title(panel: &mut Panel, text: &str, y_range: (f64, f64)) {
    if let Some(x) = panel.x_extent() {
        let y = y_range.0 + 0.9 * (y_range.1 - y_range.0);
        panel.annotate(
            TextAnnotation::new(text, ((x.start + x.end) / 2.0, y))
                .with_font_size(FONT_SIZE_ANNOTATION)
                .centered(),
        );
    }
}

fn scenario_columns() -> Vec<&'static str> {
    let mut columns: Vec<&str> = COL_ACTIGRAPH_AXES.to_vec();
    columns.extend(COL_ACTIWAVE_AXES);
    columns.extend([COL_HEART_RATE, COL_CANDIDATE_EPISODE]);
    columns
}

/// One column per non-wear scenario: ActiGraph acceleration with its candidate
/// episodes, ActiWave acceleration, and heart rate.
pub fn build_nw_scenarios(scenarios: &[TimeFrame]) -> Result<Figure> {
    let grid = PanelGrid::new(SCENARIO_ROWS, SCENARIO_TITLES.len());
    let allocation = allocate_panels(
        scenarios.len(),
        grid,
        Arrangement::Columnar {
            panels_per_group: SCENARIO_ROWS,
        },
    )?;
    let mut figure = Figure::new(grid, (PLOT_WIDTH, PLOT_HEIGHT));
    let colors = &COLOR_SCENARIO[..3];
    let columns = scenario_columns();
    let candidate_track = EpisodeTrack::at(CANDIDATE_EPISODE_TRACK_Y).with_stride(STRIDE_CANDIDATE_EPISODE);

    for (group, data) in scenarios.iter().enumerate() {
        require_rows(data, "scenario data")?;
        data.require_columns(&columns)?;
        let slots = &allocation.groups[group];

        let actigraph = figure.panel_mut(slots[0])?;
        actigraph.title = SCENARIO_TITLES[group].to_string();
        add_lines(actigraph, data, &COL_ACTIGRAPH_AXES, &ACCELERATION_LABELS, colors)?;
        actigraph.set_ylim(SCENARIO_ACCELERATION_RANGE.0, SCENARIO_ACCELERATION_RANGE.1);
        inner_title(actigraph, "ActiGraph accelerometer", SCENARIO_ACCELERATION_RANGE);
        let candidates = episodes_from_mask(
            data,
            COL_CANDIDATE_EPISODE,
            SentinelPolarity::ZeroIsFlagged,
            EpisodeLabel::NonWear,
        )?;
        draw_episode_markers(actigraph, data, &candidates, &candidate_track)?;
        if let (Some(first), Some(last)) = (candidates.first(), candidates.last()) {
            let (lo, hi) = SCENARIO_ACCELERATION_RANGE;
            let x = (to_plot_x(first.start) + to_plot_x(last.stop)) / 2.0;
            actigraph.annotate(
                TextAnnotation::new("candidate non-wear episode", (x, lo + 0.15 * (hi - lo)))
                    .with_font_size(FONT_SIZE_ANNOTATION)
                    .centered(),
            );
        }

        let actiwave = figure.panel_mut(slots[1])?;
        add_lines(actiwave, data, &COL_ACTIWAVE_AXES, &ACCELERATION_LABELS, colors)?;
        actiwave.set_ylim(SCENARIO_ACCELERATION_RANGE.0, SCENARIO_ACCELERATION_RANGE.1);
        inner_title(actiwave, "ActiWave Cardio accelerometer", SCENARIO_ACCELERATION_RANGE);

        let heart_rate = figure.panel_mut(slots[2])?;
        heart_rate.plot(PlotSeries::new(
            COL_HEART_RATE,
            data.series(COL_HEART_RATE)?,
            COLOR_SCENARIO[3],
        ));
        heart_rate.set_ylim(SCENARIO_HEART_RATE_RANGE.0, SCENARIO_HEART_RATE_RANGE.1);
        inner_title(heart_rate, "ActiWave Cardio Heart Rate", SCENARIO_HEART_RATE_RANGE);
    }
    figure.hide_panels(&allocation.unused)?;

    let format = TimeAxisFormat::default()
        .with_label_format("%H:00")
        .with_legend(Some(LegendPosition::LowerLeft));
    format_time_panels(figure.panels_mut(), &format);

    let columns_in_grid = grid.columns;
    for (index, panel) in figure.panels_mut().iter_mut().enumerate() {
        let (row, column) = (index / columns_in_grid, index % columns_in_grid);
        let bottom = row + 1 == SCENARIO_ROWS;
        panel.show_x_axis = bottom;
        panel.show_y_axis = column == 0;
        if bottom {
            panel.legend = None;
        }
        if column == 0 {
            let label = if bottom { "beats per minute" } else { "acceleration (g)" };
            panel.y_label = label.to_string();
        }
    }
    Ok(figure)
}

pub fn plot_nw_scenarios(
    scenarios: &[TimeFrame],
    plot_folder: &Path,
    plot_name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_nw_scenarios(scenarios)?;
    save_figure(&figure, plot_folder, plot_name, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COL_X, COL_Y, COL_Z};
    use crate::error::PlotError;
    use crate::overlay::episode_start_label;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(second: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            + Duration::seconds(second)
    }

    fn frame_with(n: usize, columns: &[(&str, Vec<f64>)]) -> TimeFrame {
        let mut frame = TimeFrame::new((0..n as i64).map(ts).collect()).unwrap();
        for (name, values) in columns {
            frame.insert_column(*name, values.clone()).unwrap();
        }
        frame
    }

    fn algorithm_frame(n: usize) -> TimeFrame {
        let mut columns: Vec<(&str, Vec<f64>)> = COL_ACTIGRAPH_AXES
            .iter()
            .chain(COL_ACTIWAVE_AXES.iter())
            .map(|c| (*c, vec![0.5; n]))
            .collect();
        columns.push((COL_EPOCH_60_VMU, vec![200.0; n]));
        columns.push((COL_HEART_RATE, vec![80.0; n]));
        // First half flagged by every algorithm.
        let mask: Vec<f64> = (0..n).map(|i| if i < n / 2 { 0.0 } else { 1.0 }).collect();
        for column in [
            COL_TRUE_NON_WEAR,
            COL_HECHT_NON_WEAR,
            COL_TROIANO_NON_WEAR,
            COL_CHOI_NON_WEAR,
            COL_HEES_NON_WEAR,
        ] {
            columns.push((column, mask.clone()));
        }
        frame_with(n, &columns)
    }

    #[test]
    fn test_algorithm_tracks_are_distinct() {
        let tracks = algorithm_tracks();
        let offsets: Vec<f64> = tracks.iter().map(|t| t.y_offset).collect();
        assert_eq!(offsets, vec![-4.9, -4.6, -4.4, -4.2, -4.0]);
        assert_eq!(tracks[0].stride, STRIDE_RAW_NON_WEAR);
        assert!(tracks[1..].iter().all(|t| t.stride == 1));
    }

    #[test]
    fn test_non_wear_algorithms_layout() {
        let figure = build_non_wear_algorithms(&algorithm_frame(100), "S9").unwrap();
        let actigraph = &figure.panels()[0];
        assert_eq!(actigraph.title, "ACTIGRAPH ACCELERATION (S9) - 2016-03-01 Tuesday");
        let patches: Vec<_> = actigraph.legend_patches.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            patches,
            [
                COL_TRUE_NON_WEAR,
                COL_HECHT_NON_WEAR,
                COL_TROIANO_NON_WEAR,
                COL_CHOI_NON_WEAR,
                COL_HEES_NON_WEAR
            ]
        );
        assert_eq!(actigraph.find_scatter(COL_TRUE_NON_WEAR).unwrap().points.len(), 1);
        assert_eq!(actigraph.find_scatter(COL_HECHT_NON_WEAR).unwrap().points.len(), 50);
        assert_eq!(actigraph.legend, Some(LegendPosition::UpperLeft));

        let epoch = &figure.panels()[2];
        let hecht = epoch.find_scatter(COL_HECHT_NON_WEAR).unwrap();
        assert!(hecht.points.iter().all(|p| p.1 == EPOCH_VMU_TRACK_Y));
    }

    #[test]
    fn test_cnn_inferred_uses_one_as_flag() {
        let n = 4001;
        let truth: Vec<f64> = vec![1.0; n];
        let inferred: Vec<f64> = (0..n).map(|i| if i < 10 { 1.0 } else { 0.0 }).collect();
        let frame = frame_with(
            n,
            &[
                (COL_Y, vec![0.0; n]),
                (COL_X, vec![0.0; n]),
                (COL_Z, vec![1.0; n]),
                (COL_TRUE_NW_TIME, truth),
                (COL_INFERRED_NW_TIME, inferred),
            ],
        );
        let figure = build_cnn_inferred_nw_time(&frame, "S1").unwrap();
        let panel = &figure.panels()[0];
        assert_eq!(panel.find_scatter(COL_TRUE_NW_TIME).unwrap().points.len(), 3);
        assert_eq!(panel.find_scatter(COL_INFERRED_NW_TIME).unwrap().points.len(), 1);
    }

    fn scenario(n: usize, candidate: std::ops::Range<usize>) -> TimeFrame {
        let mut columns: Vec<(&str, Vec<f64>)> = COL_ACTIGRAPH_AXES
            .iter()
            .chain(COL_ACTIWAVE_AXES.iter())
            .map(|c| (*c, vec![0.1; n]))
            .collect();
        columns.push((COL_HEART_RATE, vec![60.0; n]));
        let mask = (0..n).map(|i| if candidate.contains(&i) { 0.0 } else { 1.0 }).collect();
        columns.push((COL_CANDIDATE_EPISODE, mask));
        frame_with(n, &columns)
    }

    #[test]
    fn test_scenarios_fill_columns() {
        let figure = build_nw_scenarios(&[scenario(120, 30..90), scenario(120, 0..10)]).unwrap();
        let visible: Vec<bool> = figure.panels().iter().map(|p| p.visible).collect();
        assert_eq!(visible, [true, true, false, true, true, false, true, true, false]);
        assert_eq!(figure.panels()[0].title, "(a)");
        assert_eq!(figure.panels()[1].title, "(b)");

        let first = &figure.panels()[0];
        let start = first.find_scatter(&episode_start_label("1")).unwrap();
        assert_eq!(start.points[0].1, CANDIDATE_EPISODE_TRACK_Y);
        assert!(first.texts.iter().any(|t| t.text == "candidate non-wear episode"));

        assert!(!figure.panels()[3].show_x_axis);
        assert!(figure.panels()[7].show_x_axis);
        assert!(!figure.panels()[7].show_y_axis);
        assert_eq!(figure.panels()[6].y_label, "beats per minute");
        assert_eq!(figure.panels()[3].y_label, "acceleration (g)");
        assert_eq!(figure.panels()[6].legend, None);
        assert_eq!(figure.panels()[0].legend, Some(LegendPosition::LowerLeft));
    }

    #[test]
    fn test_too_many_scenarios() {
        let scenarios = vec![scenario(10, 0..5); 4];
        assert!(matches!(
            build_nw_scenarios(&scenarios),
            Err(PlotError::GridCapacity { .. })
        ));
    }
}
