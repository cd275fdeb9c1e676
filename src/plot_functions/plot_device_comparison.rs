// src/plot_functions/plot_device_comparison.rs

use std::path::{Path, PathBuf};

use crate::constants::{
    ACCELERATION_RANGE, COL_ECG, COL_HEART_RATE, COL_VMU, COL_VMU_ACTIGRAPH, COL_VMU_ACTIWAVE,
    DEVICE_VMU_OPACITY, ECG_RANGE, EPISODE_ANNOTATION_GAP, EPISODE_TRACK_Y,
    GROUPED_EPISODE_TRACK_Y, HEART_RATE_RANGE, LINE_CYCLE, MERGED_ANNOTATION_GAP,
    MERGED_EPISODE_TRACK_Y, STRIDE_EPISODE,
};
use crate::data_input::episodes::Episode;
use crate::data_input::time_frame::TimeFrame;
use crate::error::Result;
use crate::layout::PanelGrid;
use crate::output::OutputFormat;
use crate::overlay::{draw_episode_markers, EpisodeTrack};
use crate::plot_framework::{stacked_figure_size, Figure, Panel, PlotSeries};
use crate::plot_functions::panel_builders::{
    add_acceleration_lines, dated_title, require_rows, save_figure, share_y_range,
    ACCELERATION_COLUMNS,
};
use crate::time_axis::{format_time_panels, TimeAxisFormat};

/// Recordings of one subject worn with both devices.
#[derive(Debug, Clone, Copy)]
pub struct DeviceRecordings<'a> {
    pub actigraph_acc: &'a TimeFrame,
    pub actiwave_acc: &'a TimeFrame,
    pub actiwave_hr: &'a TimeFrame,
}

fn acceleration_panel(panel: &mut Panel, frame: &TimeFrame, title: String) -> Result<()> {
    panel.title = title;
    add_acceleration_lines(panel, frame, &ACCELERATION_COLUMNS)?;
    panel.set_ylim(ACCELERATION_RANGE.0, ACCELERATION_RANGE.1);
    Ok(())
}

fn heart_rate_panel(panel: &mut Panel, frame: &TimeFrame) -> Result<()> {
    panel.title = "ACTIWAVE HEART RATE".to_string();
    panel.plot(PlotSeries::new(COL_HEART_RATE, frame.series(COL_HEART_RATE)?, LINE_CYCLE[0]));
    panel.set_ylim(HEART_RATE_RANGE.0, HEART_RATE_RANGE.1);
    Ok(())
}

/// Overlaid VMU of both devices, each from its own frame and column.
fn vmu_panel(
    panel: &mut Panel,
    actiwave: (&TimeFrame, &str),
    actigraph: (&TimeFrame, &str),
) -> Result<()> {
    panel.title = "VMU".to_string();
    panel.plot(
        PlotSeries::new("VMU ACTIWAVE", actiwave.0.series(actiwave.1)?, LINE_CYCLE[0])
            .with_opacity(DEVICE_VMU_OPACITY),
    );
    panel.plot(
        PlotSeries::new("VMU ACTIGRAPH", actigraph.0.series(actigraph.1)?, LINE_CYCLE[1])
            .with_opacity(DEVICE_VMU_OPACITY),
    );
    Ok(())
}

fn validate_recordings(recordings: &DeviceRecordings, actigraph_vmu: &str, actiwave_vmu: &str) -> Result<()> {
    let mut actigraph_columns = ACCELERATION_COLUMNS.to_vec();
    actigraph_columns.push(actigraph_vmu);
    let mut actiwave_columns = ACCELERATION_COLUMNS.to_vec();
    actiwave_columns.push(actiwave_vmu);

    require_rows(recordings.actigraph_acc, "actigraph acceleration")?;
    recordings.actigraph_acc.require_columns(&actigraph_columns)?;
    recordings.actiwave_acc.require_columns(&actiwave_columns)?;
    recordings.actiwave_hr.require_columns(&[COL_HEART_RATE])
}

/// ActiGraph acceleration, ActiWave acceleration, heart rate, ECG and the VMU of both
/// devices, one panel each.
pub fn build_actiwave_data(
    recordings: DeviceRecordings,
    actiwave_ecg: &TimeFrame,
    subject: &str,
) -> Result<Figure> {
    validate_recordings(&recordings, COL_VMU, COL_VMU)?;
    actiwave_ecg.require_columns(&[COL_ECG])?;

    let grid = PanelGrid::column(5);
    let mut figure = Figure::new(grid, stacked_figure_size(grid.rows)).with_title(subject);

    acceleration_panel(
        figure.panel_mut(0)?,
        recordings.actigraph_acc,
        dated_title("ACTIGRAPH ACCELERATION", recordings.actigraph_acc),
    )?;
    acceleration_panel(
        figure.panel_mut(1)?,
        recordings.actiwave_acc,
        "ACTIWAVE ACCELERATION".to_string(),
    )?;
    heart_rate_panel(figure.panel_mut(2)?, recordings.actiwave_hr)?;

    let ecg = figure.panel_mut(3)?;
    ecg.title = "ACTIWAVE ECG".to_string();
    ecg.plot(PlotSeries::new(COL_ECG, actiwave_ecg.series(COL_ECG)?, LINE_CYCLE[0]));
    ecg.set_ylim(ECG_RANGE.0, ECG_RANGE.1);

    vmu_panel(
        figure.panel_mut(4)?,
        (recordings.actiwave_acc, COL_VMU),
        (recordings.actigraph_acc, COL_VMU),
    )?;

    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    Ok(figure)
}

pub fn plot_actiwave_data(
    recordings: DeviceRecordings,
    actiwave_ecg: &TimeFrame,
    plot_folder: &Path,
    subject: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_actiwave_data(recordings, actiwave_ecg, subject)?;
    save_figure(&figure, plot_folder, subject, format)
}

/// Annotated non-wear episodes under the ActiGraph acceleration, with ActiWave
/// acceleration, VMU of both devices and heart rate below.
pub fn build_non_wear_data(
    recordings: DeviceRecordings,
    annotations: &[Episode],
    subject: &str,
) -> Result<Figure> {
    validate_recordings(&recordings, COL_VMU_ACTIGRAPH, COL_VMU_ACTIWAVE)?;

    let grid = PanelGrid::column(4);
    let mut figure = Figure::new(grid, stacked_figure_size(grid.rows)).with_title(subject);

    let actigraph = figure.panel_mut(0)?;
    acceleration_panel(
        actigraph,
        recordings.actigraph_acc,
        dated_title("ACTIGRAPH ACCELERATION", recordings.actigraph_acc),
    )?;
    let track = EpisodeTrack::at(EPISODE_TRACK_Y)
        .with_stride(STRIDE_EPISODE)
        .annotated(EPISODE_ANNOTATION_GAP);
    draw_episode_markers(actigraph, recordings.actigraph_acc, annotations, &track)?;

    acceleration_panel(
        figure.panel_mut(1)?,
        recordings.actiwave_acc,
        "ACTIWAVE ACCELERATION".to_string(),
    )?;
    vmu_panel(
        figure.panel_mut(2)?,
        (recordings.actiwave_acc, COL_VMU_ACTIWAVE),
        (recordings.actigraph_acc, COL_VMU_ACTIGRAPH),
    )?;
    heart_rate_panel(figure.panel_mut(3)?, recordings.actiwave_hr)?;

    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    Ok(figure)
}

pub fn plot_non_wear_data(
    recordings: DeviceRecordings,
    annotations: &[Episode],
    plot_folder: &Path,
    subject: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_non_wear_data(recordings, annotations, subject)?;
    save_figure(&figure, plot_folder, subject, format)
}

/// ActiGraph and ActiWave acceleration on a shared y range, with episodes before and
/// after grouping drawn on two tracks under the ActiGraph panel.
pub fn build_merged_episodes(
    actigraph_acc: &TimeFrame,
    actiwave_acc: &TimeFrame,
    episodes: &[Episode],
    grouped_episodes: &[Episode],
    subject: &str,
) -> Result<Figure> {
    require_rows(actigraph_acc, "actigraph acceleration")?;
    actigraph_acc.require_columns(&ACCELERATION_COLUMNS)?;
    actiwave_acc.require_columns(&ACCELERATION_COLUMNS)?;

    let grid = PanelGrid::column(2);
    let mut figure = Figure::new(grid, stacked_figure_size(grid.rows)).with_title(subject);

    let actigraph = figure.panel_mut(0)?;
    add_acceleration_lines(actigraph, actigraph_acc, &ACCELERATION_COLUMNS)?;
    draw_episode_markers(
        actigraph,
        actigraph_acc,
        episodes,
        &EpisodeTrack::at(MERGED_EPISODE_TRACK_Y).annotated(MERGED_ANNOTATION_GAP),
    )?;
    draw_episode_markers(
        actigraph,
        actigraph_acc,
        grouped_episodes,
        &EpisodeTrack::at(GROUPED_EPISODE_TRACK_Y).annotated(MERGED_ANNOTATION_GAP),
    )?;

    add_acceleration_lines(figure.panel_mut(1)?, actiwave_acc, &ACCELERATION_COLUMNS)?;
    share_y_range(&mut figure, &[0, 1])?;

    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    Ok(figure)
}

pub fn plot_merged_episodes(
    actigraph_acc: &TimeFrame,
    actiwave_acc: &TimeFrame,
    episodes: &[Episode],
    grouped_episodes: &[Episode],
    plot_folder: &Path,
    subject: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_merged_episodes(actigraph_acc, actiwave_acc, episodes, grouped_episodes, subject)?;
    save_figure(&figure, plot_folder, subject, format)
}
