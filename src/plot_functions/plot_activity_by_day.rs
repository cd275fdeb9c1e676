// src/plot_functions/plot_activity_by_day.rs

use std::path::{Path, PathBuf};

use crate::constants::{
    ACCELERATION_RANGE, ACTIGRAPH_SAMPLING_HZ, COLOR_EPOCH_NON_WEAR, COLOR_NON_WEAR_TRUE,
    COL_EPOCH_60_NON_WEAR, COL_RAW_NON_WEAR, COL_STEPS, COL_VMU, COL_VMU_EPOCH_10,
    COL_VMU_EPOCH_60, EPOCH_60S_SAMPLING_HZ, EPOCH_NON_WEAR_TRACK_Y, LINE_CYCLE,
    RAW_NON_WEAR_TRACK_Y, STRIDE_RAW_NON_WEAR,
};
use crate::data_input::time_frame::TimeFrame;
use crate::error::{PlotError, Result};
use crate::layout::{allocate_panels, Arrangement, PanelGrid};
use crate::output::OutputFormat;
use crate::overlay::{draw_mask_track, MaskTrack, SentinelPolarity};
use crate::plot_framework::{calculate_range, stacked_figure_size, Figure, PlotSeries};
use crate::plot_functions::panel_builders::{
    add_acceleration_lines, add_lines, dated_title, day_groups, save_figure, share_y_range,
    ACCELERATION_COLUMNS,
};
use crate::time_axis::{format_time_panels, TimeAxisFormat};

/// Panels in the fixed raw VMU day grid.
pub const RAW_VMU_DAY_PANELS: usize = 3;

/// Lower limit of epoch panels; leaves room for the epoch non-wear track.
const EPOCH_Y_MIN: f64 = -300.0;

/// Raw non-wear track: zero marks non-wear, one marker per minute at 100 Hz.
pub fn raw_non_wear_track() -> MaskTrack {
    MaskTrack::new(COL_RAW_NON_WEAR, SentinelPolarity::ZeroIsFlagged, ACTIGRAPH_SAMPLING_HZ)
        .with_stride(STRIDE_RAW_NON_WEAR)
        .with_offset(RAW_NON_WEAR_TRACK_Y)
        .with_color(COLOR_NON_WEAR_TRUE)
}

/// 60 s epoch non-wear track: every flagged epoch is drawn.
pub fn epoch_non_wear_track() -> MaskTrack {
    MaskTrack::new(COL_EPOCH_60_NON_WEAR, SentinelPolarity::ZeroIsFlagged, EPOCH_60S_SAMPLING_HZ)
        .with_offset(EPOCH_NON_WEAR_TRACK_Y)
        .with_color(COLOR_EPOCH_NON_WEAR)
}

fn required_raw_columns(plot_non_wear_time: bool) -> Vec<&'static str> {
    let mut columns = ACCELERATION_COLUMNS.to_vec();
    if plot_non_wear_time {
        columns.push(COL_RAW_NON_WEAR);
    }
    columns
}

/// Raw Y/X/Z acceleration with one panel per day, optionally with the raw non-wear track.
pub fn build_raw_activity_by_day(
    data: &TimeFrame,
    subject: &str,
    plot_non_wear_time: bool,
) -> Result<Figure> {
    data.require_columns(&required_raw_columns(plot_non_wear_time))?;
    let days = day_groups(data)?;
    let grid = PanelGrid::column(days.len());
    build_raw_day_panels(&days, grid, subject, plot_non_wear_time)
}

/// Like `build_raw_activity_by_day` on a fixed three-row grid. More than three days
/// is a `GridCapacity` error; fewer leave the remaining panels hidden.
pub fn build_raw_vmu_activity_by_day(
    data: &TimeFrame,
    subject: &str,
    plot_non_wear_time: bool,
) -> Result<Figure> {
    data.require_columns(&required_raw_columns(plot_non_wear_time))?;
    let days = day_groups(data)?;
    build_raw_day_panels(&days, PanelGrid::column(RAW_VMU_DAY_PANELS), subject, plot_non_wear_time)
}

fn build_raw_day_panels(
    days: &[(chrono::NaiveDate, TimeFrame)],
    grid: PanelGrid,
    subject: &str,
    plot_non_wear_time: bool,
) -> Result<Figure> {
    let allocation = allocate_panels(days.len(), grid, Arrangement::one_per_group())?;
    let mut figure = Figure::new(grid, stacked_figure_size(grid.rows)).with_title(subject);
    let track = raw_non_wear_track();

    for (group, (_, day)) in days.iter().enumerate() {
        let index = allocation.groups[group][0];
        let panel = figure.panel_mut(index)?;
        panel.title = dated_title("", day);
        add_acceleration_lines(panel, day, &ACCELERATION_COLUMNS)?;
        panel.set_ylim(ACCELERATION_RANGE.0, ACCELERATION_RANGE.1);
        if plot_non_wear_time {
            draw_mask_track(panel, day, &track)?;
        }
    }

    figure.hide_panels(&allocation.unused)?;
    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    Ok(figure)
}

pub fn plot_raw_activity_by_day(
    data: &TimeFrame,
    plot_folder: &Path,
    subject: &str,
    plot_non_wear_time: bool,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_raw_activity_by_day(data, subject, plot_non_wear_time)?;
    save_figure(&figure, plot_folder, subject, format)
}

pub fn plot_raw_vmu_activity_by_day(
    data: &TimeFrame,
    plot_folder: &Path,
    subject: &str,
    plot_non_wear_time: bool,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_raw_vmu_activity_by_day(data, subject, plot_non_wear_time)?;
    save_figure(&figure, plot_folder, subject, format)
}

/// Which epoch series to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochSeriesSelection {
    pub counts: bool,
    pub vmu: bool,
    pub steps: bool,
}

impl Default for EpochSeriesSelection {
    fn default() -> Self {
        Self {
            counts: true,
            vmu: true,
            steps: false,
        }
    }
}

impl EpochSeriesSelection {
    fn columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        if self.counts {
            columns.extend(ACCELERATION_COLUMNS);
        }
        if self.vmu {
            columns.push(COL_VMU);
        }
        if self.steps {
            columns.push(COL_STEPS);
        }
        columns
    }
}

/// Epoch counts per day. All day panels share one y range.
pub fn build_epoch_activity_by_day(
    data: &TimeFrame,
    subject: &str,
    selection: EpochSeriesSelection,
) -> Result<Figure> {
    let columns = selection.columns();
    if columns.is_empty() {
        return Err(PlotError::InvalidConfig(
            "no epoch series selected for plotting".to_string(),
        ));
    }
    data.require_columns(&columns)?;
    let days = day_groups(data)?;
    let grid = PanelGrid::column(days.len());
    let allocation = allocate_panels(days.len(), grid, Arrangement::one_per_group())?;
    let mut figure = Figure::new(grid, stacked_figure_size(grid.rows)).with_title(subject);

    for (group, (_, day)) in days.iter().enumerate() {
        let panel = figure.panel_mut(allocation.groups[group][0])?;
        panel.title = dated_title("", day);
        add_lines(panel, day, &columns, &columns, &LINE_CYCLE)?;
    }

    let used: Vec<usize> = allocation.groups.iter().flatten().copied().collect();
    share_y_range(&mut figure, &used)?;
    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    Ok(figure)
}

pub fn plot_epoch_activity_by_day(
    data: &TimeFrame,
    plot_folder: &Path,
    subject: &str,
    selection: EpochSeriesSelection,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_epoch_activity_by_day(data, subject, selection)?;
    save_figure(&figure, plot_folder, subject, format)
}

/// Upper limit of the epoch panels: the largest 60 s VMU over all days, rounded to
/// the nearest thousand with ties going to the even thousand.
pub fn epoch_y_max(days: &[(chrono::NaiveDate, TimeFrame)]) -> Result<f64> {
    let mut max: Option<f64> = None;
    for (_, day) in days {
        if let Some(day_max) = day.column_max(COL_VMU_EPOCH_60)? {
            max = Some(max.map_or(day_max, |m: f64| m.max(day_max)));
        }
    }
    let max = max.ok_or_else(|| PlotError::EmptySeries(COL_VMU_EPOCH_60.to_string()))?;
    Ok((max / 1000.0).round_ties_even() * 1000.0)
}

/// Two panels per day: raw acceleration above, 10 s and 60 s epoch VMU below.
pub fn build_raw_and_epoch_activity_by_day(
    data: &TimeFrame,
    subject: &str,
    plot_raw_non_wear_time: bool,
    plot_epoch_non_wear_time: bool,
) -> Result<Figure> {
    let mut columns = required_raw_columns(plot_raw_non_wear_time);
    columns.extend([COL_VMU_EPOCH_10, COL_VMU_EPOCH_60]);
    if plot_epoch_non_wear_time {
        columns.push(COL_EPOCH_60_NON_WEAR);
    }
    data.require_columns(&columns)?;

    let days = day_groups(data)?;
    let grid = PanelGrid::column(days.len() * 2);
    let allocation = allocate_panels(days.len(), grid, Arrangement::Stacked { panels_per_group: 2 })?;
    let mut figure = Figure::new(grid, stacked_figure_size(grid.rows)).with_title(subject);

    let y_max = epoch_y_max(&days)?;
    let (epoch_y_min, epoch_y_max) = if y_max > EPOCH_Y_MIN {
        (EPOCH_Y_MIN, y_max)
    } else {
        calculate_range(EPOCH_Y_MIN, y_max)
    };
    let raw_track = raw_non_wear_track();
    let epoch_track = epoch_non_wear_track();

    for (group, (_, day)) in days.iter().enumerate() {
        let title = dated_title("", day);

        let raw_panel = figure.panel_mut(allocation.groups[group][0])?;
        raw_panel.title = title.clone();
        add_acceleration_lines(raw_panel, day, &ACCELERATION_COLUMNS)?;
        raw_panel.set_ylim(ACCELERATION_RANGE.0, ACCELERATION_RANGE.1);
        if plot_raw_non_wear_time {
            draw_mask_track(raw_panel, day, &raw_track)?;
        }

        let epoch_panel = figure.panel_mut(allocation.groups[group][1])?;
        epoch_panel.title = title;
        for (column, color) in [(COL_VMU_EPOCH_10, LINE_CYCLE[0]), (COL_VMU_EPOCH_60, LINE_CYCLE[1])] {
            epoch_panel.plot(PlotSeries::new(column, day.series(column)?, color));
        }
        epoch_panel.set_ylim(epoch_y_min, epoch_y_max);
        if plot_epoch_non_wear_time {
            draw_mask_track(epoch_panel, day, &epoch_track)?;
        }
    }

    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    Ok(figure)
}

pub fn plot_raw_and_epoch_activity_by_day(
    data: &TimeFrame,
    plot_folder: &Path,
    subject: &str,
    plot_raw_non_wear_time: bool,
    plot_epoch_non_wear_time: bool,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_raw_and_epoch_activity_by_day(
        data,
        subject,
        plot_raw_non_wear_time,
        plot_epoch_non_wear_time,
    )?;
    save_figure(&figure, plot_folder, subject, format)
}
