// src/overlay.rs

//! Non-wear overlays.
//!
//! A mask column is shown as a thin track of markers below the signal, one marker per
//! `stride` flagged samples. Episodes are shown as a start marker pointing left, an end
//! marker pointing right and a sparse trace in between.

use plotters::style::RGBColor;

use crate::constants::{
    ACCELERATION_RANGE, COLOR_EPISODE_NON_WEAR, COLOR_EPISODE_WEAR, COLOR_NON_WEAR_TRUE,
    EPISODE_ANNOTATION_GAP, EPISODE_TRACK_Y, MARKER_SIZE_DIRECTION, MARKER_SIZE_TRACE,
    MARKER_SIZE_TRACK, OVERLAY_PALETTE, STRIDE_EPISODE,
};
use crate::data_input::episodes::{Episode, EpisodeLabel};
use crate::data_input::time_frame::TimeFrame;
use crate::error::{PlotError, Result};
use crate::plot_framework::{MarkerShape, Panel, ScatterSeries, TextAnnotation};
use crate::time_axis::to_plot_x;
use crate::types::XYSeries;

/// Which mask value marks a sample as flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelPolarity {
    ZeroIsFlagged,
    OneIsFlagged,
}

impl SentinelPolarity {
    pub fn flag_value(self) -> f64 {
        match self {
            SentinelPolarity::ZeroIsFlagged => 0.0,
            SentinelPolarity::OneIsFlagged => 1.0,
        }
    }

    /// NaN is never flagged.
    pub fn is_flagged(self, value: f64) -> bool {
        value == self.flag_value()
    }
}

/// One overlay point per minute of flagged samples at `sampling_hz`.
pub fn default_stride(sampling_hz: f64) -> usize {
    let stride = (sampling_hz * 60.0).round();
    if stride.is_finite() && stride >= 1.0 {
        stride as usize
    } else {
        1
    }
}

/// Every `stride`-th element starting with the first; `ceil(len / stride)` elements.
pub fn downsample<T: Copy>(values: &[T], stride: usize) -> Vec<T> {
    values.iter().step_by(stride.max(1)).copied().collect()
}

/// How one mask column is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskTrack {
    pub column: String,
    pub label: String,
    pub polarity: SentinelPolarity,
    pub stride: usize,
    pub y_offset: f64,
    pub color: RGBColor,
    pub marker_size: u32,
}

impl MaskTrack {
    pub fn new(column: impl Into<String>, polarity: SentinelPolarity, sampling_hz: f64) -> Self {
        let column = column.into();
        Self {
            label: column.clone(),
            column,
            polarity,
            stride: default_stride(sampling_hz),
            y_offset: ACCELERATION_RANGE.0,
            color: COLOR_NON_WEAR_TRUE,
            marker_size: MARKER_SIZE_TRACK,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_offset(mut self, y_offset: f64) -> Self {
        self.y_offset = y_offset;
        self
    }

    pub fn with_color(mut self, color: RGBColor) -> Self {
        self.color = color;
        self
    }
}

/// Downsampled (x, y_offset) points of the flagged samples of `track.column`.
pub fn flagged_points(frame: &TimeFrame, track: &MaskTrack) -> Result<XYSeries> {
    let values = frame.column(&track.column)?;
    let flagged: Vec<f64> = frame
        .index()
        .iter()
        .zip(values)
        .filter(|(_, v)| track.polarity.is_flagged(**v))
        .map(|(t, _)| to_plot_x(*t))
        .collect();
    Ok(downsample(&flagged, track.stride)
        .into_iter()
        .map(|x| (x, track.y_offset))
        .collect())
}

fn resolve_track(frame: &TimeFrame, track: &MaskTrack) -> Result<XYSeries> {
    if track.stride == 0 {
        return Err(PlotError::InvalidConfig(format!(
            "stride of track '{}' must be at least 1",
            track.label
        )));
    }
    flagged_points(frame, track)
}

fn push_track(panel: &mut Panel, track: &MaskTrack, points: XYSeries) {
    log::debug!(
        "Overlay '{}': {} points at y={} (stride {})",
        track.label,
        points.len(),
        track.y_offset,
        track.stride
    );
    panel.scatter(
        ScatterSeries::new(track.label.clone(), points, track.color, track.marker_size).without_legend(),
    );
    panel.legend_patch(track.label.clone(), track.color);
}

/// Adds the track's markers and a legend patch to `panel`.
pub fn draw_mask_track(panel: &mut Panel, frame: &TimeFrame, track: &MaskTrack) -> Result<()> {
    let points = resolve_track(frame, track)?;
    push_track(panel, track, points);
    Ok(())
}

/// Draws several tracks on one panel. Tracks must not share an offset or a color.
/// Nothing is added to `panel` unless every track resolves.
pub fn draw_mask_tracks(panel: &mut Panel, frame: &TimeFrame, tracks: &[MaskTrack]) -> Result<()> {
    for (i, a) in tracks.iter().enumerate() {
        for b in &tracks[i + 1..] {
            if (a.y_offset - b.y_offset).abs() < f64::EPSILON {
                return Err(PlotError::InvalidConfig(format!(
                    "tracks '{}' and '{}' share y offset {}",
                    a.label, b.label, a.y_offset
                )));
            }
            if a.color == b.color {
                return Err(PlotError::InvalidConfig(format!(
                    "tracks '{}' and '{}' share a color",
                    a.label, b.label
                )));
            }
        }
    }
    let resolved = tracks
        .iter()
        .map(|track| resolve_track(frame, track))
        .collect::<Result<Vec<_>>>()?;
    for (track, points) in tracks.iter().zip(resolved) {
        push_track(panel, track, points);
    }
    Ok(())
}

/// Places track `i` at `base + i * spacing` with the `i`-th palette color.
pub fn stack_tracks(tracks: Vec<MaskTrack>, base: f64, spacing: f64) -> Result<Vec<MaskTrack>> {
    if tracks.len() > OVERLAY_PALETTE.len() {
        return Err(PlotError::InvalidConfig(format!(
            "{} tracks requested but only {} overlay colors are available",
            tracks.len(),
            OVERLAY_PALETTE.len()
        )));
    }
    if tracks.len() > 1 && spacing == 0.0 {
        return Err(PlotError::InvalidConfig(
            "stacked tracks need a non-zero spacing".to_string(),
        ));
    }
    Ok(tracks
        .into_iter()
        .zip(OVERLAY_PALETTE)
        .enumerate()
        .map(|(i, (track, color))| {
            track
                .with_offset(base + i as f64 * spacing)
                .with_color(color)
        })
        .collect())
}

/// How episodes are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeTrack {
    pub y_offset: f64,
    pub stride: usize,
    pub marker_size: u32,
    pub annotate: bool,
    /// Counter text sits at `y_offset - annotation_offset`.
    pub annotation_offset: f64,
}

impl Default for EpisodeTrack {
    fn default() -> Self {
        Self {
            y_offset: EPISODE_TRACK_Y,
            stride: STRIDE_EPISODE,
            marker_size: MARKER_SIZE_DIRECTION,
            annotate: false,
            annotation_offset: EPISODE_ANNOTATION_GAP,
        }
    }
}

impl EpisodeTrack {
    pub fn at(y_offset: f64) -> Self {
        Self {
            y_offset,
            ..Self::default()
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn annotated(mut self, annotation_offset: f64) -> Self {
        self.annotate = true;
        self.annotation_offset = annotation_offset;
        self
    }
}

pub fn episode_color(label: EpisodeLabel) -> RGBColor {
    match label {
        EpisodeLabel::NonWear => COLOR_EPISODE_NON_WEAR,
        EpisodeLabel::Wear => COLOR_EPISODE_WEAR,
    }
}

/// Scatter label of an episode's start marker.
pub fn episode_start_label(counter: &str) -> String {
    format!("episode {counter} start")
}

/// Scatter label of an episode's end marker.
pub fn episode_end_label(counter: &str) -> String {
    format!("episode {counter} end")
}

/// Scatter label of an episode's connecting trace.
pub fn episode_trace_label(counter: &str) -> String {
    format!("episode {counter} trace")
}

/// Marks each episode's first and last sample in `frame` with direction markers.
/// Every episode must cover at least one sample; otherwise nothing is drawn.
pub fn draw_episode_markers(
    panel: &mut Panel,
    frame: &TimeFrame,
    episodes: &[Episode],
    track: &EpisodeTrack,
) -> Result<()> {
    let mut resolved = Vec::with_capacity(episodes.len());
    for episode in episodes {
        let range = frame.positions_between(episode.start, episode.stop);
        let xs: Vec<f64> = frame.index()[range].iter().map(|t| to_plot_x(*t)).collect();
        let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
            return Err(PlotError::InvalidData(format!(
                "episode {} ({} - {}) has no samples in the plotted data",
                episode.counter, episode.start, episode.stop
            )));
        };
        resolved.push((episode, first, last, xs));
    }

    let y = track.y_offset;
    for (episode, first, last, xs) in resolved {
        let color = episode_color(episode.label);
        panel.scatter(
            ScatterSeries::new(episode_start_label(&episode.counter), vec![(first, y)], color, track.marker_size)
                .with_marker(MarkerShape::TriangleLeft)
                .without_legend(),
        );
        panel.scatter(
            ScatterSeries::new(episode_end_label(&episode.counter), vec![(last, y)], color, track.marker_size)
                .with_marker(MarkerShape::TriangleRight)
                .without_legend(),
        );
        let trace = downsample(&xs, track.stride)
            .into_iter()
            .map(|x| (x, y))
            .collect();
        panel.scatter(
            ScatterSeries::new(episode_trace_label(&episode.counter), trace, color, MARKER_SIZE_TRACE)
                .without_legend(),
        );
        if track.annotate {
            panel.annotate(
                TextAnnotation::new(episode.counter.clone(), (first, y - track.annotation_offset))
                    .with_color(color),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn frame(mask: Vec<f64>) -> TimeFrame {
        let index = (0..mask.len() as i64)
            .map(|i| base() + Duration::seconds(i))
            .collect();
        TimeFrame::new(index)
            .unwrap()
            .with_column("MASK", mask)
            .unwrap()
    }

    #[test]
    fn test_polarity() {
        assert!(SentinelPolarity::ZeroIsFlagged.is_flagged(0.0));
        assert!(!SentinelPolarity::ZeroIsFlagged.is_flagged(1.0));
        assert!(SentinelPolarity::OneIsFlagged.is_flagged(1.0));
        assert!(!SentinelPolarity::OneIsFlagged.is_flagged(f64::NAN));
        assert!(!SentinelPolarity::ZeroIsFlagged.is_flagged(f64::NAN));
    }

    #[test]
    fn test_default_stride() {
        assert_eq!(default_stride(100.0), 6000);
        assert_eq!(default_stride(1.0 / 60.0), 1);
        assert_eq!(default_stride(0.0), 1);
        assert_eq!(default_stride(f64::NAN), 1);
    }

    #[test]
    fn test_downsample_keeps_first_and_every_nth() {
        let values: Vec<usize> = (0..10).collect();
        assert_eq!(downsample(&values, 3), vec![0, 3, 6, 9]);
        assert_eq!(downsample(&values, 10), vec![0]);
        assert_eq!(downsample(&values, 0).len(), 10);
        assert!(downsample::<usize>(&[], 4).is_empty());
    }

    #[test]
    fn test_opposite_polarities_are_complementary() {
        let f = frame(vec![0.0, 1.0, 0.0, 0.0, 1.0, f64::NAN]);
        let zero = MaskTrack::new("MASK", SentinelPolarity::ZeroIsFlagged, 1.0 / 60.0);
        let one = MaskTrack::new("MASK", SentinelPolarity::OneIsFlagged, 1.0 / 60.0);
        let zero_points = flagged_points(&f, &zero).unwrap();
        let one_points = flagged_points(&f, &one).unwrap();
        assert_eq!(zero_points.len(), 3);
        assert_eq!(one_points.len(), 2);
        assert_eq!(zero_points[0], (to_plot_x(base()), ACCELERATION_RANGE.0));
    }

    #[test]
    fn test_draw_mask_track_adds_markers_and_patch() {
        let f = frame(vec![0.0; 7]);
        let track = MaskTrack::new("MASK", SentinelPolarity::ZeroIsFlagged, 1.0)
            .with_label("RAW NON-WEAR")
            .with_stride(3)
            .with_offset(-300.0);
        let mut panel = Panel::new("day");
        draw_mask_track(&mut panel, &f, &track).unwrap();

        let scatter = panel.find_scatter("RAW NON-WEAR").unwrap();
        assert_eq!(scatter.points.len(), 3);
        assert!(scatter.points.iter().all(|p| p.1 == -300.0));
        assert!(!scatter.in_legend);
        assert_eq!(panel.legend_patches.len(), 1);
    }

    #[test]
    fn test_missing_mask_column_propagates() {
        let f = frame(vec![0.0; 2]);
        let track = MaskTrack::new("OTHER", SentinelPolarity::ZeroIsFlagged, 100.0);
        let mut panel = Panel::default();
        assert!(matches!(
            draw_mask_track(&mut panel, &f, &track),
            Err(PlotError::MissingColumn(name)) if name == "OTHER"
        ));
        assert!(panel.scatters.is_empty());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let f = frame(vec![0.0; 2]);
        let track = MaskTrack::new("MASK", SentinelPolarity::ZeroIsFlagged, 1.0).with_stride(0);
        assert!(matches!(
            draw_mask_track(&mut Panel::default(), &f, &track),
            Err(PlotError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_shared_offset_or_color_rejected() {
        let f = frame(vec![0.0, 1.0]);
        let a = MaskTrack::new("MASK", SentinelPolarity::ZeroIsFlagged, 1.0).with_offset(-4.9);
        let b = a.clone().with_color(OVERLAY_PALETTE[1]);
        let mut panel = Panel::default();
        assert!(draw_mask_tracks(&mut panel, &f, &[a.clone(), b]).is_err());

        let c = a.clone().with_offset(-4.7);
        assert!(draw_mask_tracks(&mut panel, &f, &[a, c]).is_err());
        assert!(panel.scatters.is_empty());
    }

    #[test]
    fn test_stack_tracks_assigns_distinct_offsets_and_colors() {
        let tracks: Vec<_> = ["A", "B", "C"]
            .iter()
            .map(|c| MaskTrack::new(*c, SentinelPolarity::ZeroIsFlagged, 1.0))
            .collect();
        let stacked = stack_tracks(tracks, -4.9, 0.2).unwrap();
        let offsets: Vec<f64> = stacked.iter().map(|t| t.y_offset).collect();
        assert!((offsets[2] - (-4.5)).abs() < 1e-9);
        assert_ne!(stacked[0].color, stacked[1].color);

        let too_many = vec![MaskTrack::new("A", SentinelPolarity::ZeroIsFlagged, 1.0); 7];
        assert!(stack_tracks(too_many, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_episode_markers_sit_on_first_and_last_sample() {
        let f = frame(vec![0.0; 10]);
        let index = f.index().to_vec();
        let episodes = vec![
            Episode::new("1", index[2], index[2], EpisodeLabel::NonWear).unwrap(),
            Episode::new("2", index[4], index[8], EpisodeLabel::Wear).unwrap(),
        ];
        let mut panel = Panel::default();
        let track = EpisodeTrack::at(-4.9).with_stride(2).annotated(-0.9);
        draw_episode_markers(&mut panel, &f, &episodes, &track).unwrap();

        let start = panel.find_scatter(&episode_start_label("1")).unwrap();
        let end = panel.find_scatter(&episode_end_label("1")).unwrap();
        assert_eq!(start.points, end.points);
        assert_eq!(start.points[0].0, to_plot_x(index[2]));
        assert_eq!(start.color, COLOR_EPISODE_NON_WEAR);

        let start = panel.find_scatter(&episode_start_label("2")).unwrap();
        let end = panel.find_scatter(&episode_end_label("2")).unwrap();
        assert_eq!(start.points[0].0, to_plot_x(index[4]));
        assert_eq!(end.points[0].0, to_plot_x(index[8]));
        assert_eq!(start.marker, MarkerShape::TriangleLeft);
        assert_eq!(end.marker, MarkerShape::TriangleRight);
        assert_eq!(end.color, COLOR_EPISODE_WEAR);
        let trace = panel.find_scatter(&episode_trace_label("2")).unwrap();
        assert_eq!(trace.points.len(), 3);

        assert_eq!(panel.texts.len(), 2);
        assert!((panel.texts[1].position.1 - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_episode_outside_frame_is_an_error() {
        let f = frame(vec![0.0; 3]);
        let late = base() + Duration::hours(2);
        let episodes = vec![
            Episode::new("1", base(), base() + Duration::seconds(1), EpisodeLabel::Wear).unwrap(),
            Episode::new("9", late, late, EpisodeLabel::NonWear).unwrap(),
        ];
        let mut panel = Panel::default();
        assert!(matches!(
            draw_episode_markers(&mut panel, &f, &episodes, &EpisodeTrack::default().annotated(0.5)),
            Err(PlotError::InvalidData(_))
        ));
        assert!(panel.scatters.is_empty());
        assert!(panel.texts.is_empty());
    }

    #[test]
    fn test_failing_track_leaves_panel_untouched() {
        let f = frame(vec![0.0, 1.0, 0.0]);
        let good = MaskTrack::new("MASK", SentinelPolarity::ZeroIsFlagged, 1.0).with_offset(-4.9);
        let missing = MaskTrack::new("OTHER", SentinelPolarity::ZeroIsFlagged, 1.0)
            .with_offset(-4.7)
            .with_color(OVERLAY_PALETTE[1]);
        let mut panel = Panel::default();
        assert!(matches!(
            draw_mask_tracks(&mut panel, &f, &[good.clone(), missing]),
            Err(PlotError::MissingColumn(name)) if name == "OTHER"
        ));
        assert!(panel.scatters.is_empty());
        assert!(panel.legend_patches.is_empty());

        let zero_stride = good.clone().with_offset(-4.5).with_color(OVERLAY_PALETTE[2]).with_stride(0);
        assert!(draw_mask_tracks(&mut panel, &f, &[good.clone(), zero_stride]).is_err());
        assert!(panel.scatters.is_empty());

        draw_mask_tracks(&mut panel, &f, &[good]).unwrap();
        assert_eq!(panel.scatters.len(), 1);
    }
}
