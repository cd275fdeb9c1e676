// tests/non_wear_overlay_test.rs

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use actiplot::constants::{COL_RAW_NON_WEAR, COL_X, COL_Y, COL_Z};
use actiplot::data_input::time_frame::TimeFrame;
use actiplot::error::PlotError;
use actiplot::overlay::{downsample, draw_mask_track, flagged_points, MaskTrack, SentinelPolarity};
use actiplot::plot_framework::Panel;
use actiplot::plot_functions::plot_activity_by_day::{
    build_raw_activity_by_day, build_raw_vmu_activity_by_day,
};
use actiplot::time_axis::{format_time_panels, to_plot_x, TimeAxisFormat};

const SECONDS_PER_DAY_RECORDED: i64 = 3600;
const FLAGGED_FROM: i64 = 10 * 60;
const FLAGGED_UNTIL: i64 = 20 * 60;

fn day_start(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 3, day)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

/// One hour of 1 Hz Y/X/Z per day. The raw non-wear column is zero (non-wear) for
/// minutes 10 to 20 of the first day only.
fn recording(days: u32) -> TimeFrame {
    let mut index = Vec::new();
    let mut mask = Vec::new();
    for day in 0..days {
        for second in 0..SECONDS_PER_DAY_RECORDED {
            index.push(day_start(1 + day) + Duration::seconds(second));
            let flagged = day == 0 && (FLAGGED_FROM..FLAGGED_UNTIL).contains(&second);
            mask.push(if flagged { 0.0 } else { 1.0 });
        }
    }
    let wave: Vec<f64> = (0..index.len()).map(|i| (i as f64 / 60.0).sin()).collect();
    TimeFrame::new(index)
        .unwrap()
        .with_column(COL_Y, wave.clone())
        .unwrap()
        .with_column(COL_X, wave.iter().map(|v| v * 0.5).collect())
        .unwrap()
        .with_column(COL_Z, wave.iter().map(|v| -v).collect())
        .unwrap()
        .with_column(COL_RAW_NON_WEAR, mask)
        .unwrap()
}

#[test]
fn test_two_days_with_non_wear_on_first_day_only() {
    let figure = build_raw_activity_by_day(&recording(2), "S1", true).unwrap();
    assert_eq!(figure.panels().len(), 2);
    assert_eq!(figure.visible_panel_count(), 2);

    let window = to_plot_x(day_start(1) + Duration::seconds(FLAGGED_FROM))
        ..to_plot_x(day_start(1) + Duration::seconds(FLAGGED_UNTIL));
    let first_day = figure.panel(0).unwrap();
    assert_eq!(first_day.lines.len(), 3);
    assert_eq!(first_day.legend_patches.len(), 1);
    let overlay = &first_day.scatters[0].points;
    assert!(!overlay.is_empty());
    assert!(overlay.iter().all(|(x, _)| window.contains(x)));

    let second_day = figure.panel(1).unwrap();
    assert!(second_day.scatters[0].points.is_empty());
    assert!(second_day.title.starts_with("2016-03-02"));
}

#[test]
fn test_overlay_cluster_stays_inside_flagged_minutes() {
    let data = recording(1);
    let track = MaskTrack::new(COL_RAW_NON_WEAR, SentinelPolarity::ZeroIsFlagged, 1.0)
        .with_offset(-4.0);
    assert_eq!(track.stride, 60);

    let mut panel = Panel::new("day");
    draw_mask_track(&mut panel, &data, &track).unwrap();
    let points = &panel.scatters[0].points;
    assert_eq!(points.len(), 10);
    assert!(points.iter().all(|(_, y)| *y == -4.0));
    assert_eq!(points[0].0, to_plot_x(day_start(1) + Duration::seconds(FLAGGED_FROM)));
    assert!(points.windows(2).all(|w| w[1].0 - w[0].0 == 60.0));
}

#[test]
fn test_flipped_polarity_marks_wear_time() {
    let data = recording(1);
    let non_wear = MaskTrack::new(COL_RAW_NON_WEAR, SentinelPolarity::ZeroIsFlagged, 1.0).with_stride(1);
    let wear = MaskTrack::new(COL_RAW_NON_WEAR, SentinelPolarity::OneIsFlagged, 1.0).with_stride(1);
    let flagged = flagged_points(&data, &non_wear).unwrap().len();
    let unflagged = flagged_points(&data, &wear).unwrap().len();
    assert_eq!(flagged, (FLAGGED_UNTIL - FLAGGED_FROM) as usize);
    assert_eq!(flagged + unflagged, data.len());
}

#[test]
fn test_time_formatting_is_idempotent() {
    let mut figure = build_raw_activity_by_day(&recording(2), "S1", true).unwrap();
    let once = figure.clone();
    format_time_panels(figure.panels_mut(), &TimeAxisFormat::default());
    assert_eq!(figure, once);

    let ticks = once.panel(0).unwrap().x_ticks.clone().unwrap();
    assert_eq!(ticks.first().map(|(_, label)| label.as_str()), Some("08:00"));
}

#[test]
fn test_more_days_than_panels() {
    assert!(matches!(
        build_raw_vmu_activity_by_day(&recording(4), "S1", false),
        Err(PlotError::GridCapacity { required: 4, capacity: 3 })
    ));

    let figure = build_raw_vmu_activity_by_day(&recording(2), "S1", false).unwrap();
    assert_eq!(figure.visible_panel_count(), 2);
    assert!(figure.panel(0).unwrap().scatters.is_empty());
}

#[test]
fn test_missing_mask_column() {
    let data = TimeFrame::new(vec![day_start(1)])
        .unwrap()
        .with_column(COL_Y, vec![0.0])
        .unwrap()
        .with_column(COL_X, vec![0.0])
        .unwrap()
        .with_column(COL_Z, vec![0.0])
        .unwrap();
    assert!(matches!(
        build_raw_activity_by_day(&data, "S1", true),
        Err(PlotError::MissingColumn(column)) if column == COL_RAW_NON_WEAR
    ));
    assert!(build_raw_activity_by_day(&data, "S1", false).is_ok());
}

proptest! {
    #[test]
    fn prop_downsample_keeps_ceil_of_stride(len in 0usize..5000, stride in 1usize..700) {
        let values: Vec<usize> = (0..len).collect();
        let kept = downsample(&values, stride);
        prop_assert_eq!(kept.len(), len.div_ceil(stride));
        prop_assert!(kept.iter().all(|v| v % stride == 0));
    }

    #[test]
    fn prop_overlay_count_matches_flagged_samples(
        mask in proptest::collection::vec(prop_oneof![Just(0.0), Just(1.0), Just(f64::NAN)], 1..400),
        stride in 1usize..50,
    ) {
        let index = (0..mask.len() as i64)
            .map(|i| day_start(1) + Duration::seconds(i))
            .collect();
        let flagged = mask.iter().filter(|v| **v == 1.0).count();
        let data = TimeFrame::new(index).unwrap().with_column("MASK", mask).unwrap();
        let track = MaskTrack::new("MASK", SentinelPolarity::OneIsFlagged, 1.0).with_stride(stride);
        let points = flagged_points(&data, &track).unwrap();
        prop_assert_eq!(points.len(), flagged.div_ceil(stride));
    }
}
