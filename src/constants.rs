// src/constants.rs

// Import specific colors needed
use plotters::style::colors::full_palette::{BLUE, GREEN, ORANGE, PINK, PURPLE, RED};
use plotters::style::RGBColor;

// Plot dimensions.
pub const PLOT_WIDTH: u32 = 1920;
pub const PLOT_HEIGHT: u32 = 1080;
// Height of one day/device row in stacked time series figures.
pub const TIME_PANEL_HEIGHT: u32 = 360;
// Pixels reserved above the panel grid when a figure carries a main title.
pub const MAIN_TITLE_AREA_PX: i32 = 50;

// Font sizes
pub const FONT_SIZE_MAIN_TITLE: i32 = 24;
pub const FONT_SIZE_CHART_TITLE: i32 = 20;
pub const FONT_SIZE_AXIS_LABEL: i32 = 14;
pub const FONT_SIZE_LEGEND: i32 = 14;
pub const FONT_SIZE_MESSAGE: i32 = 18;
pub const FONT_SIZE_ANNOTATION: i32 = 16;
pub const FONT_SIZE_CELL_ANNOTATION: i32 = 12;
pub const FONT_SIZE_CONTOUR_LABEL: i32 = 12;

// Stroke widths for lines
pub const LINE_WIDTH_PLOT: u32 = 1;
pub const LINE_WIDTH_LEGEND: u32 = 2;
pub const LINE_WIDTH_REFERENCE: u32 = 1;
pub const LINE_WIDTH_CONTOUR: u32 = 2;

// Marker sizes (radius in pixels)
pub const MARKER_SIZE_TRACK: u32 = 3;
pub const MARKER_SIZE_TRACE: u32 = 1;
pub const MARKER_SIZE_DIRECTION: u32 = 7;
pub const MARKER_SIZE_OPTIMUM: u32 = 5;

// Fixed value ranges
pub const ACCELERATION_RANGE: (f64, f64) = (-5.0, 5.0);
pub const SCENARIO_ACCELERATION_RANGE: (f64, f64) = (-3.0, 3.0);
pub const HEART_RATE_RANGE: (f64, f64) = (0.0, 220.0);
pub const SCENARIO_HEART_RATE_RANGE: (f64, f64) = (0.0, 150.0);
pub const ECG_RANGE: (f64, f64) = (-4000.0, 4000.0);
pub const SCORE_RANGE: (f64, f64) = (0.0, 1.1);

// Native sampling frequencies
pub const ACTIGRAPH_SAMPLING_HZ: f64 = 100.0;
pub const EPOCH_60S_SAMPLING_HZ: f64 = 1.0 / 60.0;

// Overlay strides (keep every Nth flagged sample)
pub const STRIDE_RAW_NON_WEAR: usize = 6000;
pub const STRIDE_INFERRED_NON_WEAR: usize = 2000;
pub const STRIDE_EPISODE: usize = 1000;
pub const STRIDE_CANDIDATE_EPISODE: usize = 600;

// Overlay track placement
pub const RAW_NON_WEAR_TRACK_Y: f64 = -5.0;
pub const EPOCH_NON_WEAR_TRACK_Y: f64 = -300.0;
pub const ALGORITHM_TRACK_BASE_Y: f64 = -4.9;
pub const EPOCH_VMU_TRACK_Y: f64 = -100.0;
pub const EPISODE_TRACK_Y: f64 = -4.9;
pub const EPISODE_ANNOTATION_GAP: f64 = -0.9;
pub const MERGED_EPISODE_TRACK_Y: f64 = -4.0;
pub const GROUPED_EPISODE_TRACK_Y: f64 = -5.0;
pub const MERGED_ANNOTATION_GAP: f64 = 0.5;
pub const CANDIDATE_EPISODE_TRACK_Y: f64 = -1.7;

// Confidence interval sample size used by the comparison plots
pub const DEFAULT_CI_SAMPLE_SIZE: usize = 583;
pub const Z_95: f64 = 1.96;

// --- Column names ---
pub const COL_Y: &str = "Y";
pub const COL_X: &str = "X";
pub const COL_Z: &str = "Z";
pub const COL_VMU: &str = "VMU";
pub const COL_STEPS: &str = "STEPS";
pub const COL_RAW_NON_WEAR: &str = "RAW NON-WEAR-TIME";
pub const COL_VMU_EPOCH_10: &str = "VMU - 10 EPOCH";
pub const COL_VMU_EPOCH_60: &str = "VMU - 60 EPOCH";
pub const COL_EPOCH_60_NON_WEAR: &str = "60 EPOCH NON-WEAR-TIME";
pub const COL_ACTIGRAPH_AXES: [&str; 3] = ["ACTIGRAPH Y", "ACTIGRAPH X", "ACTIGRAPH Z"];
pub const COL_ACTIWAVE_AXES: [&str; 3] = ["ACTIWAVE Y", "ACTIWAVE X", "ACTIWAVE Z"];
pub const COL_VMU_ACTIGRAPH: &str = "VMU ACTIGRAPH";
pub const COL_VMU_ACTIWAVE: &str = "VMU ACTIWAVE";
pub const COL_HEART_RATE: &str = "ESTIMATED HR";
pub const COL_ECG: &str = "ECG";
pub const COL_EPOCH_60_VMU: &str = "EPOCH 60s VMU";
pub const COL_TRUE_NON_WEAR: &str = "TRUE NON WEAR TIME";
pub const COL_HECHT_NON_WEAR: &str = "HECHT-3 NON WEAR TIME";
pub const COL_TROIANO_NON_WEAR: &str = "TROIANO NON WEAR TIME";
pub const COL_CHOI_NON_WEAR: &str = "CHOI NON WEAR TIME";
pub const COL_HEES_NON_WEAR: &str = "HEES NON WEAR TIME";
pub const COL_TRUE_NW_TIME: &str = "TRUE NW-TIME";
pub const COL_INFERRED_NW_TIME: &str = "INFERRED NW-TIME";
pub const COL_CANDIDATE_EPISODE: &str = "CANDIDATE NW EPISODE";

// --- Plot Color Assignments ---
// Default line cycle for the three acceleration axes and a fourth series.
pub const COLOR_AXIS_Y: RGBColor = RGBColor(31, 119, 180);
pub const COLOR_AXIS_X: RGBColor = RGBColor(255, 127, 14);
pub const COLOR_AXIS_Z: RGBColor = RGBColor(44, 160, 44);
pub const COLOR_SERIES_4: RGBColor = RGBColor(214, 39, 40);
pub const COLOR_SERIES_5: RGBColor = RGBColor(148, 103, 189);
pub const LINE_CYCLE: [RGBColor; 5] = [
    COLOR_AXIS_Y,
    COLOR_AXIS_X,
    COLOR_AXIS_Z,
    COLOR_SERIES_4,
    COLOR_SERIES_5,
];

pub const COLOR_NON_WEAR_TRUE: RGBColor = RED;
pub const COLOR_NON_WEAR_HECHT: RGBColor = BLUE;
pub const COLOR_NON_WEAR_TROIANO: RGBColor = GREEN;
pub const COLOR_NON_WEAR_CHOI: RGBColor = ORANGE;
pub const COLOR_NON_WEAR_HEES: RGBColor = PINK;
pub const COLOR_EPOCH_NON_WEAR: RGBColor = BLUE;
pub const COLOR_EPISODE_NON_WEAR: RGBColor = RED;
pub const COLOR_EPISODE_WEAR: RGBColor = GREEN;
pub const COLOR_OPTIMUM: RGBColor = RGBColor(27, 158, 119);

// Distinct colors handed out to stacked overlay tracks, in order.
pub const OVERLAY_PALETTE: [RGBColor; 6] = [RED, BLUE, GREEN, ORANGE, PINK, PURPLE];

pub const COLOR_BAR_PRIMARY: RGBColor = RGBColor(216, 179, 101);
pub const COLOR_BAR_SECONDARY: RGBColor = RGBColor(90, 180, 172);
pub const COLOR_HISTOGRAM: RGBColor = RGBColor(67, 162, 202);
pub const COLOR_TIME_DISTRIBUTION: [RGBColor; 3] = [
    RGBColor(27, 158, 119),
    RGBColor(217, 95, 2),
    RGBColor(117, 112, 179),
];
pub const COLOR_SCENARIO: [RGBColor; 4] = [
    RGBColor(132, 200, 228),
    RGBColor(111, 228, 104),
    RGBColor(208, 72, 150),
    RGBColor(39, 42, 111),
];
pub const COLOR_ROC_CURVE: RGBColor = RGBColor(255, 140, 0);
pub const COLOR_ROC_DIAGONAL: RGBColor = RGBColor(0, 0, 128);
pub const COLOR_REFERENCE_LINE: RGBColor = RGBColor(0, 0, 0);
pub const COLOR_TICK_GRID: RGBColor = RGBColor(220, 220, 220);

pub const BAR_OPACITY: f64 = 0.8;
pub const REFERENCE_LINE_OPACITY: f64 = 0.5;
pub const DEVICE_VMU_OPACITY: f64 = 0.7;
