// src/plot_framework.rs

//! Explicit figure model and its plotters renderer.
//!
//! Chart routines fill a [`Figure`] made of [`Panel`]s; nothing is drawn until
//! [`Figure::save`] renders every visible panel onto a PNG or SVG backend.

use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::chart::{ChartBuilder, SeriesLabelPosition};
use plotters::coord::ranged1d::Ranged;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, EmptyElement, PathElement, Polygon, Rectangle, Text};
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, RED, WHITE};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Color, IntoFont, RGBColor};

use std::error::Error;
use std::ops::Range;
use std::path::PathBuf;

use crate::constants::{
    COLOR_TICK_GRID, FONT_SIZE_MESSAGE, LINE_WIDTH_LEGEND, LINE_WIDTH_PLOT, LINE_WIDTH_REFERENCE,
    MAIN_TITLE_AREA_PX, PLOT_WIDTH, TIME_PANEL_HEIGHT,
};
use crate::error::{PlotError, Result};
use crate::font_config::{
    FONT_TUPLE_ANNOTATION, FONT_TUPLE_AXIS_LABEL, FONT_TUPLE_CELL_ANNOTATION,
    FONT_TUPLE_CHART_TITLE, FONT_TUPLE_LEGEND, FONT_TUPLE_MAIN_TITLE, FONT_TUPLE_MESSAGE,
};
use crate::layout::PanelGrid;
use crate::output::{ensure_directory, OutputFormat, OutputTarget};
use crate::types::{TickLabels, XYSeries};

/// Number of dashes used for a dashed reference line across the plot.
const DASH_SEGMENTS: usize = 40;
/// Automatic tick labels per axis.
const MESH_LABEL_COUNT: usize = 10;

/// Calculate plot range with padding.
/// Adds 15% padding, or a fixed padding for very small ranges.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-6 { 0.5 } else { range * 0.15 };
    (min - padding, max + padding)
}

/// Y tick label with "k" and "M" notation for large values.
/// Small fractional values keep one decimal.
pub fn format_value_label(y: f64) -> String {
    if y.abs() >= 1_000_000.0 {
        format!("{:.1}M", y / 1_000_000.0)
    } else if y.abs() >= 1000.0 {
        format!("{:.0}k", y / 1000.0)
    } else if y.abs() < 10.0 && y.fract() != 0.0 {
        format!("{:.1}", y)
    } else {
        format!("{:.0}", y)
    }
}

/// Maps `value` into a colorous gradient over `[min, max]`.
pub fn scale_color(
    gradient: colorous::Gradient,
    value: f64,
    min: f64,
    max: f64,
    reversed: bool,
) -> RGBColor {
    if !value.is_finite() || !min.is_finite() || !max.is_finite() {
        return RGBColor(255, 255, 255);
    }
    let span = (max - min).abs().max(1e-9);
    let t = ((value.clamp(min.min(max), max.max(min)) - min.min(max)) / span).clamp(0.0, 1.0);
    let t = if reversed { 1.0 - t } else { t };
    let color = gradient.eval_continuous(t);
    RGBColor(color.r, color.g, color.b)
}

/// Dash, gap, dash, ... from `from` to `to`, one point pair per dash.
pub fn dash_segments(from: (f64, f64), to: (f64, f64)) -> Vec<XYSeries> {
    let step = |i: usize| {
        let t = i as f64 / (DASH_SEGMENTS * 2) as f64;
        (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
    };
    (0..DASH_SEGMENTS)
        .map(|i| vec![step(2 * i), step(2 * i + 1)])
        .collect()
}

/// Black or white, whichever reads better on `background`.
pub fn contrasting_text_color(background: RGBColor) -> RGBColor {
    let RGBColor(r, g, b) = background;
    let luminance = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    if luminance < 128.0 {
        WHITE
    } else {
        BLACK
    }
}

/// Pixel size of a single-column figure with `rows` stacked time panels.
pub fn stacked_figure_size(rows: usize) -> (u32, u32) {
    let rows = u32::try_from(rows.max(1)).unwrap_or(u32::MAX / TIME_PANEL_HEIGHT);
    (
        PLOT_WIDTH,
        rows.saturating_mul(TIME_PANEL_HEIGHT) + MAIN_TITLE_AREA_PX.unsigned_abs(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl From<LegendPosition> for SeriesLabelPosition {
    fn from(position: LegendPosition) -> Self {
        match position {
            LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
            LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
            LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    /// Points to the left; marks the start of an interval.
    TriangleLeft,
    /// Points to the right; marks the end of an interval.
    TriangleRight,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub data: XYSeries,
    pub label: String,
    pub color: RGBColor,
    pub stroke_width: u32,
    pub opacity: f64,
}

impl PlotSeries {
    pub fn new(label: impl Into<String>, data: XYSeries, color: RGBColor) -> Self {
        Self {
            data,
            label: label.into(),
            color,
            stroke_width: LINE_WIDTH_PLOT,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_stroke_width(mut self, stroke_width: u32) -> Self {
        self.stroke_width = stroke_width;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub points: XYSeries,
    pub label: String,
    pub color: RGBColor,
    pub size: u32,
    pub marker: MarkerShape,
    pub in_legend: bool,
}

impl ScatterSeries {
    pub fn new(label: impl Into<String>, points: XYSeries, color: RGBColor, size: u32) -> Self {
        Self {
            points,
            label: label.into(),
            color,
            size,
            marker: MarkerShape::Circle,
            in_legend: true,
        }
    }

    pub fn with_marker(mut self, marker: MarkerShape) -> Self {
        self.marker = marker;
        self
    }

    /// Keeps the label for lookup but leaves the series out of the legend.
    pub fn without_legend(mut self) -> Self {
        self.in_legend = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextAnnotation {
    pub position: (f64, f64),
    pub text: String,
    pub color: RGBColor,
    pub font_size: i32,
    pub centered: bool,
}

impl TextAnnotation {
    pub fn new(text: impl Into<String>, position: (f64, f64)) -> Self {
        Self {
            position,
            text: text.into(),
            color: BLACK,
            font_size: FONT_TUPLE_ANNOTATION.1,
            centered: false,
        }
    }

    pub fn with_color(mut self, color: RGBColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_font_size(mut self, font_size: i32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub orientation: Orientation,
    pub at: f64,
    pub color: RGBColor,
    pub style: LineStyle,
    pub opacity: f64,
    pub label: String,
}

impl ReferenceLine {
    pub fn horizontal(at: f64, color: RGBColor, style: LineStyle) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            at,
            color,
            style,
            opacity: 1.0,
            label: String::new(),
        }
    }

    pub fn vertical(at: f64, color: RGBColor, style: LineStyle) -> Self {
        Self {
            orientation: Orientation::Vertical,
            ..Self::horizontal(at, color, style)
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A vertical bar from zero to `height` over `[x_start, x_end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub x_start: f64,
    pub x_end: f64,
    pub height: f64,
    pub color: RGBColor,
    pub opacity: f64,
    /// Half-length of a symmetric error bar.
    pub error: Option<f64>,
    pub value_label: Option<String>,
}

impl Bar {
    pub fn new(x_start: f64, x_end: f64, height: f64, color: RGBColor) -> Self {
        Self {
            x_start,
            x_end,
            height,
            color,
            opacity: 1.0,
            error: None,
            value_label: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_value_label(mut self, label: impl Into<String>) -> Self {
        self.value_label = Some(label.into());
        self
    }

    pub fn center(&self) -> f64 {
        (self.x_start + self.x_end) / 2.0
    }

    pub fn top(&self) -> f64 {
        self.height + self.error.unwrap_or(0.0).abs()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub x: Range<f64>,
    pub y: Range<f64>,
    pub color: RGBColor,
    pub annotation: Option<String>,
    pub text_color: RGBColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendPatch {
    pub label: String,
    pub color: RGBColor,
}

/// One subplot. Everything it holds is drawn in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_range: Option<Range<f64>>,
    pub y_range: Option<Range<f64>>,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<PlotSeries>,
    pub scatters: Vec<ScatterSeries>,
    pub texts: Vec<TextAnnotation>,
    pub reference_lines: Vec<ReferenceLine>,
    pub bars: Vec<Bar>,
    pub cells: Vec<HeatCell>,
    pub legend_patches: Vec<LegendPatch>,
    pub legend: Option<LegendPosition>,
    /// Explicit x tick positions and labels; replaces the automatic x labels.
    pub x_ticks: Option<TickLabels>,
    /// Explicit y tick positions and labels; replaces the automatic y labels.
    pub y_ticks: Option<TickLabels>,
    /// Draw a light vertical grid line at every explicit x tick.
    pub tick_grid: bool,
    /// Horizontal grid lines at the major y ticks in this style instead of the mesh.
    pub y_grid: Option<LineStyle>,
    pub show_x_axis: bool,
    pub show_y_axis: bool,
    pub visible: bool,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_range: None,
            y_range: None,
            x_label: String::new(),
            y_label: String::new(),
            lines: Vec::new(),
            scatters: Vec::new(),
            texts: Vec::new(),
            reference_lines: Vec::new(),
            bars: Vec::new(),
            cells: Vec::new(),
            legend_patches: Vec::new(),
            legend: None,
            x_ticks: None,
            y_ticks: None,
            tick_grid: false,
            y_grid: None,
            show_x_axis: true,
            show_y_axis: true,
            visible: true,
        }
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<Range<f64>>, v| {
            Some(match acc {
                None => v..v,
                Some(r) => r.start.min(v)..r.end.max(v),
            })
        })
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn plot(&mut self, series: PlotSeries) -> &mut Self {
        self.lines.push(series);
        self
    }

    pub fn scatter(&mut self, series: ScatterSeries) -> &mut Self {
        self.scatters.push(series);
        self
    }

    pub fn annotate(&mut self, annotation: TextAnnotation) -> &mut Self {
        self.texts.push(annotation);
        self
    }

    pub fn reference_line(&mut self, line: ReferenceLine) -> &mut Self {
        self.reference_lines.push(line);
        self
    }

    pub fn bar(&mut self, bar: Bar) -> &mut Self {
        self.bars.push(bar);
        self
    }

    pub fn cell(&mut self, cell: HeatCell) -> &mut Self {
        self.cells.push(cell);
        self
    }

    pub fn legend_patch(&mut self, label: impl Into<String>, color: RGBColor) -> &mut Self {
        self.legend_patches.push(LegendPatch {
            label: label.into(),
            color,
        });
        self
    }

    pub fn set_xlim(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some(min..max);
        self
    }

    pub fn set_ylim(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some(min..max);
        self
    }

    pub fn set_labels(&mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> &mut Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// True when there is at least one mark to draw.
    pub fn has_content(&self) -> bool {
        self.lines.iter().any(|s| !s.data.is_empty())
            || self.scatters.iter().any(|s| !s.points.is_empty())
            || !self.bars.is_empty()
            || !self.cells.is_empty()
    }

    pub fn find_scatter(&self, label: &str) -> Option<&ScatterSeries> {
        self.scatters.iter().find(|s| s.label == label)
    }

    pub fn find_line(&self, label: &str) -> Option<&PlotSeries> {
        self.lines.iter().find(|s| s.label == label)
    }

    /// Smallest and largest x over all drawn marks.
    pub fn data_x_extent(&self) -> Option<Range<f64>> {
        let lines = self.lines.iter().flat_map(|s| s.data.iter().map(|p| p.0));
        let scatters = self.scatters.iter().flat_map(|s| s.points.iter().map(|p| p.0));
        let bars = self.bars.iter().flat_map(|b| [b.x_start, b.x_end]);
        let cells = self.cells.iter().flat_map(|c| [c.x.start, c.x.end]);
        extent(lines.chain(scatters).chain(bars).chain(cells))
    }

    /// Smallest and largest y over all drawn marks, bars measured from zero.
    pub fn data_y_extent(&self) -> Option<Range<f64>> {
        let lines = self.lines.iter().flat_map(|s| s.data.iter().map(|p| p.1));
        let scatters = self.scatters.iter().flat_map(|s| s.points.iter().map(|p| p.1));
        let bars = self.bars.iter().flat_map(|b| [0.0, b.height, b.top()]);
        let cells = self.cells.iter().flat_map(|c| [c.y.start, c.y.end]);
        let lines_at = self
            .reference_lines
            .iter()
            .filter(|l| l.orientation == Orientation::Horizontal)
            .map(|l| l.at);
        extent(lines.chain(scatters).chain(bars).chain(cells).chain(lines_at))
    }

    /// The x range this panel shows: the fixed one if set, else the data extent.
    pub fn x_extent(&self) -> Option<Range<f64>> {
        self.x_range.clone().or_else(|| self.data_x_extent())
    }

    /// Coordinate ranges used for drawing. Degenerate ranges are padded.
    pub fn plot_ranges(&self) -> (Range<f64>, Range<f64>) {
        let pad = |r: Range<f64>| {
            let (lo, hi) = calculate_range(r.start, r.end);
            lo..hi
        };
        let x = match self.x_extent() {
            Some(r) if r.end > r.start => r,
            Some(r) => pad(r),
            None => 0.0..1.0,
        };
        let y = match &self.y_range {
            Some(r) if r.end > r.start => r.clone(),
            _ => self.data_y_extent().map(pad).unwrap_or(0.0..1.0),
        };
        (x, y)
    }
}

/// A grid of panels rendered into one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    pub grid: PanelGrid,
    pub size: (u32, u32),
    panels: Vec<Panel>,
}

impl Figure {
    pub fn new(grid: PanelGrid, size: (u32, u32)) -> Self {
        Self {
            title: None,
            grid,
            size,
            panels: vec![Panel::default(); grid.capacity()],
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut [Panel] {
        &mut self.panels
    }

    pub fn panel(&self, index: usize) -> Result<&Panel> {
        self.panels.get(index).ok_or(PlotError::PanelOutOfRange {
            index,
            capacity: self.panels.len(),
        })
    }

    pub fn panel_mut(&mut self, index: usize) -> Result<&mut Panel> {
        let capacity = self.panels.len();
        self.panels
            .get_mut(index)
            .ok_or(PlotError::PanelOutOfRange { index, capacity })
    }

    pub fn hide_panels(&mut self, indices: &[usize]) -> Result<()> {
        for &index in indices {
            self.panel_mut(index)?.hide();
        }
        Ok(())
    }

    pub fn visible_panel_count(&self) -> usize {
        self.panels.iter().filter(|p| p.visible).count()
    }

    /// Renders the figure into `target` and returns the written path.
    pub fn save(&self, target: &OutputTarget) -> Result<PathBuf> {
        ensure_directory(&target.folder)?;
        let path = target.path();
        if !self.panels.iter().any(|p| p.visible && p.has_content()) {
            log::warn!(
                "'{}' has no data in any panel, only placeholder messages shown.",
                path.display()
            );
        }
        match target.format {
            OutputFormat::Png => {
                let root = BitMapBackend::new(&path, self.size).into_drawing_area();
                self.render_on(&root).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
            OutputFormat::Svg => {
                let root = SVGBackend::new(&path, self.size).into_drawing_area();
                self.render_on(&root).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
        }
        log::info!("Plot saved as '{}'.", path.display());
        Ok(path)
    }

    fn render_on<DB>(&self, root: &DrawingArea<DB, Shift>) -> std::result::Result<(), Box<dyn Error>>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let grid_area = match &self.title {
            Some(title) => {
                root.draw(&Text::new(
                    title.as_str(),
                    (10, 10),
                    FONT_TUPLE_MAIN_TITLE.into_font().color(&BLACK),
                ))?;
                root.margin(MAIN_TITLE_AREA_PX, 5, 5, 5)
            }
            None => root.margin(5, 5, 5, 5),
        };
        let areas = grid_area.split_evenly((self.grid.rows, self.grid.columns));
        for (area, panel) in areas.iter().zip(&self.panels) {
            if !panel.visible {
                continue;
            }
            if panel.has_content() {
                draw_panel(area, panel)?;
            } else {
                draw_unavailable_message(area, &panel.title, "No data points")?;
            }
        }
        Ok(())
    }
}

fn render_error(err: impl std::fmt::Display) -> PlotError {
    PlotError::Render(err.to_string())
}

/// Draw a "Data Unavailable" message on a plot area.
pub fn draw_unavailable_message<DB>(
    area: &DrawingArea<DB, Shift>,
    panel_title: &str,
    reason: &str,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    const CHAR_WIDTH_RATIO: f32 = 0.6;
    const LINE_HEIGHT_SPACING: i32 = 4;

    let (x_range, y_range) = area.get_pixel_range();
    let (width, height) = (x_range.end - x_range.start, y_range.end - y_range.start);
    let message = if panel_title.is_empty() {
        format!("Data Unavailable:\n{reason}")
    } else {
        format!("{panel_title} Data Unavailable:\n{reason}")
    };

    let estimated_char_width = (FONT_SIZE_MESSAGE as f32 * CHAR_WIDTH_RATIO) as i32;
    let estimated_line_height = FONT_SIZE_MESSAGE + LINE_HEIGHT_SPACING;
    let lines: Vec<&str> = message.split('\n').collect();
    let max_line_length = lines.iter().map(|line| line.len()).max().unwrap_or(0);
    let estimated_text_width = max_line_length.saturating_mul(estimated_char_width as usize) as i32;
    let estimated_text_height = lines.len().saturating_mul(estimated_line_height as usize) as i32;

    let center_x = width / 2 - estimated_text_width / 2;
    let center_y = height / 2 - estimated_text_height / 2;

    let text_style = FONT_TUPLE_MESSAGE.into_font().color(&RED);
    area.draw(&Text::new(message, (center_x, center_y), text_style))?;
    Ok(())
}

fn draw_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_range, y_range) = panel.plot_ranges();

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(5)
        .x_label_area_size(if panel.show_x_axis { 50 } else { 10 })
        .y_label_area_size(if panel.show_y_axis { 60 } else { 10 });
    if !panel.title.is_empty() {
        builder.caption(&panel.title, FONT_TUPLE_CHART_TITLE);
    }
    let mut chart = builder.build_cartesian_2d(x_range.clone(), y_range.clone())?;

    let blank = |_: &f64| String::new();
    let value_label = |y: &f64| format_value_label(*y);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(MESH_LABEL_COUNT)
            .y_labels(MESH_LABEL_COUNT)
            .light_line_style(WHITE.mix(0.7))
            .label_style(FONT_TUPLE_AXIS_LABEL);
        if panel.show_x_axis {
            mesh.x_desc(&panel.x_label);
        }
        if panel.show_y_axis {
            mesh.y_desc(&panel.y_label);
        }
        if panel.x_ticks.is_some() || !panel.show_x_axis {
            mesh.x_label_formatter(&blank).disable_x_mesh();
        }
        if panel.y_ticks.is_some() || !panel.show_y_axis {
            mesh.y_label_formatter(&blank).disable_y_mesh();
        } else {
            mesh.y_label_formatter(&value_label);
        }
        if panel.y_grid.is_some() {
            mesh.disable_y_mesh();
        }
        mesh.draw()?;
    }

    if let Some(style) = panel.y_grid {
        let grid_style = COLOR_TICK_GRID.stroke_width(1);
        let grid_ys: Vec<f64> = chart.as_coord_spec().y_spec().key_points(MESH_LABEL_COUNT);
        for y in grid_ys {
            let (from, to) = ((x_range.start, y), (x_range.end, y));
            let segments = match style {
                LineStyle::Solid => vec![vec![from, to]],
                LineStyle::Dashed => dash_segments(from, to),
            };
            for segment in segments {
                chart.draw_series(LineSeries::new(segment, grid_style))?;
            }
        }
    }

    let area_offset = area.get_base_pixel();

    if let (Some(ticks), true) = (&panel.x_ticks, panel.show_x_axis) {
        let style = FONT_TUPLE_AXIS_LABEL
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (x, label) in ticks {
            if *x < x_range.start || *x > x_range.end {
                continue;
            }
            if panel.tick_grid {
                chart.draw_series(LineSeries::new(
                    vec![(*x, y_range.start), (*x, y_range.end)],
                    COLOR_TICK_GRID.stroke_width(1),
                ))?;
            }
            let (px, py) = chart.backend_coord(&(*x, y_range.start));
            area.draw(&Text::new(
                label.as_str(),
                (px - area_offset.0, py - area_offset.1 + 5),
                style.clone(),
            ))?;
        }
    }
    if let (Some(ticks), true) = (&panel.y_ticks, panel.show_y_axis) {
        let style = FONT_TUPLE_AXIS_LABEL
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Center));
        for (y, label) in ticks {
            if *y < y_range.start || *y > y_range.end {
                continue;
            }
            let (px, py) = chart.backend_coord(&(x_range.start, *y));
            area.draw(&Text::new(
                label.as_str(),
                (px - area_offset.0 - 5, py - area_offset.1),
                style.clone(),
            ))?;
        }
    }

    // Heat cells and bars go first so lines and markers stay on top.
    for cell in &panel.cells {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(cell.x.start, cell.y.start), (cell.x.end, cell.y.end)],
            cell.color.filled(),
        )))?;
        if let Some(text) = &cell.annotation {
            let style = FONT_TUPLE_CELL_ANNOTATION
                .into_font()
                .color(&cell.text_color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            let center = (
                (cell.x.start + cell.x.end) / 2.0,
                (cell.y.start + cell.y.end) / 2.0,
            );
            chart.draw_series(std::iter::once(Text::new(text.clone(), center, style)))?;
        }
    }

    let label_gap = (y_range.end - y_range.start) * 0.01;
    for bar in &panel.bars {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(bar.x_start, 0.0), (bar.x_end, bar.height)],
            bar.color.mix(bar.opacity).filled(),
        )))?;
        if let Some(error) = bar.error {
            let center = bar.center();
            let cap = (bar.x_end - bar.x_start) * 0.15;
            let (low, high) = (bar.height - error.abs(), bar.height + error.abs());
            for segment in [
                vec![(center, low), (center, high)],
                vec![(center - cap, low), (center + cap, low)],
                vec![(center - cap, high), (center + cap, high)],
            ] {
                chart.draw_series(std::iter::once(PathElement::new(
                    segment,
                    BLACK.stroke_width(1),
                )))?;
            }
        }
        if let Some(text) = &bar.value_label {
            let style = FONT_TUPLE_CELL_ANNOTATION
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            chart.draw_series(std::iter::once(Text::new(
                text.clone(),
                (bar.center(), bar.top() + label_gap),
                style,
            )))?;
        }
    }

    let mut legend_series_count = 0;

    for line in &panel.reference_lines {
        let style = line.color.mix(line.opacity).stroke_width(LINE_WIDTH_REFERENCE);
        let (from, to) = match line.orientation {
            Orientation::Horizontal => ((x_range.start, line.at), (x_range.end, line.at)),
            Orientation::Vertical => ((line.at, y_range.start), (line.at, y_range.end)),
        };
        let segments: Vec<Vec<(f64, f64)>> = match line.style {
            LineStyle::Solid => vec![vec![from, to]],
            LineStyle::Dashed => dash_segments(from, to),
        };
        for segment in segments {
            chart.draw_series(LineSeries::new(segment, style))?;
        }
        if !line.label.is_empty() {
            let color = line.color;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x_range.start, y_range.start)],
                    color.stroke_width(0),
                )))?
                .label(&line.label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH_LEGEND))
                });
            legend_series_count += 1;
        }
    }

    // A non-finite point breaks a line into separate pieces.
    for s in &panel.lines {
        let style = s.color.mix(s.opacity).stroke_width(s.stroke_width);
        let pieces = s
            .data
            .split(|(x, y)| !x.is_finite() || !y.is_finite())
            .filter(|piece| !piece.is_empty());
        for (i, piece) in pieces.enumerate() {
            let series = chart.draw_series(LineSeries::new(piece.iter().cloned(), style))?;
            if i == 0 && !s.label.is_empty() {
                let color = s.color;
                series.label(&s.label).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH_LEGEND))
                });
                legend_series_count += 1;
            }
        }
    }

    for s in &panel.scatters {
        if s.points.is_empty() {
            continue;
        }
        let color = s.color;
        let r = s.size as i32;
        let annotation = match s.marker {
            MarkerShape::Circle => chart.draw_series(
                s.points
                    .iter()
                    .map(|&p| Circle::new(p, r, color.filled())),
            )?,
            MarkerShape::TriangleLeft => chart.draw_series(s.points.iter().map(|&p| {
                EmptyElement::at(p) + Polygon::new(vec![(-r, 0), (r, -r), (r, r)], color.filled())
            }))?,
            MarkerShape::TriangleRight => chart.draw_series(s.points.iter().map(|&p| {
                EmptyElement::at(p) + Polygon::new(vec![(r, 0), (-r, -r), (-r, r)], color.filled())
            }))?,
            MarkerShape::Square => chart.draw_series(s.points.iter().map(|&p| {
                EmptyElement::at(p) + Rectangle::new([(-r, -r), (r, r)], color.filled())
            }))?,
        };
        if s.in_legend && !s.label.is_empty() {
            annotation
                .label(&s.label)
                .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
            legend_series_count += 1;
        }
    }

    for t in &panel.texts {
        let font = (FONT_TUPLE_ANNOTATION.0, t.font_size).into_font().color(&t.color);
        let style = if t.centered {
            font.pos(Pos::new(HPos::Center, VPos::Center))
        } else {
            font
        };
        chart.draw_series(std::iter::once(Text::new(t.text.clone(), t.position, style)))?;
    }

    // Manual legend entries: an invisible mark carrying a filled swatch.
    for patch in &panel.legend_patches {
        let color = patch.color;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x_range.start, y_range.start)],
                color.stroke_width(0),
            )))?
            .label(&patch.label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        legend_series_count += 1;
    }

    if let (Some(position), true) = (panel.legend, legend_series_count > 0) {
        chart
            .configure_series_labels()
            .position(position.into())
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(FONT_TUPLE_LEGEND)
            .draw()?;
    }

    Ok(())
}
