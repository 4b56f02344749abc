//! The two report charts, drawn with plotters onto PNG bitmaps.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::debug;
use miette::Diagnostic;
use plotters::prelude::*;
use thiserror::Error;
use time::Date;

use crate::{date::month_abbr, observation::ObservationTable, summary::Summary};

pub const DAILY_CANVAS: (u32, u32) = (1400, 700);
pub const MONTHLY_CANVAS: (u32, u32) = (1200, 700);

const FONT: &str = "sans-serif";
const GRID: RGBColor = RGBColor(225, 225, 225);
const FINE_GRID: RGBColor = RGBColor(242, 242, 242);
const LIGHT_BLUE: RGBColor = RGBColor(158, 202, 225);
const DARK_BLUE: RGBColor = RGBColor(8, 48, 107);

#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("Could not draw '{}': {message}", .path.display())]
    #[diagnostic(
        code(meteo_report::render),
        help("chart labels need a sans-serif font installed on the system")
    )]
    Draw { path: PathBuf, message: String },
    #[error("{0} cannot be placed on a chart axis")]
    #[diagnostic(code(meteo_report::render::date))]
    Date(Date),
}

/// Produces the chart images referenced by the report. Both operations
/// overwrite whatever is at `path`.
pub trait ChartRenderer {
    fn daily_trend(
        &self,
        table: &ObservationTable,
        summary: &Summary,
        path: &Path,
    ) -> Result<(), RenderError>;

    fn monthly_pattern(&self, summary: &Summary, path: &Path) -> Result<(), RenderError>;
}

#[derive(Debug, Clone)]
pub struct BitmapCharts {
    city: String,
}

impl BitmapCharts {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

impl ChartRenderer for BitmapCharts {
    fn daily_trend(
        &self,
        table: &ObservationTable,
        summary: &Summary,
        path: &Path,
    ) -> Result<(), RenderError> {
        debug!("drawing {} days into {}", table.len(), path.display());
        let series = DailySeries::new(table, summary)?;
        draw_daily_trend(&self.city, &series, summary, path).map_err(|e| RenderError::Draw {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn monthly_pattern(&self, summary: &Summary, path: &Path) -> Result<(), RenderError> {
        debug!(
            "drawing {} months into {}",
            summary.monthly_precipitation.len(),
            path.display()
        );
        draw_monthly_pattern(summary, path).map_err(|e| RenderError::Draw {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn naive_date(date: Date) -> Result<NaiveDate, RenderError> {
    NaiveDate::from_ymd_opt(date.year(), date.month() as u32, date.day() as u32)
        .ok_or(RenderError::Date(date))
}

/// The daily table moved onto plotters' chrono date axis.
#[derive(Debug, PartialEq)]
struct DailySeries {
    points: Vec<(NaiveDate, f64)>,
    first: NaiveDate,
    /// Day after the last observation, so the last point is not on the edge.
    end: NaiveDate,
    wettest: NaiveDate,
}

impl DailySeries {
    fn new(table: &ObservationTable, summary: &Summary) -> Result<Self, RenderError> {
        let points = table
            .iter()
            .map(|row| naive_date(row.time).map(|date| (date, row.precipitation_mm)))
            .collect::<Result<Vec<_>, RenderError>>()?;
        let last = naive_date(summary.period_end)?;
        Ok(Self {
            points,
            first: naive_date(summary.period_start)?,
            end: last.succ_opt().unwrap_or(last),
            wettest: naive_date(summary.wettest_day.time)?,
        })
    }
}

/// Legend text of the wettest day marker.
pub fn wettest_day_label(summary: &Summary) -> String {
    let day = summary.wettest_day;
    format!(
        "Wettest day ({:02}-{:02}: {} mm)",
        day.time.month() as u8,
        day.time.day(),
        day.precipitation_mm
    )
}

/// Bar colour of the `index`th of `count` bars, going from light to dark blue.
fn shade(index: usize, count: usize) -> RGBColor {
    let ratio = if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        1.0
    };
    let mix = |light: u8, dark: u8| {
        (f64::from(light) + (f64::from(dark) - f64::from(light)) * ratio).round() as u8
    };
    RGBColor(
        mix(LIGHT_BLUE.0, DARK_BLUE.0),
        mix(LIGHT_BLUE.1, DARK_BLUE.1),
        mix(LIGHT_BLUE.2, DARK_BLUE.2),
    )
}

fn draw_daily_trend(
    city: &str,
    series: &DailySeries,
    summary: &Summary,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let DailySeries {
        points,
        first,
        end,
        wettest,
    } = series;
    let wettest = *wettest;
    let peak = summary.wettest_day.precipitation_mm;
    let floor = points.iter().map(|(_, value)| *value).fold(0.0, f64::min);
    let ceiling = if peak > 0.0 { peak * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, DAILY_CANVAS).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Daily precipitation trend ({}, {})", city, summary.years()),
            (FONT, 32).into_font(),
        )
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(*first..*end, floor..ceiling)?;

    chart
        .configure_mesh()
        .bold_line_style(GRID)
        .light_line_style(FINE_GRID)
        .x_labels(12)
        .x_label_formatter(&|date: &NaiveDate| date.format("%Y-%m-%d").to_string())
        .x_desc("Date")
        .y_desc("Daily precipitation (mm)")
        .axis_desc_style((FONT, 20))
        .draw()?;

    let line = BLUE.mix(0.7);
    chart.draw_series(LineSeries::new(points.iter().copied(), line.stroke_width(2)))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(date, value)| Circle::new((date, value), 4, line.filled())),
    )?;

    chart
        .draw_series(LineSeries::new(
            vec![(wettest, floor), (wettest, ceiling)],
            RED.stroke_width(2),
        ))?
        .label(wettest_day_label(summary))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT, 18))
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_monthly_pattern(
    summary: &Summary,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let months: Vec<(u8, f64)> = summary.monthly_precipitation.iter().collect();
    let labels: Vec<&str> = months
        .iter()
        .map(|(month, _)| month_abbr(*month).unwrap_or("?"))
        .collect();
    let peak = months.iter().map(|(_, total)| *total).fold(0.0, f64::max);
    let ceiling = if peak > 0.0 { peak * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, MONTHLY_CANVAS).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Total precipitation by month (seasonal pattern)",
            (FONT, 32).into_font(),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d((0..months.len() as i32).into_segmented(), 0.0..ceiling)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(GRID)
        .light_line_style(FINE_GRID)
        .x_labels(months.len() + 1)
        .x_label_formatter(&|value: &SegmentValue<i32>| match value {
            SegmentValue::CenterOf(index) => usize::try_from(*index)
                .ok()
                .and_then(|index| labels.get(index))
                .map(|label| label.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc("Month")
        .y_desc("Total precipitation (mm)")
        .axis_desc_style((FONT, 20))
        .draw()?;

    chart.draw_series(months.iter().enumerate().map(|(index, (_, total))| {
        let x = index as i32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(x), 0.0), (SegmentValue::Exact(x + 1), *total)],
            shade(index, months.len()).filled(),
        );
        bar.set_margin(0, 0, 12, 12);
        bar
    }))?;

    root.present()?;
    Ok(())
}
