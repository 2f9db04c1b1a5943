//! Bar chart rendering with plotters.
//!
//! Four charts are drawn from the [`DashboardSummary`]: average by gender,
//! average by race/ethnicity, all scores by test preparation, and the band
//! distribution. Each chart is written as a PNG into the plots directory.
//!
//! A chart that fails to render is logged and reported with no path; the
//! remaining charts are still attempted.

use crate::error::DashboardError;
use crate::schema::METRIC_COLUMNS;
use crate::types::{AggregateView, BandCounts, DashboardSummary};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const SINGLE_BAR: RGBColor = RGBColor(0x4F, 0x81, 0xBD);
const RACE_BAR: RGBColor = RGBColor(0x5A, 0x5A, 0x5A);
const BAND_BAR: RGBColor = RGBColor(0x00, 0x33, 0x99);
const METRIC_BARS: [RGBColor; 4] = [
    RGBColor(0x4F, 0x81, 0xBD),
    RGBColor(0xC0, 0x50, 0x4D),
    RGBColor(0x9B, 0xBB, 0x59),
    RGBColor(0x80, 0x64, 0xA2),
];

/// Which of the four dashboard charts a rendering belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    AverageByGender,
    AverageByRace,
    ScoresByPrep,
    BandCounts,
}

impl ChartKind {
    /// All charts in rendering order.
    pub const ALL: [ChartKind; 4] = [
        Self::AverageByGender,
        Self::AverageByRace,
        Self::ScoresByPrep,
        Self::BandCounts,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::AverageByGender => "Average Score by Gender",
            Self::AverageByRace => "Average Score by Race/Ethnicity",
            Self::ScoresByPrep => "Scores by Test Prep Course",
            Self::BandCounts => "Performance Band Distribution",
        }
    }

    /// Heading written above the chart on the Summary sheet.
    pub fn caption(&self) -> &'static str {
        match self {
            Self::AverageByGender => "Average by Gender",
            Self::AverageByRace => "Average by Race/Ethnicity",
            Self::ScoresByPrep => "Scores by Test Prep",
            Self::BandCounts => "Performance Bands",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::AverageByGender => "avg_by_gender.png",
            Self::AverageByRace => "avg_by_race.png",
            Self::ScoresByPrep => "scores_by_prep.png",
            Self::BandCounts => "band_counts.png",
        }
    }

    pub fn y_label(&self) -> &'static str {
        match self {
            Self::AverageByGender | Self::AverageByRace => "Average",
            Self::ScoresByPrep => "Score",
            Self::BandCounts => "Count",
        }
    }

    /// Build the plotted data for this chart.
    pub fn series(&self, summary: &DashboardSummary) -> ChartSeries {
        match self {
            Self::AverageByGender => ChartSeries::averages(&summary.by_gender),
            Self::AverageByRace => ChartSeries::averages(&summary.by_race),
            Self::ScoresByPrep => ChartSeries::all_metrics(&summary.by_prep),
            Self::BandCounts => ChartSeries::band_counts(&summary.bands),
        }
    }

    fn colors(&self) -> &'static [RGBColor] {
        match self {
            Self::AverageByGender => std::slice::from_ref(&SINGLE_BAR),
            Self::AverageByRace => std::slice::from_ref(&RACE_BAR),
            Self::ScoresByPrep => &METRIC_BARS,
            Self::BandCounts => std::slice::from_ref(&BAND_BAR),
        }
    }
}

/// Category labels plus one or more named value series of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub series: Vec<(String, Vec<f64>)>,
}

impl ChartSeries {
    /// One bar per group: the group's mean Average.
    pub fn averages(view: &AggregateView) -> Self {
        Self {
            labels: view.groups.iter().map(|g| g.key.clone()).collect(),
            series: vec![(
                "Average".to_string(),
                view.groups.iter().map(|g| g.average).collect(),
            )],
        }
    }

    /// Four bars per group: Math, Reading, Writing and Average.
    pub fn all_metrics(view: &AggregateView) -> Self {
        let series = METRIC_COLUMNS
            .iter()
            .enumerate()
            .map(|(slot, name)| {
                let values = view.groups.iter().map(|g| g.metrics()[slot]).collect();
                (name.to_string(), values)
            })
            .collect();
        Self {
            labels: view.groups.iter().map(|g| g.key.clone()).collect(),
            series,
        }
    }

    /// One bar per band, in band order.
    pub fn band_counts(bands: &BandCounts) -> Self {
        Self {
            labels: bands.counts.iter().map(|(band, _)| band.to_string()).collect(),
            series: vec![(
                "Count".to_string(),
                bands.counts.iter().map(|(_, count)| *count as f64).collect(),
            )],
        }
    }

    /// Largest value across all series, or zero when empty.
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Outcome of rendering one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub kind: ChartKind,
    /// Written image, or `None` when rendering failed.
    pub path: Option<PathBuf>,
}

/// Writes the dashboard charts into a directory.
pub struct ChartRenderer {
    plots_dir: PathBuf,
    size: (u32, u32),
}

impl ChartRenderer {
    pub fn new(plots_dir: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            plots_dir: plots_dir.into(),
            size,
        }
    }

    /// Render all four charts. The result always has one entry per chart.
    pub fn render_all(&self, summary: &DashboardSummary) -> Vec<RenderedChart> {
        if let Err(e) = fs::create_dir_all(&self.plots_dir) {
            warn!(
                "Cannot create plots directory '{}': {}; skipping charts",
                self.plots_dir.display(),
                e
            );
            return ChartKind::ALL
                .into_iter()
                .map(|kind| RenderedChart { kind, path: None })
                .collect();
        }

        let charts: Vec<RenderedChart> = ChartKind::ALL
            .into_iter()
            .map(|kind| {
                let path = match self.render(kind, &kind.series(summary)) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                };
                RenderedChart { kind, path }
            })
            .collect();

        let written = charts.iter().filter(|c| c.path.is_some()).count();
        info!("Rendered {}/{} charts into '{}'", written, charts.len(), self.plots_dir.display());
        charts
    }

    /// Render one chart and return the written file.
    pub fn render(&self, kind: ChartKind, data: &ChartSeries) -> Result<PathBuf, DashboardError> {
        let path = self.plots_dir.join(kind.file_name());
        draw_bars(&path, self.size, kind, data).map_err(|e| DashboardError::ChartRender {
            chart: kind.title().to_string(),
            reason: e.to_string(),
        })?;
        debug!("Wrote chart '{}'", path.display());
        Ok(path)
    }
}

/// Draw grouped vertical bars.
///
/// Each category owns `series + 1` segments on the x axis: one per series
/// and one empty segment as the gap before the next category.
fn draw_bars(path: &Path, size: (u32, u32), kind: ChartKind, data: &ChartSeries) -> DrawResult {
    let slots = data.series.len() as i32 + 1;
    let segments = (data.labels.len() as i32 * slots).max(1);
    let label_slot = (slots - 2) / 2;
    let y_max = match data.max_value() {
        max if max > 0.0 => max * 1.15,
        _ => 1.0,
    };

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(kind.title(), ("sans-serif", 26))
        .margin(12)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..segments).into_segmented(), 0f64..y_max)?;

    let labels = &data.labels;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(segments as usize)
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(segment) if segment % slots == label_slot => labels
                .get((segment / slots) as usize)
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc(kind.y_label())
        .draw()?;

    let colors = kind.colors();
    for (offset, (name, values)) in data.series.iter().enumerate() {
        let color = colors[offset % colors.len()];
        let bars = values
            .iter()
            .enumerate()
            .map(|(category, value)| (category as i32 * slots + offset as i32, *value));
        let drawn = chart.draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(2)
                .data(bars),
        )?;
        if data.series.len() > 1 {
            drawn
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }
    }

    if data.series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
