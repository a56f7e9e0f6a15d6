use std::fs;
use std::path::Path;

use anyhow::Context;
use plotters::prelude::*;

use crate::results::ResultTable;

/// One drawable line series: every row sharing a mode/threshold pair,
/// ordered by distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub obss_pd_enabled: bool,
    pub obss_pd_threshold: Option<f64>,
    pub label: String,
    /// (distance, mean, half_width) triples in ascending distance order.
    pub points: Vec<(f64, f64, f64)>,
}

fn series_label(enabled: bool, threshold: Option<f64>) -> String {
    match (enabled, threshold) {
        (true, Some(threshold)) => format!("OBSS_PD Enabled threshold = {threshold} dBm"),
        (true, None) => "OBSS_PD Enabled".to_string(),
        (false, _) => "OBSS_PD Disabled".to_string(),
    }
}

/// Groups the table by mode and threshold, keeping first-appearance order
/// (which is sweep order for tables straight out of a run). Rows without an
/// estimate are skipped; a group left with no points yields no series at
/// all.
pub fn group_series(table: &ResultTable) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();

    for row in table.rows() {
        let enabled = row.params.obss_pd_enabled;
        let threshold = row.params.obss_pd_threshold;

        let position = series
            .iter()
            .position(|s| s.obss_pd_enabled == enabled && s.obss_pd_threshold == threshold);
        let idx = match position {
            Some(idx) => idx,
            None => {
                series.push(Series {
                    obss_pd_enabled: enabled,
                    obss_pd_threshold: threshold,
                    label: series_label(enabled, threshold),
                    points: Vec::new(),
                });
                series.len() - 1
            }
        };
        let entry = &mut series[idx];

        if let Some(estimate) = row.estimate {
            entry.points.push((
                row.params.distance,
                estimate.mean,
                estimate.half_width,
            ));
        }
    }

    series.retain(|s| !s.points.is_empty());
    for s in &mut series {
        s.points
            .sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    series
}

/// Renders the aggregated table as a PNG: one line per mode/threshold group
/// across distance, each point carrying a vertical error bar of plus/minus
/// the confidence half-width.
pub fn render_chart(table: &ResultTable, confidence: u8, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let series = group_series(table);

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y_max = 0.0_f64;
    for s in &series {
        for &(x, mean, half_width) in &s.points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_max = y_max.max(mean + half_width);
        }
    }
    if series.is_empty() {
        x_min = 0.0;
        x_max = 1.0;
    }
    if x_max <= x_min {
        x_min -= 1.0;
        x_max += 1.0;
    }
    let y_max = (y_max * 1.05).max(1.0);

    let root = BitMapBackend::new(path, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!("Throughput vs. Distance with {confidence}% CI");
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 34).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Distance (m)")
        .y_desc("Throughput (Mbps)")
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();

        chart
            .draw_series(LineSeries::new(
                s.points.iter().map(|&(x, mean, _)| (x, mean)),
                color.stroke_width(2),
            ))?
            .label(s.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });

        chart.draw_series(s.points.iter().map(|&(x, mean, half_width)| {
            ErrorBar::new_vertical(
                x,
                mean - half_width,
                mean,
                mean + half_width,
                color.filled(),
                6,
            )
        }))?;
    }

    if !series.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()
        .with_context(|| format!("failed to write chart to {}", path.display()))?;
    Ok(())
}
