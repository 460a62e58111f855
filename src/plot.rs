//! Figures for the mixture experiment
//!
//! Writes `<name>_posteriors.png` (data vs recovered density and the
//! marginal posteriors) and `<name>_traces.png` (per-component traces).

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::density::GaussianKde;
use crate::error::{Result, SysIdError};
use crate::posterior::Trace;
use crate::results::MixtureResults;

/// ColorBrewer Dark2, 8 classes
const DARK2: [RGBColor; 8] = [
    RGBColor(27, 158, 119),
    RGBColor(217, 95, 2),
    RGBColor(117, 112, 179),
    RGBColor(231, 41, 138),
    RGBColor(102, 166, 30),
    RGBColor(230, 171, 2),
    RGBColor(166, 118, 29),
    RGBColor(102, 102, 102),
];

const DENSITY_POINTS: usize = 200;

struct Series {
    points: Vec<(f64, f64)>,
    color: RGBColor,
}

fn plot_err<E: std::fmt::Display>(error: E) -> SysIdError {
    SysIdError::Plot(error.to_string())
}

fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }

    let pad = ((hi - lo) * 0.05).max(1e-6);
    (lo - pad)..(hi + pad)
}

/// Smoothed marginal posterior of one set of draws
fn posterior_density(draws: &[f64], color: RGBColor) -> Option<Series> {
    let kde = GaussianKde::new(draws).ok()?;
    let span = padded_range(draws.iter().copied());
    let lo = span.start - 3.0 * kde.bandwidth();
    let hi = span.end + 3.0 * kde.bandwidth();

    let points = (0..=DENSITY_POINTS)
        .map(|k| {
            let x = lo + (hi - lo) * k as f64 / DENSITY_POINTS as f64;
            (x, kde.density(x))
        })
        .collect();
    Some(Series { points, color })
}

fn component_densities(trace: &Trace, color_offset: usize) -> Vec<Series> {
    (0..trace.components())
        .filter_map(|k| {
            let draws = trace.component(k)?;
            posterior_density(&draws, DARK2[(k + color_offset) % DARK2.len()])
        })
        .collect()
}

fn trace_series(trace: &Trace, k: usize, color: RGBColor) -> Vec<Series> {
    trace
        .component(k)
        .map(|draws| Series {
            points: draws
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i as f64, v))
                .collect(),
            color,
        })
        .into_iter()
        .collect()
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x_desc: &str,
    y_desc: &str,
    series: &[Series],
) -> Result<()> {
    let x_range = padded_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
    let y_range = padded_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()
        .map_err(plot_err)?;

    for s in series {
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), &s.color))
            .map_err(plot_err)?;
    }
    Ok(())
}

fn plot_posteriors(results: &MixtureResults, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1280, 960)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let (top, bottom) = root.split_vertically(320);
    let densities = [
        Series {
            points: results
                .grid_points
                .iter()
                .copied()
                .zip(results.kernel_density_estimate.iter().copied())
                .collect(),
            color: BLUE,
        },
        Series {
            points: results
                .grid_points
                .iter()
                .copied()
                .zip(results.mcmc_density_estimate.iter().copied())
                .collect(),
            color: GREEN,
        },
    ];
    draw_panel(&top, "x", "p(x)", &densities)?;

    let panels = bottom.split_evenly((2, 2));
    draw_panel(&panels[0], "mu", "posterior estimate", &component_densities(&results.mu, 0))?;
    draw_panel(
        &panels[1],
        "sigma",
        "posterior estimate",
        &component_densities(&results.sigma, 0),
    )?;
    draw_panel(
        &panels[2],
        "sigma0",
        "posterior estimate",
        &component_densities(&results.sigma0, 6),
    )?;
    draw_panel(&panels[3], "e0", "posterior estimate", &component_densities(&results.e0, 7))?;

    root.present().map_err(plot_err)?;
    Ok(())
}

fn plot_traces(results: &MixtureResults, path: &Path) -> Result<()> {
    let rows = results
        .mu
        .components()
        .max(results.sigma.components())
        .max(1);

    let root = BitMapBackend::new(path, (1280, 200 * rows as u32)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let panels = root.split_evenly((rows, 2));
    for k in 0..rows {
        let color = DARK2[k % DARK2.len()];
        draw_panel(&panels[2 * k], "mu", "Trace", &trace_series(&results.mu, k, color))?;
        draw_panel(
            &panels[2 * k + 1],
            "sigma",
            "Trace",
            &trace_series(&results.sigma, k, color),
        )?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Render both mixture figures into `dir`, returning the posterior and trace paths
pub fn plot_mixture_results(results: &MixtureResults, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;
    let posteriors_path = dir.join(format!("{}_posteriors.png", results.name));
    let traces_path = dir.join(format!("{}_traces.png", results.name));

    plot_posteriors(results, &posteriors_path)?;
    plot_traces(results, &traces_path)?;

    info!(
        posteriors = %posteriors_path.display(),
        traces = %traces_path.display(),
        "wrote mixture figures"
    );
    Ok((posteriors_path, traces_path))
}
