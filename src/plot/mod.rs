//! Volcano plot rendering
//!
//! X axis is log2FC, Y axis is |delta| (|treat - ctrl|), a stand-in for a
//! significance score since no test statistic is computed. Points are
//! coloured by direction, with dashed guides at ±fc_threshold.

use std::error::Error;
use std::ops::Range;
use std::path::Path;

use plotters::prelude::*;

use crate::diffexpr::{DiffResults, Direction, LOG2FC_THRESHOLD};
use crate::error::{BioflowError, Result};

/// Rendering options for [`plot_volcano`]
#[derive(Debug, Clone)]
pub struct VolcanoConfig {
    /// Position of the vertical guide lines
    pub fc_threshold: f64,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Point radius in pixels
    pub point_size: u32,
}

impl Default for VolcanoConfig {
    fn default() -> Self {
        Self {
            fc_threshold: LOG2FC_THRESHOLD,
            width: 2400,
            height: 1800,
            point_size: 6,
        }
    }
}

/// One plotted gene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolcanoPoint {
    pub log2_fold_change: f64,
    pub abs_delta: f64,
    pub direction: Direction,
}

/// Points to plot; genes with a non-finite coordinate are skipped
pub fn volcano_points(results: &DiffResults) -> Vec<VolcanoPoint> {
    results
        .log2_fold_changes
        .iter()
        .zip(results.delta.iter())
        .zip(results.directions.iter())
        .filter(|((lfc, delta), _)| lfc.is_finite() && delta.is_finite())
        .map(|((&lfc, &delta), &direction)| VolcanoPoint {
            log2_fold_change: lfc,
            abs_delta: delta.abs(),
            direction,
        })
        .collect()
}

/// Colour for a direction: red up, blue down, grey unchanged
pub fn direction_color(direction: Direction) -> RGBColor {
    match direction {
        Direction::Up => RGBColor(220, 20, 20),
        Direction::Down => RGBColor(20, 60, 220),
        Direction::Unchanged => RGBColor(150, 150, 150),
    }
}

/// Axis ranges: x symmetric around zero and wide enough to show the
/// threshold guides, y from zero with a little headroom
pub fn axis_ranges(points: &[VolcanoPoint], fc_threshold: f64) -> (Range<f64>, Range<f64>) {
    let max_x = points
        .iter()
        .map(|p| p.log2_fold_change.abs())
        .fold(fc_threshold.abs(), f64::max)
        .max(1.0)
        * 1.1;
    let max_y = points.iter().map(|p| p.abs_delta).fold(0.0, f64::max);
    let max_y = if max_y > 0.0 { max_y * 1.05 } else { 1.0 };
    (-max_x..max_x, 0.0..max_y)
}

/// Render the volcano plot of a result table to a PNG file
pub fn plot_volcano<P: AsRef<Path>>(
    results: &DiffResults,
    output_path: P,
    config: &VolcanoConfig,
) -> Result<()> {
    let points = volcano_points(results);
    log::debug!(
        "Plotting {} of {} genes to {}",
        points.len(),
        results.n_genes(),
        output_path.as_ref().display()
    );
    draw_volcano(&points, output_path.as_ref(), config).map_err(|e| BioflowError::Plot {
        reason: e.to_string(),
    })
}

fn draw_volcano(
    points: &[VolcanoPoint],
    output_path: &Path,
    config: &VolcanoConfig,
) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_range, y_range) = axis_ranges(points, config.fc_threshold);
    let (y_min, y_max) = (y_range.start, y_range.end);

    let mut chart = ChartBuilder::on(&root)
        .caption("Volcano Plot", ("sans-serif", 48))
        .x_label_area_size(80)
        .y_label_area_size(100)
        .margin(30)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("log2 Fold Change (log2FC)")
        .y_desc("|Delta| (proxy for significance)")
        .label_style(("sans-serif", 28))
        .axis_desc_style(("sans-serif", 32))
        .draw()?;

    // Dashed threshold guides
    let n_dashes = 40;
    let dash = (y_max - y_min) / (2 * n_dashes) as f64;
    for x in [config.fc_threshold, -config.fc_threshold] {
        chart.draw_series((0..n_dashes).map(|k| {
            let y0 = y_min + (2 * k) as f64 * dash;
            PathElement::new(vec![(x, y0), (x, y0 + dash)], BLACK.stroke_width(2))
        }))?;
    }

    for direction in [Direction::Up, Direction::Down, Direction::Unchanged] {
        let color = direction_color(direction);
        let size = config.point_size;
        chart
            .draw_series(
                points
                    .iter()
                    .filter(|p| p.direction == direction)
                    .map(|p| Circle::new((p.log2_fold_change, p.abs_delta), size, color.mix(0.8).filled())),
            )?
            .label(direction.as_str())
            .legend(move |(x, y)| Circle::new((x, y), size, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", 28))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> DiffResults {
        DiffResults {
            gene_ids: Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
            ctrl: vec![1.0, 8.0, 1.0, -1.0],
            treat: vec![16.0, 2.0, 1.2, 1.0],
            delta: vec![15.0, -6.0, 0.2, 2.0],
            fold_change: vec![16.0, 0.25, 1.2, -1.0],
            log2_fold_changes: vec![4.0, -2.0, 0.263, f64::NAN],
            directions: vec![
                Direction::Up,
                Direction::Down,
                Direction::Unchanged,
                Direction::Unchanged,
            ],
        }
    }

    #[test]
    fn test_points_skip_undefined_fold_changes() {
        let points = volcano_points(&results());
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].abs_delta, 6.0);
        assert_eq!(points[1].direction, Direction::Down);
    }

    #[test]
    fn test_axis_ranges_cover_points_and_guides() {
        let points = volcano_points(&results());
        let (x, y) = axis_ranges(&points, 1.0);
        assert!(x.start < -4.0 && x.end > 4.0);
        assert_eq!(x.start, -x.end);
        assert_eq!(y.start, 0.0);
        assert!(y.end > 15.0);
    }

    #[test]
    fn test_axis_ranges_without_points() {
        let (x, y) = axis_ranges(&[], 1.0);
        assert!(x.end >= 1.0);
        assert_eq!(y, 0.0..1.0);
    }

    #[test]
    fn test_direction_colors_are_distinct() {
        let up = direction_color(Direction::Up);
        let down = direction_color(Direction::Down);
        let flat = direction_color(Direction::Unchanged);
        assert_ne!((up.0, up.1, up.2), (down.0, down.1, down.2));
        assert_ne!((down.0, down.1, down.2), (flat.0, flat.1, flat.2));
    }
}
