//! Comparative BLER chart rendering

use std::path::Path;

use plotters::prelude::*;

use crate::{Error, SweepResults};

/// Floor below which BLER values are clamped on the logarithmic axis
///
/// A zero or near-zero estimate would otherwise fall off the chart; clamping keeps the point
/// visible at the bottom edge instead of dropping it.
const BLER_FLOOR: f64 = 1e-6;

/// Chart dimensions in pixels
const CHART_SIZE: (u32, u32) = (1280, 720);

const PURPLE: RGBColor = RGBColor(128, 0, 128);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// Curve colors, assigned by code-size position and cycled
const CURVE_COLORS: [RGBColor; 5] = [BLUE, GREEN, RED, PURPLE, ORANGE];

/// Renders one BLER-versus-SNR curve per code size to a PNG file.
///
/// Curves are drawn in `code_sizes` order on a linear-SNR, logarithmic-BLER chart spanning the
/// sweep's SNR bounds, each with a color and marker shape fixed by its position and a legend
/// entry naming its code size.
///
/// # Errors
///
/// Returns an error if the results hold no code sizes or no SNR values, or if drawing or writing
/// the image fails.
pub fn render_bler_chart(results: &SweepResults, path: &Path) -> Result<(), Error> {
    if results.snr_values.is_empty() || results.code_sizes.is_empty() {
        return Err(Error::InvalidInput(
            "Results hold no curves to render".to_string(),
        ));
    }
    let x_min = results.snr_values[0];
    let x_max = results.snr_values[results.snr_values.len() - 1];

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("BLER vs SNR ({} iterations per point)", results.iterations),
            ("sans-serif", 34).into_font(),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min .. x_max, (BLER_FLOOR .. 1.0f64).log_scale())
        .map_err(draw_error)?;
    chart
        .configure_mesh()
        .x_desc("SNR (dB)")
        .y_desc("BLER")
        .draw()
        .map_err(draw_error)?;

    for (index, &code_size) in results.code_sizes.iter().enumerate() {
        let Some(blers) = results.blers_for(code_size) else {
            continue;
        };
        let color = CURVE_COLORS[index % CURVE_COLORS.len()];
        let points = series_points(&results.snr_values, blers);
        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(draw_error)?
            .label(format!("n = {code_size}"))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 25, y)], color.stroke_width(3))
            });
        match index % 3 {
            0 => chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            ),
            1 => chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| TriangleMarker::new((x, y), 5, color.filled())),
            ),
            _ => chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Cross::new((x, y), 4, color.stroke_width(2))),
            ),
        }
        .map_err(draw_error)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.7))
        .draw()
        .map_err(draw_error)?;
    root.present().map_err(draw_error)?;
    Ok(())
}

/// Returns the plotted points for one curve, clamped to the BLER floor.
fn series_points(snr_values: &[f64], blers: &[f64]) -> Vec<(f64, f64)> {
    snr_values
        .iter()
        .zip(blers)
        .map(|(&snr_db, &bler)| (snr_db, bler.max(BLER_FLOOR)))
        .collect()
}

/// Maps a plotters error into the crate error type.
fn draw_error<E: std::fmt::Display>(error: E) -> Error {
    Error::ChartRenderError(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use std::collections::BTreeMap;

    #[test]
    fn test_series_points_clamp_to_floor() {
        let snr_values = [-2.0, -1.0, 0.0, 1.0];
        let blers = [0.5, 1e-6, 1e-9, 0.0];
        let points = series_points(&snr_values, &blers);
        assert_eq!(points.len(), 4);
        for (point, &snr_db) in points.iter().zip(&snr_values) {
            assert_float_eq!(point.0, snr_db, abs <= 1e-12);
        }
        assert_float_eq!(points[0].1, 0.5, abs <= 1e-12);
        assert_float_eq!(points[1].1, 1e-6, abs <= 1e-18);
        // Values below the floor stay visible at the floor.
        assert_float_eq!(points[2].1, BLER_FLOOR, abs <= 1e-18);
        assert_float_eq!(points[3].1, BLER_FLOOR, abs <= 1e-18);
    }

    #[test]
    fn test_render_rejects_empty_results() {
        let results = SweepResults {
            snr_values: Vec::new(),
            code_sizes: Vec::new(),
            results: BTreeMap::new(),
            iterations: 10,
        };
        assert!(render_bler_chart(&results, Path::new("unused.png")).is_err());
    }
}
