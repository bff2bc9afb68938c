use std::io::Cursor;

use chartbox_core::{ChartRenderer, GraphData, GraphKind, RenderError, RenderOptions};
use image::{ImageOutputFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;

/// Colors cycled across datasets.
const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(54, 102, 204),
    RGBColor(219, 68, 55),
    RGBColor(244, 180, 0),
    RGBColor(15, 157, 88),
    RGBColor(171, 71, 188),
    RGBColor(0, 172, 193),
];

/// Renders graphs to PNG with the plotters crate.
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(
        &self,
        title: &str,
        kind: GraphKind,
        labels: &[String],
        data: &GraphData,
        options: RenderOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let RenderOptions { width, height } = options;
        let mut buffer = vec![0u8; (width * height * 3) as usize];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(to_draw_error)?;

            match kind {
                GraphKind::Line => draw_lines(&root, title, labels, data)?,
                GraphKind::Bar => draw_bars(&root, title, labels, data)?,
                GraphKind::Pie => draw_pie(&root, title, labels, data)?,
            }

            root.present().map_err(to_draw_error)?;
        }

        encode_png(width, height, buffer)
    }
}

fn draw_lines(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    labels: &[String],
    data: &GraphData,
) -> Result<(), RenderError> {
    let (y_min, y_max) = value_bounds(data, false);
    let x_range = -0.5..labels.len() as f64 - 0.5;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_min..y_max)
        .map_err(to_draw_error)?;

    let formatter = |x: &f64| label_at(labels, *x);

    chart
        .configure_mesh()
        .x_labels(labels.len().min(12))
        .x_label_formatter(&formatter)
        .draw()
        .map_err(to_draw_error)?;

    let series = data.series();
    let with_legend = series.iter().any(|(name, _)| name.is_some());

    for (index, (name, values)) in series.iter().enumerate() {
        let color = SERIES_COLORS[index % SERIES_COLORS.len()];
        let points = values.iter().enumerate().map(|(i, v)| (i as f64, *v));

        let drawn = chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(to_draw_error)?;

        if let Some(name) = name {
            drawn.label(*name).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
        }
    }

    if with_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(to_draw_error)?;
    }

    Ok(())
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    labels: &[String],
    data: &GraphData,
) -> Result<(), RenderError> {
    let (y_min, y_max) = value_bounds(data, true);
    let x_range = -0.5..labels.len() as f64 - 0.5;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_min..y_max)
        .map_err(to_draw_error)?;

    let formatter = |x: &f64| label_at(labels, *x);

    chart
        .configure_mesh()
        .x_labels(labels.len().min(12))
        .x_label_formatter(&formatter)
        .draw()
        .map_err(to_draw_error)?;

    let series = data.series();
    let with_legend = series.iter().any(|(name, _)| name.is_some());
    let slot = 0.8 / series.len() as f64;

    for (index, (name, values)) in series.iter().enumerate() {
        let color = SERIES_COLORS[index % SERIES_COLORS.len()];

        let bars = values.iter().enumerate().map(|(i, v)| {
            let left = i as f64 - 0.4 + index as f64 * slot;
            Rectangle::new([(left, 0.), (left + slot, *v)], color.filled())
        });

        let drawn = chart.draw_series(bars).map_err(to_draw_error)?;

        if let Some(name) = name {
            drawn.label(*name).legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled())
            });
        }
    }

    if with_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(to_draw_error)?;
    }

    Ok(())
}

fn draw_pie(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    labels: &[String],
    data: &GraphData,
) -> Result<(), RenderError> {
    let values = match data {
        GraphData::Single(values) => values.as_slice(),
        GraphData::Multi(_) => {
            return Err(RenderError::Draw(
                "pie graphs require a single series".to_string(),
            ))
        }
    };

    if values.iter().sum::<f64>() <= 0. {
        return Err(RenderError::Draw(
            "pie has no slices with a positive value".to_string(),
        ));
    }

    let root = root
        .titled(title, ("sans-serif", 30).into_font())
        .map_err(to_draw_error)?;

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = width.min(height) as f64 * 0.35;

    let colors: Vec<RGBColor> = (0..values.len())
        .map(|i| SERIES_COLORS[i % SERIES_COLORS.len()])
        .collect();

    let mut pie = Pie::new(&center, &radius, values, &colors, labels);
    pie.label_style(("sans-serif", 18).into_font());

    root.draw(&pie).map_err(to_draw_error)?;

    Ok(())
}

/// The y axis bounds for the given data, padded so the extremes don't sit on
/// the chart edge. Bars are anchored at zero, so their range must include it.
fn value_bounds(data: &GraphData, include_zero: bool) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for (_, values) in data.series() {
        for value in values {
            min = min.min(*value);
            max = max.max(*value);
        }
    }

    if include_zero {
        min = min.min(0.);
        max = max.max(0.);
    }

    if min == max {
        return (min - 1., max + 1.);
    }

    let padding = (max - min) * 0.05;
    (min - padding, max + padding)
}

fn label_at(labels: &[String], position: f64) -> String {
    let index = position.round();

    if (position - index).abs() > 0.25 || index < 0. {
        return String::new();
    }

    labels.get(index as usize).cloned().unwrap_or_default()
}

fn encode_png(width: u32, height: u32, buffer: Vec<u8>) -> Result<Vec<u8>, RenderError> {
    let image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| RenderError::Encode("pixel buffer size mismatch".to_string()))?;

    let mut bytes = Cursor::new(Vec::new());

    image
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok(bytes.into_inner())
}

fn to_draw_error<E: std::error::Error>(error: E) -> RenderError {
    RenderError::Draw(error.to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use chartbox_core::Dataset;

    #[test]
    fn test_value_bounds_pads_the_range() {
        let data = GraphData::Single(vec![10., 20.]);
        let (min, max) = value_bounds(&data, false);

        assert!(min < 10. && min > 9.);
        assert!(max > 20. && max < 21.);
    }

    #[test]
    fn test_value_bounds_spans_all_series() {
        let data = GraphData::Multi(vec![
            Dataset {
                label: "A".to_string(),
                values: vec![-5., 0.],
            },
            Dataset {
                label: "B".to_string(),
                values: vec![3., 8.],
            },
        ]);

        let (min, max) = value_bounds(&data, false);
        assert!(min < -5.);
        assert!(max > 8.);
    }

    #[test]
    fn test_bar_bounds_include_zero() {
        let data = GraphData::Single(vec![5., 10.]);
        let (min, _) = value_bounds(&data, true);

        assert!(min <= 0.);
    }

    #[test]
    fn test_flat_data_still_has_a_range() {
        let data = GraphData::Single(vec![4., 4.]);
        let (min, max) = value_bounds(&data, false);

        assert_eq!((min, max), (3., 5.));
    }

    #[test]
    fn test_labels_only_at_whole_positions() {
        let labels = vec!["Jan".to_string(), "Feb".to_string()];

        assert_eq!(label_at(&labels, 1.), "Feb");
        assert_eq!(label_at(&labels, 0.1), "Jan");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 5.), "");
    }
}
