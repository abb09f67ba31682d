use std::{collections::BTreeMap, fs, path::Path};

use eyre::{Context, ContextCompat, Result, ensure};
use itertools::Itertools;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::stats::AggregatedSeries;

/// Figure geometry and typography. Owned by the config and passed down by
/// reference, so two renders in one process cannot interfere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub tick_size: u32,
    pub line_width: u32,
    pub marker_size: u32,
    pub band_alpha: f64,
    pub palette: Palette,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            width: 960,
            height: 420,
            font_size: 14,
            tick_size: 12,
            line_width: 2,
            marker_size: 4,
            band_alpha: 0.2,
            palette: Palette::default(),
        }
    }
}

/// Named interconnect colors, "<name>2" being the light variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette(BTreeMap<String, String>);

impl Default for Palette {
    fn default() -> Self {
        let entries = [
            ("eth", "#FAB900"),
            ("eth2", "#FFC92E"),
            ("dis", "#389E9B"),
            ("dis2", "#4ABFBB"),
            ("ssocks", "#DD0001"),
            ("ssocks2", "#FF1112"),
            ("sisci", "#CF24AA"),
            ("sisci2", "#DF47BE"),
            ("ib", "#76B900"),
            ("ib2", "#97EC00"),
        ];
        Self(
            entries
                .iter()
                .map(|(name, hex)| (name.to_string(), hex.to_string()))
                .collect(),
        )
    }
}

impl Palette {
    pub fn color(&self, name: &str) -> Result<RGBColor> {
        let hex = self
            .0
            .get(name)
            .wrap_err_with(|| format!("unknown palette color {name:?}"))?;
        parse_hex(hex)
    }
}

fn parse_hex(hex: &str) -> Result<RGBColor> {
    let digits = hex.trim_start_matches('#');
    ensure!(digits.len() == 6, "bad hex color {hex:?}");
    let parse = |range| {
        u8::from_str_radix(&digits[range], 16).wrap_err_with(|| format!("bad hex color {hex:?}"))
    };
    Ok(RGBColor(parse(0..2)?, parse(2..4)?, parse(4..6)?))
}

/// Shaded area around a series' mean line.
#[derive(Debug, Clone, Copy)]
pub enum Band<'a> {
    None,
    /// ±1 standard deviation of the aggregated samples.
    StdDev,
    /// Explicit half-widths, e.g. a companion deviation metric.
    Values(&'a [f64]),
}

pub struct DataSeries<'a> {
    pub label: &'a str,
    pub color: RGBColor,
    pub data: &'a AggregatedSeries,
    pub band: Band<'a>,
}

pub struct Figure<'a> {
    pub out_file: &'a Path,
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Power-of-two tick range of the x axis, e.g. (6, 24) for 64 B..16 MiB.
    pub exp_range: (u32, u32),
}

/// Power-of-two tick label in the original figures' byte style.
pub fn byte_label(exp: i32) -> String {
    let bytes = 1u64 << exp.clamp(0, 63);
    if bytes >= 1 << 30 {
        format!("{} GiB", bytes >> 30)
    } else if bytes >= 1 << 20 {
        format!("{} MiB", bytes >> 20)
    } else if bytes >= 1 << 10 {
        format!("{} KiB", bytes >> 10)
    } else {
        format!("{bytes} B")
    }
}

fn size_exponent(size: u64) -> i32 {
    (size.max(1) as f64).log2().round() as i32
}

fn band_widths(series: &DataSeries<'_>) -> Option<Vec<f64>> {
    match series.band {
        Band::None => None,
        Band::StdDev => Some(series.data.std_dev.clone()),
        Band::Values(values) => Some(values.to_vec()),
    }
}

/// Render one log₂-x line chart: mean lines with circle markers, optional
/// shaded deviation bands, and a frameless legend. Parent directories of
/// the output file are created as needed.
pub fn line_chart(figure: &Figure<'_>, series: &[DataSeries<'_>], style: &Style) -> Result<()> {
    ensure!(
        series.iter().any(|s| !s.data.is_empty()),
        "no data for {}",
        figure.out_file.display()
    );
    if let Some(parent) = figure.out_file.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("create plot directory {}", parent.display()))?;
    }

    let y_top = series
        .iter()
        .flat_map(|s| {
            let band = band_widths(s).unwrap_or_default();
            s.data
                .mean
                .iter()
                .enumerate()
                .map(move |(i, mean)| mean + band.get(i).copied().unwrap_or(0.0))
                .collect::<Vec<_>>()
        })
        .minmax()
        .into_option()
        .map(|(_, max)| max)
        .unwrap_or(1.0);
    let y_max = if y_top > 0.0 { y_top * 1.05 } else { 1.0 };

    let (x0, x1) = (figure.exp_range.0 as i32, figure.exp_range.1 as i32);
    let root = SVGBackend::new(figure.out_file, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels((x1 - x0 + 1) as usize)
        .x_label_formatter(&|exp| byte_label(*exp))
        .y_label_formatter(&|y| format!("{y:.1}"))
        .x_desc(figure.x_label)
        .y_desc(figure.y_label)
        .axis_desc_style(("sans-serif", style.font_size).into_font())
        .label_style(("sans-serif", style.tick_size).into_font())
        .bold_line_style(RGBColor(200, 200, 200).mix(0.4).stroke_width(1))
        .light_line_style(&WHITE)
        .draw()?;

    for entry in series {
        let points: Vec<(i32, f64)> = entry
            .data
            .sizes
            .iter()
            .zip(&entry.data.mean)
            .map(|(&size, &mean)| (size_exponent(size), mean))
            .collect();

        if let Some(widths) = band_widths(entry) {
            let mut area: Vec<(i32, f64)> = points
                .iter()
                .zip(&widths)
                .map(|(&(x, mean), width)| (x, mean + width))
                .collect();
            area.extend(
                points
                    .iter()
                    .zip(&widths)
                    .rev()
                    .map(|(&(x, mean), width)| (x, (mean - width).max(0.0))),
            );
            chart.draw_series(std::iter::once(Polygon::new(
                area,
                entry.color.mix(style.band_alpha).filled(),
            )))?;
        }

        let color = entry.color;
        let line_width = style.line_width;
        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(line_width),
            ))?
            .label(entry.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(line_width))
            });
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), style.marker_size as i32, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(&TRANSPARENT)
        .background_style(WHITE.mix(0.6).filled())
        .label_font(("sans-serif", style.font_size).into_font())
        .draw()?;

    root.present()
        .wrap_err_with(|| format!("write {}", figure.out_file.display()))?;
    info!("Saved figure to {}", figure.out_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_labels_pick_the_largest_unit() {
        assert_eq!(byte_label(6), "64 B");
        assert_eq!(byte_label(12), "4 KiB");
        assert_eq!(byte_label(20), "1 MiB");
        assert_eq!(byte_label(33), "8 GiB");
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex("#389E9B").unwrap(), RGBColor(0x38, 0x9E, 0x9B));
        assert!(parse_hex("#39").is_err());
    }

    #[test]
    fn palette_knows_the_interconnects() {
        let palette = Palette::default();
        for name in ["eth", "dis", "ssocks", "sisci", "ib", "ib2"] {
            palette.color(name).unwrap();
        }
        assert!(palette.color("rainbow").is_err());
    }
}
