use std::path::PathBuf;

use common::{
    MB_TO_GB,
    chart::Chart,
    config::Settings,
    loader::{MetricPath, SourceFormat, ValueKind, load},
    render::{Band, DataSeries, Figure, line_chart},
    stats::{AggregatedSeries, aggregate},
};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// One qperf CSV directory: an interconnect's repeated sweeps plus the
/// column its transport reports (tcp_bw/rc_bw, tcp_lat/rc_lat).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QperfSource {
    pub label: String,
    pub color: String,
    pub data: PathBuf,
    pub column: String,
}

fn default_size_column() -> String {
    "msg_size".to_owned()
}

fn load_sources(
    sources: &[QperfSource],
    size_column: &str,
    settings: &Settings,
    scale: f64,
) -> Result<Vec<AggregatedSeries>> {
    let format = SourceFormat::Csv {
        size_column: size_column.to_owned(),
    };
    sources
        .iter()
        .map(|source| {
            let series = load(
                &settings.data_path(&source.data),
                &format,
                &MetricPath::new(&source.column),
                ValueKind::Plain,
            )?;
            Ok(aggregate(&series).scale(scale))
        })
        .collect()
}

fn render_sources(
    sources: &[QperfSource],
    aggregated: &[AggregatedSeries],
    figure: &Figure<'_>,
    settings: &Settings,
) -> Result<()> {
    let series = sources
        .iter()
        .zip(aggregated)
        .map(|(source, data)| {
            Ok(DataSeries {
                label: &source.label,
                color: settings.style.palette.color(&source.color)?,
                data,
                band: Band::StdDev,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    line_chart(figure, &series, &settings.style)
}

/// qperf streaming bandwidth vs message size for the compared
/// interconnects, MB/s converted to GB/s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QperfBandwidth {
    pub sources: Vec<QperfSource>,
    #[serde(default = "default_size_column")]
    pub size_column: String,
    #[serde(default = "bandwidth_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "bandwidth_out_file")]
    pub out_file: PathBuf,
}

fn bandwidth_exp_range() -> (u32, u32) {
    (2, 24)
}

fn bandwidth_out_file() -> PathBuf {
    PathBuf::from("qperf_bw.svg")
}

impl Default for QperfBandwidth {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            size_column: default_size_column(),
            exp_range: bandwidth_exp_range(),
            out_file: bandwidth_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for QperfBandwidth {
    fn name(&self) -> &'static str {
        "qperf-bandwidth"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let aggregated = load_sources(&self.sources, &self.size_column, settings, MB_TO_GB)?;
        render_sources(
            &self.sources,
            &aggregated,
            &Figure {
                out_file: &settings.out_path(&self.out_file),
                x_label: "Message size [bytes]",
                y_label: "Bandwidth [GB/s]",
                exp_range: self.exp_range,
            },
            settings,
        )
    }
}

/// qperf round-trip latency vs message size, in µs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QperfLatency {
    pub sources: Vec<QperfSource>,
    #[serde(default = "default_size_column")]
    pub size_column: String,
    #[serde(default = "latency_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "latency_out_file")]
    pub out_file: PathBuf,
}

fn latency_exp_range() -> (u32, u32) {
    (2, 16)
}

fn latency_out_file() -> PathBuf {
    PathBuf::from("qperf_lat.svg")
}

impl Default for QperfLatency {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            size_column: default_size_column(),
            exp_range: latency_exp_range(),
            out_file: latency_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for QperfLatency {
    fn name(&self) -> &'static str {
        "qperf-latency"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let aggregated = load_sources(&self.sources, &self.size_column, settings, 1.0)?;
        render_sources(
            &self.sources,
            &aggregated,
            &Figure {
                out_file: &settings.out_path(&self.out_file),
                x_label: "Message size [bytes]",
                y_label: "Latency [µs]",
                exp_range: self.exp_range,
            },
            settings,
        )
    }
}
