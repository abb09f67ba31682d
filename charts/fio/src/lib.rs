use std::path::PathBuf;

use common::{
    KB_TO_MB,
    chart::Chart,
    config::Settings,
    loader::{MetricPath, RwDirection, SourceFormat, ValueKind, load},
    render::{Band, DataSeries, Figure, line_chart},
    stats::{AggregatedSeries, aggregate},
};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// One fio JSON result in a figure: a label, a palette color and the file
/// holding the per-block-size jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FioSeries {
    pub label: String,
    pub color: String,
    pub file: PathBuf,
}

fn load_series(
    series: &[FioSeries],
    rw: RwDirection,
    metric: &str,
    dev_metric: Option<&str>,
    scale: f64,
    settings: &Settings,
) -> Result<Vec<(AggregatedSeries, Option<AggregatedSeries>)>> {
    let format = SourceFormat::FioJson { rw };
    series
        .iter()
        .map(|entry| {
            let file = settings.data_path(&entry.file);
            let data = aggregate(&load(
                &file,
                &format,
                &MetricPath::new(metric),
                ValueKind::Plain,
            )?)
            .scale(scale);
            let dev = dev_metric
                .map(|dev_metric| {
                    let dev = load(&file, &format, &MetricPath::new(dev_metric), ValueKind::Plain)?;
                    Ok::<_, eyre::Report>(aggregate(&dev).scale(scale))
                })
                .transpose()?;
            Ok((data, dev))
        })
        .collect()
}

fn render_series(
    series: &[FioSeries],
    loaded: &[(AggregatedSeries, Option<AggregatedSeries>)],
    figure: &Figure<'_>,
    settings: &Settings,
) -> Result<()> {
    let data_series = series
        .iter()
        .zip(loaded)
        .map(|(entry, (data, dev))| {
            Ok(DataSeries {
                label: &entry.label,
                color: settings.style.palette.color(&entry.color)?,
                data,
                band: match dev {
                    Some(dev) => Band::Values(&dev.mean),
                    None => Band::None,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;
    line_chart(figure, &data_series, &settings.style)
}

/// fio bandwidth vs block size. The metric defaults to the per-job
/// `bw_mean` with its `bw_dev` companion as the shaded band; fio reports
/// KB/s, plotted as MB/s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FioBandwidth {
    pub series: Vec<FioSeries>,
    #[serde(default)]
    pub rw: RwDirection,
    #[serde(default = "bandwidth_metric")]
    pub metric: String,
    #[serde(default = "bandwidth_dev_metric")]
    pub dev_metric: Option<String>,
    #[serde(default = "bandwidth_scale")]
    pub scale: f64,
    #[serde(default = "bandwidth_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "bandwidth_out_file")]
    pub out_file: PathBuf,
}

fn bandwidth_metric() -> String {
    "bw_mean".to_owned()
}

fn bandwidth_dev_metric() -> Option<String> {
    Some("bw_dev".to_owned())
}

fn bandwidth_scale() -> f64 {
    KB_TO_MB
}

fn bandwidth_exp_range() -> (u32, u32) {
    (10, 24)
}

fn bandwidth_out_file() -> PathBuf {
    PathBuf::from("fio_write_bw.svg")
}

impl Default for FioBandwidth {
    fn default() -> Self {
        Self {
            series: Vec::new(),
            rw: RwDirection::default(),
            metric: bandwidth_metric(),
            dev_metric: bandwidth_dev_metric(),
            scale: bandwidth_scale(),
            exp_range: bandwidth_exp_range(),
            out_file: bandwidth_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for FioBandwidth {
    fn name(&self) -> &'static str {
        "fio-bandwidth"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let loaded = load_series(
            &self.series,
            self.rw,
            &self.metric,
            self.dev_metric.as_deref(),
            self.scale,
            settings,
        )?;
        render_series(
            &self.series,
            &loaded,
            &Figure {
                out_file: &settings.out_path(&self.out_file),
                x_label: "Block size [bytes]",
                y_label: "Bandwidth [MB/s]",
                exp_range: self.exp_range,
            },
            settings,
        )
    }
}

/// fio completion latency vs block size, nanoseconds plotted as µs. The
/// metric is a dotted path into the job's read/write block, defaulting to
/// `lat_ns.mean` with the `lat_ns.stddev` band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FioLatency {
    pub series: Vec<FioSeries>,
    #[serde(default)]
    pub rw: RwDirection,
    #[serde(default = "latency_metric")]
    pub metric: String,
    #[serde(default = "latency_dev_metric")]
    pub dev_metric: Option<String>,
    #[serde(default = "latency_scale")]
    pub scale: f64,
    #[serde(default = "latency_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "latency_out_file")]
    pub out_file: PathBuf,
}

fn latency_metric() -> String {
    "lat_ns.mean".to_owned()
}

fn latency_dev_metric() -> Option<String> {
    Some("lat_ns.stddev".to_owned())
}

fn latency_scale() -> f64 {
    0.001
}

fn latency_exp_range() -> (u32, u32) {
    (10, 24)
}

fn latency_out_file() -> PathBuf {
    PathBuf::from("fio_write_lat.svg")
}

impl Default for FioLatency {
    fn default() -> Self {
        Self {
            series: Vec::new(),
            rw: RwDirection::default(),
            metric: latency_metric(),
            dev_metric: latency_dev_metric(),
            scale: latency_scale(),
            exp_range: latency_exp_range(),
            out_file: latency_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for FioLatency {
    fn name(&self) -> &'static str {
        "fio-latency"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let loaded = load_series(
            &self.series,
            self.rw,
            &self.metric,
            self.dev_metric.as_deref(),
            self.scale,
            settings,
        )?;
        render_series(
            &self.series,
            &loaded,
            &Figure {
                out_file: &settings.out_path(&self.out_file),
                x_label: "Block size [bytes]",
                y_label: "Latency [µs]",
                exp_range: self.exp_range,
            },
            settings,
        )
    }
}
