use std::path::PathBuf;

use common::{
    MIB_TO_GB,
    chart::Chart,
    config::Settings,
    loader::{MetricPath, SourceFormat, ValueKind, load},
    render::{Band, DataSeries, Figure, line_chart},
    stats::aggregate,
};
use eyre::Result;
use serde::{Deserialize, Serialize};

fn default_size_column() -> String {
    "#bytes".to_owned()
}

/// ib_write_bw against a dma_bench PCIe run: one perftest CSV, one
/// loop-JSON file, both converted MiB/s to GB/s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbBandwidth {
    /// ib_write_bw CSV export, relative to data_root.
    pub ib_csv: PathBuf,
    /// dma_bench loop-JSON file of the PCIe link.
    pub pcie_json: PathBuf,
    #[serde(default = "default_size_column")]
    pub size_column: String,
    #[serde(default = "bandwidth_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "bandwidth_out_file")]
    pub out_file: PathBuf,
}

fn bandwidth_exp_range() -> (u32, u32) {
    (6, 24)
}

fn bandwidth_out_file() -> PathBuf {
    PathBuf::from("ib_bw.svg")
}

impl Default for IbBandwidth {
    fn default() -> Self {
        Self {
            ib_csv: PathBuf::new(),
            pcie_json: PathBuf::new(),
            size_column: default_size_column(),
            exp_range: bandwidth_exp_range(),
            out_file: bandwidth_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for IbBandwidth {
    fn name(&self) -> &'static str {
        "ib-bandwidth"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let style = &settings.style;
        let ib = aggregate(&load(
            &settings.data_path(&self.ib_csv),
            &SourceFormat::Csv {
                size_column: self.size_column.clone(),
            },
            &MetricPath::new("BW average[MB/sec]"),
            ValueKind::Plain,
        )?)
        .scale(MIB_TO_GB);
        let pcie = aggregate(&load(
            &settings.data_path(&self.pcie_json),
            &SourceFormat::LoopJson {
                size_field: "Message size".to_owned(),
            },
            &MetricPath::new("Bandwidth"),
            ValueKind::Embedded,
        )?)
        .scale(MIB_TO_GB);

        line_chart(
            &Figure {
                out_file: &settings.out_path(&self.out_file),
                x_label: "Message size [bytes]",
                y_label: "Bandwidth [GB/s]",
                exp_range: self.exp_range,
            },
            &[
                DataSeries {
                    label: "InfiniBand (4x HDR)",
                    color: style.palette.color("ib")?,
                    data: &ib,
                    band: Band::None,
                },
                DataSeries {
                    label: "PCIe (Gen4 x16)",
                    color: style.palette.color("dis")?,
                    data: &pcie,
                    band: Band::None,
                },
            ],
            style,
        )
    }
}

/// ib_write_lat against a scipp PCIe run, in µs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbLatency {
    /// ib_write_lat CSV export.
    pub ib_csv: PathBuf,
    /// scipp loop-JSON file of the PCIe link.
    pub pcie_json: PathBuf,
    #[serde(default = "default_size_column")]
    pub size_column: String,
    #[serde(default = "latency_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "latency_out_file")]
    pub out_file: PathBuf,
}

fn latency_exp_range() -> (u32, u32) {
    (2, 13)
}

fn latency_out_file() -> PathBuf {
    PathBuf::from("ib_lat.svg")
}

impl Default for IbLatency {
    fn default() -> Self {
        Self {
            ib_csv: PathBuf::new(),
            pcie_json: PathBuf::new(),
            size_column: default_size_column(),
            exp_range: latency_exp_range(),
            out_file: latency_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for IbLatency {
    fn name(&self) -> &'static str {
        "ib-latency"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let style = &settings.style;
        let ib = aggregate(&load(
            &settings.data_path(&self.ib_csv),
            &SourceFormat::Csv {
                size_column: self.size_column.clone(),
            },
            &MetricPath::new("t_avg[usec]"),
            ValueKind::Plain,
        )?);
        let pcie = aggregate(&load(
            &settings.data_path(&self.pcie_json),
            &SourceFormat::LoopJson {
                size_field: "Message size".to_owned(),
            },
            &MetricPath::new("latency (usec)"),
            ValueKind::Embedded,
        )?);

        line_chart(
            &Figure {
                out_file: &settings.out_path(&self.out_file),
                x_label: "Message size [bytes]",
                y_label: "Latency [µs]",
                exp_range: self.exp_range,
            },
            &[
                DataSeries {
                    label: "InfiniBand",
                    color: style.palette.color("ib")?,
                    data: &ib,
                    band: Band::None,
                },
                DataSeries {
                    label: "PCIe",
                    color: style.palette.color("dis")?,
                    data: &pcie,
                    band: Band::None,
                },
            ],
            style,
        )
    }
}
