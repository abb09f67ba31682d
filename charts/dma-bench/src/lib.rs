use std::path::PathBuf;

use common::{
    MB_TO_GB,
    chart::Chart,
    config::Settings,
    loader::{MetricPath, SourceFormat, ValueKind, load},
    render::{Band, DataSeries, Figure, line_chart},
    stats::aggregate,
};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// dma_bench transfer-time and bandwidth sweeps, lab machines vs the eX3
/// cluster. One figure per metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmaBench {
    /// Loop-JSON directory of the lab-machine runs, relative to data_root.
    pub lab_data: PathBuf,
    /// Loop-JSON directory of the eX3 runs.
    pub cluster_data: PathBuf,
    #[serde(default = "default_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

fn default_exp_range() -> (u32, u32) {
    (6, 19)
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dma_bench")
}

impl Default for DmaBench {
    fn default() -> Self {
        Self {
            lab_data: PathBuf::new(),
            cluster_data: PathBuf::new(),
            exp_range: default_exp_range(),
            out_dir: default_out_dir(),
        }
    }
}

#[typetag::serde]
impl Chart for DmaBench {
    fn name(&self) -> &'static str {
        "dma-bench"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let format = SourceFormat::LoopJson {
            size_field: "Message size".to_owned(),
        };
        let style = &settings.style;

        let figures = [
            (
                "Transfer time",
                "Time [µs]",
                1.0,
                "dma_bench_transfer_time_mpg_vs_ex3.svg",
            ),
            (
                "Bandwidth",
                "Bandwidth [GB/s]",
                MB_TO_GB,
                "dma_bench_bandwidth_mpg_vs_ex3.svg",
            ),
        ];
        for (metric, y_label, factor, file) in figures {
            let metric = MetricPath::new(metric);
            let lab = aggregate(&load(
                &settings.data_path(&self.lab_data),
                &format,
                &metric,
                ValueKind::Embedded,
            )?)
            .scale(factor);
            let cluster = aggregate(&load(
                &settings.data_path(&self.cluster_data),
                &format,
                &metric,
                ValueKind::Embedded,
            )?)
            .scale(factor);

            line_chart(
                &Figure {
                    out_file: &settings.out_path(self.out_dir.join(file)),
                    x_label: "Message size [bytes]",
                    y_label,
                    exp_range: self.exp_range,
                },
                &[
                    DataSeries {
                        label: "Lab Machines",
                        color: style.palette.color("dis")?,
                        data: &lab,
                        band: Band::None,
                    },
                    DataSeries {
                        label: "eX3",
                        color: style.palette.color("sisci")?,
                        data: &cluster,
                        band: Band::None,
                    },
                ],
                style,
            )?;
        }
        Ok(())
    }
}
