use std::path::PathBuf;

use common::{
    chart::Chart,
    config::Settings,
    loader::{MetricPath, SourceFormat, ValueKind, load},
    render::{Band, DataSeries, Figure, line_chart},
    stats::aggregate,
};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// scipp ping-pong latency vs message size, eX3 against the MPG lab
/// machines, with std-dev bands across repeated runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScippLatency {
    pub ex3_data: PathBuf,
    pub mpg_data: PathBuf,
    #[serde(default = "default_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "default_out_file")]
    pub out_file: PathBuf,
}

fn default_exp_range() -> (u32, u32) {
    (2, 13)
}

fn default_out_file() -> PathBuf {
    PathBuf::from("scipp_ex3_v_mpg.svg")
}

impl Default for ScippLatency {
    fn default() -> Self {
        Self {
            ex3_data: PathBuf::new(),
            mpg_data: PathBuf::new(),
            exp_range: default_exp_range(),
            out_file: default_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for ScippLatency {
    fn name(&self) -> &'static str {
        "scipp-latency"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let format = SourceFormat::LoopJson {
            size_field: "Message size".to_owned(),
        };
        let metric = MetricPath::new("latency (usec)");
        let style = &settings.style;

        let ex3 = aggregate(&load(
            &settings.data_path(&self.ex3_data),
            &format,
            &metric,
            ValueKind::Embedded,
        )?);
        let mpg = aggregate(&load(
            &settings.data_path(&self.mpg_data),
            &format,
            &metric,
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
                    label: "eX3",
                    color: style.palette.color("dis")?,
                    data: &ex3,
                    band: Band::StdDev,
                },
                DataSeries {
                    label: "MPG",
                    color: style.palette.color("dis2")?,
                    data: &mpg,
                    band: Band::StdDev,
                },
            ],
            style,
        )
    }
}
