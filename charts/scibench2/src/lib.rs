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

/// scibench2 average send latency vs segment size, eX3 against MPG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scibench2Latency {
    pub ex3_data: PathBuf,
    pub mpg_data: PathBuf,
    #[serde(default = "default_size_field")]
    pub size_field: String,
    #[serde(default = "default_exp_range")]
    pub exp_range: (u32, u32),
    #[serde(default = "default_out_file")]
    pub out_file: PathBuf,
}

fn default_size_field() -> String {
    "Segment size".to_owned()
}

fn default_exp_range() -> (u32, u32) {
    (2, 16)
}

fn default_out_file() -> PathBuf {
    PathBuf::from("scibench2_ex3_v_mpg.svg")
}

impl Default for Scibench2Latency {
    fn default() -> Self {
        Self {
            ex3_data: PathBuf::new(),
            mpg_data: PathBuf::new(),
            size_field: default_size_field(),
            exp_range: default_exp_range(),
            out_file: default_out_file(),
        }
    }
}

#[typetag::serde]
impl Chart for Scibench2Latency {
    fn name(&self) -> &'static str {
        "scibench2-latency"
    }

    fn render(&self, settings: &Settings) -> Result<()> {
        let format = SourceFormat::LoopJson {
            size_field: self.size_field.clone(),
        };
        let metric = MetricPath::new("Average Send Latency");
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
                x_label: "Segment size [bytes]",
                y_label: "Avg. send latency [µs]",
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
