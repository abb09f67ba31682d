use std::fs;

use clap::{Parser, Subcommand};
use common::config::Config;
use eyre::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const MODULES: &[&str] = &[
    "common",
    "dma_bench",
    "scipp",
    "scibench2",
    "qperf",
    "ib_tools",
    "fio",
];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Additional log directives (module=level)
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the charts in a config
    Ls {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
    },
    /// Render the configured charts
    Render {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
        /// Only render charts with this name
        #[arg(long)]
        only: Option<String>,
    },
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("info".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("linkplot={log_level}"));
    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }
    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_charts::init_charts();

    match args.command {
        Commands::Ls { config_file } => ls(&config_file)?,
        Commands::Render { config_file, only } => {
            if let Err(err) = render(&config_file, only.as_deref()) {
                error!("{err:#?}");
                return Err(err);
            }
        }
    };

    Ok(())
}

fn load_config(path: &str) -> Result<Config> {
    let text = fs::read_to_string(path).wrap_err_with(|| format!("read config {path}"))?;
    serde_yml::from_str(&text).wrap_err_with(|| format!("parse config {path}"))
}

fn ls(config_file: &str) -> Result<()> {
    let config = load_config(config_file)?;
    for chart in &config.charts {
        println!("{} -> {chart:?}", chart.name());
    }
    Ok(())
}

fn render(config_file: &str, only: Option<&str>) -> Result<()> {
    let config = load_config(config_file)?;
    fs::create_dir_all(&config.settings.output_dir)?;

    let mut rendered = 0usize;
    for chart in &config.charts {
        if let Some(filter) = only
            && chart.name() != filter
        {
            continue;
        }
        chart
            .render(&config.settings)
            .wrap_err_with(|| format!("render {}", chart.name()))?;
        rendered += 1;
    }
    info!("{}: rendered {rendered} chart(s)", config.name);
    Ok(())
}
