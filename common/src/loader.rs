use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use eyre::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Metric readings per message/block size, collected across every file of
/// a source. Sizes are bytes; one entry per record that yielded both the
/// size and the metric.
pub type Series = BTreeMap<u64, Vec<f64>>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no .{extension} files in {}", dir.display())]
    MissingData {
        dir: PathBuf,
        extension: &'static str,
    },
    #[error("no numeric literal in {0:?}")]
    NoNumericLiteral(String),
    #[error("unsupported block size {0:?}")]
    BadBlockSize(String),
}

/// How scalar fields are turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// The whole field is the number.
    Plain,
    /// The number is embedded in a unit-suffixed string ("123.45 MBytes/s").
    Embedded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RwDirection {
    Read,
    #[default]
    Write,
}

impl RwDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            RwDirection::Read => "read",
            RwDirection::Write => "write",
        }
    }
}

/// The shape of the result files a source holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    /// `{"results": {"loop N": {"<entry>": {field: value}}}}` documents.
    /// Only groups named with a "loop" prefix are read; `size_field` names
    /// the independent-variable field of each entry.
    LoopJson { size_field: String },
    /// fio `{"jobs": [...]}` documents; the block size comes from the job
    /// options (or the jobname suffix) and the metric resolves inside the
    /// job's read/write block.
    FioJson { rw: RwDirection },
    /// Header + rows; independent variable and metric are both addressed
    /// by column name.
    Csv { size_column: String },
}

/// A flat key or dotted path ("clat_ns.mean") into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPath(Vec<String>);

impl MetricPath {
    pub fn new(path: &str) -> Self {
        Self(path.split('.').map(str::to_owned).collect())
    }

    /// Walk the path components and return the leaf value.
    pub fn resolve<'a>(&self, mut value: &'a Value) -> Option<&'a Value> {
        for key in &self.0 {
            value = value.get(key)?;
        }
        Some(value)
    }

    fn column_name(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for MetricPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").unwrap());

/// Extract the first numeric literal from a unit-suffixed string.
pub fn extract_number(text: &str) -> Result<f64, LoadError> {
    NUMERIC
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| LoadError::NoNumericLiteral(text.to_owned()))
}

/// Convert a fio block-size string ("4k", "1M", "512") to bytes.
pub fn parse_block_size(text: &str) -> Result<u64, LoadError> {
    let lower = text.trim().to_ascii_lowercase();
    let (number, unit) = if let Some(n) = lower.strip_suffix('k') {
        (n, 1u64 << 10)
    } else if let Some(n) = lower.strip_suffix('m') {
        (n, 1u64 << 20)
    } else if let Some(n) = lower.strip_suffix('g') {
        (n, 1u64 << 30)
    } else {
        (lower.as_str(), 1)
    };
    let value: f64 = number
        .parse()
        .map_err(|_| LoadError::BadBlockSize(text.to_owned()))?;
    Ok((value * unit as f64) as u64)
}

fn parse_scalar(text: &str, kind: ValueKind) -> Option<f64> {
    match kind {
        ValueKind::Plain => text.trim().parse().ok(),
        ValueKind::Embedded => extract_number(text).ok(),
    }
}

fn numeric(value: &Value, kind: ValueKind) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_scalar(s, kind),
        _ => None,
    }
}

fn as_size(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then_some(value as u64)
}

/// Load a [`Series`] from a single result file or a directory of them.
///
/// Individual records missing the independent variable or the metric, or
/// holding non-numeric data, are skipped; the one fatal condition is a
/// directory with no matching files at all.
pub fn load(
    source: &Path,
    format: &SourceFormat,
    metric: &MetricPath,
    kind: ValueKind,
) -> Result<Series> {
    let extension = match format {
        SourceFormat::Csv { .. } => "csv",
        _ => "json",
    };
    let files = collect_files(source, extension)?;

    let mut series = Series::new();
    for file in &files {
        match format {
            SourceFormat::LoopJson { size_field } => {
                load_loop_json(file, size_field, metric, kind, &mut series)
            }
            SourceFormat::FioJson { rw } => load_fio_json(file, *rw, metric, kind, &mut series),
            SourceFormat::Csv { size_column } => {
                load_csv(file, size_column, metric, kind, &mut series)
            }
        }
    }
    Ok(series)
}

fn collect_files(source: &Path, extension: &'static str) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }

    let entries = fs::read_dir(source)
        .wrap_err_with(|| format!("read data directory {}", source.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension)
        })
        .collect();
    if files.is_empty() {
        return Err(LoadError::MissingData {
            dir: source.to_path_buf(),
            extension,
        }
        .into());
    }
    files.sort();
    Ok(files)
}

fn read_json(file: &Path) -> Option<Value> {
    let text = match fs::read_to_string(file) {
        Ok(text) => text,
        Err(err) => {
            warn!("Could not read {}: {err}", file.display());
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(doc) => Some(doc),
        Err(err) => {
            warn!("Could not parse {}: {err}", file.display());
            None
        }
    }
}

fn load_loop_json(
    file: &Path,
    size_field: &str,
    metric: &MetricPath,
    kind: ValueKind,
    series: &mut Series,
) {
    let Some(doc) = read_json(file) else {
        return;
    };
    let Some(groups) = doc.get("results").and_then(Value::as_object) else {
        warn!("No result groups in {}", file.display());
        return;
    };

    for (group_name, group) in groups {
        if !group_name.starts_with("loop") {
            debug!("Skipping group {group_name:?} in {}", file.display());
            continue;
        }
        let Some(entries) = group.as_object() else {
            continue;
        };
        for entry in entries.values() {
            let Some(size) = entry
                .get(size_field)
                .and_then(|v| numeric(v, kind))
                .and_then(as_size)
            else {
                continue;
            };
            let Some(value) = metric.resolve(entry).and_then(|v| numeric(v, kind)) else {
                continue;
            };
            series.entry(size).or_default().push(value);
        }
    }
}

fn job_block_size(job: &Value) -> Option<u64> {
    if let Some(bs) = job
        .get("job options")
        .and_then(|options| options.get("bs"))
        .and_then(Value::as_str)
        && let Ok(bytes) = parse_block_size(bs)
    {
        return Some(bytes);
    }
    // fio conventionally encodes the block size as the trailing jobname
    // token, e.g. "write_seq_4k"
    let name = job.get("jobname")?.as_str()?;
    parse_block_size(name.rsplit('_').next()?).ok()
}

fn load_fio_json(
    file: &Path,
    rw: RwDirection,
    metric: &MetricPath,
    kind: ValueKind,
    series: &mut Series,
) {
    let Some(doc) = read_json(file) else {
        return;
    };
    let Some(jobs) = doc.get("jobs").and_then(Value::as_array) else {
        warn!("No jobs in {}", file.display());
        return;
    };

    for job in jobs {
        let Some(size) = job_block_size(job) else {
            continue;
        };
        let Some(value) = job
            .get(rw.as_str())
            .and_then(|block| metric.resolve(block))
            .and_then(|v| numeric(v, kind))
        else {
            continue;
        };
        series.entry(size).or_default().push(value);
    }
}

fn load_csv(
    file: &Path,
    size_column: &str,
    metric: &MetricPath,
    kind: ValueKind,
    series: &mut Series,
) {
    let mut reader = match csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(file)
    {
        Ok(reader) => reader,
        Err(err) => {
            warn!("Could not read {}: {err}", file.display());
            return;
        }
    };

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(err) => {
            warn!("Could not read header of {}: {err}", file.display());
            return;
        }
    };
    let metric_column = metric.column_name();
    let (Some(size_idx), Some(metric_idx)) = (
        headers.iter().position(|h| h == size_column),
        headers.iter().position(|h| h == metric_column),
    ) else {
        warn!(
            "Missing column {size_column:?} or {metric_column:?} in {}",
            file.display()
        );
        return;
    };

    for record in reader.records() {
        let Ok(record) = record else {
            continue;
        };
        let Some(size) = record
            .get(size_idx)
            .and_then(|text| parse_scalar(text, kind))
            .and_then(as_size)
        else {
            continue;
        };
        let Some(value) = record
            .get(metric_idx)
            .and_then(|text| parse_scalar(text, kind))
        else {
            continue;
        };
        series.entry(size).or_default().push(value);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_first_numeric_literal() {
        assert_eq!(extract_number("123.45 MBytes/s").unwrap(), 123.45);
        assert_eq!(extract_number("-3.2e3 usec").unwrap(), -3200.0);
        assert_eq!(extract_number("64").unwrap(), 64.0);
    }

    #[test]
    fn extract_fails_without_digits() {
        assert!(matches!(
            extract_number("no digits here"),
            Err(LoadError::NoNumericLiteral(_))
        ));
    }

    #[test]
    fn block_size_suffixes() {
        assert_eq!(parse_block_size("4k").unwrap(), 4096);
        assert_eq!(parse_block_size("1M").unwrap(), 1 << 20);
        assert_eq!(parse_block_size("2g").unwrap(), 2 << 30);
        assert_eq!(parse_block_size("512").unwrap(), 512);
        assert!(parse_block_size("whole-disk").is_err());
    }

    #[test]
    fn metric_path_walks_nested_fields() {
        let job = json!({"clat_ns": {"mean": 12.5}, "bw": 2048});
        let nested = MetricPath::new("clat_ns.mean");
        assert_eq!(nested.resolve(&job).unwrap().as_f64(), Some(12.5));
        let flat = MetricPath::new("bw");
        assert_eq!(flat.resolve(&job).unwrap().as_f64(), Some(2048.0));
        assert!(MetricPath::new("clat_ns.max").resolve(&job).is_none());
    }

    #[test]
    fn jobname_fallback_for_block_size() {
        let job = json!({"jobname": "write_seq_8k"});
        assert_eq!(job_block_size(&job), Some(8192));
        let with_options = json!({"jobname": "write_seq_8k", "job options": {"bs": "1m"}});
        assert_eq!(job_block_size(&with_options), Some(1 << 20));
        assert_eq!(job_block_size(&json!({"jobname": "plain"})), None);
    }

    #[test]
    fn plain_kind_rejects_unit_suffixes() {
        assert_eq!(parse_scalar("42.5", ValueKind::Plain), Some(42.5));
        assert_eq!(parse_scalar("42.5 MB/s", ValueKind::Plain), None);
        assert_eq!(parse_scalar("42.5 MB/s", ValueKind::Embedded), Some(42.5));
    }
}
