//! Loader behavior against real files on disk.

use std::fs;

use common::{
    loader::{LoadError, MetricPath, RwDirection, SourceFormat, ValueKind, load},
    stats::aggregate,
};
use tempfile::tempdir;

fn loop_format() -> SourceFormat {
    SourceFormat::LoopJson {
        size_field: "Message size".to_owned(),
    }
}

#[test]
fn aggregates_repeated_runs_across_files() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("run0.json"),
        r#"{"results": {"loop 0": {"e1": {"Message size": "64", "Bandwidth": "100 MB/s"}}}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("run1.json"),
        r#"{"results": {"loop 0": {"e1": {"Message size": "64", "Bandwidth": "200 MB/s"}}}}"#,
    )
    .unwrap();

    let series = load(
        dir.path(),
        &loop_format(),
        &MetricPath::new("Bandwidth"),
        ValueKind::Embedded,
    )
    .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[&64], vec![100.0, 200.0]);

    let agg = aggregate(&series);
    assert_eq!(agg.sizes, vec![64]);
    assert_eq!(agg.mean, vec![150.0]);
    assert_eq!(agg.std_dev, vec![50.0]);
}

#[test]
fn malformed_entries_and_foreign_groups_are_skipped() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("run0.json"),
        r#"{
            "results": {
                "loop 0": {
                    "e1": {"Message size": "64", "Bandwidth": "100 MB/s"},
                    "e2": {"Message size": "128"},
                    "e3": {"Message size": "256", "Bandwidth": "n/a"},
                    "e4": {"Message size": "512", "Bandwidth": "400 MB/s"}
                },
                "warmup": {
                    "e1": {"Message size": "64", "Bandwidth": "999 MB/s"}
                }
            }
        }"#,
    )
    .unwrap();

    let series = load(
        dir.path(),
        &loop_format(),
        &MetricPath::new("Bandwidth"),
        ValueKind::Embedded,
    )
    .unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[&64], vec![100.0]);
    assert_eq!(series[&512], vec![400.0]);
}

#[test]
fn key_set_is_the_union_across_files() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a.json"),
        r#"{"results": {"loop 0": {
            "e1": {"Message size": "64", "Latency": "1.5 usec"},
            "e2": {"Message size": "128", "Latency": "2.5 usec"}
        }}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"{"results": {"loop 0": {
            "e1": {"Message size": "128", "Latency": "3.5 usec"}
        }}}"#,
    )
    .unwrap();

    let series = load(
        dir.path(),
        &loop_format(),
        &MetricPath::new("Latency"),
        ValueKind::Embedded,
    )
    .unwrap();
    assert_eq!(series[&64], vec![1.5]);
    assert_eq!(series[&128], vec![2.5, 3.5]);
}

#[test]
fn empty_directory_is_fatal() {
    let dir = tempdir().unwrap();
    let err = load(
        dir.path(),
        &loop_format(),
        &MetricPath::new("Bandwidth"),
        ValueKind::Embedded,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LoadError>(),
        Some(LoadError::MissingData { .. })
    ));
}

#[test]
fn unreadable_file_does_not_stop_the_rest() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.json"), "{ not json at all").unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"{"results": {"loop 0": {"e1": {"Message size": "64", "Bandwidth": "100 MB/s"}}}}"#,
    )
    .unwrap();

    let series = load(
        dir.path(),
        &loop_format(),
        &MetricPath::new("Bandwidth"),
        ValueKind::Embedded,
    )
    .unwrap();
    assert_eq!(series[&64], vec![100.0]);
}

#[test]
fn fio_jobs_key_by_block_size() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("result.json"),
        r#"{"jobs": [
            {
                "jobname": "write_seq_4k",
                "job options": {"bs": "4k"},
                "write": {"bw_mean": 1000.0, "lat_ns": {"mean": 150000.0, "stddev": 10.0}}
            },
            {
                "jobname": "write_seq_1m",
                "write": {"bw_mean": 4000.0, "lat_ns": {"mean": 650000.0, "stddev": 25.0}}
            },
            {
                "jobname": "broken",
                "write": {"bw_mean": 123.0}
            }
        ]}"#,
    )
    .unwrap();

    let format = SourceFormat::FioJson {
        rw: RwDirection::Write,
    };
    let file = dir.path().join("result.json");

    let bw = load(
        &file,
        &format,
        &MetricPath::new("bw_mean"),
        ValueKind::Plain,
    )
    .unwrap();
    assert_eq!(bw[&4096], vec![1000.0]);
    assert_eq!(bw[&(1 << 20)], vec![4000.0]);
    // "broken" has neither options nor a block-size jobname token
    assert_eq!(bw.len(), 2);

    let lat = load(
        &file,
        &format,
        &MetricPath::new("lat_ns.mean"),
        ValueKind::Plain,
    )
    .unwrap();
    assert_eq!(lat[&4096], vec![150000.0]);
    assert_eq!(lat[&(1 << 20)], vec![650000.0]);
}

#[test]
fn fio_jobs_without_the_metric_are_skipped() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("result.json"),
        r#"{"jobs": [
            {"job options": {"bs": "4k"}, "write": {"bw_mean": 1000.0}},
            {"job options": {"bs": "8k"}, "write": {"iops": 5.0}},
            {"job options": {"bs": "16k"}, "read": {"bw_mean": 2.0}}
        ]}"#,
    )
    .unwrap();

    let series = load(
        &dir.path().join("result.json"),
        &SourceFormat::FioJson {
            rw: RwDirection::Write,
        },
        &MetricPath::new("bw_mean"),
        ValueKind::Plain,
    )
    .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[&4096], vec![1000.0]);
}

#[test]
fn csv_columns_are_addressed_by_name() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("ib_write_bw.csv"),
        "#bytes,#iterations,BW peak[MB/sec],BW average[MB/sec]\n\
         64,1000,120.1,118.9\n\
         128,1000,not-a-number,oops\n\
         256,1000,480.0,475.5\n",
    )
    .unwrap();

    let series = load(
        &dir.path().join("ib_write_bw.csv"),
        &SourceFormat::Csv {
            size_column: "#bytes".to_owned(),
        },
        &MetricPath::new("BW average[MB/sec]"),
        ValueKind::Plain,
    )
    .unwrap();
    assert_eq!(series[&64], vec![118.9]);
    assert_eq!(series[&256], vec![475.5]);
    assert_eq!(series.len(), 2);
}

#[test]
fn csv_directories_merge_runs() {
    let dir = tempdir().unwrap();
    for (file, value) in [("run0.csv", 10.0), ("run1.csv", 20.0)] {
        fs::write(
            dir.path().join(file),
            format!("msg_size,tcp_bw\n1024,{value}\n"),
        )
        .unwrap();
    }

    let series = load(
        dir.path(),
        &SourceFormat::Csv {
            size_column: "msg_size".to_owned(),
        },
        &MetricPath::new("tcp_bw"),
        ValueKind::Plain,
    )
    .unwrap();
    assert_eq!(series[&1024], vec![10.0, 20.0]);
}

#[test]
fn csv_without_the_requested_column_yields_nothing() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("run0.csv"),
        "msg_size,tcp_lat\n1024,12.5\n",
    )
    .unwrap();

    let series = load(
        dir.path(),
        &SourceFormat::Csv {
            size_column: "msg_size".to_owned(),
        },
        &MetricPath::new("tcp_bw"),
        ValueKind::Plain,
    )
    .unwrap();
    assert!(series.is_empty());
}
