//! Links every chart crate so their tagged deserializers are present in
//! the final binary.

pub fn init_charts() {
    // serialize each default once so the registrations survive the linker
    serde_json::to_string(&dma_bench::DmaBench::default()).unwrap();
    serde_json::to_string(&scipp::ScippLatency::default()).unwrap();
    serde_json::to_string(&scibench2::Scibench2Latency::default()).unwrap();
    serde_json::to_string(&qperf::QperfBandwidth::default()).unwrap();
    serde_json::to_string(&qperf::QperfLatency::default()).unwrap();
    serde_json::to_string(&ib_tools::IbBandwidth::default()).unwrap();
    serde_json::to_string(&ib_tools::IbLatency::default()).unwrap();
    serde_json::to_string(&fio::FioBandwidth::default()).unwrap();
    serde_json::to_string(&fio::FioLatency::default()).unwrap();
}
