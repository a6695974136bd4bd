// Observability: metrics recording and exporter setup

pub mod metrics;
