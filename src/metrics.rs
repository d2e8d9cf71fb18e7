use std::time::{Duration, Instant};

use opentelemetry::{
    metrics::{Counter, Histogram},
    KeyValue,
};

/// I/O counters for the blob API. Recorded against the global meter; they
/// no-op unless a meter provider is installed.
#[derive(Debug)]
pub struct ApiMetrics {
    pub uploads: Counter<u64>,
    pub upload_bytes: Counter<u64>,
    pub downloads: Counter<u64>,
    pub download_bytes: Counter<u64>,
    pub presigned_uploads: Counter<u64>,
    pub request_latency: Histogram<f64>,
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiMetrics {
    pub fn new() -> ApiMetrics {
        let meter = opentelemetry::global::meter("depot-server");
        let uploads = meter
            .u64_counter("depot.uploads")
            .with_description("number of direct blob uploads")
            .build();
        let upload_bytes = meter
            .u64_counter("depot.upload_bytes")
            .with_description("number of bytes ingested by direct uploads")
            .build();
        let downloads = meter
            .u64_counter("depot.downloads")
            .with_description("number of blob downloads")
            .build();
        let download_bytes = meter
            .u64_counter("depot.download_bytes")
            .with_description("number of bytes served by downloads")
            .build();
        let presigned_uploads = meter
            .u64_counter("depot.presigned_uploads")
            .with_description("number of presigned upload URLs issued")
            .build();
        let request_latency = meter
            .f64_histogram("depot.request_latency")
            .with_description("blob API request latency in seconds")
            .build();
        ApiMetrics {
            uploads,
            upload_bytes,
            downloads,
            download_bytes,
            presigned_uploads,
            request_latency,
        }
    }
}

pub trait TimerUpdate {
    fn add(&self, duration: Duration, labels: &[KeyValue]);
}

impl TimerUpdate for Histogram<f64> {
    fn add(&self, duration: Duration, labels: &[KeyValue]) {
        self.record(duration.as_secs_f64(), labels);
    }
}

/// Records elapsed time into the metric when dropped.
pub struct Timer<'a, T: TimerUpdate + Sync> {
    start: Instant,
    metric: &'a T,
    labels: &'a [KeyValue],
}

impl<'a, T: TimerUpdate + Sync> Timer<'a, T> {
    pub fn start_with_labels(metric: &'a T, labels: &'a [KeyValue]) -> Self {
        Self {
            start: Instant::now(),
            metric,
            labels,
        }
    }
}

impl<'a, T: TimerUpdate + Sync> Drop for Timer<'a, T> {
    fn drop(&mut self) {
        self.metric.add(self.start.elapsed(), self.labels);
    }
}
