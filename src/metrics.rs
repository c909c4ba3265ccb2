//! Metrics for the request pipeline.

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{
    linear_buckets, register_histogram_vec_with_registry, proto::MetricFamily, HistogramVec,
    Registry,
};

/// The registry holding every pipeline metric.
static PIPELINE_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The pipeline related metrics.
pub static PIPELINE_METRICS: Lazy<PipelineMetrics> =
    Lazy::new(|| PipelineMetrics::new(&PIPELINE_REGISTRY));

/// Gather the current metric families for scraping.
#[must_use]
pub fn gather() -> Vec<MetricFamily> {
    PIPELINE_REGISTRY.gather()
}

/// The pipeline related metrics.
#[derive(Debug)]
pub struct PipelineMetrics {
    /// The durations of fuse operations. With label: `[op]`.
    fuse_operation_duration_seconds: HistogramVec,
}

impl PipelineMetrics {
    /// Creates an instance of `PipelineMetrics` and registers its
    /// collectors into the specified registry.
    ///
    /// # Panics
    /// This method panics if it is called multiple times on the same
    /// registry.
    fn new(registry: &Registry) -> Self {
        let fuse_operation_duration_seconds = register_histogram_vec_with_registry!(
            "fuse_operation_duration_seconds",
            "The durations of fuse operations",
            &["op"],
            linear_buckets(0.005, 0.005, 20).expect("`count` and `width` is not zero"),
            registry,
        )
        .expect("Metrics name must be unique");

        Self {
            fuse_operation_duration_seconds,
        }
    }

    /// Observes the duration of one FUSE operation from frame arrival to
    /// reply emission.
    pub fn observe_operation_duration(&self, op: &str, elapsed: Duration) {
        self.fuse_operation_duration_seconds
            .with_label_values(&[op])
            .observe(elapsed.as_secs_f64());
    }
}
