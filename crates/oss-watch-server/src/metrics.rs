//! Prometheus gauges for queue depth, rate-limit headroom, and job-run
//! durations. Only compiled with the `metrics` feature.

use prometheus::{Encoder, Gauge, HistogramVec, IntGauge, Registry, TextEncoder};

pub struct RegistryMetrics {
    registry: Registry,
    pub queue_depth: IntGauge,
    pub rate_limit_remaining: Gauge,
    pub job_run_duration_seconds: HistogramVec,
}

impl RegistryMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let queue_depth = IntGauge::new(
            "oss_watch_queue_depth",
            "Unprocessed queue entries awaiting deep analysis",
        )?;
        registry.register(Box::new(queue_depth.clone()))?;

        let rate_limit_remaining = Gauge::new(
            "oss_watch_rate_limit_remaining",
            "Core-class upstream requests remaining before the safety floor",
        )?;
        registry.register(Box::new(rate_limit_remaining.clone()))?;

        let job_run_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "oss_watch_job_run_duration_seconds",
                "Wall-clock duration of a pipeline run",
            ),
            &["job_type"],
        )?;
        registry.register(Box::new(job_run_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            queue_depth,
            rate_limit_remaining,
            job_run_duration_seconds,
        })
    }

    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
