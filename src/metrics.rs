use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::response::CachePolicy;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder and publish the cache policy as gauges.
    /// Call once per process.
    pub fn init(cache: &CachePolicy) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_gauge!(
            "analysis_cache_max_age_secs",
            "s-maxage advertised on the analysis response."
        );
        describe_gauge!(
            "analysis_cache_stale_while_revalidate_secs",
            "stale-while-revalidate grace advertised on the analysis response."
        );
        gauge!("analysis_cache_max_age_secs").set(cache.max_age_secs as f64);
        gauge!("analysis_cache_stale_while_revalidate_secs")
            .set(cache.stale_while_revalidate_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
