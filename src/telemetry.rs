use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "energy_trading_platform=info,tower_http=info";

const REQUESTS_TOTAL: &str = "gateway_http_requests_total";
const REQUEST_DURATION: &str = "gateway_http_request_duration_seconds";
const RATE_LIMITED_TOTAL: &str = "gateway_rate_limited_total";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

// Human-readable logs for the gateway
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .compact()
        .init();
}

// One JSON object per line for the oracle simulator
pub fn init_json_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .json()
        .with_current_span(false)
        .init();
}

// Per-router recorder; never installed globally
pub struct GatewayMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayMetrics {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            metrics::describe_counter!(
                REQUESTS_TOTAL,
                "HTTP requests handled, by method, route and status"
            );
            metrics::describe_histogram!(
                REQUEST_DURATION,
                metrics::Unit::Seconds,
                "HTTP request latency, by method and route"
            );
            metrics::describe_counter!(RATE_LIMITED_TOTAL, "Requests rejected by the rate limiter");
        });

        Self { recorder, handle }
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let method = method.to_string();
        let route = route.to_string();

        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(
                REQUESTS_TOTAL,
                "method" => method.clone(),
                "route" => route.clone(),
                "status" => status.to_string()
            )
            .increment(1);
            metrics::histogram!(REQUEST_DURATION, "method" => method, "route" => route)
                .record(elapsed.as_secs_f64());
        });
    }

    pub fn record_rate_limited(&self) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(RATE_LIMITED_TOTAL).increment(1);
        });
    }

    // Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_recorded_requests() {
        let metrics = GatewayMetrics::new();
        metrics.record_request("GET", "/health", 200, Duration::from_millis(3));
        metrics.record_request("GET", "/health", 200, Duration::from_millis(5));
        metrics.record_rate_limited();

        let output = metrics.render();
        assert!(output.contains(REQUESTS_TOTAL));
        assert!(output.contains("route=\"/health\""));
        assert!(output.contains("status=\"200\""));
        assert!(output.contains(REQUEST_DURATION));
        assert!(output.contains(&format!("{} 1", RATE_LIMITED_TOTAL)));
    }

    #[test]
    fn recorders_are_isolated() {
        let first = GatewayMetrics::new();
        let second = GatewayMetrics::new();
        first.record_request("POST", "/api/metrics/*rest", 502, Duration::from_millis(1));

        assert!(first.render().contains("/api/metrics/*rest"));
        assert!(!second.render().contains("/api/metrics/*rest"));
    }
}
