use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

pub struct Metrics {
    request_counter: IntCounterVec,
    prediction_duration: HistogramVec,
    prediction_outcomes: IntCounterVec,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("plant_health".to_string()), None)?;

        let request_counter = IntCounterVec::new(
            Opts::new("requests_total", "Total number of requests"),
            &["route"],
        )?;

        let prediction_duration = HistogramVec::new(
            HistogramOpts::new(
                "prediction_duration_ms",
                "Duration of prediction operations in milliseconds",
            )
            .buckets(prediction_buckets()?),
            &["route"],
        )?;

        let prediction_outcomes = IntCounterVec::new(
            Opts::new("predictions_total", "Predictions by resulting health status"),
            &["outcome"],
        )?;

        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(prediction_duration.clone()))?;
        registry.register(Box::new(prediction_outcomes.clone()))?;

        Ok(Metrics {
            request_counter,
            prediction_duration,
            prediction_outcomes,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        self.request_counter.with_label_values(&[route]).inc();
    }

    pub fn record_prediction_duration(&self, duration_ms: u64, route: &str) {
        self.prediction_duration
            .with_label_values(&[route])
            .observe(duration_ms as f64);
    }

    /// `outcome` is a health status, or `error` for failed predictions.
    pub fn record_prediction_outcome(&self, outcome: &str) {
        self.prediction_outcomes.with_label_values(&[outcome]).inc();
    }
}

/// Millisecond buckets doubling from 2ms up to about 2s.
fn prediction_buckets() -> Result<Vec<f64>, prometheus::Error> {
    prometheus::exponential_buckets(2.0, 2.0, 11)
}
