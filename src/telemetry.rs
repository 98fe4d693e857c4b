use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    request_counter: Counter<u64>,
    inference_duration: Histogram<u64>,
    records_saved: Counter<u64>,
    searches: Counter<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .unwrap();

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("fashion_detect");
        global::set_meter_provider(provider);

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of requests")
            .build();

        // Remote inference calls run from tens of milliseconds to several
        // seconds, so the buckets thin out toward the tail.
        let boundaries = generate_boundaries((15, 30, 60, 500, 5000));

        let inference_duration = meter
            .u64_histogram("inference_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Duration of remote inference calls in milliseconds")
            .build();

        let records_saved = meter
            .u64_counter("records_saved_total")
            .with_description("Records written to the remote table")
            .build();

        let searches = meter
            .u64_counter("record_searches_total")
            .with_description("Search queries issued against the remote table")
            .build();

        Metrics {
            request_counter,
            inference_duration,
            records_saved,
            searches,
            registry,
        }
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_inference_duration(&self, duration_ms: u64, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.inference_duration.record(duration_ms, &attributes);
    }

    pub fn record_record_saved(&self) {
        self.records_saved.add(1, &[]);
    }

    pub fn record_search(&self, filtered: bool) {
        let attributes = vec![KeyValue::new("filtered", filtered)];
        self.searches.add(1, &attributes);
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 10;
    let middle_step: usize = 2;
    let end_step: usize = 20;
    let tail_step: usize = 100;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_boundaries() {
        let parts = (5, 25, 29, 49, 149);
        let get = generate_boundaries(parts);
        let expected = vec![5.0, 15.0, 25.0, 27.0, 29.0, 49.0, 149.0];

        assert_eq!(get, expected);
    }
}
