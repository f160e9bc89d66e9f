use std::time::Duration;

use prometheus_exporter::prometheus::{
    HistogramTimer, HistogramVec, IntCounterVec, default_registry,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
};

/// Buckets, in seconds, for work that has to finish within a slot.
pub const SLOT_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 12.0,
];

pub fn create_int_counter_vec(name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
    register_int_counter_vec_with_registry!(name, help, label_names, default_registry())
        .expect("failed to create int counter vec")
}

pub fn inc_int_counter_vec(counter_vec: &IntCounterVec, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc();
}

pub fn inc_int_counter_vec_by(counter_vec: &IntCounterVec, value: u64, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc_by(value);
}

pub fn create_histogram_vec(
    name: &str,
    help: &str,
    label_names: &[&str],
    buckets: &[f64],
) -> HistogramVec {
    register_histogram_vec_with_registry!(
        name,
        help,
        label_names,
        buckets.to_vec(),
        default_registry()
    )
    .expect("failed to create histogram vec")
}

pub fn start_timer_vec(histogram_vec: &HistogramVec, label_values: &[&str]) -> HistogramTimer {
    histogram_vec.with_label_values(label_values).start_timer()
}

/// Records the time since `timer` started and returns it.
pub fn stop_timer(timer: HistogramTimer) -> Duration {
    Duration::from_secs_f64(timer.stop_and_record())
}
