use prometheus_exporter::prometheus::{
    HistogramTimer, HistogramVec, IntCounterVec, IntGaugeVec, default_registry,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry,
};

// Provisioning each metrics
lazy_static::lazy_static! {
    pub static ref STATE_TRANSITION_TIME: HistogramVec = create_histogram_vec(
        "stf_state_transition_time",
        "Duration of the sections of a state transition",
        &["section"]
    );

    pub static ref PAYLOAD_GAS_USED: HistogramVec = create_histogram_vec(
        "stf_payload_gas_used",
        "Gas used by each processed execution payload",
        &[]
    );

    pub static ref PAYLOAD_TIMESTAMP_SKEW: IntGaugeVec = create_int_gauge_vec(
        "stf_payload_timestamp_skew_seconds",
        "Consensus time minus the timestamp of the last processed execution payload",
        &[]
    );

    pub static ref DEPOSIT_SIGNATURE_FAILURES: IntCounterVec = create_int_counter_vec(
        "stf_deposit_signature_failures",
        "Deposits dropped because their signature did not verify",
        &[]
    );

    pub static ref VALIDATOR_UPDATES: IntCounterVec = create_int_counter_vec(
        "stf_validator_updates",
        "Validator updates handed to the consensus engine",
        &["kind"]
    );
}

/// Create a new gauge metric
pub fn create_int_gauge_vec(name: &str, help: &str, label_names: &[&str]) -> IntGaugeVec {
    let registry = default_registry();
    register_int_gauge_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int gauge vec")
}

/// Set the value of a gauge metric
pub fn set_int_gauge_vec(gauge_vec: &IntGaugeVec, value: i64, label_values: &[&str]) {
    gauge_vec.with_label_values(label_values).set(value);
}

/// Create a new counter metric
pub fn create_int_counter_vec(name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
    let registry = default_registry();
    register_int_counter_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int counter vec")
}

/// Increase a counter metric by ``value``
pub fn inc_int_counter_vec(counter_vec: &IntCounterVec, value: u64, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc_by(value);
}

/// Create a new histogram metric
pub fn create_histogram_vec(name: &str, help: &str, label_names: &[&str]) -> HistogramVec {
    let registry = default_registry();
    register_histogram_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create histogram")
}

/// Record a single observation on a histogram metric
pub fn observe_histogram_vec(histogram_vec: &HistogramVec, value: f64, label_values: &[&str]) {
    histogram_vec.with_label_values(label_values).observe(value);
}

/// Start a timer for a histogram metric
pub fn start_timer_vec(histogram_vec: &HistogramVec, label_values: &[&str]) -> HistogramTimer {
    histogram_vec.with_label_values(label_values).start_timer()
}

/// Stop a timer for a histogram metric
pub fn stop_timer(timer: HistogramTimer) {
    timer.observe_duration()
}
