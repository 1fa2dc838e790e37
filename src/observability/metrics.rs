use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub offer_transitions_total: IntCounterVec,
    pub transportation_transitions_total: IntCounterVec,
    pub accept_latency_seconds: HistogramVec,
    pub channel_connections: IntGauge,
    pub channel_messages_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let offer_transitions_total = IntCounterVec::new(
            Opts::new(
                "offer_transitions_total",
                "Offer lifecycle operations by transition and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid offer_transitions_total metric");

        let transportation_transitions_total = IntCounterVec::new(
            Opts::new(
                "transportation_transitions_total",
                "Transportation lifecycle operations by transition and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid transportation_transitions_total metric");

        let accept_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "accept_latency_seconds",
                "Latency of offer acceptance including lock wait, in seconds",
            ),
            &["outcome"],
        )
        .expect("valid accept_latency_seconds metric");

        let channel_connections = IntGauge::new(
            "channel_connections",
            "Currently admitted location channel connections",
        )
        .expect("valid channel_connections metric");

        let channel_messages_total = IntCounterVec::new(
            Opts::new(
                "channel_messages_total",
                "Location channel messages handled by kind",
            ),
            &["kind"],
        )
        .expect("valid channel_messages_total metric");

        registry
            .register(Box::new(offer_transitions_total.clone()))
            .expect("register offer_transitions_total");
        registry
            .register(Box::new(transportation_transitions_total.clone()))
            .expect("register transportation_transitions_total");
        registry
            .register(Box::new(accept_latency_seconds.clone()))
            .expect("register accept_latency_seconds");
        registry
            .register(Box::new(channel_connections.clone()))
            .expect("register channel_connections");
        registry
            .register(Box::new(channel_messages_total.clone()))
            .expect("register channel_messages_total");

        Self {
            registry,
            offer_transitions_total,
            transportation_transitions_total,
            accept_latency_seconds,
            channel_connections,
            channel_messages_total,
        }
    }

    pub fn record_offer<T, E>(&self, transition: &str, result: &Result<T, E>) {
        self.offer_transitions_total
            .with_label_values(&[transition, outcome(result)])
            .inc();
    }

    pub fn record_transportation<T, E>(&self, transition: &str, result: &Result<T, E>) {
        self.transportation_transitions_total
            .with_label_values(&[transition, outcome(result)])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
