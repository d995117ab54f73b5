//! The fixed set of metrics exported for every broker node

pub const CONNECTIONS_TOTAL: &str = "connections_total";
pub const CHANNELS_TOTAL: &str = "channels_total";
pub const QUEUES_TOTAL: &str = "queues_total";
pub const CONSUMERS_TOTAL: &str = "consumers_total";
pub const EXCHANGES_TOTAL: &str = "exchanges_total";
pub const MESSAGES_TOTAL: &str = "messages_total";
pub const MESSAGES: &str = "messages";
pub const MESSAGES_READY: &str = "messages_ready";
pub const MESSAGES_UNACKNOWLEDGED: &str = "messages_unacknowledged";
pub const MESSAGES_PUBLISHED: &str = "messages_published";
pub const MESSAGES_ACKED: &str = "messages_acked";
pub const MESSAGES_DELIVERED: &str = "messages_delivered";
pub const MESSAGES_CONFIRMED: &str = "messages_confirmed";
pub const MESSAGES_REDELIVERED: &str = "messages_redelivered";
pub const MESSAGES_DELIVERED_GET: &str = "messages_delivered_get";
pub const MESSAGES_DELIVERED_NO_ACK: &str = "messages_delivered_no_ack";

/// Name of the label every metric is partitioned by
pub const NODE_LABEL: &str = "node";

/// Prometheus metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    /// Mirrors a cumulative value reported by the broker. The exporter
    /// overwrites it on every observation and never sums locally.
    Counter,
}

/// Static description of one exported metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
}

/// Every metric family the exporter knows
pub const METRICS: &[MetricDesc] = &[
    MetricDesc {
        name: CONNECTIONS_TOTAL,
        help: "Total number of open connections.",
        kind: MetricKind::Gauge,
    },
    MetricDesc {
        name: CHANNELS_TOTAL,
        help: "Total number of open channels.",
        kind: MetricKind::Gauge,
    },
    MetricDesc {
        name: QUEUES_TOTAL,
        help: "Total number of queues in use.",
        kind: MetricKind::Gauge,
    },
    MetricDesc {
        name: CONSUMERS_TOTAL,
        help: "Total number of message consumers.",
        kind: MetricKind::Gauge,
    },
    MetricDesc {
        name: EXCHANGES_TOTAL,
        help: "Total number of exchanges in use.",
        kind: MetricKind::Gauge,
    },
    MetricDesc {
        name: MESSAGES_TOTAL,
        help: "Total number of messages in all queues.",
        kind: MetricKind::Gauge,
    },
    MetricDesc {
        name: MESSAGES,
        help: "Counter of messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_READY,
        help: "Counter of ready messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_UNACKNOWLEDGED,
        help: "Counter of unacknowledged messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_PUBLISHED,
        help: "Counter of published messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_ACKED,
        help: "Counter of acked messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_DELIVERED,
        help: "Counter of delivered messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_CONFIRMED,
        help: "Counter of confirmed messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_REDELIVERED,
        help: "Counter of redelivered messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_DELIVERED_GET,
        help: "Counter of delivered get messages.",
        kind: MetricKind::Counter,
    },
    MetricDesc {
        name: MESSAGES_DELIVERED_NO_ACK,
        help: "Counter of delivered no ack messages.",
        kind: MetricKind::Counter,
    },
];

/// One observed value for one node
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub name: &'static str,
    pub label: String,
    pub value: f64,
}

impl MetricPoint {
    pub fn new(name: &'static str, label: impl Into<String>, value: f64) -> Self {
        Self {
            name,
            label: label.into(),
            value,
        }
    }
}
