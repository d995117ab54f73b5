//! Turns decoded management API snapshots into metric points
//!
//! Missing or non-numeric fields are not errors: the point is simply not
//! produced, which leaves the previous registry value for that key in place.
//! Only a snapshot that cannot be attributed to a node fails.

use serde_json::Value;
use tracing::debug;

use crate::error::{PollError, PollResult};
use crate::metrics::{
    CHANNELS_TOTAL, CONNECTIONS_TOTAL, CONSUMERS_TOTAL, EXCHANGES_TOTAL, MESSAGES,
    MESSAGES_ACKED, MESSAGES_CONFIRMED, MESSAGES_DELIVERED, MESSAGES_DELIVERED_GET,
    MESSAGES_DELIVERED_NO_ACK, MESSAGES_PUBLISHED, MESSAGES_READY, MESSAGES_REDELIVERED,
    MESSAGES_TOTAL, MESSAGES_UNACKNOWLEDGED, MetricPoint, QUEUES_TOTAL,
};

/// `(group, field, metric)` for every value read from the overview
const OVERVIEW_FIELDS: &[(&str, &str, &str)] = &[
    ("object_totals", "channels", CHANNELS_TOTAL),
    ("object_totals", "connections", CONNECTIONS_TOTAL),
    ("object_totals", "consumers", CONSUMERS_TOTAL),
    ("object_totals", "queues", QUEUES_TOTAL),
    ("object_totals", "exchanges", EXCHANGES_TOTAL),
    ("queue_totals", "messages", MESSAGES),
    ("queue_totals", "messages_ready", MESSAGES_READY),
    ("queue_totals", "messages_unacknowledged", MESSAGES_UNACKNOWLEDGED),
    ("message_stats", "publish", MESSAGES_PUBLISHED),
    ("message_stats", "ack", MESSAGES_ACKED),
    ("message_stats", "deliver", MESSAGES_DELIVERED),
    ("message_stats", "confirm", MESSAGES_CONFIRMED),
    ("message_stats", "redeliver", MESSAGES_REDELIVERED),
    ("message_stats", "deliver_get", MESSAGES_DELIVERED_GET),
    ("message_stats", "deliver_no_ack", MESSAGES_DELIVERED_NO_ACK),
];

/// Number of points an overview with every field present produces
pub const OVERVIEW_METRIC_COUNT: usize = OVERVIEW_FIELDS.len();

/// Map an `/api/overview` object to its metric points
///
/// Every point is labeled with the overview's `node` field.
pub fn map_overview(overview: &Value) -> PollResult<Vec<MetricPoint>> {
    let label = node_label(overview)?;

    let points = OVERVIEW_FIELDS
        .iter()
        .filter_map(|&(group, field, metric)| {
            let value = overview.get(group).and_then(|g| g.get(field));
            match value.and_then(Value::as_f64) {
                Some(value) => Some(MetricPoint::new(metric, label, value)),
                None => {
                    debug!(node = %label, "skipping {group}.{field}: {}", describe_gap(value));
                    None
                }
            }
        })
        .collect();

    Ok(points)
}

/// Map an `/api/queues` array to the `messages_total` point
///
/// The total is the sum of every queue's `messages` field and is labeled with
/// the `node` of the first queue. An empty listing fails with
/// [`PollError::EmptyQueueList`] since there is no node to attribute it to.
pub fn map_queue_messages(queues: &Value) -> PollResult<MetricPoint> {
    let queues = queues
        .as_array()
        .ok_or_else(|| PollError::Decode("queue listing is not an array".to_string()))?;

    let first = queues.first().ok_or(PollError::EmptyQueueList)?;
    let label = node_label(first)?;

    let total = queues
        .iter()
        .filter_map(|queue| {
            let messages = queue.get("messages").and_then(Value::as_f64);
            if messages.is_none() {
                debug!(
                    node = %label,
                    "queue {} has no numeric message count",
                    queue.get("name").and_then(serde_json::Value::as_str).unwrap_or("<unnamed>")
                );
            }
            messages
        })
        .sum::<f64>();

    Ok(MetricPoint::new(MESSAGES_TOTAL, label, total))
}

fn node_label(value: &Value) -> PollResult<&str> {
    value
        .get("node")
        .and_then(Value::as_str)
        .ok_or(PollError::MissingNodeLabel)
}

fn describe_gap(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(_) => "not a number",
    }
}
