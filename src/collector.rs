//! Prometheus collector over a registry snapshot
//!
//! The exporter owns its values in [`MetricRegistry`](crate::MetricRegistry)
//! with overwrite semantics. On every scrape the current snapshot is handed to
//! a [`SnapshotCollector`], which turns it into metric families for the
//! `prometheus` text encoder. Counters are emitted with the broker's value as
//! is; nothing is incremented locally.

use std::collections::HashMap;

use prometheus::core::{Collector, Desc};
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, Registry, TextEncoder};

use crate::metrics::{METRICS, MetricDesc, MetricKind, MetricPoint, NODE_LABEL};

/// Collector serving a fixed set of points
#[derive(Debug)]
pub struct SnapshotCollector {
    descs: Vec<Desc>,
    points: Vec<MetricPoint>,
}

impl SnapshotCollector {
    pub fn new(points: Vec<MetricPoint>) -> prometheus::Result<Self> {
        let descs = METRICS
            .iter()
            .map(|desc| {
                Desc::new(
                    desc.name.to_string(),
                    desc.help.to_string(),
                    vec![NODE_LABEL.to_string()],
                    HashMap::new(),
                )
            })
            .collect::<prometheus::Result<Vec<_>>>()?;

        Ok(Self { descs, points })
    }
}

impl Collector for SnapshotCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        METRICS
            .iter()
            .filter_map(|desc| family(desc, &self.points))
            .collect()
    }
}

/// Build the family for one metric, `None` when it has no samples
fn family(desc: &MetricDesc, points: &[MetricPoint]) -> Option<MetricFamily> {
    let metrics: Vec<Metric> = points
        .iter()
        .filter(|p| p.name == desc.name)
        .map(|p| sample(desc.kind, p))
        .collect();

    if metrics.is_empty() {
        return None;
    }

    let mut family = MetricFamily::default();
    family.set_name(desc.name.to_string());
    family.set_help(desc.help.to_string());
    family.set_field_type(match desc.kind {
        MetricKind::Gauge => MetricType::GAUGE,
        MetricKind::Counter => MetricType::COUNTER,
    });
    family.set_metric(metrics.into());
    Some(family)
}

fn sample(kind: MetricKind, point: &MetricPoint) -> Metric {
    let mut label = LabelPair::default();
    label.set_name(NODE_LABEL.to_string());
    label.set_value(point.label.clone());

    let mut metric = Metric::default();
    metric.set_label(vec![label].into());
    match kind {
        MetricKind::Gauge => {
            let mut gauge = Gauge::default();
            gauge.set_value(point.value);
            metric.set_gauge(gauge);
        }
        MetricKind::Counter => {
            let mut counter = Counter::default();
            counter.set_value(point.value);
            metric.set_counter(counter);
        }
    }
    metric
}

/// Encode points in the Prometheus text exposition format
///
/// Families without any sample are left out entirely.
pub fn encode_points(points: Vec<MetricPoint>) -> prometheus::Result<String> {
    let registry = Registry::new();
    registry.register(Box::new(SnapshotCollector::new(points)?))?;

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
