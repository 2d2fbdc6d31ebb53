#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

//! Ceph usage per crush root, aggregated from `ceph osd df tree`.

mod output;
mod report;
mod summary;
mod topology;

use log::warn;

pub use output::{to_json, to_table};
pub use report::{
    read, run, LoadError, Node, NodeType, Report, Source, NAN_SENTINEL,
};
pub use summary::{round2, summarize, to_gb, to_tb, RootSummary, Unit};
pub use topology::{
    collect_devices, discover_roots, DeviceStats, Devices, Topology,
    TraversalAnomaly,
};

/// Summarizes every crush root of the report, sorted by root name.
///
/// Anomalies found while collecting the devices of a root, like cycles or
/// dangling children, are logged as warnings. The affected root is
/// summarized from whatever devices were found.
#[must_use]
pub fn summarize_all(report: &Report) -> Vec<RootSummary> {
    let topology = Topology::new(report.nodes());

    topology
        .roots()
        .into_iter()
        .map(|(name, id)| summarize_logged(&topology, &name, id))
        .collect()
}

/// Summarizes a single crush root by name.
#[must_use]
pub fn summarize_root(report: &Report, name: &str) -> Option<RootSummary> {
    let topology = Topology::new(report.nodes());
    let id = *topology.roots().get(name)?;

    Some(summarize_logged(&topology, name, id))
}

fn summarize_logged(topology: &Topology, name: &str, id: i64) -> RootSummary {
    let devices = topology.devices(id);

    for anomaly in devices.anomalies() {
        warn!("crush root {}: {}", name, anomaly);
    }

    summarize(name, &devices)
}
