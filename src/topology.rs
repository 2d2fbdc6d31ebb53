use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use thiserror::Error;

use crate::report::{Node, NodeType};

/// Something unexpected found while descending from a root. The devices
/// collected so far are still used.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TraversalAnomaly {
    #[error("node {0} is its own ancestor, not descending again")]
    Cycle(i64),

    #[error("child {0} does not match any node")]
    Unresolved(i64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceStats {
    pub id: i64,
    pub utilization: f64,
    pub kb: u64,
    pub kb_used: u64,
    pub kb_avail: u64,
}

impl From<&Node> for DeviceStats {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id(),
            utilization: node.utilization(),
            kb: node.kb(),
            kb_used: node.kb_used(),
            kb_avail: node.kb_avail(),
        }
    }
}

/// Devices reachable from one root, keyed by device name.
#[derive(Debug, Default, PartialEq)]
pub struct Devices {
    devices: BTreeMap<String, DeviceStats>,
    anomalies: Vec<TraversalAnomaly>,
}

impl Devices {
    #[must_use]
    pub const fn devices(&self) -> &BTreeMap<String, DeviceStats> {
        &self.devices
    }

    #[must_use]
    pub fn anomalies(&self) -> &[TraversalAnomaly] {
        &self.anomalies
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Read-only view on the nodes of a report, indexed by id.
pub struct Topology<'a> {
    nodes: &'a [Node],
    by_id: HashMap<i64, Vec<&'a Node>>,
}

impl<'a> Topology<'a> {
    #[must_use]
    pub fn new(nodes: &'a [Node]) -> Self {
        let mut by_id: HashMap<i64, Vec<&Node>> = HashMap::new();

        for node in nodes {
            by_id.entry(node.id()).or_default().push(node);
        }

        Self { nodes, by_id }
    }

    /// Returns all crush roots as name to id.
    ///
    /// Roots sharing a name collapse into one entry with the id of the one
    /// that comes last in the report.
    #[must_use]
    pub fn roots(&self) -> BTreeMap<String, i64> {
        discover_roots(self.nodes)
    }

    /// Collects every device reachable from `root_id` through `children`.
    ///
    /// Nodes are visited depth first in report order. All nodes sharing an
    /// id are visited one after another, each with its whole subtree. A
    /// device name seen twice keeps the stats of the later node. An id is
    /// descended into at most once, so cyclic and diamond shaped reports
    /// terminate. Only ids found again below themselves count as a
    /// [`TraversalAnomaly::Cycle`].
    #[must_use]
    pub fn devices(&self, root_id: i64) -> Devices {
        let mut devices = Devices::default();
        let mut visited = HashSet::new();
        let mut path = HashSet::new();
        let mut stack = vec![Work::Visit(root_id)];

        while let Some(work) = stack.pop() {
            match work {
                Work::Visit(id) => {
                    if path.contains(&id) {
                        let anomaly = TraversalAnomaly::Cycle(id);
                        devices.anomalies.push(anomaly);
                        continue;
                    }

                    if !visited.insert(id) {
                        debug!("node {} already visited", id);
                        continue;
                    }

                    let Some(matches) = self.by_id.get(&id) else {
                        let anomaly = TraversalAnomaly::Unresolved(id);
                        devices.anomalies.push(anomaly);
                        continue;
                    };

                    path.insert(id);
                    stack.push(Work::Leave(id));
                    stack.extend(
                        matches.iter().rev().copied().map(Work::Node),
                    );
                }

                Work::Node(node) => {
                    if node.node_type() == NodeType::Device {
                        let stats = DeviceStats::from(node);
                        devices.devices.insert(node.name().into(), stats);
                    }

                    let children = node.children().iter().rev().copied();
                    stack.extend(children.map(Work::Visit));
                }

                Work::Leave(id) => {
                    path.remove(&id);
                }
            }
        }

        devices
    }
}

enum Work<'a> {
    Visit(i64),
    Node(&'a Node),
    Leave(i64),
}

/// Returns all crush roots of `nodes` as name to id, last one wins.
#[must_use]
pub fn discover_roots(nodes: &[Node]) -> BTreeMap<String, i64> {
    nodes
        .iter()
        .filter(|node| node.node_type() == NodeType::Root)
        .map(|node| (node.name().into(), node.id()))
        .collect()
}

/// Collects the devices below `root_id`, see [`Topology::devices`].
#[must_use]
pub fn collect_devices(root_id: i64, nodes: &[Node]) -> Devices {
    Topology::new(nodes).devices(root_id)
}
