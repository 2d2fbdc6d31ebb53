use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::str::FromStr;
use std::string::FromUtf8Error;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Textual stand-in `ceph` prints for non-finite numbers, e.g. the
/// utilization of an OSD without capacity.
pub const NAN_SENTINEL: &str = "-nan";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error running: {command}")]
    SourceUnavailable {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error running: {command} ({status}): {stderr}")]
    SourceFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("report is not valid UTF-8")]
    Encoding(#[from] FromUtf8Error),

    #[error("reading report")]
    Io(#[from] std::io::Error),

    #[error("parsing report")]
    Parse(#[from] serde_json::Error),
}

impl LoadError {
    /// Whether the report could not be obtained at all, as opposed to being
    /// obtained but unreadable.
    #[must_use]
    pub const fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::SourceFailed { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    #[serde(rename = "osd")]
    Device,
    /// host, rack, datacenter and every other grouping level
    #[serde(other)]
    Intermediate,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Node {
    id: i64,
    name: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    children: Option<Vec<i64>>,
    #[serde(default)]
    utilization: f64,
    #[serde(default)]
    kb: u64,
    #[serde(default)]
    kb_used: u64,
    #[serde(default)]
    kb_avail: u64,
}

impl Node {
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Child ids in report order. Absent and `null` lists are empty.
    #[must_use]
    pub fn children(&self) -> &[i64] {
        self.children.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub const fn utilization(&self) -> f64 {
        self.utilization
    }

    #[must_use]
    pub const fn kb(&self) -> u64 {
        self.kb
    }

    #[must_use]
    pub const fn kb_used(&self) -> u64 {
        self.kb_used
    }

    #[must_use]
    pub const fn kb_avail(&self) -> u64 {
        self.kb_avail
    }
}

/// Parsed output of `ceph osd df tree -f json`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Report {
    nodes: Vec<Node>,
}

impl Report {
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

impl FromStr for Report {
    type Err = LoadError;

    /// Parses a report, replacing every [`NAN_SENTINEL`] in the raw text with
    /// `0` first.
    ///
    /// The substitution is textual, so a name containing `-nan` gets
    /// rewritten as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.replace(NAN_SENTINEL, "0");
        let report = serde_json::from_str(&s)?;
        Ok(report)
    }
}

/// Runs `ceph osd df tree -f json`, and returns the parsed output.
///
/// # Errors
///
/// Returns an error if `ceph` cannot be started, exits unsuccessfully or if
/// parsing its output fails.
pub fn run(ceph: &str) -> Result<Report, LoadError> {
    let mut cmd = Command::new(ceph);
    cmd.args(["osd", "df", "tree", "-f", "json"]);

    debug!("running {:?}", cmd);

    let output = cmd
        .output()
        .map_err(|source| LoadError::SourceUnavailable {
            command: format!("{:?}", cmd),
            source,
        })?;

    if output.status.success() {
        let output = String::from_utf8(output.stdout)?;
        output.parse()
    } else {
        Err(LoadError::SourceFailed {
            command: format!("{:?}", cmd),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().into(),
        })
    }
}

/// Reads a previously saved report, e.g. from a file or **STDIN**.
///
/// # Errors
///
/// Returns an error if reading fails or if parsing the report fails.
pub fn read<R: Read>(mut reader: R) -> Result<Report, LoadError> {
    let mut buf = Vec::with_capacity(64 * 1024);
    reader.read_to_end(&mut buf)?;

    let s = String::from_utf8(buf)?;
    s.parse()
}

/// Where a report comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Run the given `ceph` binary.
    Ceph(String),
    Stdin,
    File(PathBuf),
}

impl Default for Source {
    fn default() -> Self {
        Self::Ceph("ceph".into())
    }
}

impl Source {
    /// Loads and parses the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be obtained or parsed.
    pub fn load(&self) -> Result<Report, LoadError> {
        match self {
            Self::Ceph(ceph) => run(ceph),
            Self::Stdin => read(std::io::stdin().lock()),
            Self::File(path) => read(BufReader::new(File::open(path)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let s = concat!(
            r#"{"nodes":["#,
            r#"{"id":-1,"name":"default","type":"root","type_id":11,"children":[-2]},"#,
            r#"{"id":-2,"name":"node1","type":"host","type_id":1,"pool_weights":{},"children":[1,0]},"#,
            r#"{"id":0,"device_class":"hdd","name":"osd.0","type":"osd","type_id":0,"#,
            r#""kb":1048576,"kb_used":524288,"kb_avail":524288,"utilization":50.0,"var":1.0,"pgs":12},"#,
            r#"{"id":1,"device_class":"hdd","name":"osd.1","type":"osd","type_id":0,"#,
            r#""kb":1048576,"kb_used":0,"kb_avail":1048576,"utilization":0,"var":0,"pgs":0}"#,
            r#"],"stray":[],"summary":{"total_kb":2097152,"average_utilization":25.0}}"#,
        );

        let report: Report = s.parse().unwrap();
        let nodes = report.nodes();

        assert_eq!(nodes.len(), 4);

        assert_eq!(nodes[0].node_type(), NodeType::Root);
        assert_eq!(nodes[0].children(), &[-2]);

        assert_eq!(nodes[1].node_type(), NodeType::Intermediate);
        assert_eq!(nodes[1].children(), &[1, 0]);

        assert_eq!(
            nodes[2],
            Node {
                id: 0,
                name: "osd.0".into(),
                node_type: NodeType::Device,
                children: None,
                utilization: 50.0,
                kb: 1_048_576,
                kb_used: 524_288,
                kb_avail: 524_288,
            }
        );
    }

    #[test]
    fn nan_sentinel_becomes_zero() {
        let s = concat!(
            r#"{"nodes":[{"id":3,"name":"osd.3","type":"osd","#,
            r#""kb":0,"kb_used":0,"kb_avail":0,"utilization":-nan,"var":-nan}]}"#,
        );

        let report: Report = s.parse().unwrap();

        assert_eq!(report.nodes()[0].utilization(), 0.0);
    }

    #[test]
    fn nan_sentinel_inside_names_is_replaced_too() {
        let s = r#"{"nodes":[{"id":-1,"name":"banana-nana","type":"root"}]}"#;

        let report: Report = s.parse().unwrap();

        assert_eq!(report.nodes()[0].name(), "banana0a");
    }

    #[test]
    fn missing_and_null_children_are_empty() {
        let s = concat!(
            r#"{"nodes":["#,
            r#"{"id":-1,"name":"a","type":"root"},"#,
            r#"{"id":-2,"name":"b","type":"root","children":null},"#,
            r#"{"id":-3,"name":"c","type":"root","children":[]}"#,
            r#"]}"#,
        );

        let report: Report = s.parse().unwrap();

        for node in report.nodes() {
            assert!(node.children().is_empty(), "{}", node.name());
        }
    }

    #[test]
    fn malformed_reports_are_parse_errors() {
        for s in [
            "",
            "not json",
            r#"{"osds":[]}"#,
            r#"{"nodes":[{"id":"x","name":"a","type":"root"}]}"#,
            r#"{"nodes":[{"id":1,"name":"osd.1","type":"osd","kb":-5}]}"#,
        ] {
            let err = s.parse::<Report>().unwrap_err();
            assert!(matches!(err, LoadError::Parse(_)), "{}: {:?}", s, err);
            assert!(!err.is_source_unavailable());
        }
    }

    #[test]
    fn read_rejects_invalid_utf8() {
        let bytes: &[u8] = &[b'{', 0xff, b'}'];

        let err = read(bytes).unwrap_err();

        assert!(matches!(err, LoadError::Encoding(_)));
    }

    #[test]
    fn run_missing_binary_is_source_unavailable() {
        let err = run("/nonexistent/ceph-usage-test/ceph").unwrap_err();

        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
        assert!(err.is_source_unavailable());
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir()
            .join(format!("ceph-usage-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"nodes":[{"id":-1,"name":"default","type":"root"}]}"#,
        )
        .unwrap();

        let report = Source::File(path.clone()).load();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.unwrap().nodes()[0].name(), "default");
    }

    #[test]
    fn load_from_missing_file() {
        let err = Source::File("/nonexistent/ceph-usage-test.json".into())
            .load()
            .unwrap_err();

        assert!(matches!(err, LoadError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn run_failing_binary_is_source_failed() {
        let err = run("false").unwrap_err();

        assert!(matches!(err, LoadError::SourceFailed { .. }));
        assert!(err.is_source_unavailable());
    }
}
