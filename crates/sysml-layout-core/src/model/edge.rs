//! Edges of the diagram graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// The kind of relationship an edge represents.
///
/// `Composition` and `Generalization` refine `Connector` for block definition
/// diagrams, where they drive the rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Connector,
    Composition,
    Generalization,
    Flow,
    Message,
    TraceLink,
}

impl EdgeKind {
    /// Only reflexive messages and connectors may start and end at the same node.
    pub fn allows_self_loop(self) -> bool {
        matches!(self, Self::Connector | Self::Message)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connector => "connector",
            Self::Composition => "composition",
            Self::Generalization => "generalization",
            Self::Flow => "flow",
            Self::Message => "message",
            Self::TraceLink => "trace-link",
        };
        write!(f, "{name}")
    }
}

/// A directed edge between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Edge {
    id: Id,
    kind: EdgeKind,
    source: Id,
    target: Id,
    #[serde(default)]
    sequence: Option<u32>,
    #[serde(default)]
    label: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<Id>, kind: EdgeKind, source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            target: target.into(),
            sequence: None,
            label: None,
        }
    }

    /// Sets the sequencing index used to order sequence diagram messages.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn sequence(&self) -> Option<u32> {
        self.sequence
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_loop_permissions() {
        assert!(EdgeKind::Message.allows_self_loop());
        assert!(EdgeKind::Connector.allows_self_loop());
        assert!(!EdgeKind::Flow.allows_self_loop());
        assert!(!EdgeKind::TraceLink.allows_self_loop());
        assert!(!EdgeKind::Generalization.allows_self_loop());
    }

    #[test]
    fn test_deserialize_edge() {
        let json = r#"{
            "id": "m1",
            "kind": "message",
            "source": "L1",
            "target": "L2",
            "sequence": 3,
            "label": "ping()"
        }"#;
        let edge: Edge = serde_json::from_str(json).expect("valid edge");

        assert_eq!(edge.kind(), EdgeKind::Message);
        assert_eq!(edge.source(), "L1");
        assert_eq!(edge.target(), "L2");
        assert_eq!(edge.sequence(), Some(3));
        assert_eq!(edge.label(), Some("ping()"));
        assert!(!edge.is_self_loop());
    }

    #[test]
    fn test_kind_display_matches_serde_names() {
        assert_eq!(EdgeKind::TraceLink.to_string(), "trace-link");
        let kind: EdgeKind = serde_json::from_str("\"trace-link\"").expect("valid kind");
        assert_eq!(kind, EdgeKind::TraceLink);
    }
}
