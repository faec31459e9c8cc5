//! Nodes of the diagram graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// The kind of model element a node represents.
///
/// The names match external configuration strings (kebab-case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Block,
    Port,
    ActivityNode,
    Lifeline,
    Requirement,
}

impl NodeKind {
    /// Ports are anchored to their owner rather than laid out freely.
    pub fn is_port(self) -> bool {
        matches!(self, Self::Port)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Block => "block",
            Self::Port => "port",
            Self::ActivityNode => "activity-node",
            Self::Lifeline => "lifeline",
            Self::Requirement => "requirement",
        };
        write!(f, "{name}")
    }
}

/// Refinement of [`NodeKind::ActivityNode`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    #[default]
    Action,
    Decision,
    Merge,
    Fork,
    Join,
    Initial,
    Final,
}

/// Intrinsic size hint of a node. Missing dimensions are sized automatically.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
pub struct SizeHint {
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    height: Option<f32>,
}

impl SizeHint {
    /// Creates a size hint with both dimensions fixed.
    pub fn fixed(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Creates a size hint that leaves both dimensions to auto sizing.
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn width(&self) -> Option<f32> {
        self.width
    }

    pub fn height(&self) -> Option<f32> {
        self.height
    }

    /// Returns a description of the first invalid dimension, if any.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(format!("{name} must be finite, got {value}"));
                }
                if value < 0.0 {
                    return Err(format!("{name} must not be negative, got {value}"));
                }
            }
        }
        Ok(())
    }
}

/// A node of the diagram graph.
///
/// # Examples
///
/// ```
/// use sysml_layout_core::model::{Node, NodeKind};
///
/// let engine = Node::new("Engine", NodeKind::Block)
///     .with_label("«block» Engine")
///     .with_children(["Engine.fuel"]);
/// assert_eq!(engine.label(), "«block» Engine");
/// assert_eq!(engine.children().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    id: Id,
    kind: NodeKind,
    #[serde(default)]
    size: SizeHint,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    style_class: Option<String>,
    #[serde(default)]
    children: Vec<Id>,
    #[serde(default)]
    activity_kind: Option<ActivityKind>,
    #[serde(default)]
    lane: Option<String>,
}

impl Node {
    /// Creates a node with auto size and no label, style, children or lane.
    pub fn new(id: impl Into<Id>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            size: SizeHint::auto(),
            label: None,
            style_class: None,
            children: Vec::new(),
            activity_kind: None,
            lane: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_size(mut self, size: SizeHint) -> Self {
        self.size = size;
        self
    }

    pub fn with_style_class(mut self, style_class: impl Into<String>) -> Self {
        self.style_class = Some(style_class.into());
        self
    }

    /// Sets the owned child nodes (composition), e.g. the ports of a block.
    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_activity_kind(mut self, activity_kind: ActivityKind) -> Self {
        self.activity_kind = Some(activity_kind);
        self
    }

    /// Assigns the node to a swimlane.
    pub fn with_lane(mut self, lane: impl Into<String>) -> Self {
        self.lane = Some(lane.into());
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn size(&self) -> SizeHint {
        self.size
    }

    /// The text to display: the label when present, the id otherwise.
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn style_class(&self) -> Option<&str> {
        self.style_class.as_deref()
    }

    pub fn children(&self) -> &[Id] {
        &self.children
    }

    /// The activity refinement; activity nodes without one are actions.
    pub fn activity_kind(&self) -> Option<ActivityKind> {
        match self.kind {
            NodeKind::ActivityNode => Some(self.activity_kind.unwrap_or_default()),
            _ => self.activity_kind,
        }
    }

    pub fn lane(&self) -> Option<&str> {
        self.lane.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_falls_back_to_id() {
        let node = Node::new("Battery", NodeKind::Block);
        assert_eq!(node.label(), "Battery");

        let labelled = node.with_label("Main Battery");
        assert_eq!(labelled.label(), "Main Battery");
    }

    #[test]
    fn test_activity_kind_defaults_to_action() {
        let action = Node::new("a1", NodeKind::ActivityNode);
        assert_eq!(action.activity_kind(), Some(ActivityKind::Action));

        let block = Node::new("b1", NodeKind::Block);
        assert_eq!(block.activity_kind(), None);
    }

    #[test]
    fn test_size_hint_validation() {
        assert!(SizeHint::fixed(10.0, 20.0).validate().is_ok());
        assert!(SizeHint::fixed(-1.0, 20.0).validate().is_err());
        assert!(SizeHint::fixed(10.0, f32::NAN).validate().is_err());
        assert!(SizeHint::auto().validate().is_ok());
    }

    #[test]
    fn test_deserialize_node() {
        let json = r#"{
            "id": "decide",
            "kind": "activity-node",
            "activity_kind": "decision",
            "lane": "Controller",
            "size": { "width": 40.0 }
        }"#;
        let node: Node = serde_json::from_str(json).expect("valid node");

        assert_eq!(node.id(), "decide");
        assert_eq!(node.kind(), NodeKind::ActivityNode);
        assert_eq!(node.activity_kind(), Some(ActivityKind::Decision));
        assert_eq!(node.lane(), Some("Controller"));
        assert_eq!(node.size().width(), Some(40.0));
        assert_eq!(node.size().height(), None);
    }
}
