//! Configuration for the layout engine.
//!
//! [`LayoutConfig`] implements [`serde::Deserialize`] with camelCase keys so it
//! can be loaded from any external source. Unknown keys are ignored and missing
//! keys fall back to their defaults. Counts are read as signed integers and
//! routing styles as free names, so out-of-range values survive parsing and are
//! reported by [`LayoutConfig::validate`].
//!
//! # Example
//!
//! ```
//! # use sysml_layout::config::{LayoutConfig, RoutingStyle};
//! # use sysml_layout::model::DiagramKind;
//! let config = LayoutConfig::default().with_node_spacing(45.0);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.routing_style_for(DiagramKind::Requirements), RoutingStyle::Curved);
//! ```

use serde::Deserialize;

use sysml_layout_core::model::DiagramKind;

use crate::error::ConfigError;

/// Upper bound for [`LayoutConfig::force_iterations`].
pub const MAX_FORCE_ITERATIONS: usize = 100_000;

/// Upper bound for [`LayoutConfig::layered_crossing_passes`].
pub const MAX_CROSSING_PASSES: usize = 1_000;

/// How edges are drawn between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStyle {
    /// Axis-aligned segments with rounded corners.
    Orthogonal,
    /// Cubic Bézier curves.
    Curved,
    /// A single straight segment. Used for sequence diagram messages.
    #[serde(skip_deserializing)]
    Straight,
}

/// A routing style as written in a config source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum RoutingStyleName {
    Known(RoutingStyle),
    Unknown(String),
}

/// Options controlling every layout strategy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    rank_separation: f32,
    node_spacing: f32,
    routing_style: Option<RoutingStyleName>,
    force_iterations: i64,
    layered_crossing_passes: i64,
    margin: f32,
    corner_radius: f32,
    message_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_separation: 60.0,
            node_spacing: 30.0,
            routing_style: None,
            force_iterations: 300,
            layered_crossing_passes: 6,
            margin: 20.0,
            corner_radius: 4.0,
            message_spacing: 40.0,
        }
    }
}

impl LayoutConfig {
    /// Vertical distance between consecutive rank bands.
    pub fn rank_separation(&self) -> f32 {
        self.rank_separation
    }

    /// Minimum horizontal distance between neighbouring nodes.
    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    /// The explicitly configured routing style, if any.
    ///
    /// An unknown name reads as `None`; [`Self::validate`] rejects it.
    pub fn routing_style(&self) -> Option<RoutingStyle> {
        match &self.routing_style {
            Some(RoutingStyleName::Known(style)) => Some(*style),
            Some(RoutingStyleName::Unknown(_)) | None => None,
        }
    }

    /// Negative counts read as zero; [`Self::validate`] rejects them.
    pub fn force_iterations(&self) -> usize {
        usize::try_from(self.force_iterations).unwrap_or_default()
    }

    pub fn layered_crossing_passes(&self) -> usize {
        usize::try_from(self.layered_crossing_passes).unwrap_or_default()
    }

    /// Padding added around the document bounding box.
    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    /// Vertical distance between consecutive sequence diagram messages.
    pub fn message_spacing(&self) -> f32 {
        self.message_spacing
    }

    pub fn with_rank_separation(mut self, rank_separation: f32) -> Self {
        self.rank_separation = rank_separation;
        self
    }

    pub fn with_node_spacing(mut self, node_spacing: f32) -> Self {
        self.node_spacing = node_spacing;
        self
    }

    pub fn with_routing_style(mut self, routing_style: RoutingStyle) -> Self {
        self.routing_style = Some(RoutingStyleName::Known(routing_style));
        self
    }

    pub fn with_force_iterations(mut self, force_iterations: usize) -> Self {
        self.force_iterations = i64::try_from(force_iterations).unwrap_or(i64::MAX);
        self
    }

    pub fn with_layered_crossing_passes(mut self, passes: usize) -> Self {
        self.layered_crossing_passes = i64::try_from(passes).unwrap_or(i64::MAX);
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_corner_radius(mut self, corner_radius: f32) -> Self {
        self.corner_radius = corner_radius;
        self
    }

    pub fn with_message_spacing(mut self, message_spacing: f32) -> Self {
        self.message_spacing = message_spacing;
        self
    }

    /// Resolves the routing style for a diagram kind.
    ///
    /// Sequence messages are always straight. Otherwise the configured style wins,
    /// falling back to curved for requirements and orthogonal for the rest.
    pub fn routing_style_for(&self, diagram: DiagramKind) -> RoutingStyle {
        match (diagram, self.routing_style()) {
            (DiagramKind::Sequence, _) => RoutingStyle::Straight,
            (_, Some(style)) => style,
            (DiagramKind::Requirements, None) => RoutingStyle::Curved,
            (_, None) => RoutingStyle::Orthogonal,
        }
    }

    /// Checks every option against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first negative or non-finite distance,
    /// a non-positive message spacing, a negative or over-cap count, or an
    /// unknown routing style name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("rankSeparation", self.rank_separation),
            ("nodeSpacing", self.node_spacing),
            ("margin", self.margin),
            ("cornerRadius", self.corner_radius),
            ("messageSpacing", self.message_spacing),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { key, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { key, value });
            }
        }

        if self.message_spacing <= 0.0 {
            return Err(ConfigError::NotPositive {
                key: "messageSpacing",
                value: self.message_spacing,
            });
        }

        for (key, value, max) in [
            ("forceIterations", self.force_iterations, MAX_FORCE_ITERATIONS),
            (
                "layeredCrossingPasses",
                self.layered_crossing_passes,
                MAX_CROSSING_PASSES,
            ),
        ] {
            if value < 0 {
                return Err(ConfigError::NegativeCount { key, value });
            }
            if value > max as i64 {
                return Err(ConfigError::AboveCap { key, value, max });
            }
        }

        if let Some(RoutingStyleName::Unknown(name)) = &self.routing_style {
            return Err(ConfigError::UnknownRoutingStyle(name.clone()));
        }

        Ok(())
    }
}
