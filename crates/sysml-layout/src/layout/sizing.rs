//! Intrinsic node sizes.
//!
//! Text is measured with a fixed per-character advance; an explicit size hint
//! always wins over the measured value for the dimensions it sets.

use sysml_layout_core::{
    geometry::{Insets, Size},
    model::{ActivityKind, Node, NodeKind},
};

/// Average advance of one character of label text.
const CHAR_WIDTH: f32 = 7.5;
/// Height of one line of label text.
const LINE_HEIGHT: f32 = 16.0;
/// Padding between a label and its node outline.
const TEXT_PADDING: Insets = Insets::new(12.0, 12.0, 12.0, 12.0);

/// Side length of a port square.
pub const PORT_SIZE: f32 = 12.0;

/// Size of a label's text block, one line per `\n`.
pub fn text_size(label: &str) -> Size {
    let (lines, widest) = label.lines().fold((0_usize, 0_usize), |(lines, widest), line| {
        (lines + 1, widest.max(line.chars().count()))
    });
    Size::new(
        widest as f32 * CHAR_WIDTH,
        lines.max(1) as f32 * LINE_HEIGHT,
    )
}

/// Minimum size for a node kind, before any label is measured.
fn minimum_size(node: &Node) -> Size {
    match node.kind() {
        NodeKind::Block => Size::new(120.0, 60.0),
        NodeKind::Requirement => Size::new(160.0, 80.0),
        NodeKind::Lifeline => Size::new(100.0, 40.0),
        NodeKind::Port => Size::new(PORT_SIZE, PORT_SIZE),
        NodeKind::ActivityNode => match node.activity_kind().unwrap_or_default() {
            ActivityKind::Action => Size::new(100.0, 40.0),
            ActivityKind::Decision | ActivityKind::Merge => Size::new(40.0, 40.0),
            ActivityKind::Initial | ActivityKind::Final => Size::new(24.0, 24.0),
            ActivityKind::Fork | ActivityKind::Join => Size::new(80.0, 6.0),
        },
    }
}

/// Returns true when the label is drawn inside the node outline and so
/// contributes to its size.
fn label_fits_inside(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Port => false,
        NodeKind::ActivityNode => matches!(
            node.activity_kind().unwrap_or_default(),
            ActivityKind::Action
        ),
        _ => true,
    }
}

/// Resolves the size a node wants before layout.
pub fn intrinsic_size(node: &Node) -> Size {
    let minimum = minimum_size(node);
    let measured = if label_fits_inside(node) {
        minimum.max(text_size(&node.label()).add_padding(TEXT_PADDING))
    } else {
        minimum
    };

    let hint = node.size();
    Size::new(
        hint.width().unwrap_or(measured.width()),
        hint.height().unwrap_or(measured.height()),
    )
}
