//! SysML Layout CLI library
//!
//! This module contains the core CLI logic: read a graph definition, lay it
//! out and write the layout document as JSON.

pub mod error_adapter;

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use std::fs;

use log::{debug, info};

use sysml_layout::{
    LayoutBuilder,
    model::{DiagramKind, GraphDefinition},
};

/// Run the SysML layout CLI application
///
/// Reads the graph definition at `args.input`, lays it out with the loaded
/// configuration and writes the pretty-printed layout document to
/// `args.output`.
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed graph JSON
/// - An unknown `--diagram` value
/// - Graph validation and layout errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let definition: GraphDefinition = serde_json::from_str(&source).map_err(CliError::Input)?;
    let mut graph = definition.into_graph()?;

    if let Some(diagram) = &args.diagram {
        let diagram: DiagramKind = diagram
            .parse()
            .map_err(|_| CliError::UnknownDiagram(diagram.clone()))?;
        debug!(diagram:% = diagram; "Overriding diagram kind");
        graph = graph.with_diagram(diagram);
    }

    let document = LayoutBuilder::new(app_config.layout().clone()).layout(&graph)?;
    let json = serde_json::to_string_pretty(&document).map_err(CliError::Output)?;

    fs::write(&args.output, json)?;

    info!(output_file = args.output; "Layout document written");

    Ok(())
}
