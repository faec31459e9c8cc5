//! Error adapter for converting [`CliError`] to miette diagnostics.
//!
//! This module provides the bridge between the CLI's error type and miette's
//! rich diagnostic formatting. Every error gets a stable code and, where the
//! fix is predictable, a help line.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use sysml_layout::{LayoutError, SequencingError};

use crate::error::CliError;

/// Adapter rendering a [`CliError`] through miette.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "sysml_layout::io",
            CliError::MissingConfig(_) | CliError::Config(_) => "sysml_layout::config",
            CliError::Input(_) => "sysml_layout::input",
            CliError::UnknownDiagram(_) => "sysml_layout::diagram",
            CliError::Layout(LayoutError::InvalidGraph(_)) => "sysml_layout::graph",
            CliError::Layout(LayoutError::InvalidConfiguration(_)) => "sysml_layout::config",
            CliError::Layout(LayoutError::InvalidSequencing(_)) => "sysml_layout::sequencing",
            CliError::Output(_) => "sysml_layout::output",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            CliError::MissingConfig(_) => "pass an existing file to --config or omit the flag",
            CliError::UnknownDiagram(_) => {
                "expected one of: bdd, ibd, activity, sequence, requirements"
            }
            CliError::Layout(LayoutError::InvalidConfiguration(_)) => {
                "check the [layout] table of the configuration file"
            }
            CliError::Layout(LayoutError::InvalidSequencing(SequencingError::MissingIndex {
                ..
            })) => "give every message a `sequence` index",
            CliError::Layout(LayoutError::InvalidSequencing(
                SequencingError::ConflictingDirection { .. },
            )) => "messages sharing an index must travel in the same direction",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
