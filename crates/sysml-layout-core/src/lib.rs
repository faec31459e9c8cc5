//! SysML Layout Core Types and Definitions
//!
//! This crate provides the foundational types shared by the SysML diagram layout
//! engine and its callers:
//!
//! - **Identifiers**: String-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Model**: The validated, diagram-type-agnostic graph model ([`model`] module)
//! - **Errors**: Structural validation failures ([`error::GraphError`])

pub mod error;
pub mod geometry;
pub mod identifier;
pub mod model;
