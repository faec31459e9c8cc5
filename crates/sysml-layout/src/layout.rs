//! Layout algorithms.
//!
//! The generic placement modes ([`layered`], [`force`]) and the [`routing`] of
//! edges know nothing about SysML. The per-diagram strategies in [`engines`]
//! map diagram semantics onto them.

pub mod engines;
pub mod force;
pub mod layered;
pub mod ports;
pub mod routing;
pub mod scope;
pub mod sizing;
