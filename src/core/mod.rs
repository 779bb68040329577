//! Core grid engine – layout, lattice virtualization, lens, spring and snap.
//!
//! Nothing in this module depends on any TUI or rendering crate.  All
//! geometry is in virtual pixels; the UI decides how pixels map to cells.

pub mod error;
pub mod geom;
pub mod grid;
pub mod idle;
pub mod item;
pub mod lattice;
pub mod layout;
pub mod lens;
pub mod snap;
pub mod spring;
pub mod velocity;
