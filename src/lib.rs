//! Aether Deploy - deployment toolkit for the AETHER project
//!
//! This crate verifies a work tree against hosting platform limits, renders
//! the per-platform deployment files, manages dashboard secrets, and drives
//! the release pipeline that commits and publishes the project.

pub mod cli;
pub mod container;
pub mod launch;
pub mod manifest;
pub mod platform;
pub mod preflight;
pub mod release;
pub mod repo;
pub mod secrets;
pub mod types;

pub use types::*;
