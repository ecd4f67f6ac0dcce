//! Dependency manifest exporter.
//!
//! Given the artifacts a build resolved for a dependency set, this crate
//! writes a JSON manifest describing each one: its coordinate name, a
//! download URL found by probing Maven repositories, its size and a content
//! digest. Downstream installers use the manifest to fetch and verify
//! artifacts without resolving dependencies again.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Export configuration loaded from TOML
//! - [`constraint`] - Per-classifier platform annotations
//! - [`coordinate`] - Resolved artifacts and Maven coordinates
//! - [`digest`] - Streaming file digests
//! - [`error`] - Export error types
//! - [`export`] - Per-job policy and the run loop
//! - [`manifest`] - Manifest entry construction and JSON output
//! - [`output`] - Terminal output for the binary
//! - [`repository`] - Repository probing and URL resolution
//! - [`source`] - Sources of resolved artifacts

pub mod cli;
pub mod config;
pub mod constraint;
pub mod coordinate;
pub mod digest;
pub mod error;
pub mod export;
pub mod manifest;
pub mod output;
pub mod repository;
pub mod source;
