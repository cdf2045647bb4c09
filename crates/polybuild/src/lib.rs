//! polybuild - workspace build orchestrator with pluggable build types
//!
//! This crate provides both a library and CLI for polybuild, including:
//! - Package manifest parsing and caching
//! - Workspace analysis (package discovery, dependency ordering)
//! - The build-type handler contract and registry
//! - Per-package build contexts and the build-action execution protocol
//! - Built-in cmake and python build types

pub mod build;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod package;
pub mod workspace;

pub use error::{Error, Result};
