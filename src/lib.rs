// src/lib.rs
// Litterbox agent: line-oriented file editing with bounded undo, behind a
// token-protected HTTP surface for exec, transfers and metrics.

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod file_system;
pub mod services;
pub mod web;

pub use error::{AgentError, Result};
