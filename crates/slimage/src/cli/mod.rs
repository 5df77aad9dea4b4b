//! Command handlers for the slimage CLI.

pub mod config;
pub mod process;
