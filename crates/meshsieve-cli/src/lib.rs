//! Meshsieve CLI library.
//!
//! This crate provides the per-asset pipeline driver, the batch runner
//! with idempotent resume, and the command implementations behind the
//! `meshsieve` binary.

pub mod batch;
pub mod commands;
pub mod driver;
