//! Library exports for the drawer compositing core.
//!
//! Exposes the drawable object model, the compositing canvas, scene
//! persistence and configuration so that front ends can share them with the
//! `drawer` command-line tool.

pub mod config;
pub mod draw;
pub mod scene;
pub mod util;

pub use config::Config;
