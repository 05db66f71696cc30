//! Core types shared across the organizer
//!
//! Contains the application configuration and the crate-wide error
//! taxonomy. Nothing in here touches the filesystem or the network.

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{OrganizerError, Result};
