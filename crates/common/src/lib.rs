//! Common utilities shared across the todo gateway workspace.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, header inspection, iat validation)
pub mod jwt;
