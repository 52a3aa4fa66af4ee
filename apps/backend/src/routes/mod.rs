//! HTTP handlers for the local UI.

pub mod content;
pub mod exam;
pub mod reviews;
