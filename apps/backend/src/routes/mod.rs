//! HTTP handlers, grouped by resource

pub mod cards;
pub mod lessons;
pub mod progress;
pub mod quiz;
pub mod reviews;
pub mod status;
