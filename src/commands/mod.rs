//! UI-facing entry points. Errors are flattened to strings for display.

pub mod admin;
pub mod credentials;
pub mod monitoring;
pub mod quotes;
pub mod search;
pub mod settings;
pub mod watchlist;
