//! Utility modules: timeouts, races, retry, text previews.

pub mod race;
pub mod retry;
pub mod text;
pub mod timeout;
