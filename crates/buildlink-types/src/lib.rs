//! Types shared between the BuildLink crates: stored models, REST payloads
//! and gateway events.

pub mod api;
pub mod events;
pub mod models;
