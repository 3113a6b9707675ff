//! Incident crate: SignalFx integration for clearing stale incidents and muting detectors.
#![allow(clippy::uninlined_format_args)]
/// SignalFx REST client
pub mod client;
/// Entry point dispatching the configured task
pub mod janitor;
/// Wire types exchanged with the SignalFx API
pub mod models;
/// Detector muting
pub mod mute;
/// Raw incident records to simplified incidents
pub mod normalize;
/// Stale incident resolution
pub mod resolver;

pub use client::Client;
pub use janitor::Janitor;
pub use mute::MuteParams;
pub use normalize::SimpleIncident;
pub use resolver::{FailurePolicy, ResolveSummary, Resolver};
