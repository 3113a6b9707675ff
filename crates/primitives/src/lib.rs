//! Core primitives shared by the janitor crates.
/// Duration expression parsing and formatting
pub mod duration;
