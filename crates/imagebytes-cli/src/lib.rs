//! Tooling behind the `imagebytes` binary.
//!
//! - [`pattern`] builds synthetic test frames
//! - [`report`] renders headers and decoded arrays as text

pub mod error;
pub mod pattern;
pub mod report;

pub use error::CliError;
