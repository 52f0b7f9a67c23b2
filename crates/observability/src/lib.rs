//! Process-wide logging setup shared by every binary embedding the projection.

pub mod subscriber;

pub use subscriber::{DEFAULT_FILTER, init_json, init_test};

/// Install JSON logging with the default `info` filter.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    subscriber::init_json(DEFAULT_FILTER);
}
