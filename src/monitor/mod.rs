pub mod metrics;

pub use metrics::{ForwarderStats, StatsSnapshot};
