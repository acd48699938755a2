//! Record and dataset sanity checks.
//!
//! These confirm that generated data has the expected shape. They say
//! nothing about clinical realism.

mod distribution;
mod statistics;

pub use distribution::{CategoryDistribution, DistributionViolation};
pub use statistics::SampleStatistics;
