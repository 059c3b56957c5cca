//! Core building blocks shared by every allocator
//!
//! - `buffer` - the owned, fixed-size backing byte region
//! - `stats` - allocation counters and the [`AllocatorStats`] snapshot
//! - `traits` - capability traits ([`MemoryUsage`], [`Resettable`],
//!   [`StatisticsProvider`])

pub(crate) mod buffer;
pub mod stats;
pub mod traits;

pub(crate) use buffer::RawBuffer;
pub(crate) use stats::StatsCounter;

pub use stats::AllocatorStats;
pub use traits::{MemoryUsage, Resettable, StatisticsProvider};
