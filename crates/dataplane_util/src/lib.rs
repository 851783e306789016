//! Data-plane utilities
//!
//! Building blocks shared by data-plane extensions. The main one is
//! [`ParallelSink`], which splits the parts of a source into partitions and
//! hands each partition to an extension-specific [`PartTransfer`] on its own
//! tokio task, with a bound on how many partitions run at once.

pub mod partition;
pub mod sink;

pub use partition::partition;
pub use sink::{
    ParallelSink, ParallelSinkBuilder, PartTransfer, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_PARTITION_SIZE,
};
