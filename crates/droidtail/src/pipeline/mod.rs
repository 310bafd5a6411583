/// Two-stage ingestion pipeline.
///
/// A background task (reassembly + parsing + batch scheduling) and a
/// foreground task (coalescing aggregation into the bounded view) connected
/// by one-way channels. No record storage is shared between them; batches are
/// handed over by value.
///
/// - `batch.rs`: dual-trigger (count / interval) batch scheduler
/// - `aggregate.rs`: fixed-delay coalescing window + bounded ordered view
/// - `pump.rs`: tasks, channels, and the `LogPipeline` handle

pub mod aggregate;
pub mod batch;
pub mod pump;

pub use aggregate::AggregationBuffer;
pub use batch::BatchScheduler;
pub use pump::{LogPipeline, ViewSnapshot};
