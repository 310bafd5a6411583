use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::PipelineConfig;
use crate::parser::model::LogRecord;
use crate::parser::{parse_line, LineReassembler, Utf8ChunkDecoder};
use super::aggregate::AggregationBuffer;
use super::batch::{BatchScheduler, SubmitAction};

/// Commands accepted by the background parsing/batching task.
#[derive(Debug)]
enum Command {
    Ingest(Bytes),
    Clear,
}

/// Messages flowing from the background task to the foreground aggregator.
///
/// Batches are tagged with the background task's generation, which is bumped
/// on every `Clear`. The clear itself travels in-band on the same FIFO
/// channel, so the foreground can drop any batch dispatched before a clear it
/// has already applied. This closes the clear/in-flight-batch race instead of
/// tolerating stale late arrivals.
#[derive(Debug)]
enum BatchMsg {
    Batch {
        generation: u64,
        records: Vec<LogRecord>,
    },
    Clear {
        generation: u64,
    },
}

/// Immutable view snapshot published after every merge and clear.
pub type ViewSnapshot = Arc<[LogRecord]>;

const COMMAND_CHANNEL_CAPACITY: usize = 256;
const BATCH_CHANNEL_CAPACITY: usize = 64;

/// Handle to a running two-task ingestion pipeline.
///
/// `ingest` and `clear` cannot fail in steady state; after shutdown they are
/// no-ops. Raw chunks flow in on the control channel, batches flow out to the
/// aggregator, and the display layer observes the bounded view through the
/// watch channel returned by `subscribe`.
pub struct LogPipeline {
    commands: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<ViewSnapshot>,
    background: JoinHandle<()>,
    foreground: JoinHandle<()>,
}

impl LogPipeline {
    /// Spawn the background and foreground tasks. Must be called from within
    /// a tokio runtime.
    pub fn spawn(config: PipelineConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(ViewSnapshot::from(Vec::new()));

        let background = tokio::spawn(background_task(command_rx, batch_tx, config.clone()));
        let foreground = tokio::spawn(foreground_task(batch_rx, snapshot_tx, config));

        Self {
            commands: command_tx,
            snapshot_rx,
            background,
            foreground,
        }
    }

    /// Push one raw chunk, in arrival order. Chunk boundaries need not align
    /// with line boundaries.
    pub async fn ingest(&self, chunk: Bytes) {
        let _ = self.commands.send(Command::Ingest(chunk)).await;
    }

    /// Atomically reset all pipeline state. Buffered partial lines, pending
    /// batches, staged batches, and the view are all discarded; records from
    /// before the clear never reappear.
    pub async fn clear(&self) {
        let _ = self.commands.send(Command::Clear).await;
    }

    /// Watch the published view snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Close the control channel and wait for both tasks to drain. The
    /// background task attempts a best-effort final flush on the way out.
    pub async fn shutdown(self) {
        drop(self.commands);
        let _ = self.background.await;
        let _ = self.foreground.await;
    }
}

/// Background context: line reassembly, parsing, dual-trigger batching.
/// Owns the partial-line buffer, the pending batch, and the generation
/// counter; no other task touches them.
async fn background_task(
    mut commands: mpsc::Receiver<Command>,
    batches: mpsc::Sender<BatchMsg>,
    config: PipelineConfig,
) {
    let mut decoder = Utf8ChunkDecoder::new();
    let mut reassembler = LineReassembler::new();
    let mut scheduler = BatchScheduler::new(config.batch_size);
    let mut next_key: u64 = 0;
    let mut generation: u64 = 0;
    let mut deadline: Option<Instant> = None;

    loop {
        // Moves a copy of the deadline so the select arms can rewrite it.
        let timer = async move {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Ingest(chunk)) => {
                    // Chunk boundaries can fall inside a multibyte character;
                    // the decoder carries the incomplete suffix to the next chunk.
                    let text = decoder.decode(&chunk);
                    let mut parsed = Vec::new();
                    let mut dropped = 0usize;
                    for line in reassembler.ingest(&text) {
                        match parse_line(&line, next_key) {
                            Some(record) => {
                                next_key += 1;
                                parsed.push(record);
                            }
                            // Expected: continuations and garbage are dropped.
                            None => dropped += 1,
                        }
                    }
                    if dropped > 0 {
                        trace!(dropped, "dropped unparsable lines");
                    }
                    match scheduler.submit(parsed) {
                        SubmitAction::Flush(records) => {
                            deadline = None;
                            let _ = batches.send(BatchMsg::Batch { generation, records }).await;
                        }
                        SubmitAction::ArmTimer => {
                            deadline = Some(Instant::now() + config.batch_interval());
                        }
                        SubmitAction::Wait => {}
                    }
                }
                Some(Command::Clear) => {
                    generation += 1;
                    decoder.clear();
                    reassembler.clear();
                    scheduler.clear();
                    deadline = None;
                    debug!(generation, "pipeline cleared");
                    let _ = batches.send(BatchMsg::Clear { generation }).await;
                }
                None => {
                    // Control channel closed: best-effort final flush.
                    if let Some(records) = scheduler.flush() {
                        let _ = batches.send(BatchMsg::Batch { generation, records }).await;
                    }
                    break;
                }
            },
            _ = timer => {
                deadline = None;
                if let Some(records) = scheduler.flush() {
                    let _ = batches.send(BatchMsg::Batch { generation, records }).await;
                }
            }
        }
    }
}

/// Foreground context: coalesces batches and maintains the bounded view.
async fn foreground_task(
    mut batches: mpsc::Receiver<BatchMsg>,
    snapshots: watch::Sender<ViewSnapshot>,
    config: PipelineConfig,
) {
    let mut buffer = AggregationBuffer::new(config.view_capacity);
    let mut current_generation: u64 = 0;
    let mut deadline: Option<Instant> = None;

    loop {
        let timer = async move {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            msg = batches.recv() => match msg {
                Some(BatchMsg::Batch { generation, records }) => {
                    if generation < current_generation {
                        debug!(generation, current_generation, "dropping stale batch");
                        continue;
                    }
                    if buffer.on_batch(records) {
                        deadline = Some(Instant::now() + config.coalesce_interval());
                    }
                }
                Some(BatchMsg::Clear { generation }) => {
                    current_generation = generation;
                    buffer.clear();
                    deadline = None;
                    let _ = snapshots.send(ViewSnapshot::from(Vec::new()));
                }
                None => {
                    // Upstream gone: merge whatever is staged and exit.
                    if buffer.merge_staging() {
                        let _ = snapshots.send(ViewSnapshot::from(buffer.snapshot()));
                    }
                    break;
                }
            },
            _ = timer => {
                deadline = None;
                if buffer.merge_staging() {
                    let _ = snapshots.send(ViewSnapshot::from(buffer.snapshot()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            batch_size: 200,
            batch_interval_ms: 150,
            coalesce_interval_ms: 300,
            view_capacity: 1000,
        }
    }

    fn line(i: u64) -> String {
        format!("10-01 12:00:00.{:03} 123 456 I Test: message {i}\n", i % 1000)
    }

    fn chunk_of(range: std::ops::Range<u64>) -> Bytes {
        let text: String = range.map(line).collect();
        Bytes::from(text)
    }

    async fn settle() {
        // Paused clock: sleeping auto-advances past both timer stages.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_line_reaches_view_after_both_timers() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        pipeline.ingest(chunk_of(0..1)).await;

        // Inside the batch interval nothing has been published yet.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.borrow().is_empty());

        settle().await;
        let view = rx.borrow().clone();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].message, "message 0");

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_trigger_skips_batch_timer() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        pipeline.ingest(chunk_of(0..200)).await;

        // The batch is emitted immediately; only the coalesce window remains.
        tokio::time::sleep(Duration::from_millis(310)).await;
        assert_eq!(rx.borrow().len(), 200);

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunk_boundary_mid_line() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        pipeline.ingest(Bytes::from("10-01 12:00:00.000 1 2 I Split")).await;
        pipeline.ingest(Bytes::from("Tag: first half joined\n")).await;

        settle().await;
        let view = rx.borrow().clone();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].tag, "SplitTag");
        assert_eq!(view[0].message, "first half joined");

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunk_boundary_mid_multibyte_char() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        // Split the line between the two bytes of the é.
        let line = "10-01 12:00:00.000 1 2 I Tag: h\u{e9}llo\n";
        let bytes = line.as_bytes();
        let split = line.find('\u{e9}').unwrap() + 1;
        pipeline.ingest(Bytes::copy_from_slice(&bytes[..split])).await;
        pipeline.ingest(Bytes::copy_from_slice(&bytes[split..])).await;

        settle().await;
        let view = rx.borrow().clone();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].message, "h\u{e9}llo");

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparsable_lines_dropped_silently() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        pipeline
            .ingest(Bytes::from(
                "garbage\n10-01 12:00:00.000 1 2 W Tag: kept\n\tat continuation\n",
            ))
            .await;

        settle().await;
        let view = rx.borrow().clone();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].message, "kept");

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_bounded_with_oldest_evicted() {
        let mut config = test_config();
        config.view_capacity = 50;
        let pipeline = LogPipeline::spawn(config);
        let rx = pipeline.subscribe();

        pipeline.ingest(chunk_of(0..130)).await;

        settle().await;
        let view = rx.borrow().clone();
        assert_eq!(view.len(), 50);
        // Exactly the most recent 50, arrival order preserved.
        assert_eq!(view[0].message, "message 80");
        assert_eq!(view[49].message, "message 129");
        let keys: Vec<u64> = view.iter().map(|r| r.key).collect();
        assert_eq!(keys, (80..130).collect::<Vec<_>>());

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_before_timers_fire() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        pipeline.ingest(chunk_of(0..5)).await;
        pipeline.clear().await;

        settle().await;
        assert!(rx.borrow().is_empty());

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_suppresses_in_flight_batch() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        // Size trigger dispatches a batch immediately; the clear issued right
        // after must still win because it travels behind it on the same
        // channel and bumps the generation.
        pipeline.ingest(chunk_of(0..200)).await;
        pipeline.clear().await;

        settle().await;
        assert!(rx.borrow().is_empty());

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_idempotent() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        pipeline.ingest(chunk_of(0..3)).await;
        pipeline.clear().await;
        pipeline.clear().await;

        settle().await;
        assert!(rx.borrow().is_empty());

        // The pipeline keeps working after a double clear.
        pipeline.ingest(chunk_of(10..12)).await;
        settle().await;
        assert_eq!(rx.borrow().len(), 2);

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingest_after_clear_flows_normally() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        pipeline.ingest(chunk_of(0..10)).await;
        settle().await;
        assert_eq!(rx.borrow().len(), 10);

        pipeline.clear().await;
        pipeline.ingest(chunk_of(100..103)).await;

        settle().await;
        let view = rx.borrow().clone();
        assert_eq!(view.len(), 3);
        assert_eq!(view[0].message, "message 100");

        pipeline.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_performs_final_flush() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        // No timer has fired yet; shutdown must still deliver the pending batch.
        pipeline.ingest(chunk_of(0..4)).await;
        pipeline.shutdown().await;

        assert_eq!(rx.borrow().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_coalesce_window_merges_multiple_batches() {
        let pipeline = LogPipeline::spawn(test_config());
        let rx = pipeline.subscribe();

        // Two size-triggered batches land inside one 300ms coalesce window
        // and must appear in a single merge, order preserved.
        pipeline.ingest(chunk_of(0..200)).await;
        pipeline.ingest(chunk_of(200..400)).await;

        settle().await;
        let view = rx.borrow().clone();
        assert_eq!(view.len(), 400);
        let keys: Vec<u64> = view.iter().map(|r| r.key).collect();
        assert_eq!(keys, (0..400).collect::<Vec<_>>());

        pipeline.shutdown().await;
    }
}
