//! Tail loop — wires the adb chunk stream into the pipeline and prints
//! filtered view updates to stdout.

use futures_util::StreamExt;
use tracing::info;

use crate::adb::AdbClient;
use crate::config::AppConfig;
use crate::filter::DisplayFilter;
use crate::parser::model::LogRecord;
use crate::pipeline::LogPipeline;

/// Follow one device's logcat until the stream ends or Ctrl-C.
pub async fn tail(client: AdbClient, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let serial = match config.device_serial.clone() {
        Some(serial) => serial,
        None => {
            let device = client.first_online_device().await?;
            device.serial
        }
    };
    info!("Tailing device {serial}");

    let filter = DisplayFilter::new(
        config.filter.keyword.as_deref(),
        config.filter.case_sensitive,
        config.filter.tag.as_deref(),
        config.filter.min_severity(),
    )?;

    let pipeline = LogPipeline::spawn(config.pipeline.clone());
    let mut view_rx = pipeline.subscribe();
    let mut chunks = client.logcat(&serial, &config.logcat_filters)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // Records already printed are tracked by arrival key; each published
    // snapshot only contributes its unseen suffix.
    let mut last_printed: Option<u64> = None;

    loop {
        tokio::select! {
            maybe_chunk = chunks.next() => match maybe_chunk {
                Some(chunk) => pipeline.ingest(chunk).await,
                None => {
                    info!("logcat stream ended");
                    break;
                }
            },
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view_rx.borrow_and_update().clone();
                last_printed = print_new_records(&snapshot, last_printed, &filter);
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    pipeline.shutdown().await;
    Ok(())
}

/// Print the filtered suffix of records not yet seen and return the key of
/// the newest record in the snapshot. Keys in a snapshot are ascending, so
/// the seen prefix is found by binary search; the cursor advances past
/// filtered-out records too.
fn print_new_records(
    snapshot: &[LogRecord],
    last_printed: Option<u64>,
    filter: &DisplayFilter,
) -> Option<u64> {
    let start = match last_printed {
        Some(k) => snapshot.partition_point(|r| r.key <= k),
        None => 0,
    };
    let fresh = &snapshot[start..];
    for record in filter.apply(fresh) {
        println!(
            "{} {:>5} {:>5} {} {}: {}",
            record.timestamp, record.pid, record.tid, record.symbol, record.tag, record.message
        );
    }
    fresh.last().map(|r| r.key).or(last_printed)
}
