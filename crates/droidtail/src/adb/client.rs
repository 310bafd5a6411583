use std::process::Stdio;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::error::AdbError;

const CHUNK_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Device,
    Offline,
    Unauthorized,
    Other(String),
}

impl DeviceState {
    fn from_token(token: &str) -> Self {
        match token {
            "device" => DeviceState::Device,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            other => DeviceState::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub serial: String,
    pub state: DeviceState,
}

impl DeviceInfo {
    pub fn is_online(&self) -> bool {
        self.state == DeviceState::Device
    }
}

/// Thin wrapper around the adb binary: device enumeration and logcat
/// spawning. All parsing of the log stream itself happens downstream in the
/// pipeline; this layer only moves raw chunks.
pub struct AdbClient {
    path: String,
}

impl AdbClient {
    pub fn new(path: &str) -> Result<Self, AdbError> {
        if path.is_empty() {
            return Err(AdbError::PathNotConfigured);
        }
        Ok(Self {
            path: path.to_string(),
        })
    }

    /// Run `adb devices` and return the attached devices.
    pub async fn devices(&self) -> Result<Vec<DeviceInfo>, AdbError> {
        let output = Command::new(&self.path)
            .arg("devices")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AdbError::SpawnFailed {
                command: format!("{} devices", self.path),
                source,
            })?;

        if !output.status.success() {
            return Err(AdbError::CommandFailed(
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(parse_devices(&String::from_utf8_lossy(&output.stdout)))
    }

    /// First device in the `device` state.
    pub async fn first_online_device(&self) -> Result<DeviceInfo, AdbError> {
        self.devices()
            .await?
            .into_iter()
            .find(DeviceInfo::is_online)
            .ok_or(AdbError::NoDevice)
    }

    /// Spawn `adb logcat -v threadtime` for one device and return its raw
    /// stdout as a stream of chunks. Chunk boundaries are whatever the pipe
    /// delivers; the pipeline's reassembler restores line boundaries.
    ///
    /// The child is killed when the returned stream is dropped.
    pub fn logcat(
        &self,
        serial: &str,
        filters: &[String],
    ) -> Result<ReceiverStream<Bytes>, AdbError> {
        let args = logcat_args(serial, filters);
        debug!(adb = %self.path, ?args, "spawning logcat");

        let mut child = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AdbError::SpawnFailed {
                command: format!("{} logcat", self.path),
                source,
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| AdbError::Io(std::io::Error::other("logcat stdout not captured")))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("adb: {line}");
                }
            });
        }

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut buf = BytesMut::with_capacity(8 * 1024);
            loop {
                match stdout.read_buf(&mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(buf.split().freeze()).await.is_err() {
                            // Consumer gone; kill_on_drop reaps the child.
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("logcat read failed: {e}");
                        break;
                    }
                }
            }
            match child.wait().await {
                Ok(status) => debug!(%status, "logcat exited"),
                Err(e) => warn!("failed to reap logcat: {e}"),
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

/// `-s SERIAL logcat -v threadtime [FILTERSPEC... *:S]`
///
/// When filter specs are given, `*:S` silences everything they don't match,
/// matching logcat's server-side filtering convention.
fn logcat_args(serial: &str, filters: &[String]) -> Vec<String> {
    let mut args = vec![
        "-s".to_string(),
        serial.to_string(),
        "logcat".to_string(),
        "-v".to_string(),
        "threadtime".to_string(),
    ];
    if !filters.is_empty() {
        args.extend(filters.iter().cloned());
        args.push("*:S".to_string());
    }
    args
}

fn parse_devices(output: &str) -> Vec<DeviceInfo> {
    output
        .lines()
        .filter(|line| {
            let line = line.trim();
            !line.is_empty()
                && !line.starts_with("List of devices")
                && !line.starts_with('*')
        })
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            Some(DeviceInfo {
                serial: serial.to_string(),
                state: DeviceState::from_token(state),
            })
        })
        .collect()
}
