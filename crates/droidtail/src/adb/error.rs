use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdbError {
    #[error("adb path is not configured")]
    PathNotConfigured,

    #[error("failed to spawn {command}: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("adb exited with status {0}: {1}")]
    CommandFailed(i32, String),

    #[error("no online device available")]
    NoDevice,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
