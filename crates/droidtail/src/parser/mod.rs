/// Log line reassembly and parsing.
///
/// - `decode.rs`: incremental UTF-8 decoding of arbitrarily-split chunks
/// - `reassembly.rs`: turns decoded text into complete lines
/// - `logcat.rs`: threadtime grammar → `LogRecord`, mismatches dropped
/// - `model.rs`: record and severity types

pub mod decode;
pub mod logcat;
pub mod model;
pub mod reassembly;

pub use decode::Utf8ChunkDecoder;
pub use logcat::parse_line;
pub use model::{LogRecord, Severity};
pub use reassembly::LineReassembler;

/// Severity symbols the grammar accepts. `A` parses but carries no rank.
pub const SEVERITY_SYMBOLS: [char; 7] = ['V', 'D', 'I', 'W', 'E', 'A', 'F'];
