pub mod engine;

pub use engine::{DisplayFilter, FilterError};
