pub mod config;
pub mod error;
pub mod generate;
pub mod metric;
pub mod parser;
pub mod table;
pub mod trace;
pub mod util;

/// Size of an on-disk edge id, used for IO amplification
pub const EDGE_BYTES: u64 = 4;
pub const BYTES_PER_MB: f64 = 1_000_000.0;
