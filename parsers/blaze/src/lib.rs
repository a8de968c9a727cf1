//! Trace parser for Blaze runs.
//!
//! The line format below is an assumed profiler dump, not the output of a
//! released Blaze build; check it against real traces before relying on it.
//!
//! ```text
//! # time per iter: <secs>
//! # total accessed edges: <n>
//! # io <device> read_bytes: <n>
//! # compute thread <id>: <secs>
//! ```

use common::{
    parser::TraceParser,
    trace::{FLOAT_PATTERN, TraceStats, TraceStatsBuilder},
};
use eyre::Result;
use regex::Regex;
use tracing::debug;

/// Blaze prints its profiler output as `# <stat>: <value>` lines
#[derive(Debug, Default, Clone)]
pub struct Blaze;

impl TraceParser for Blaze {
    fn name(&self) -> &'static str {
        "blaze"
    }

    fn parse_stats(&self, trace: &str) -> Result<TraceStats> {
        let stats = parse_output(trace)?;
        debug!("Parsed blaze trace {stats:?}");
        Ok(stats)
    }
}

pub fn parse_output(output: &str) -> Result<TraceStats> {
    let re_time = Regex::new(&format!(r"^#\s*time per iter:\s*{FLOAT_PATTERN}"))?;
    let re_edges = Regex::new(r"^#\s*total accessed edges:\s*(\d+)")?;
    let re_io = Regex::new(r"^#\s*io\s+(\S+)\s+read_bytes:\s*(\d+)")?;
    let re_compute = Regex::new(&format!(r"^#\s*compute thread\s+(\d+):\s*{FLOAT_PATTERN}"))?;

    let mut stats = TraceStatsBuilder::default();
    for line in output.lines().map(str::trim) {
        if let Some(cap) = re_time.captures(line) {
            stats.time(cap[1].parse()?);
        } else if let Some(cap) = re_edges.captures(line) {
            stats.accessed_edges(cap[1].parse()?);
        } else if let Some(cap) = re_io.captures(line) {
            stats.io(&cap[1], cap[2].parse()?)?;
        } else if let Some(cap) = re_compute.captures(line) {
            stats.compute(&cap[1], cap[2].parse()?);
        }
    }
    Ok(stats.build())
}
