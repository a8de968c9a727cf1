//! Trace parser for FlashGraph runs.
//!
//! The line format below is assumed, not taken from FlashGraph sources;
//! check it against real traces before relying on it.
//!
//! ```text
//! It takes <secs> seconds
//! ... accessed <n> edges
//! <device>: read <n> bytes
//! thread <id> computes for <secs> seconds
//! ```

use common::{
    parser::TraceParser,
    trace::{FLOAT_PATTERN, TraceStats, TraceStatsBuilder},
};
use eyre::Result;
use regex::Regex;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct Flashgraph;

impl TraceParser for Flashgraph {
    fn name(&self) -> &'static str {
        "flashgraph"
    }

    fn parse_stats(&self, trace: &str) -> Result<TraceStats> {
        let stats = parse_output(trace)?;
        debug!("Parsed flashgraph trace {stats:?}");
        Ok(stats)
    }
}

pub fn parse_output(output: &str) -> Result<TraceStats> {
    let re_time = Regex::new(&format!(r"It takes\s+{FLOAT_PATTERN}\s+seconds"))?;
    let re_edges = Regex::new(r"accessed\s+(\d+)\s+edges")?;
    let re_io = Regex::new(r"^(\S+):\s*read\s+(\d+)\s+bytes")?;
    let re_compute = Regex::new(&format!(
        r"thread\s+(\d+)\s+computes for\s+{FLOAT_PATTERN}\s+seconds"
    ))?;

    let mut stats = TraceStatsBuilder::default();
    for line in output.lines().map(str::trim) {
        if let Some(cap) = re_time.captures(line) {
            stats.time(cap[1].parse()?);
        } else if let Some(cap) = re_io.captures(line) {
            stats.io(&cap[1], cap[2].parse()?)?;
        } else if let Some(cap) = re_compute.captures(line) {
            stats.compute(&cap[1], cap[2].parse()?);
        } else if let Some(cap) = re_edges.captures(line) {
            stats.accessed_edges(cap[1].parse()?);
        }
    }
    Ok(stats.build())
}
