//! Trace parser for Graphene runs.
//!
//! The line format below is assumed, not taken from Graphene sources;
//! check it against real traces before relying on it.
//!
//! ```text
//! Total time: <secs> s
//! edges accessed: <n>
//! disk <id> io bytes: <n>
//! worker <id> compute time: <secs>
//! ```

use common::{
    parser::TraceParser,
    trace::{FLOAT_PATTERN, TraceStats, TraceStatsBuilder},
};
use eyre::Result;
use regex::Regex;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct Graphene;

impl TraceParser for Graphene {
    fn name(&self) -> &'static str {
        "graphene"
    }

    fn parse_stats(&self, trace: &str) -> Result<TraceStats> {
        let stats = parse_output(trace)?;
        debug!("Parsed graphene trace {stats:?}");
        Ok(stats)
    }
}

pub fn parse_output(output: &str) -> Result<TraceStats> {
    let re_time = Regex::new(&format!(r"^Total time:\s*{FLOAT_PATTERN}\s*s"))?;
    let re_edges = Regex::new(r"^edges accessed:\s*(\d+)")?;
    let re_io = Regex::new(r"^disk\s+(\d+)\s+io bytes:\s*(\d+)")?;
    let re_compute = Regex::new(&format!(r"^worker\s+(\d+)\s+compute time:\s*{FLOAT_PATTERN}"))?;

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
