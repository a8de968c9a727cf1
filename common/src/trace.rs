use std::collections::BTreeMap;

use eyre::{ContextCompat, Result, bail};

use crate::{
    BYTES_PER_MB, EDGE_BYTES,
    metric::{Metric, MetricValue},
    util::skew,
};

/// Raw quantities pulled out of a single trace file
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TraceStats {
    pub time_secs: Option<f64>,
    pub accessed_edges: Option<u64>,
    /// Bytes read, one entry per device
    pub io_bytes: Vec<u64>,
    /// Compute time, one entry per worker thread
    pub compute_secs: Vec<f64>,
}

impl TraceStats {
    fn time(&self) -> Result<f64> {
        self.time_secs.context("Trace has no run time")
    }

    fn edges(&self) -> Result<u64> {
        self.accessed_edges
            .context("Trace has no accessed edge count")
    }

    fn io(&self) -> Result<u64> {
        if self.io_bytes.is_empty() {
            bail!("Trace has no IO statistics");
        }
        self.io_bytes
            .iter()
            .try_fold(0u64, |acc, x| acc.checked_add(*x))
            .context("Total IO bytes overflow")
    }

    pub fn metric(&self, metric: Metric) -> Result<MetricValue> {
        let value = match metric {
            Metric::Time => MetricValue::Float(self.time()?),
            Metric::TotalAccessedEdges => MetricValue::Int(self.edges()?),
            Metric::TotalIoBytes => MetricValue::Int(self.io()?),
            Metric::IoBw => {
                let time = self.time()?;
                if time <= 0.0 {
                    bail!("Cannot compute IO bandwidth for run time {time}");
                }
                MetricValue::Float(self.io()? as f64 / BYTES_PER_MB / time)
            }
            Metric::IoAmp => {
                let edges = self.edges()?;
                if edges == 0 {
                    bail!("Cannot compute IO amplification without accessed edges");
                }
                let edge_bytes = edges
                    .checked_mul(EDGE_BYTES)
                    .context("Accessed edge bytes overflow")?;
                MetricValue::Float(self.io()? as f64 / edge_bytes as f64)
            }
            Metric::IoSkew => {
                let io = self.io_bytes.iter().map(|x| *x as f64).collect::<Vec<_>>();
                MetricValue::Float(skew(&io).context("Trace has no IO statistics")?)
            }
            Metric::ComputeSkew => MetricValue::Float(
                skew(&self.compute_secs).context("Trace has no per-thread compute times")?,
            ),
        };
        Ok(value)
    }
}

/// Decimal number, optionally in scientific notation
pub const FLOAT_PATTERN: &str = r"([0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)";

/// Accumulates trace lines into [`TraceStats`]. Repeated scalars keep the
/// last value, repeated devices and workers are summed.
#[derive(Debug, Default)]
pub struct TraceStatsBuilder {
    time_secs: Option<f64>,
    accessed_edges: Option<u64>,
    io_bytes: BTreeMap<String, u64>,
    compute_secs: BTreeMap<String, f64>,
}

impl TraceStatsBuilder {
    pub fn time(&mut self, secs: f64) {
        self.time_secs = Some(secs);
    }

    pub fn accessed_edges(&mut self, edges: u64) {
        self.accessed_edges = Some(edges);
    }

    pub fn io(&mut self, device: &str, bytes: u64) -> Result<()> {
        let total = self.io_bytes.entry(device.to_owned()).or_default();
        *total = total
            .checked_add(bytes)
            .with_context(|| format!("IO bytes of {device} overflow"))?;
        Ok(())
    }

    pub fn compute(&mut self, worker: &str, secs: f64) {
        *self.compute_secs.entry(worker.to_owned()).or_default() += secs;
    }

    pub fn build(self) -> TraceStats {
        TraceStats {
            time_secs: self.time_secs,
            accessed_edges: self.accessed_edges,
            io_bytes: self.io_bytes.into_values().collect(),
            compute_secs: self.compute_secs.into_values().collect(),
        }
    }
}
