use core::fmt;

use clap::ValueEnum;

/// The scalar quantity extracted from a trace file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Metric {
    Time,
    IoBw,
    TotalAccessedEdges,
    TotalIoBytes,
    IoAmp,
    IoSkew,
    ComputeSkew,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Time => "time",
            Metric::IoBw => "io_bw",
            Metric::TotalAccessedEdges => "total_accessed_edges",
            Metric::TotalIoBytes => "total_io_bytes",
            Metric::IoAmp => "io_amp",
            Metric::IoSkew => "io_skew",
            Metric::ComputeSkew => "compute_skew",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value extracted for one layout cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(u64),
    Float(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            // keeps a decimal point or exponent so float columns read back as floats
            MetricValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}
