use core::fmt::Debug;
use std::{path::Path, sync::Arc};

use eyre::{Context, Result};

use crate::{
    error::GenerateError,
    metric::{Metric, MetricValue},
    trace::TraceStats,
    util::quoted_list,
};

pub trait TraceParser: Debug + Send + Sync {
    /// Name of the benchmarked system, used to select the parser
    fn name(&self) -> &'static str;
    /// Extracts the raw statistics from the contents of a trace file
    fn parse_stats(&self, trace: &str) -> Result<TraceStats>;
    /// Reads the trace file at `path` and extracts `metric` from it
    fn parse_trace_file(&self, path: &Path, metric: Metric) -> Result<MetricValue> {
        let trace = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Reading trace file {}", path.display()))?;
        self.parse_stats(&trace)
            .wrap_err_with(|| format!("Parsing {} trace {}", self.name(), path.display()))?
            .metric(metric)
            .wrap_err_with(|| format!("Extracting {metric} from {}", path.display()))
    }
}

/// Maps system names to their trace parser
#[derive(Debug, Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn TraceParser>>,
}

impl ParserRegistry {
    pub fn new(parsers: Vec<Arc<dyn TraceParser>>) -> Self {
        Self { parsers }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parsers.iter().map(|p| p.name())
    }

    pub fn resolve(&self, system: &str) -> Result<Arc<dyn TraceParser>, GenerateError> {
        self.parsers
            .iter()
            .find(|p| p.name() == system)
            .cloned()
            .ok_or_else(|| GenerateError::Resolution {
                system: system.to_owned(),
                known: quoted_list(self.names()),
            })
    }
}
