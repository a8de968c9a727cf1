use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root of the benchmark trace files, ie. results/<time>/<kernel>/<file>
    pub results_dir: PathBuf,
    /// Root of the generated tables, ie. csv/<time>/<out_file>
    pub csv_dir: PathBuf,
    /// Extract cells on a rayon pool instead of one at a time
    pub parallel: bool,
    /// Size of the rayon pool, defaults to the number of CPUs
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            csv_dir: PathBuf::from("csv"),
            parallel: false,
            jobs: None,
        }
    }
}

impl Settings {
    pub fn jobs(&self) -> usize {
        self.jobs.filter(|j| *j > 0).unwrap_or_else(num_cpus::get)
    }
}
