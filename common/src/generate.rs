use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use eyre::Result;
use tokio::{
    fs::{create_dir_all, read_to_string, write},
    task::spawn_blocking,
};
use tracing::{debug, info};

use crate::{
    config::Settings,
    error::GenerateError,
    metric::{Metric, MetricValue},
    parser::{ParserRegistry, TraceParser},
    table::{CellRef, Table},
};

/// One invocation of the generator
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Benchmarked system, selects the trace parser
    pub system: String,
    /// CSV whose cells are <kernel>/<filename> references
    pub layout_path: PathBuf,
    pub metric: Metric,
    /// File name of the generated table, placed in <csv_dir>/<time>/
    pub out_file: String,
    /// Run label, names both the trace and the output directory
    pub time: String,
}

/// Appends `parts` to `base`, each after a `/`. Unlike [`Path::join`] an
/// absolute part never replaces what precedes it.
pub fn concat_path(base: &Path, parts: &[&str]) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    for part in parts {
        path.push("/");
        path.push(part);
    }
    PathBuf::from(path)
}

/// Resolves a `<kernel>/<filename>` layout cell to
/// `<results_dir>/<time>/<kernel>/<filename>`
pub fn trace_path(
    results_dir: &Path,
    time: &str,
    at: CellRef<'_>,
    cell: &str,
) -> Result<PathBuf, GenerateError> {
    if !cell.contains('/') {
        return Err(GenerateError::Format {
            row: at.row.to_owned(),
            column: at.column.to_owned(),
            value: cell.to_owned(),
        });
    }
    Ok(concat_path(results_dir, &[time, cell]))
}

pub async fn read_layout(path: &Path) -> Result<Table<String>, GenerateError> {
    let data = read_to_string(path)
        .await
        .map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Table::from_csv(&data, path)
}

/// Runs `parser` over every trace path. Cells are visited in row-major order
/// unless [`Settings::parallel`] is set.
pub fn extract(
    parser: &dyn TraceParser,
    paths: &Table<PathBuf>,
    metric: Metric,
    settings: &Settings,
) -> Result<Table<MetricValue>> {
    let parse = |at: CellRef<'_>, path: &PathBuf| {
        debug!(
            "Extracting {metric} for ({}, {}) from {}",
            at.row,
            at.column,
            path.display()
        );
        parser.parse_trace_file(path, metric)
    };

    if settings.parallel {
        let jobs = settings.jobs();
        debug!("Extracting on {jobs} threads");
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        pool.install(|| paths.par_try_map(parse))
    } else {
        paths.try_map(parse)
    }
}

/// Builds the result table for `request` and writes it to
/// `<csv_dir>/<time>/<out_file>`, returning the written path.
///
/// Nothing is written unless every cell was extracted.
pub async fn generate(
    registry: &ParserRegistry,
    settings: &Settings,
    request: &GenerateRequest,
) -> Result<PathBuf> {
    let parser = registry.resolve(&request.system)?;
    let layout = read_layout(&request.layout_path).await?;
    let (rows, cols) = layout.shape();
    debug!(
        "Loaded {rows}x{cols} layout from {}",
        request.layout_path.display()
    );

    let paths = layout.try_map(|at, cell| {
        trace_path(&settings.results_dir, &request.time, at, cell)
    })?;

    let metric = request.metric;
    let extract_settings = settings.clone();
    let values =
        spawn_blocking(move || extract(parser.as_ref(), &paths, metric, &extract_settings))
            .await??;

    let out_dir = concat_path(&settings.csv_dir, &[request.time.as_str()]);
    create_dir_all(&out_dir)
        .await
        .map_err(|source| GenerateError::Io {
            path: out_dir.clone(),
            source,
        })?;
    let out_path = concat_path(&out_dir, &[request.out_file.as_str()]);
    write(&out_path, values.to_csv()?)
        .await
        .map_err(|source| GenerateError::Io {
            path: out_path.clone(),
            source,
        })?;

    info!(
        "Wrote {rows}x{cols} {} table for {} to {}",
        request.metric,
        request.system,
        out_path.display()
    );
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use eyre::bail;

    use super::*;
    use crate::trace::TraceStats;

    /// Records every call and answers with the length of the path
    #[derive(Debug, Default)]
    struct Recording {
        calls: Mutex<Vec<(PathBuf, Metric)>>,
    }

    impl TraceParser for Recording {
        fn name(&self) -> &'static str {
            "frameworkX"
        }

        fn parse_stats(&self, _trace: &str) -> Result<TraceStats> {
            bail!("not used")
        }

        fn parse_trace_file(&self, path: &Path, metric: Metric) -> Result<MetricValue> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_path_buf(), metric));
            Ok(MetricValue::Int(path.as_os_str().len() as u64))
        }
    }

    /// Trace files hold a single number, the run time
    #[derive(Debug)]
    struct Seconds;

    impl TraceParser for Seconds {
        fn name(&self) -> &'static str {
            "seconds"
        }

        fn parse_stats(&self, trace: &str) -> Result<TraceStats> {
            Ok(TraceStats {
                time_secs: Some(trace.trim().parse()?),
                ..Default::default()
            })
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        recording: Arc<Recording>,
        registry: ParserRegistry,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let recording = Arc::new(Recording::default());
            let registry = ParserRegistry::new(vec![
                recording.clone() as Arc<dyn TraceParser>,
                Arc::new(Seconds),
            ]);
            let settings = Settings {
                csv_dir: dir.path().join("csv"),
                ..Default::default()
            };
            Self {
                dir,
                recording,
                registry,
                settings,
            }
        }

        fn layout(&self, data: &str) -> PathBuf {
            let path = self.dir.path().join("layout.csv");
            std::fs::write(&path, data).unwrap();
            path
        }

        fn request(&self, system: &str, layout_path: PathBuf, metric: Metric) -> GenerateRequest {
            GenerateRequest {
                system: system.to_owned(),
                layout_path,
                metric,
                out_file: "out.csv".to_owned(),
                time: "run42".to_owned(),
            }
        }

        fn out_path(&self) -> PathBuf {
            self.settings.csv_dir.join("run42").join("out.csv")
        }

        fn calls(&self) -> Vec<(PathBuf, Metric)> {
            self.recording.calls.lock().unwrap().clone()
        }
    }

    fn error_of(err: &eyre::Report) -> &GenerateError {
        err.downcast_ref::<GenerateError>().unwrap()
    }

    #[tokio::test]
    async fn single_cell_end_to_end() {
        let fx = Fixture::new();
        let layout = fx.layout(",kernel\ng0,matmul/trial1.log\n");
        let request = fx.request("frameworkX", layout, Metric::Time);

        let out = generate(&fx.registry, &fx.settings, &request).await.unwrap();

        assert_eq!(out, fx.out_path());
        assert_eq!(
            fx.calls(),
            vec![(PathBuf::from("results/run42/matmul/trial1.log"), Metric::Time)]
        );
        let expected = "results/run42/matmul/trial1.log".len();
        assert_eq!(
            std::fs::read_to_string(out).unwrap(),
            format!(",kernel\ng0,{expected}\n")
        );
    }

    #[tokio::test]
    async fn keeps_shape_and_labels() {
        let fx = Fixture::new();
        let layout = fx.layout("graph,bfs,pr,cc\nrmat,bfs/a,pr/bb,cc/ccc\ntwitter,bfs/dddd,pr/e,cc/ff\n");
        let request = fx.request("frameworkX", layout.clone(), Metric::IoAmp);

        let out = generate(&fx.registry, &fx.settings, &request).await.unwrap();

        let input = read_layout(&layout).await.unwrap();
        let output = read_layout(&out).await.unwrap();
        assert_eq!(output.shape(), input.shape());
        assert_eq!(output.index_name, input.index_name);
        assert_eq!(output.columns, input.columns);
        let labels = |t: &Table<String>| t.rows.iter().map(|r| r.label.clone()).collect::<Vec<_>>();
        assert_eq!(labels(&output), labels(&input));
        for (in_row, out_row) in input.rows.iter().zip(&output.rows) {
            for (cell, value) in in_row.cells.iter().zip(&out_row.cells) {
                let path = format!("results/run42/{cell}");
                assert_eq!(value, &path.len().to_string());
            }
        }
        assert_eq!(fx.calls().len(), 6);
        assert!(fx.calls().iter().all(|(_, m)| *m == Metric::IoAmp));
    }

    #[tokio::test]
    async fn parallel_matches_sequential() {
        let fx = Fixture::new();
        let mut data = String::from("g");
        for c in 0..5 {
            data.push_str(&format!(",k{c}"));
        }
        data.push('\n');
        for r in 0..20 {
            data.push_str(&format!("graph{r}"));
            for c in 0..5 {
                data.push_str(&format!(",k{c}/{}.log", "x".repeat(r * c + 1)));
            }
            data.push('\n');
        }
        let layout = fx.layout(&data);
        let request = fx.request("frameworkX", layout, Metric::Time);

        let out = generate(&fx.registry, &fx.settings, &request).await.unwrap();
        let sequential = std::fs::read(&out).unwrap();

        let settings = Settings {
            parallel: true,
            jobs: Some(4),
            ..fx.settings.clone()
        };
        let out = generate(&fx.registry, &settings, &request).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), sequential);
    }

    #[tokio::test]
    async fn reruns_are_identical() {
        let fx = Fixture::new();
        let layout = fx.layout(",a,b\nx,a/1,b/22\n");
        let request = fx.request("frameworkX", layout, Metric::IoSkew);

        let first = std::fs::read(generate(&fx.registry, &fx.settings, &request).await.unwrap())
            .unwrap();
        let second = std::fs::read(generate(&fx.registry, &fx.settings, &request).await.unwrap())
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_layout_produces_empty_table() {
        let fx = Fixture::new();
        let layout = fx.layout("graph,bfs,pr\n");
        let request = fx.request("frameworkX", layout, Metric::Time);

        let out = generate(&fx.registry, &fx.settings, &request).await.unwrap();

        assert_eq!(std::fs::read_to_string(out).unwrap(), "graph,bfs,pr\n");
        assert!(fx.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_cell_aborts_without_output() {
        let fx = Fixture::new();
        let layout = fx.layout(",a,b\nx,a/1,justafilename\n");
        let request = fx.request("frameworkX", layout, Metric::Time);

        let err = generate(&fx.registry, &fx.settings, &request)
            .await
            .unwrap_err();

        match error_of(&err) {
            GenerateError::Format { row, column, value } => {
                assert_eq!((row.as_str(), column.as_str()), ("x", "b"));
                assert_eq!(value, "justafilename");
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(fx.calls().is_empty());
        assert!(!fx.out_path().exists());
    }

    #[tokio::test]
    async fn unknown_system_fails_before_reading_layout() {
        let fx = Fixture::new();
        let request = fx.request(
            "frameworkY",
            fx.dir.path().join("does-not-exist.csv"),
            Metric::Time,
        );

        let err = generate(&fx.registry, &fx.settings, &request)
            .await
            .unwrap_err();

        assert!(matches!(error_of(&err), GenerateError::Resolution { system, .. } if system == "frameworkY"));
    }

    #[tokio::test]
    async fn missing_layout_is_an_io_error() {
        let fx = Fixture::new();
        let request = fx.request(
            "frameworkX",
            fx.dir.path().join("does-not-exist.csv"),
            Metric::Time,
        );

        let err = generate(&fx.registry, &fx.settings, &request)
            .await
            .unwrap_err();

        assert!(matches!(error_of(&err), GenerateError::Io { .. }));
    }

    #[tokio::test]
    async fn reads_trace_files_under_results_dir() {
        let mut fx = Fixture::new();
        fx.settings.results_dir = fx.dir.path().join("results");
        let kernel_dir = fx.settings.results_dir.join("run42").join("bfs");
        std::fs::create_dir_all(&kernel_dir).unwrap();
        std::fs::write(kernel_dir.join("t1.log"), "1.5\n").unwrap();
        std::fs::write(kernel_dir.join("t2.log"), "0.25\n").unwrap();
        let layout = fx.layout(",trial1,trial2\nrmat,bfs/t1.log,bfs/t2.log\n");
        let request = fx.request("seconds", layout, Metric::Time);

        let out = generate(&fx.registry, &fx.settings, &request).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(out).unwrap(),
            ",trial1,trial2\nrmat,1.5,0.25\n"
        );
    }

    #[tokio::test]
    async fn parser_errors_abort_without_output() {
        let mut fx = Fixture::new();
        fx.settings.results_dir = fx.dir.path().join("results");
        let kernel_dir = fx.settings.results_dir.join("run42").join("bfs");
        std::fs::create_dir_all(&kernel_dir).unwrap();
        std::fs::write(kernel_dir.join("t1.log"), "garbage\n").unwrap();
        let layout = fx.layout(",trial1\nrmat,bfs/t1.log\n");
        let request = fx.request("seconds", layout, Metric::Time);

        let err = generate(&fx.registry, &fx.settings, &request)
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<GenerateError>().is_none());
        assert!(format!("{err:#}").contains("t1.log"));
        assert!(!fx.out_path().exists());
    }

    #[test]
    fn trace_path_keeps_the_whole_cell() {
        let at = CellRef {
            row: "r",
            column: "c",
        };
        let path = trace_path(Path::new("results"), "run42", at, "matmul/trial1.log").unwrap();
        assert_eq!(path, PathBuf::from("results/run42/matmul/trial1.log"));

        let path = trace_path(Path::new("results"), "run42", at, "bfs/sub/trial1.log").unwrap();
        assert_eq!(path.as_os_str(), "results/run42/bfs/sub/trial1.log");

        for (cell, expected) in [
            ("/trial1.log", "results/run42//trial1.log"),
            ("matmul/", "results/run42/matmul/"),
        ] {
            let path = trace_path(Path::new("results"), "run42", at, cell).unwrap();
            assert_eq!(path.as_os_str(), expected);
        }

        for bad in ["justafilename", ""] {
            assert!(matches!(
                trace_path(Path::new("results"), "run42", at, bad),
                Err(GenerateError::Format { .. })
            ));
        }
    }

    #[test]
    fn absolute_segments_stay_under_results_dir() {
        let at = CellRef {
            row: "r",
            column: "c",
        };
        let path = trace_path(Path::new("results"), "run42", at, "bfs//etc/passwd").unwrap();
        assert_eq!(path.as_os_str(), "results/run42/bfs//etc/passwd");

        let path = trace_path(Path::new("results"), "/tmp/x", at, "k/f.log").unwrap();
        assert_eq!(path.as_os_str(), "results//tmp/x/k/f.log");
    }

    #[tokio::test]
    async fn absolute_time_writes_under_csv_dir() {
        let fx = Fixture::new();
        let layout = fx.layout(",a
x,k/f.log
");
        let mut request = fx.request("frameworkX", layout, Metric::Time);
        request.time = "/nested".to_owned();

        let out = generate(&fx.registry, &fx.settings, &request).await.unwrap();

        assert!(out.starts_with(&fx.settings.csv_dir));
        assert_eq!(
            out.as_os_str(),
            concat_path(&fx.settings.csv_dir, &["/nested", "out.csv"]).as_os_str()
        );
        assert!(fx.settings.csv_dir.join("nested").join("out.csv").exists());
        assert_eq!(
            fx.calls(),
            vec![(PathBuf::from("results//nested/k/f.log"), Metric::Time)]
        );
    }
}
