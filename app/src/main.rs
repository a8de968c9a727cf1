use std::path::PathBuf;

use clap::Parser;
use common::{
    config::Settings,
    generate::{GenerateRequest, generate},
    metric::Metric,
};
use eyre::{Context, Result};
use tokio::fs::read_to_string;
use tracing::{debug, error};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Datafile generator
///
/// Replaces every <kernel>/<filename> cell of a layout CSV with a metric
/// extracted from results/<time>/<kernel>/<filename>, and writes the table
/// to csv/<time>/<out_file>.
#[derive(Parser, Debug)]
#[command(name = "generate_datafile")]
struct Cli {
    /// Target system, selects the trace parser
    system: String,
    /// Input CSV layout
    in_layout_file: PathBuf,
    /// Target metric
    #[arg(value_enum)]
    metric: Metric,
    /// Output CSV file name
    out_file: String,
    /// Test time of the run
    time: String,
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Extract cells in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Threads used with --parallel
    #[arg(short, long)]
    jobs: Option<usize>,
    #[arg(short, long)]
    log: Vec<String>,
}

impl Cli {
    fn request(&self) -> GenerateRequest {
        GenerateRequest {
            system: self.system.clone(),
            layout_path: self.in_layout_file.clone(),
            metric: self.metric,
            out_file: self.out_file.clone(),
            time: self.time.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let modules: &[&str] = default_parsers::PARSER_NAMES;
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "generate_datafile.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("generate_datafile={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in std::iter::once(&"common").chain(modules) {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    let settings = load_settings(&args).await?;
    debug!("Settings: {settings:?}");

    match generate(default_parsers::parsers(), &settings, &args.request()).await {
        Ok(path) => println!("{}", path.display()),
        Err(err) => {
            error!("{err:#?}");
            return Err(err);
        }
    }

    Ok(())
}

async fn load_settings(args: &Cli) -> Result<Settings> {
    let mut settings: Settings = match &args.config {
        Some(path) => serde_yml::from_str(
            &read_to_string(path)
                .await
                .wrap_err_with(|| format!("Reading config {}", path.display()))?,
        )
        .wrap_err_with(|| format!("Parsing config {}", path.display()))?,
        None => Settings::default(),
    };

    if args.parallel {
        settings.parallel = true;
    }
    if args.jobs.is_some() {
        settings.jobs = args.jobs;
    }
    Ok(settings)
}
