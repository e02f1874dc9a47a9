#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod config;
mod error;
mod output;
mod skeleton;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{load_config, LoggingConfig, SkelConfig};
use error::SkelError;
use output::Sink;

#[derive(Parser)]
#[command(name = "goskel")]
#[command(about = "Print the import/type/const/var skeleton of a Go source file", long_about = None)]
#[command(version)]
struct Cli {
    /// Go source file to read
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the skeleton to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file ([logging], [output])
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g. debug, info, warn, error); RUST_LOG wins when set
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(report(&e)),
    }
}

/// Print the failure once on stderr and pick the exit status.
fn report(e: &anyhow::Error) -> u8 {
    let typed = e.downcast_ref::<SkelError>();
    let code = typed.map(SkelError::exit_code).unwrap_or(1);
    // сообщение для пользователя печатается ниже, в лог только на debug
    tracing::debug!(error = %e, code, "skeleton extraction failed");
    eprintln!("Error: {e}");
    if let Some(SkelError::Usage(_)) = typed {
        let _ = Cli::command().write_help(&mut std::io::stderr());
    }
    code
}

// === Pipeline entry point ===

fn run(cli: Cli) -> anyhow::Result<()> {
    // ничего не читаем, пока нет --input
    let Some(input) = cli.input else {
        return Err(SkelError::Usage("--input flag is required".into()).into());
    };

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SkelConfig::default(),
    };
    init_logging(cli.log_level.as_deref(), &config.logging);

    let bytes = std::fs::read(&input)
        .map_err(|e| SkelError::io("failed to read input file", &input, e))?;
    tracing::debug!(path = %input.display(), bytes = bytes.len(), "read input");

    // рендерим целиком до записи: при ошибке выходной файл не появляется
    let text = skeleton::extract_skeleton(bytes, &input)?;

    let sink = Sink::from_arg(cli.output);
    sink.write(&text)?;
    if let Sink::File(path) = &sink {
        if config.output.announce {
            println!("Successfully extracted skeleton to: {}", path.display());
        }
    }
    Ok(())
}

/// stderr-only logging; filter from RUST_LOG, then --log-level, then config.
fn init_logging(cli_level: Option<&str>, logging: &LoggingConfig) {
    let fallback = cli_level.unwrap_or(&logging.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    // повторная инициализация (несколько запусков в одном процессе) не ошибка
    let _ = if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}
