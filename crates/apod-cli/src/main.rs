use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use apod_core::{BlockingClient, Bounds, Error, ErrorKind, ProcessOptions, Stage};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "apod-thumb",
    version,
    about = "Fetch NASA's picture of the day as a baseline JPEG sized for a 320x240 display"
)]
struct Cli {
    /// APOD API key
    #[arg(long, env = "APOD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// APOD API endpoint
    #[arg(long, env = "APOD_API_URL", default_value = apod_core::DEFAULT_API_URL)]
    api_url: String,

    /// Output JPEG path (overwritten on every run)
    #[arg(short, long, default_value = apod_core::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Display width in pixels
    #[arg(long, default_value_t = Bounds::DISPLAY.width)]
    width: u32,

    /// Display height in pixels
    #[arg(long, default_value_t = Bounds::DISPLAY.height)]
    height: u32,

    /// HTTP timeout in seconds (library default if unset)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let t_total = std::time::Instant::now();

    let client = BlockingClient::new(cli.timeout_secs.map(Duration::from_secs))
        .context("failed to build HTTP client")?;
    let options = ProcessOptions {
        api_key: cli.api_key,
        api_url: cli.api_url,
        output: cli.output,
        bounds: Bounds::new(cli.width, cli.height),
    };

    let result = apod_core::process(&options, &client, &|stage, current, total, message| {
        info!("[{}] {}/{} {}", stage, current + 1, total, message);
    })?;

    info!(
        "Done! {} {}x{} -> {}x{}, {} bytes written to {} ({:.2}s)",
        result.media_type.as_str(),
        result.source_size.0,
        result.source_size.1,
        result.size.0,
        result.size.1,
        result.bytes_written,
        result.output.display(),
        t_total.elapsed().as_secs_f64()
    );
    Ok(())
}

/// What to print for a failed run and the exit code to return.
#[derive(Debug, PartialEq, Eq)]
struct Diagnostic {
    stdout: Vec<String>,
    stderr: Option<String>,
    code: u8,
}

/// Handled failures get a short diagnostic on stdout and exit 1;
/// anything else gets the full error chain on stderr and exits 2.
fn diagnose(err: &anyhow::Error) -> Diagnostic {
    let unexpected = || Diagnostic {
        stdout: Vec::new(),
        stderr: Some(format!("Error: {err:?}")),
        code: 2,
    };

    let Some(core_err) = err.downcast_ref::<Error>() else {
        return unexpected();
    };

    let stdout = match core_err {
        Error::HttpStatus { stage, status } => {
            let headline = match stage {
                Stage::Metadata => "Error Contacting APOD API",
                Stage::Asset => "Error Downloading APOD Image",
            };
            vec![headline.to_string(), format!("Response Code: {status}")]
        }
        Error::UnsupportedMediaType(_) => vec!["Error Parsing APOD API JSON".to_string()],
        _ => {
            debug_assert_eq!(core_err.kind(), ErrorKind::Unexpected);
            return unexpected();
        }
    };

    Diagnostic {
        stdout,
        stderr: None,
        code: core_err.exit_code() as u8,
    }
}

fn report(err: &anyhow::Error) -> ExitCode {
    let diagnostic = diagnose(err);
    for line in &diagnostic.stdout {
        println!("{line}");
    }
    if let Some(message) = &diagnostic.stderr {
        eprintln!("{message}");
    }
    ExitCode::from(diagnostic.code)
}
