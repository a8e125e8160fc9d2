use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod engines;
mod http;
mod pipeline;
#[cfg(test)]
mod test_fixtures;
mod utils;

use config::Settings;
use engines::CapabilityRegistry;
use pipeline::{OutputMode, Pipeline};
use utils::pdf::has_pdf_magic;

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

/// Prints lines centered in a box on stderr. Empty strings give blank rows.
fn print_box(lines: &[String]) {
    const BOX_WIDTH: usize = 60;
    const CONTENT_WIDTH: usize = BOX_WIDTH - 4;

    eprintln!("\n\x1b[36m╔{}╗", "═".repeat(BOX_WIDTH - 2));
    for line in lines {
        let visible = ANSI_ESCAPE.replace_all(line, "").chars().count();
        if visible >= CONTENT_WIDTH {
            eprintln!("║  {}\x1b[36m  ║", line);
            continue;
        }
        let padding = CONTENT_WIDTH - visible;
        let left = padding / 2;
        eprintln!(
            "║  {}{}{}\x1b[0m\x1b[36m║",
            " ".repeat(left),
            line,
            " ".repeat(padding - left)
        );
    }
    eprintln!("╚{}╝\x1b[0m\n", "═".repeat(BOX_WIDTH - 2));
}

fn banner(pipeline: &Pipeline, host: &str, port: u16) -> Vec<String> {
    let registry = pipeline.registry();
    let config = pipeline.config();
    let mark = |present: bool| if present { "\x1b[32myes" } else { "\x1b[31mno" };

    vec![
        String::new(),
        format!("\x1b[1m\x1b[31m pdfscan {} \x1b[0m", env!("CARGO_PKG_VERSION")),
        String::new(),
        format!("\x1b[0mListening on {}:{}", host, port),
        format!(
            "\x1b[0mText: {} then {}",
            config.primary,
            config
                .secondary
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "nothing".to_string())
        ),
        format!(
            "\x1b[0mpdftotext: {}\x1b[0m  pdftoppm: {}",
            mark(registry.has_text_engine(engines::TextEngineKind::Pdftotext)),
            mark(registry.raster_engine().is_some())
        ),
        String::new(),
    ]
}

fn init_tracing(quiet: bool) {
    // stdout carries the JSON printed by `extract` and `capabilities`
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if quiet { "error" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::build_cli().get_matches();
    let quiet = matches.get_flag("quiet");
    init_tracing(quiet);

    let outcome = match matches.subcommand() {
        Some(("extract", sub)) => run_extract(sub).await,
        Some(("capabilities", sub)) => run_capabilities(sub),
        Some(("serve", sub)) => run_serve(sub, quiet).await,
        _ => run_serve(&matches, quiet).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_serve(matches: &ArgMatches, quiet: bool) -> Result<ExitCode> {
    let settings = Settings::from_matches(matches)?;
    let registry = CapabilityRegistry::probe(settings.pipeline.step_timeout);
    let pipeline = Arc::new(Pipeline::new(settings.pipeline, registry));

    if !quiet {
        print_box(&banner(&pipeline, &settings.server.host, settings.server.port));
    }

    info!("Starting HTTP server...");
    http::serve(pipeline, &settings.server)
        .await
        .context("HTTP server failed")?;
    Ok(ExitCode::SUCCESS)
}

async fn run_extract(matches: &ArgMatches) -> Result<ExitCode> {
    let settings = Settings::from_matches(matches)?;
    let path = matches
        .get_one::<String>("path")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("missing PATH"))?;
    let mode: OutputMode = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("hybrid")
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let pretty = matches.get_flag("pretty");

    let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !has_pdf_magic(&bytes) {
        error!("{} is not a PDF", path.display());
        return Ok(ExitCode::FAILURE);
    }
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);

    let registry = CapabilityRegistry::probe(settings.pipeline.step_timeout);
    let pipeline = Pipeline::new(settings.pipeline, registry);
    let result = tokio::task::spawn_blocking(move || {
        pipeline.process(&bytes, mode, filename.as_deref())
    })
    .await
    .context("Extraction task failed")?;

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    Ok(if result.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_capabilities(matches: &ArgMatches) -> Result<ExitCode> {
    let settings = Settings::from_matches(matches)?;
    let registry = CapabilityRegistry::probe(settings.pipeline.step_timeout);
    let pipeline = Pipeline::new(settings.pipeline, registry);
    println!(
        "{}",
        serde_json::to_string_pretty(&http::health_report(&pipeline))?
    );
    Ok(ExitCode::SUCCESS)
}
