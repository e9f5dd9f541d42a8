use anyhow::{Context, Result, anyhow};
use dotenv;
use product_analysis::analysis::{AnalysisReport, render_json, render_text};
use product_analysis::config::AnalysisConfig;
use product_analysis::loader::CsvLoader;
use product_analysis::session::AnalysisSession;
use std::env;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

struct CliArgs {
    json: bool,
    config_path: Option<String>,
    files: Vec<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut cli = CliArgs {
        json: false,
        config_path: None,
        files: Vec::new(),
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" | "-j" => cli.json = true,
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config expects a file path"))?;
                cli.config_path = Some(path);
            }
            flag if flag.starts_with('-') => {
                return Err(anyhow!(
                    "Unknown option: {}\nUsage: product-analysis [--json] [--config <path>] [FILE ...]",
                    flag
                ));
            }
            _ => cli.files.push(PathBuf::from(arg)),
        }
    }

    Ok(cli)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout carries only reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("product_analysis=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args(env::args().skip(1))?;

    let config = AnalysisConfig::resolve(cli.config_path.as_deref())
        .context("Failed to load analysis configuration")?;

    info!("🚀 Starting Product Listing Analysis");
    info!(
        "Cache capacity: {} datasets, preview rows: {}, histogram bins: {}",
        config.cache.capacity, config.report.preview_rows, config.report.histogram_bins
    );

    let mut session = AnalysisSession::from_config(&config)?;

    for path in &cli.files {
        process_upload(&mut session, path, cli.json).await;
    }

    run_prompt(&mut session, cli.json).await?;

    info!("\n=== Session Summary ===");
    info!(
        "✅ Analysed {} upload(s), {} failed",
        session.processed(),
        session.failed()
    );
    info!(
        "📦 Cache: {} hit(s), {} miss(es), {} dataset(s) held",
        session.cache().hits(),
        session.cache().misses(),
        session.cache().len()
    );

    if session.processed() == 0 {
        warn!("⚠️ No uploads were analysed");
    }

    Ok(())
}

/// Read further paths from stdin until an empty line, `quit`, or EOF.
async fn run_prompt(session: &mut AnalysisSession, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stderr = tokio::io::stderr();

    loop {
        stderr
            .write_all(b"csv path (empty line or 'quit' to finish)> ")
            .await?;
        stderr.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("quit") {
            break;
        }

        process_upload(session, Path::new(line), json).await;
    }

    Ok(())
}

async fn process_upload(session: &mut AnalysisSession, path: &Path, json: bool) {
    info!("\n=== Processing Upload: {} ===", path.display());

    let result = match CsvLoader::read_upload(path).await {
        Ok(upload) => session.analyze(&upload),
        Err(e) => Err(e),
    };

    match result.and_then(|report| emit(&report, json)) {
        Ok(()) => info!("✅ Successfully analysed {}", path.display()),
        Err(e) => error!("❌ Failed to analyse {}: {:#}", path.display(), e),
    }
}

fn emit(report: &AnalysisReport, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(report)?);
    } else {
        println!("{}", render_text(report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse_args(args(&["--json", "--config", "a.toml", "one.csv", "two.csv"])).unwrap();
        assert!(cli.json);
        assert_eq!(cli.config_path.as_deref(), Some("a.toml"));
        assert_eq!(cli.files, vec![PathBuf::from("one.csv"), PathBuf::from("two.csv")]);
    }

    #[test]
    fn test_parse_args_rejects_bad_flags() {
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }
}
