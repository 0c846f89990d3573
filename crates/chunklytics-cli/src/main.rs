// chunklytics - access log analytics CLI

mod error;
mod metrics;
mod sink;
mod source;
mod summary;

use chunklytics_core::{CommonLogMatcher, Pipeline, MAX_TOP_N};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use error::CliError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chunklytics")]
#[command(version = "0.1.0")]
#[command(about = "chunk-o-lytics access log parser and extractor", long_about = None)]
struct Cli {
    /// Input file to be parsed
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,

    /// Output JSON file (parent directories are created)
    #[arg(long = "out", value_name = "PATH")]
    output: PathBuf,

    /// Maximum number of results in top_client_ips
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(0..=MAX_TOP_N as i64))]
    max_client_ips: u16,

    /// Maximum number of results in top_path_avg_seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(0..=MAX_TOP_N as i64))]
    max_paths: u16,

    /// StatsD server (host:port) that receives the line counters
    #[arg(long, env = "STATSD_SERVER")]
    statsd_server: Option<String>,

    /// Prefix for StatsD metric names
    #[arg(long, default_value = "metric")]
    statsd_prefix: String,

    /// Print a summary table after writing the results
    #[arg(long)]
    summary: bool,

    /// Show a line counter while processing
    #[arg(long)]
    progress: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env may hold STATSD_SERVER
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return fail(CliError::Arguments(e)),
    };

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(err: CliError) -> ExitCode {
    match &err {
        CliError::Arguments(e) => {
            let _ = e.print();
        }
        other => {
            error!(error = %other, exit_code = other.exit_code(), "Run failed");
            eprintln!("{} {}", "Error:".red().bold(), other);
        }
    }
    ExitCode::from(err.exit_code())
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let reader = source::open(&cli.input)?;
    sink::prepare(&cli.output)?;

    let started = Instant::now();
    let progress = progress_bar(cli.progress);

    let matcher = CommonLogMatcher::new();
    let mut pipeline = Pipeline::new(&matcher);
    source::feed_lines(reader, &cli.input, &mut pipeline, &progress)?;
    progress.finish_and_clear();

    let result = pipeline.finish(cli.max_client_ips.into(), cli.max_paths.into());
    sink::write_json(&result, &cli.output)?;

    info!(
        input = %cli.input.display(),
        output = %cli.output.display(),
        processed = result.total_processed,
        ok = result.total_ok,
        failed = result.total_failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Wrote results"
    );

    if let Some(server) = &cli.statsd_server {
        metrics::report(server, &cli.statsd_prefix, &result).await;
    }

    if cli.summary {
        summary::print(&result);
    }

    Ok(())
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} lines ({per_sec})") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["chunklytics", "--in", "a.log", "--out", "out/b.json"]).unwrap();

        assert_eq!(cli.input, PathBuf::from("a.log"));
        assert_eq!(cli.output, PathBuf::from("out/b.json"));
        assert_eq!(cli.max_client_ips, 10);
        assert_eq!(cli.max_paths, 10);
        assert_eq!(cli.statsd_prefix, "metric");
        assert!(!cli.summary);
    }

    #[test]
    fn test_top_n_range() {
        let parse = |n: &str| {
            Cli::try_parse_from(["chunklytics", "--in", "a", "--out", "b", "--max-client-ips", n, "--max-paths", n])
        };

        assert_eq!(parse("0").unwrap().max_client_ips, 0);
        assert_eq!(parse("10000").unwrap().max_paths, 10000);
        assert!(parse("10001").is_err());
        assert!(parse("-1").is_err());
        assert!(parse("ten").is_err());
    }

    #[test]
    fn test_required_flags() {
        assert!(Cli::try_parse_from(["chunklytics", "--in", "a.log"]).is_err());
        assert!(Cli::try_parse_from(["chunklytics", "--out", "b.json"]).is_err());
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("access.log");
        let output = dir.path().join("nested/out.json");
        std::fs::write(
            &input,
            concat!(
                r#"10.0.0.1 - - [08/Feb/2024:10:30:00 +0000] "GET /a HTTP/1.1" 200 500 "-""#,
                "\n",
                r#"10.0.0.1 - - [08/Feb/2024:10:30:01 +0000] "GET /a?x=1 HTTP/1.1" 200 1500 "-""#,
                "\n",
                "not a log line\n",
            ),
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "chunklytics",
            "--in",
            input.to_str().unwrap(),
            "--out",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(&cli).await.unwrap();

        let expected = r#"{
  "total_number_of_lines_processed": 3,
  "total_number_of_lines_ok": 2,
  "total_number_of_lines_failed": 1,
  "top_client_ips": {
    "10.0.0.1": 2
  },
  "top_path_avg_seconds": {
    "/a": 1.0
  }
}
"#;
        assert_eq!(std::fs::read_to_string(&output).unwrap(), expected);
    }

    #[test]
    fn test_fail_maps_exit_codes() {
        let write = CliError::Write {
            path: "out.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::StorageFull, "full"),
        };
        assert_eq!(fail(write), ExitCode::from(2));

        let args = Cli::try_parse_from(["chunklytics"]).unwrap_err();
        assert_eq!(fail(CliError::Arguments(args)), ExitCode::from(1));
    }

    #[tokio::test]
    async fn test_run_missing_input_exits_1() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.json");

        let cli = Cli::try_parse_from([
            "chunklytics",
            "--in",
            dir.path().join("nope.log").to_str().unwrap(),
            "--out",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let err = run(&cli).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(!output.exists());
    }
}
