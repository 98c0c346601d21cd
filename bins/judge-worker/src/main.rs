use anyhow::{Context, Result};
use clap::Parser;
use judge_common::config::JudgeConfig;
use judge_common::types::{Language, Verdict};
use judge_engine::{Judge, LanguageRegistry};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

/// Single-shot judge: reads one execution request on stdin, writes one
/// verdict on stdout, exits. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "judge-worker")]
#[command(about = "Judge untrusted code against test cases", long_about = None)]
struct Cli {
    /// JSON judge configuration file
    #[arg(long, env = "JUDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Serve only this language (e.g. typescript, python)
    #[arg(long, env = "JUDGE_LANGUAGE")]
    language: Option<String>,

    /// Print the supported languages and exit
    #[arg(long)]
    list_languages: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let registry = LanguageRegistry::with_defaults();

    if cli.list_languages {
        for language in registry.list_languages() {
            println!("{}", language);
        }
        return ExitCode::SUCCESS;
    }

    let judge = match build_judge(&cli, registry) {
        Ok(judge) => Arc::new(judge),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Invalid judge configuration");
            return fail(Verdict::system_error_with_detail(
                "Invalid judge configuration",
                format!("{:#}", e),
            ));
        }
    };

    let input = match read_request().await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to read request");
            return fail(Verdict::system_error_with_detail(
                "Failed to read request",
                format!("{:#}", e),
            ));
        }
    };

    // Run on its own task so a panic anywhere in the pipeline still
    // produces a verdict.
    let task = tokio::spawn({
        let judge = Arc::clone(&judge);
        async move {
            match String::from_utf8(input) {
                Ok(text) => judge.judge_json(&text).await,
                Err(e) => Verdict::system_error_with_detail("Invalid JSON input", e.to_string()),
            }
        }
    });

    match task.await {
        Ok(verdict) => match emit(&verdict) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %format!("{:#}", e), "Failed to write verdict");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!(error = %e, "Judge task aborted");
            fail(Verdict::system_error_with_detail("Judge crashed", e.to_string()))
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("JUDGE_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout belongs to the verdict
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_judge(cli: &Cli, registry: LanguageRegistry) -> Result<Judge> {
    let config = match &cli.config {
        Some(path) => JudgeConfig::load(path)?,
        None => JudgeConfig::default(),
    }
    .with_env_overrides()?;

    info!(
        timeout_ms = config.timeout_ms,
        build_timeout_ms = config.build_timeout_ms,
        max_parallel_tests = config.max_parallel_tests,
        "Judge configured"
    );

    let judge = Judge::new(config, registry);

    match &cli.language {
        Some(name) => {
            let language: Language = name.parse().context("Invalid --language")?;
            info!(language = %language, "Judge pinned to language");
            Ok(judge.pinned_to(language))
        }
        None => Ok(judge),
    }
}

async fn read_request() -> Result<Vec<u8>> {
    let mut input = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut input)
        .await
        .context("Failed to read stdin")?;
    Ok(input)
}

fn emit(verdict: &Verdict) -> Result<()> {
    let payload = serde_json::to_string(verdict).context("Failed to serialize verdict")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", payload).context("Failed to write verdict to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Harness-level failure: best-effort verdict, then a non-zero exit.
fn fail(verdict: Verdict) -> ExitCode {
    if let Err(e) = emit(&verdict) {
        error!(error = %format!("{:#}", e), "Failed to write verdict");
    }
    ExitCode::FAILURE
}
