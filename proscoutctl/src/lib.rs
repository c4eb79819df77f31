use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use proscout_core::scrape::{load_targets_file, AbortReason, LogLevel, RunOutcome};
use proscout_core::{
    load_scraper_config, Credentials, LiveSessionFactory, ProfileTarget, ScrapeEvent,
    ScrapeObserver, ScrapeOrchestrator, ScrapeRun, ScraperConfig, SessionLauncher,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] proscout_core::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no credentials: pass --email and set PROSCOUT_PASSWORD")]
    MissingCredentials,
    #[error("no targets: pass profile URLs or --input FILE")]
    NoTargets,
    #[error("run aborted: {0}")]
    Aborted(AbortReason),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "ProScout profile scraping control interface", long_about = None)]
pub struct Cli {
    /// Path to the scraper config file
    #[arg(long, default_value = "configs/proscout.toml")]
    pub config: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and scrape the given profile URLs
    Scrape(ScrapeArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Profile URLs to scrape, in order
    pub urls: Vec<String>,

    /// File with one profile URL per line
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Where to write the report (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Account email. The password is read from PROSCOUT_PASSWORD only,
    /// never from the command line.
    #[arg(long, env = "PROSCOUT_EMAIL")]
    pub email: Option<String>,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_scraper_config(&cli.config)?;

    match cli.command {
        Commands::Scrape(args) => scrape(&config, &args, cli.format).await,
    }
}

async fn scrape(config: &ScraperConfig, args: &ScrapeArgs, format: OutputFormat) -> Result<()> {
    let credentials = resolve_credentials(args)?;
    let targets = resolve_targets(args).await?;
    if targets.is_empty() {
        return Err(AppError::NoTargets);
    }

    let factory = LiveSessionFactory::new(SessionLauncher::new(config.clone()));
    let mut orchestrator = ScrapeOrchestrator::new(Arc::new(factory), config);
    orchestrator.subscribe(Arc::new(ConsoleObserver));

    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupt received, finishing current profile");
            cancel.cancel();
        }
    });

    let run = orchestrator.run(&credentials, &targets).await;

    // Partial results are still worth keeping on an aborted run.
    write_report(&run, args.output.as_deref(), format)?;

    match &run.outcome {
        RunOutcome::Aborted(reason) => Err(AppError::Aborted(reason.clone())),
        _ => Ok(()),
    }
}

fn resolve_credentials(args: &ScrapeArgs) -> Result<Credentials> {
    let email = args.email.clone().ok_or(AppError::MissingCredentials)?;
    let password =
        std::env::var("PROSCOUT_PASSWORD").map_err(|_| AppError::MissingCredentials)?;
    if email.is_empty() || password.is_empty() {
        return Err(AppError::MissingCredentials);
    }
    Ok(Credentials::new(email, password))
}

async fn resolve_targets(args: &ScrapeArgs) -> Result<Vec<ProfileTarget>> {
    let mut targets: Vec<ProfileTarget> = args
        .urls
        .iter()
        .map(|url| ProfileTarget::from(url.trim()))
        .filter(|target| !target.as_str().is_empty())
        .collect();
    if let Some(path) = &args.input {
        targets.extend(load_targets_file(path).await?);
    }
    Ok(targets)
}

pub fn write_report(run: &ScrapeRun, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            render(run, file, format)
        }
        None => render(run, std::io::stdout().lock(), format),
    }
}

fn render<W: Write>(run: &ScrapeRun, writer: W, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for record in &run.records {
                csv_writer.serialize(record)?;
            }
            csv_writer.flush()?;
            Ok(())
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, run)?;
            writeln!(writer)?;
            Ok(())
        }
    }
}

/// Mirrors run progress to stderr so the report on stdout stays clean.
struct ConsoleObserver;

impl ScrapeObserver for ConsoleObserver {
    fn on_event(&self, event: &ScrapeEvent) {
        match event {
            ScrapeEvent::Progress {
                index,
                total,
                url,
                status,
            } => eprintln!("[{index}/{total}] {url}: {status}"),
            ScrapeEvent::Log {
                level, message, ..
            } => match level {
                LogLevel::Warn | LogLevel::Error => eprintln!("{message}"),
                _ => {}
            },
            ScrapeEvent::Summary {
                total,
                succeeded,
                failed,
            } => eprintln!("done: {succeeded} succeeded, {failed} failed of {total}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proscout_core::scrape::RecordStatus;
    use proscout_core::ProfileRecord;

    fn sample_run() -> ScrapeRun {
        let mut run = ScrapeRun::begin();
        run.records.push(ProfileRecord {
            profile_url: "https://www.linkedin.com/in/ada/".to_string(),
            name: "Ada Lovelace".to_string(),
            headline: "Engineer".to_string(),
            location: "London".to_string(),
            about: "First programmer.".to_string(),
            status: RecordStatus::Success,
        });
        run.records.push(ProfileRecord {
            profile_url: "https://www.linkedin.com/in/slow/".to_string(),
            name: String::new(),
            headline: String::new(),
            location: String::new(),
            about: String::new(),
            status: RecordStatus::Timeout,
        });
        run.finish(RunOutcome::Completed {
            succeeded: 1,
            failed: 1,
        });
        run
    }

    #[test]
    fn csv_report_keeps_column_order_and_status_strings() {
        let run = sample_run();
        let mut buffer = Vec::new();
        render(&run, &mut buffer, OutputFormat::Csv).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "profile_url,name,headline,location,about,status"
        );
        assert!(lines.next().unwrap().ends_with("success"));
        assert!(lines.next().unwrap().ends_with("timeout"));
    }

    #[test]
    fn json_report_carries_run_metadata() {
        let run = sample_run();
        let mut buffer = Vec::new();
        render(&run, &mut buffer, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["records"].as_array().unwrap().len(), 2);
        assert_eq!(value["records"][1]["status"], "timeout");
        assert!(value["run_id"].is_string());
    }

    #[test]
    fn report_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&sample_run(), Some(&path), OutputFormat::Csv).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("profile_url,"));
    }

    #[test]
    fn missing_password_is_rejected() {
        let args = ScrapeArgs {
            urls: vec!["https://www.linkedin.com/in/ada/".to_string()],
            input: None,
            output: None,
            email: Some("user@example.com".to_string()),
        };
        std::env::remove_var("PROSCOUT_PASSWORD");
        assert!(matches!(
            resolve_credentials(&args),
            Err(AppError::MissingCredentials)
        ));
    }
}
