use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::{data_dir, Config, Overrides};
use crate::logging::{self, LogTarget};
use crate::report::{Report, DEFAULT_TOP_N};
use crate::services::{DashboardLoader, LoadOutcome};
use crate::types::{DataSource, DateRange, Department, DepartmentAnalytics};

const LOG_FILE_NAME: &str = "datacent.log";

/// Terminal analytics dashboard for manufacturing data
#[derive(Parser)]
#[command(name = "datacent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "DATACENT_API_URL", global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "DATACENT_TIMEOUT_SECS", global = true)]
    timeout: Option<u64>,

    /// Config file (defaults to ~/.datacent/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui,

    /// Show the sales dashboard
    Sales(ReportArgs),

    /// Show the manufacturing dashboard
    Manufacturing(ReportArgs),

    /// Show the field service dashboard
    Field(ReportArgs),

    /// Show the testing dashboard
    Testing(ReportArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
struct ReportArgs {
    /// First date to include (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Rows per ranking
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top: usize,
}

/// JSON output of a report command
#[derive(Serialize)]
struct JsonReport<'a> {
    department: Department,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<DataSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analytics: Option<&'a DepartmentAnalytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Commands {
    fn report(&self) -> Option<(Department, &ReportArgs)> {
        match self {
            Commands::Tui => None,
            Commands::Sales(args) => Some((Department::Sales, args)),
            Commands::Manufacturing(args) => Some((Department::Manufacturing, args)),
            Commands::Field(args) => Some((Department::Field, args)),
            Commands::Testing(args) => Some((Department::Testing, args)),
        }
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let overrides = Overrides {
            api_url: self.api_url.clone(),
            timeout_secs: self.timeout,
        };

        match self.command.as_ref().and_then(Commands::report) {
            None => {
                logging::init(LogTarget::File(data_dir()?.join(LOG_FILE_NAME)))?;
                let config = Config::load(&overrides, self.config.as_deref())?;
                crate::tui::run(&config)
            }
            Some((department, args)) => {
                logging::init(LogTarget::Stderr)?;
                let config = Config::load(&overrides, self.config.as_deref())?;
                run_report(&config, department, args)
            }
        }
    }
}

fn run_report(config: &Config, department: Department, args: &ReportArgs) -> anyhow::Result<()> {
    let range = DateRange::from_args(args.start.as_deref(), args.end.as_deref())?;
    let loader = DashboardLoader::new(config.client()?, config.sample_size);

    match loader.load(department, range.as_ref()) {
        LoadOutcome::Ready { analytics, source } => {
            if args.json {
                let out = JsonReport {
                    department,
                    source: Some(source),
                    range,
                    analytics: Some(&analytics),
                    reason: None,
                };
                println!(
                    "{}",
                    serde_json::to_string_pretty(&out).context("serializing report")?
                );
            } else {
                let report = Report::build(&analytics, source, range, args.top.max(1));
                print!("{}", report.render_text());
            }
        }
        LoadOutcome::NoData { reason } => {
            if args.json {
                let out = JsonReport {
                    department,
                    source: None,
                    range,
                    analytics: None,
                    reason: Some(reason),
                };
                println!(
                    "{}",
                    serde_json::to_string_pretty(&out).context("serializing report")?
                );
            } else {
                println!("No {} data available: {}", department.label(), reason);
            }
        }
    }
    Ok(())
}
