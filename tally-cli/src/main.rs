use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tally_finance::{InsightPipeline, InsightSummary};

mod config;
mod llm;
mod narrative;
mod render;
mod state;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "tally", version = VERSION, about = "Bank statement analysis: categories, monthly totals, top flows")]
struct Cli {
    /// Config file (default: ~/.tally/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Transaction export (CSV)
    #[arg(long)]
    csv: PathBuf,

    /// Entries per ranked list (overrides config)
    #[arg(long)]
    top_n: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a statement and print the report tables
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Print the summary as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Print the narrative-report prompt built from the summary
    Prompt {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Ask the configured LLM for a narrative report
    Narrate {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG > --verbose > info
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze { input, json } => {
            let summary = analyze(&cfg, &input)?;
            if json {
                println!("{}", summary.to_json_pretty()?);
            } else {
                print!("{}", render::render_summary(&summary));
            }
        }

        Command::Prompt { input } => {
            let summary = analyze(&cfg, &input)?;
            println!("{}", narrative::build_prompt(&summary)?);
        }

        Command::Narrate { input } => {
            let summary = analyze(&cfg, &input)?;
            let prompt = narrative::build_prompt(&summary)?;
            let llm_cfg = llm::LlmConfig::from_section(&cfg.llm)?;
            info!("Generating narrative with {}", llm_cfg.model);
            match llm::complete(&llm_cfg, narrative::SYSTEM_PROMPT, &prompt) {
                Ok(report) => println!("{report}"),
                Err(e) => {
                    // the tables are still worth having
                    warn!("Narrative generation failed: {e:#}");
                    print!("{}", render::render_summary(&summary));
                }
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init { force } => config::init_config(force)?,
            ConfigCommand::Show => {
                let text = toml::to_string_pretty(&cfg).context("serialize config")?;
                println!("{text}");
            }
        },
    }

    Ok(())
}

fn analyze(cfg: &config::Config, input: &InputArgs) -> Result<InsightSummary> {
    let mut analysis = cfg.analysis.clone();
    if let Some(n) = input.top_n {
        analysis.top_n = n;
    }
    let pipeline = InsightPipeline::new(analysis).context("invalid analysis config")?;
    run_file(&pipeline, &input.csv)
}

fn run_file(pipeline: &InsightPipeline, path: &Path) -> Result<InsightSummary> {
    if !path.exists() {
        bail!("CSV not found: {} (pass --csv <path>)", path.display());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    pipeline
        .run_csv(BufReader::new(file))
        .with_context(|| format!("analyzing {}", path.display()))
}
