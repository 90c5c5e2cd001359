//! Vetline CLI - Assessment initiation and result inspection
//!
//! Thin client over the Vetline API for operators: kick off a phone
//! screen, watch the index, pull a scored result.

mod api;
mod config;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use api::VetlineClient;
use config::Config;

#[derive(Parser)]
#[command(name = "vetline")]
#[command(about = "Vetline CLI - voice skills assessments", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the API base URL from config
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an assessment call to a candidate
    Initiate {
        /// Candidate phone number (E.164 or human formatting)
        #[arg(short, long)]
        phone: String,
        /// Role key (e.g. bartender, banquet_server, host)
        #[arg(short, long)]
        role: Option<String>,
        /// Caller-side candidate identifier
        #[arg(long)]
        candidate_id: Option<String>,
    },

    /// List all assessments in the index
    List,

    /// Show one assessment result
    Result {
        /// Assessment ID
        assessment_id: String,
    },

    /// Re-run scoring for a completed assessment
    Rescore {
        /// Assessment ID
        assessment_id: String,
    },

    /// Show current configuration
    Config {
        /// Write the active settings to the config file
        #[arg(long)]
        init: bool,
    },
}

fn recommendation_colored(recommendation: &str) -> colored::ColoredString {
    match recommendation {
        "PASS" => recommendation.green().bold(),
        "FAIL" => recommendation.red().bold(),
        _ => recommendation.yellow().bold(),
    }
}

fn print_result(result: &api::AssessmentResult) {
    println!(
        "{} {} ({})",
        "Assessment".bold(),
        result.assessment_id,
        result.role
    );
    println!(
        "Recommendation: {}",
        recommendation_colored(&result.recommendation)
    );
    if result.degraded {
        println!(
            "{}",
            "Some answers could not be evaluated - flagged for review".yellow()
        );
    }
    println!("Reasoning: {}", result.reasoning);
    println!();

    for category in &result.categories {
        let status = if category.passed {
            "pass".green()
        } else {
            "fail".red()
        };
        println!(
            "  {} {:.0}% (threshold {:.0}%) - {}{}",
            category.name.bold(),
            category.percentage,
            category.pass_threshold_pct,
            status,
            if category.degraded {
                " (degraded)".yellow().to_string()
            } else {
                String::new()
            }
        );
    }
    println!();

    for answer in &result.answers {
        println!(
            "  {} [{}] {:.1} - {}",
            answer.question_key.bold(),
            answer.tier,
            answer.score,
            answer.reasoning
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let base_url = cli.base_url.unwrap_or_else(|| config.base_url.clone());
    let client = VetlineClient::new(&base_url);

    match cli.command {
        Commands::Initiate {
            phone,
            role,
            candidate_id,
        } => {
            let role = match role.or_else(|| config.default_role.clone()) {
                Some(r) => r,
                None => bail!("no role given and no default_role configured"),
            };
            let resp = client
                .initiate(&phone, &role, candidate_id.as_deref())
                .await?;
            println!("{} {}", "Assessment started:".green().bold(), resp.assessment_id);
            println!("  role:     {}", resp.role);
            println!("  phone:    {}", resp.candidate_phone);
            println!("  call sid: {}", resp.provider_call_id);
        }

        Commands::List => {
            let index = client.list().await?;
            println!(
                "{} ({} total)",
                "Assessments".bold(),
                index.total_count
            );
            for entry in index.assessments {
                println!(
                    "  {}  {:<16} {:<8} {}",
                    entry.assessment_id,
                    entry.role,
                    entry.status,
                    entry.analyzed_at
                );
            }
        }

        Commands::Result { assessment_id } => {
            let result = client.result(&assessment_id).await?;
            print_result(&result);
        }

        Commands::Rescore { assessment_id } => {
            println!("Rescoring {assessment_id}...");
            let result = client.rescore(&assessment_id).await?;
            print_result(&result);
        }

        Commands::Config { init } => {
            if init {
                let mut persisted = config.clone();
                persisted.base_url = base_url.clone();
                persisted.save()?;
                println!("{}", "Configuration written".green());
            }
            println!("config path: {:?}", Config::config_path()?);
            println!("base_url:    {}", config.base_url);
            if let Some(role) = &config.default_role {
                println!("default_role: {role}");
            }
            let healthy = client.health().await.unwrap_or(false);
            println!(
                "server:      {}",
                if healthy {
                    "reachable".green()
                } else {
                    "unreachable".red()
                }
            );
        }
    }

    Ok(())
}
