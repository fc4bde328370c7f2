//! Vartiss Mailer - resilient mail submission client
//!
//! Drives the Vartiss site's form-submission pipeline from the command line:
//! - Normalizes raw form fields into the canonical payload
//! - Drops honeypot-flagged spam without a network call
//! - POSTs through the endpoint cascade (primary, retry, local fallbacks)
//! - Reports a plain-text success/failure message

mod config;
mod form;
mod mailer;
mod payload;
mod transport;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::form::{FormContext, ResultKind};
use crate::payload::{FormSource, RawFields};
use crate::transport::HttpTransport;

/// Vartiss Mailer - send site form submissions
#[derive(Parser)]
#[command(name = "vartiss-mailer")]
#[command(author = "Vartiss")]
#[command(version)]
#[command(about = "Send Vartiss contact/enquiry form submissions with endpoint fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a form message through the mail pipeline
    Send {
        /// Sender name
        #[arg(short, long)]
        name: Option<String>,

        /// Sender email address
        #[arg(short, long)]
        email: Option<String>,

        /// Sender phone number (optional)
        #[arg(short, long)]
        phone: Option<String>,

        /// Message body
        #[arg(short, long)]
        message: Option<String>,

        /// Which form produced the submission
        #[arg(long, value_enum, default_value = "index")]
        source: FormSource,

        /// Submit to an explicit form-relay endpoint instead of the mail cascade
        #[arg(long)]
        relay_url: Option<String>,

        /// Honeypot field value (spam simulation)
        #[arg(long, hide = true)]
        gotcha: Option<String>,
    },

    /// Show the resolved endpoint candidates and timeout budgets
    Endpoints,

    /// Create the default config file if it doesn't exist
    Init,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vartiss_mailer=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            name,
            email,
            phone,
            message,
            source,
            relay_url,
            gotcha,
        } => {
            let config = Config::load()?;

            let fields = RawFields {
                name,
                email,
                phone,
                message,
                gotcha,
            };

            let mut form = FormContext::new(source, fields);
            let relay = relay_url.or_else(|| config.relay.endpoint.clone());
            if let Some(url) = relay {
                form = form.with_relay(&url);
            }

            let transport = HttpTransport::new();
            let endpoints = config.endpoints();

            println!("{}", "Sending...".bright_cyan());

            let rt = tokio::runtime::Runtime::new()?;
            let Some(outcome) = rt.block_on(form.submit(&transport, &endpoints)) else {
                return Ok(());
            };

            match form.result_panel().map(|p| p.kind()) {
                Some(ResultKind::Success) => {
                    println!("{} {}", "✓".bright_green(), outcome.message.bright_green())
                }
                _ => println!("{} {}", "✗".bright_red(), outcome.message.bright_red()),
            }

            if !outcome.success {
                std::process::exit(1);
            }
        }
        Commands::Endpoints => {
            let config = Config::load()?;
            let endpoints = config.endpoints();

            println!("{}", "Mail endpoint candidates, in priority order:".bold());
            println!(
                "  1. {} (timeout {}s, one retry at {}s after {}ms backoff)",
                endpoints.primary.bright_cyan(),
                endpoints.primary_timeout.as_secs(),
                endpoints.retry_timeout.as_secs(),
                endpoints.retry_backoff.as_millis(),
            );
            for (i, url) in endpoints.fallbacks.iter().enumerate() {
                println!(
                    "  {}. {} (timeout {}s)",
                    i + 2,
                    url.bright_cyan(),
                    endpoints.fallback_timeout.as_secs(),
                );
            }
            if let Some(relay) = &config.relay.endpoint {
                println!("{} {}", "Relay override:".bold(), relay.bright_yellow());
            }
            println!("Config file: {}", Config::config_path()?.display());
        }
        Commands::Init => {
            Config::init()?;
            println!(
                "{} {}",
                "Config ready at".bright_green(),
                Config::config_path()?.display()
            );
        }
    }

    Ok(())
}
