mod args;
mod output;

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use mailprobe_lib::{FileSource, Verifier};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;
use crate::output::OutputRow;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut emails = cli.emails.clone();
    if cli.stdin {
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            if !line.trim().is_empty() {
                emails.push(line);
            }
        }
    }
    if emails.is_empty() {
        Cli::clap_command().print_help()?;
        println!();
        return Ok(());
    }

    let verifier = Verifier::new(cli.verifier_config()?)?;
    if let Some(path) = &cli.disposable_list {
        verifier
            .registry()
            .refresh_now(&FileSource::new(path))
            .await
            .with_context(|| format!("load disposable list {path}"))?;
    }

    // séquentiel: une seule connexion SMTP ouverte à la fois
    let mut rows = Vec::with_capacity(emails.len());
    for email in emails {
        let row = match verifier.verify_email(&email).await {
            Ok(verification) => OutputRow::Checked(verification),
            Err(err) => OutputRow::Rejected {
                input: email,
                error: err.to_string(),
            },
        };
        rows.push(row);
    }

    output::emit(&rows, &cli.format)?;

    // codes de sortie : 0 OK, 2 adresses invalides ou injoignables, 1 fatal
    if rows.iter().any(OutputRow::is_unreachable) {
        std::process::exit(2);
    }
    Ok(())
}
