use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sertifikat::{Period, Portal, PortalConfig, PortalError, ProgramType};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Practicum status lookup and certificate download")]
struct Args {
    /// YAML portal config; the built-in deployment layout is used when absent
    #[arg(long, env = "SERTIFIKAT_CONFIG", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show enrollment, pass and assistant status as JSON
    Status {
        #[arg(long)]
        npm: String,
        #[arg(long)]
        program: ProgramType,
        /// Defaults to the configured current period
        #[arg(long)]
        period: Option<Period>,
    },
    /// Write the student's certificate PDF into a directory
    Download {
        #[arg(long)]
        npm: String,
        #[arg(long)]
        program: ProgramType,
        #[arg(long)]
        period: Option<Period>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// List the periods a practicum is offered in
    Periods {
        #[arg(long)]
        program: ProgramType,
    },
}

/// Attach the student-facing message on top of the technical error.
fn user_facing(err: PortalError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) load config ──────────────────────────────────────────────
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => PortalConfig::load(path)?,
        None => PortalConfig::default(),
    };
    let portal = Portal::from_config(config).map_err(user_facing)?;

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match args.command {
        Command::Status {
            npm,
            program,
            period,
        } => {
            let period = period.unwrap_or_else(|| portal.current_period());
            let status = portal
                .resolve_eligibility(&npm, program, period)
                .await
                .map_err(user_facing)?;
            let report = serde_json::json!({
                "student": &status,
                "display_name": status.display_name(),
                "status": status.status_label().to_string(),
                "eligible": status.is_eligible(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Download {
            npm,
            program,
            period,
            out,
        } => {
            let period = period.unwrap_or_else(|| portal.current_period());
            let status = portal
                .resolve_eligibility(&npm, program, period)
                .await
                .map_err(user_facing)?;
            if !status.is_eligible() {
                bail!(
                    "{} ({}) tidak berhak mengunduh sertifikat: status {}",
                    status.display_name(),
                    status.student_id,
                    status.status_label()
                );
            }

            let artifact = portal
                .resolve_certificate(&status.student_id, program, period, status.is_assistant)
                .await
                .map_err(user_facing)?;

            tokio::fs::create_dir_all(&out)
                .await
                .with_context(|| format!("creating {}", out.display()))?;
            let dest = out.join(&artifact.filename);
            tokio::fs::write(&dest, &artifact.bytes)
                .await
                .with_context(|| format!("writing {}", dest.display()))?;
            info!(path = %dest.display(), size = artifact.bytes.len(), "certificate saved");
            println!("{}", dest.display());
        }
        Command::Periods { program } => {
            let periods = portal.list_available_periods(program);
            if periods.is_empty() {
                bail!("Praktikum {} belum memiliki periode yang dibuka", program);
            }
            for period in periods {
                println!("{}", period);
            }
        }
    }

    Ok(())
}
