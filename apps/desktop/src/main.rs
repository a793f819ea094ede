use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_config, ClientConfig, CreateSnapshot, CreateSubmissionController, DraftField,
    ListSyncController, RemoteClient, RemoteTransport, SubmitStatus,
};
use shared::domain::Opportunity;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "opportunities", about = "List and create CRM opportunities")]
struct Args {
    /// Overrides the configured API base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// TOML file with `api_base_url`; defaults to ./client.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show opportunities.
    List {
        #[arg(long)]
        new_only: bool,
    },
    /// Show the stage names and accounts the create form offers.
    Options,
    /// Create an opportunity.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        stage: String,
        #[arg(long)]
        close_date: String,
        /// Account id, as listed by `options`.
        #[arg(long)]
        account: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config = match &args.base_url {
        Some(base_url) => ClientConfig::new(base_url)?,
        None => load_config(args.config.as_deref())?,
    };
    let client = RemoteClient::new(config)?;
    info!(base_url = %client.config().base_url(), "using api");
    let transport: Arc<dyn RemoteTransport> = Arc::new(client);

    let ok = match args.command {
        Command::List { new_only } => run_list(transport, new_only).await,
        Command::Options => run_options(transport).await,
        Command::Create {
            name,
            amount,
            stage,
            close_date,
            account,
            description,
        } => {
            let fields = [
                (DraftField::Name, name),
                (DraftField::Amount, amount),
                (DraftField::StageName, stage),
                (DraftField::CloseDate, close_date),
                (DraftField::AccountId, account),
                (DraftField::Description, description),
            ];
            run_create(transport, fields).await?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run_list(transport: Arc<dyn RemoteTransport>, new_only: bool) -> bool {
    let controller = ListSyncController::new(transport);
    let snapshot = controller.set_filter(new_only).await;

    if let Some(message) = snapshot.error_message() {
        eprintln!("Error: {message}");
        return false;
    }
    if snapshot.data.is_empty() {
        println!("No opportunities.");
    }
    for opportunity in &snapshot.data {
        println!("{}", render_opportunity(opportunity));
    }
    true
}

async fn run_options(transport: Arc<dyn RemoteTransport>) -> bool {
    let controller = CreateSubmissionController::new(transport);
    let snapshot = controller.load_options().await;
    if let Some(message) = snapshot.options_error() {
        eprintln!("Error loading options: {message}");
        return false;
    }
    print_options(&snapshot);
    true
}

async fn run_create(
    transport: Arc<dyn RemoteTransport>,
    fields: [(DraftField, String); 6],
) -> Result<bool> {
    let controller = CreateSubmissionController::new(transport);
    let snapshot = controller.load_options().await;
    if let Some(message) = snapshot.options_error() {
        eprintln!("Error loading options: {message}");
        return Ok(false);
    }

    for (field, value) in fields {
        check_choice(&snapshot, field, &value)?;
        controller.update_field(field, value).await;
    }

    match controller.submit().await {
        SubmitStatus::Success => {
            let snapshot = controller.snapshot().await;
            match &snapshot.created {
                Some(created) => println!("Opportunity created: {}", render_opportunity(created)),
                None => println!("Opportunity created."),
            }
            Ok(true)
        }
        SubmitStatus::Error { message } => {
            eprintln!("Error: {message}");
            Ok(false)
        }
        other => bail!("submission did not complete: {other:?}"),
    }
}

/// Select-style fields only accept values from the loaded options.
fn check_choice(snapshot: &CreateSnapshot, field: DraftField, value: &str) -> Result<()> {
    match field {
        DraftField::StageName => {
            if !snapshot.stage_names.iter().any(|stage| stage.as_str() == value) {
                let choices: Vec<&str> = snapshot.stage_names.iter().map(|s| s.as_str()).collect();
                bail!("unknown stage '{value}'; choose one of: {}", choices.join(", "));
            }
        }
        DraftField::AccountId => {
            if !snapshot.accounts.iter().any(|account| account.id.as_str() == value) {
                bail!("unknown account '{value}'; run `opportunities options` to list accounts");
            }
        }
        _ => {}
    }
    Ok(())
}

fn print_options(snapshot: &CreateSnapshot) {
    println!("Stages:");
    for stage in &snapshot.stage_names {
        println!("  {stage}");
    }
    println!("Accounts:");
    if snapshot.accounts.is_empty() {
        println!("  (none)");
    }
    for account in &snapshot.accounts {
        println!("  {}  {}", account.id, account.name);
    }
}

fn render_opportunity(opportunity: &Opportunity) -> String {
    let mut line = format!(
        "{} | {} | ${:.2} | {} | {}% | account: {} | owner: {} | created {}",
        opportunity.id,
        opportunity.name,
        opportunity.amount,
        opportunity.stage_name,
        opportunity.probability,
        opportunity.account_name,
        opportunity.owner_name,
        opportunity.created_date.format("%Y-%m-%d"),
    );
    if let Some(description) = opportunity.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!(" | {description}"));
    }
    line
}
