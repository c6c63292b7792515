use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ExpenseController, HttpExpenseApi, IntentDispatcher};
use shared::domain::{Amount, ExpenseId, DEFAULT_CATEGORY};
use storage::Storage;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod session;

use config::{load_settings, normalize_api_base_url};
use render::render_view;

#[derive(Parser, Debug)]
#[command(name = "expenses", about = "Voice-assisted expense tracker")]
struct Args {
    /// Overrides the expenses API base URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Overrides the local storage database URL.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all expenses.
    List,
    /// Add an expense.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
    },
    /// Change the amount of an expense.
    UpdateAmount {
        #[arg(long)]
        id: String,
        #[arg(long)]
        amount: f64,
    },
    /// Delete an expense.
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Print the assistant state snapshot as JSON.
    State,
    /// Read commands and assistant signals from stdin.
    Session,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }
    let api_url = normalize_api_base_url(&settings.api_base_url)?;

    let storage = Storage::new(&settings.database_url).await?;
    let user = storage.load_or_create_user_identity().await?;
    let api = HttpExpenseApi::new(&api_url).context("failed to build expenses gateway")?;
    let controller = ExpenseController::new(Arc::new(api), user);

    let mode = settings.assistant_mode();
    info!(api_url = %api_url, user_id = %controller.user(), assistant = mode.label(), "starting");

    if let Err(err) = controller.mount().await {
        warn!("initial load failed: {err}");
    }

    match args.command.unwrap_or(Command::List) {
        Command::List => println!("{}", render_view(&controller.view().await)),
        Command::Add {
            title,
            amount,
            category,
        } => {
            let record = controller
                .add_expense(&title, Some(Amount(amount)), &category)
                .await?;
            println!("added #{}", record.id);
        }
        Command::UpdateAmount { id, amount } => {
            controller
                .update_amount(Some(ExpenseId::new(id)), Some(Amount(amount)))
                .await?;
            println!("{}", render_view(&controller.view().await));
        }
        Command::Delete { id } => {
            controller.delete_expense(Some(ExpenseId::new(id))).await?;
            println!("{}", render_view(&controller.view().await));
        }
        Command::State => {
            let dispatcher = IntentDispatcher::new(controller);
            println!(
                "{}",
                serde_json::to_string_pretty(&dispatcher.assistant_state().await)?
            );
        }
        Command::Session => {
            if let Some(phrase) = mode.init_phrase() {
                println!("assistant debugger mode; start phrase: «{phrase}»");
            }
            let dispatcher = IntentDispatcher::new(controller);
            session::run(BufReader::new(tokio::io::stdin()), dispatcher).await?;
        }
    }

    Ok(())
}
