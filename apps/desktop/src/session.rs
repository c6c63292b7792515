//! Interactive session: text commands and assistant signals on stdin.

use std::sync::Arc;

use anyhow::{Context, Result};
use client_core::{spawn_assistant_bridge, ControllerEvent, IntentDispatcher};
use shared::{
    domain::{Amount, ExpenseId, DEFAULT_CATEGORY},
    protocol::AssistantSignal,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{broadcast, mpsc},
};
use tracing::warn;

use crate::render::render_view;

const SIGNAL_QUEUE: usize = 16;

pub const HELP: &str = "\
commands:
  list                           show expenses
  add <amount> <category> <title> add an expense (category '-' means Другое)
  amount <id> <value>            change an expense amount
  delete [id]                    delete by id, or the selected expense
  select <id>                    select an expense
  category <name>                add a category
  dismiss                        hide the error banner
  state                          print the assistant state snapshot
  quit                           leave the session
lines starting with '{' are assistant signals, e.g.
  {\"event\":\"data\",\"payload\":{\"type\":\"smart_app_data\",\"action\":{\"type\":\"add_note\",\"note\":\"Taxi\",\"summ\":20}}}";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    List,
    Add {
        amount: Option<Amount>,
        category: String,
        title: String,
    },
    UpdateAmount {
        id: Option<ExpenseId>,
        value: Option<Amount>,
    },
    Delete {
        id: Option<ExpenseId>,
    },
    Select {
        id: ExpenseId,
    },
    Category(String),
    Dismiss,
    State,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Signal(AssistantSignal),
    Command(SessionCommand),
}

pub fn parse_line(line: &str) -> Result<Option<SessionInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map(|signal| Some(SessionInput::Signal(signal)))
            .map_err(|err| format!("invalid assistant signal: {err}"));
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let command = match verb {
        "list" | "ls" => SessionCommand::List,
        "add" => {
            let amount = words.next().and_then(Amount::parse);
            let category = match words.next() {
                Some("-") | None => DEFAULT_CATEGORY.to_string(),
                Some(category) => category.to_string(),
            };
            let title = words.collect::<Vec<_>>().join(" ");
            SessionCommand::Add {
                amount,
                category,
                title,
            }
        }
        "amount" => SessionCommand::UpdateAmount {
            id: words.next().map(ExpenseId::from),
            value: words.next().and_then(Amount::parse),
        },
        "delete" | "rm" => SessionCommand::Delete {
            id: words.next().map(ExpenseId::from),
        },
        "select" => match words.next() {
            Some(id) => SessionCommand::Select {
                id: ExpenseId::from(id),
            },
            None => return Err("usage: select <id>".to_string()),
        },
        "category" => {
            let name = words.collect::<Vec<_>>().join(" ");
            SessionCommand::Category(name)
        }
        "dismiss" | "×" => SessionCommand::Dismiss,
        "state" => SessionCommand::State,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(SessionInput::Command(command)))
}

/// Runs one command; `None` ends the session.
pub async fn execute(
    command: SessionCommand,
    dispatcher: &IntentDispatcher,
) -> Result<Option<String>> {
    let controller = dispatcher.controller();
    let reply = match command {
        SessionCommand::List => render_view(&controller.view().await),
        SessionCommand::Add {
            amount,
            category,
            title,
        } => match controller.add_expense(&title, amount, &category).await {
            Ok(record) => format!("added #{}", record.id),
            Err(_) => render_view(&controller.view().await),
        },
        SessionCommand::UpdateAmount { id, value } => {
            let _ = controller.update_amount(id, value).await;
            render_view(&controller.view().await)
        }
        SessionCommand::Delete { id } => {
            let target = match id {
                Some(id) => Some(id),
                None => controller.selected().await,
            };
            let _ = controller.delete_expense(target).await;
            render_view(&controller.view().await)
        }
        SessionCommand::Select { id } => {
            controller.select_expense(Some(id)).await;
            render_view(&controller.view().await)
        }
        SessionCommand::Category(name) => {
            if controller.add_category(&name).await {
                format!("category '{name}' added")
            } else {
                format!("category '{name}' rejected")
            }
        }
        SessionCommand::Dismiss => {
            controller.dismiss_error().await;
            render_view(&controller.view().await)
        }
        SessionCommand::State => {
            serde_json::to_string_pretty(&dispatcher.assistant_state().await)?
        }
        SessionCommand::Help => HELP.to_string(),
        SessionCommand::Quit => return Ok(None),
    };
    Ok(Some(reply))
}

/// Alerts collected since the last call, in arrival order.
pub fn drain_alerts(events: &mut broadcast::Receiver<ControllerEvent>) -> Vec<String> {
    let mut alerts = Vec::new();
    loop {
        match events.try_recv() {
            Ok(ControllerEvent::Alert(text)) => alerts.push(text),
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "controller events lagged");
            }
            Err(_) => break,
        }
    }
    alerts
}

/// Reads stdin lines until EOF or `quit`. Assistant signals go through the
/// assistant bridge; commands run inline.
pub async fn run<R>(input: R, dispatcher: IntentDispatcher) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let dispatcher = Arc::new(dispatcher);
    let controller = Arc::clone(dispatcher.controller());
    let mut events = controller.subscribe_events();
    let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_QUEUE);
    let (outcome_tx, mut outcomes) = mpsc::channel(SIGNAL_QUEUE);
    let bridge = spawn_assistant_bridge(Arc::clone(&dispatcher), signal_rx, outcome_tx);
    let mut lines = input.lines();
    println!("{}", render_view(&controller.view().await));

    while let Some(line) = lines.next_line().await? {
        let reply = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(SessionInput::Signal(signal))) => {
                signal_tx
                    .send(signal)
                    .await
                    .context("assistant bridge stopped")?;
                let outcome = outcomes
                    .recv()
                    .await
                    .context("assistant bridge stopped")?;
                Some(format!(
                    "{outcome:?}\n{}",
                    render_view(&controller.view().await)
                ))
            }
            Ok(Some(SessionInput::Command(command))) => execute(command, &dispatcher).await?,
            Err(message) => Some(message),
        };

        for alert in drain_alerts(&mut events) {
            eprintln!("ALERT: {alert}");
        }
        match reply {
            Some(text) => println!("{text}"),
            None => break,
        }
    }

    drop(signal_tx);
    if let Err(err) = bridge.await {
        warn!("assistant bridge task failed: {err}");
    }
    controller.unmount().await;
    Ok(())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
