//! # Commands
//!
//! Argument parsing and dispatch. Each command maps onto one engine call.
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────────────────┐
//! │ Command                                      │ Engine call              │
//! ├──────────────────────────────────────────────┼──────────────────────────┤
//! │ create --customer ID --item PID:QTY...       │ TransactionService::     │
//! │        [--status S] [--notes TEXT]           │   create                 │
//! │ status ID STATUS                             │   update_status          │
//! │ fulfill ID                                   │   fulfill                │
//! │ show ID                                      │   get                    │
//! │ view ID                                      │   view                   │
//! │ list [--status S] [--limit N] [--offset N]   │   list                   │
//! │ pay TX --method M --amount A [...]           │ PaymentService::post     │
//! │ payments TX                                  │   list                   │
//! │ migrate                                      │ Database::run_migrations │
//! └──────────────────────────────────────────────┴──────────────────────────┘
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use gading_core::{
    CreateItemInput, CreateTransactionInput, ListTransactionsInput, PostPaymentInput,
};
use gading_db::migrations::migration_status;
use gading_db::Database;
use gading_ledger::{parse_status, PaymentService, TransactionService};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{CliError, CliResult};

pub const USAGE: &str = "\
Usage: gading [--config <path>] <command> [args]

Commands:
  create --customer <id> --item <product>:<qty>... [--status draft|pending|completed] [--notes <text>]
  status <id> <status>
  fulfill <id>
  show <id>
  view <id>
  list [--status <status>] [--limit <n>] [--offset <n>]
  pay <tx> --method cash|transfer --amount <decimal> [--paid-at <rfc3339>]
      [--sender <name>] [--reference <ref>] [--note <text>]
  payments <tx>
  migrate

Environment:
  DATABASE_URL, GADING_MAX_CONNECTIONS, GADING_STATEMENT_TIMEOUT_SECS,
  GADING_LOG_LEVEL, RUST_LOG";

// =============================================================================
// Parsed Command Line
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub command: Command,
}

/// Status text stays raw until dispatch so unknown values surface as
/// `InvalidStatus` from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        customer_id: String,
        items: Vec<CreateItemInput>,
        status: Option<String>,
        notes: Option<String>,
    },
    Status {
        id: String,
        status: String,
    },
    Fulfill {
        id: String,
    },
    Show {
        id: String,
    },
    View {
        id: String,
    },
    List {
        status: Option<String>,
        limit: i64,
        offset: i64,
    },
    Pay(PostPaymentInput),
    Payments {
        transaction_id: String,
    },
    Migrate,
    Help,
}

/// Walks the arguments after the command name.
struct Args<'a> {
    rest: std::slice::Iter<'a, String>,
}

impl<'a> Args<'a> {
    fn next(&mut self) -> Option<&'a str> {
        self.rest.next().map(String::as_str)
    }

    fn value(&mut self, flag: &str) -> CliResult<String> {
        self.next()
            .map(str::to_string)
            .ok_or_else(|| CliError::usage(format!("{flag} needs a value")))
    }

    fn positional(&mut self, name: &str) -> CliResult<String> {
        match self.next() {
            Some(v) if !v.starts_with("--") => Ok(v.to_string()),
            _ => Err(CliError::usage(format!("missing <{name}>"))),
        }
    }

    fn finish(mut self) -> CliResult<()> {
        match self.next() {
            Some(extra) => Err(CliError::usage(format!("unexpected argument '{extra}'"))),
            None => Ok(()),
        }
    }
}

fn parse_number(flag: &str, value: &str) -> CliResult<i64> {
    value
        .parse()
        .map_err(|_| CliError::usage(format!("{flag} expects an integer, got '{value}'")))
}

fn parse_item(value: &str) -> CliResult<CreateItemInput> {
    let (product_id, qty) = value
        .rsplit_once(':')
        .ok_or_else(|| CliError::usage(format!("--item expects <product>:<qty>, got '{value}'")))?;
    Ok(CreateItemInput {
        product_id: product_id.to_string(),
        qty: parse_number("--item", qty)?,
    })
}

fn parse_paid_at(value: &str) -> CliResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CliError::usage(format!("--paid-at expects RFC 3339: {e}")))
}

/// Parses `argv` without the program name.
pub fn parse_args(argv: &[String]) -> CliResult<Cli> {
    let mut config = None;
    let mut iter = argv.iter();

    let name = loop {
        match iter.next().map(String::as_str) {
            Some("--config" | "-c") => {
                let path = iter
                    .next()
                    .ok_or_else(|| CliError::usage("--config needs a value"))?;
                config = Some(PathBuf::from(path));
            }
            Some("--help" | "-h" | "help") | None => {
                return Ok(Cli {
                    config,
                    command: Command::Help,
                })
            }
            Some(name) => break name,
        }
    };

    let mut args = Args { rest: iter };
    let command = match name {
        "create" => {
            let mut customer_id = None;
            let mut items = Vec::new();
            let mut status = None;
            let mut notes = None;
            while let Some(flag) = args.next() {
                match flag {
                    "--customer" => customer_id = Some(args.value(flag)?),
                    "--item" => items.push(parse_item(&args.value(flag)?)?),
                    "--status" => status = Some(args.value(flag)?),
                    "--notes" => notes = Some(args.value(flag)?),
                    other => return Err(CliError::usage(format!("unknown option '{other}'"))),
                }
            }
            Command::Create {
                customer_id: customer_id.ok_or_else(|| CliError::usage("--customer is required"))?,
                items,
                status,
                notes,
            }
        }
        "status" => {
            let id = args.positional("id")?;
            let status = args.positional("status")?;
            args.finish()?;
            Command::Status { id, status }
        }
        "fulfill" | "show" | "view" => {
            let id = args.positional("id")?;
            args.finish()?;
            match name {
                "fulfill" => Command::Fulfill { id },
                "show" => Command::Show { id },
                _ => Command::View { id },
            }
        }
        "list" => {
            let mut status = None;
            let mut limit = 0;
            let mut offset = 0;
            while let Some(flag) = args.next() {
                match flag {
                    "--status" => status = Some(args.value(flag)?),
                    "--limit" => limit = parse_number(flag, &args.value(flag)?)?,
                    "--offset" => offset = parse_number(flag, &args.value(flag)?)?,
                    other => return Err(CliError::usage(format!("unknown option '{other}'"))),
                }
            }
            Command::List {
                status,
                limit,
                offset,
            }
        }
        "pay" => {
            let mut input = PostPaymentInput {
                transaction_id: args.positional("tx")?,
                ..Default::default()
            };
            while let Some(flag) = args.next() {
                match flag {
                    "--method" => input.method = args.value(flag)?,
                    "--amount" => input.amount = args.value(flag)?,
                    "--paid-at" => input.paid_at = Some(parse_paid_at(&args.value(flag)?)?),
                    "--sender" => input.sender_name = Some(args.value(flag)?),
                    "--reference" => input.reference = Some(args.value(flag)?),
                    "--note" => input.note = Some(args.value(flag)?),
                    other => return Err(CliError::usage(format!("unknown option '{other}'"))),
                }
            }
            Command::Pay(input)
        }
        "payments" => {
            let transaction_id = args.positional("tx")?;
            args.finish()?;
            Command::Payments { transaction_id }
        }
        "migrate" => {
            args.finish()?;
            Command::Migrate
        }
        other => return Err(CliError::usage(format!("unknown command '{other}'"))),
    };

    Ok(Cli { config, command })
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs one command against the database and returns its JSON result.
pub async fn run(db: &Database, command: Command) -> CliResult<Value> {
    let transactions = TransactionService::new(db.store());
    let payments = PaymentService::new(db.store());

    let value = match command {
        Command::Create {
            customer_id,
            items,
            status,
            notes,
        } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let detail = transactions
                .create(CreateTransactionInput {
                    customer_id,
                    notes,
                    items,
                    status,
                })
                .await?;
            serde_json::to_value(detail)?
        }
        Command::Status { id, status } => {
            let status = parse_status(&status)?;
            serde_json::to_value(transactions.update_status(&id, status).await?)?
        }
        Command::Fulfill { id } => serde_json::to_value(transactions.fulfill(&id).await?)?,
        Command::Show { id } => serde_json::to_value(transactions.get(&id).await?)?,
        Command::View { id } => serde_json::to_value(transactions.view(&id).await?)?,
        Command::List {
            status,
            limit,
            offset,
        } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let list = transactions
                .list(ListTransactionsInput {
                    status,
                    limit,
                    offset,
                })
                .await?;
            serde_json::to_value(list)?
        }
        Command::Pay(input) => {
            let (payment, state) = payments.post(input).await?;
            json!({ "payment": payment, "transaction": state })
        }
        Command::Payments { transaction_id } => {
            serde_json::to_value(payments.list(&transaction_id).await?)?
        }
        Command::Migrate => {
            db.run_migrations().await?;
            let (total, applied) = migration_status(db.pool()).await?;
            info!(total, applied, "Migrations up to date");
            json!({ "migrations": { "total": total, "applied": applied } })
        }
        Command::Help => json!({ "usage": USAGE }),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_create_with_items() {
        let cli = parse_args(&argv(
            "--config /tmp/g.toml create --customer c-1 --item p-1:2 --item p-2:3 --status pending",
        ))
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/g.toml")));
        assert_eq!(
            cli.command,
            Command::Create {
                customer_id: "c-1".into(),
                items: vec![
                    CreateItemInput { product_id: "p-1".into(), qty: 2 },
                    CreateItemInput { product_id: "p-2".into(), qty: 3 },
                ],
                status: Some("pending".into()),
                notes: None,
            }
        );
    }

    #[test]
    fn test_create_requires_customer() {
        let err = parse_args(&argv("create --item p-1:2")).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_bad_item_is_usage_error() {
        assert!(parse_args(&argv("create --customer c --item p-1")).is_err());
        assert!(parse_args(&argv("create --customer c --item p-1:two")).is_err());
    }

    #[test]
    fn test_status_keeps_raw_text() {
        let cli = parse_args(&argv("status t-1 shipped")).unwrap();
        assert_eq!(
            cli.command,
            Command::Status { id: "t-1".into(), status: "shipped".into() }
        );
    }

    #[test]
    fn test_single_id_commands() {
        assert_eq!(
            parse_args(&argv("fulfill t-1")).unwrap().command,
            Command::Fulfill { id: "t-1".into() }
        );
        assert_eq!(
            parse_args(&argv("view t-1")).unwrap().command,
            Command::View { id: "t-1".into() }
        );
        assert!(parse_args(&argv("show")).is_err());
        assert!(parse_args(&argv("show t-1 extra")).is_err());
    }

    #[test]
    fn test_list_paging() {
        let cli = parse_args(&argv("list --status draft --limit 5 --offset 10")).unwrap();
        assert_eq!(
            cli.command,
            Command::List { status: Some("draft".into()), limit: 5, offset: 10 }
        );
        assert!(parse_args(&argv("list --limit many")).is_err());
    }

    #[test]
    fn test_pay_options() {
        let cli = parse_args(&argv(
            "pay t-1 --method transfer --amount 2500.50 --paid-at 2026-03-01T10:00:00+07:00 --reference TRX-9",
        ))
        .unwrap();

        let Command::Pay(input) = cli.command else {
            panic!("expected pay");
        };
        assert_eq!(input.transaction_id, "t-1");
        assert_eq!(input.method, "transfer");
        assert_eq!(input.amount, "2500.50");
        assert_eq!(input.reference.as_deref(), Some("TRX-9"));
        assert_eq!(input.paid_at.unwrap().to_rfc3339(), "2026-03-01T03:00:00+00:00");
        assert_eq!(input.currency, None);
    }

    #[test]
    fn test_help_and_unknown() {
        assert_eq!(parse_args(&[]).unwrap().command, Command::Help);
        assert_eq!(parse_args(&argv("--help")).unwrap().command, Command::Help);
        assert!(matches!(parse_args(&argv("refund t-1")), Err(CliError::Usage(_))));
    }
}
