//! Scripted ledger session
//!
//! The mock ledger lives in process memory, so ledger operations run as a
//! session: one command per line from stdin or a script file.
//!
//! ```text
//! deploy [name] [symbol] [initial_supply]
//! mint <address> <amount> <token> <deposit_amount>
//! burn <address> <amount> <token>
//! transfer <to> <amount> [from]
//! balance <address>
//! supply | stats | contract | price | reserves
//! transactions [limit]
//! quit
//! ```

use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::io::BufRead;
use unity_api::models::*;
use unity_api::{ApiError, ApiResult, UnityService};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Deploy {
        name: Option<String>,
        symbol: Option<String>,
        initial_supply: Option<Decimal>,
    },
    Mint {
        to: String,
        amount: Decimal,
        token: String,
        deposit: Decimal,
    },
    Burn {
        from: String,
        amount: Decimal,
        token: String,
    },
    Transfer {
        to: String,
        amount: Decimal,
        from: Option<String>,
    },
    Balance(String),
    Supply,
    Stats,
    Contract,
    Price,
    Reserves,
    Transactions(usize),
    Quit,
}

fn decimal(field: &str, value: &str) -> Result<Decimal, String> {
    value
        .parse::<Decimal>()
        .map_err(|_| format!("{} must be a number, got '{}'", field, value))
}

fn arg<'a>(args: &[&'a str], index: usize, field: &str) -> Result<&'a str, String> {
    args.get(index)
        .copied()
        .ok_or_else(|| format!("missing {}", field))
}

/// Parse one line; blank lines and `#` comments yield `None`
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let parsed = match command.as_str() {
        "deploy" => SessionCommand::Deploy {
            name: args.first().map(|s| s.to_string()),
            symbol: args.get(1).map(|s| s.to_string()),
            initial_supply: args
                .get(2)
                .map(|s| decimal("initial_supply", s))
                .transpose()?,
        },
        "mint" => SessionCommand::Mint {
            to: arg(&args, 0, "address")?.to_string(),
            amount: decimal("amount", arg(&args, 1, "amount")?)?,
            token: arg(&args, 2, "token")?.to_string(),
            deposit: decimal("deposit_amount", arg(&args, 3, "deposit_amount")?)?,
        },
        "burn" => SessionCommand::Burn {
            from: arg(&args, 0, "address")?.to_string(),
            amount: decimal("amount", arg(&args, 1, "amount")?)?,
            token: arg(&args, 2, "token")?.to_string(),
        },
        "transfer" => SessionCommand::Transfer {
            to: arg(&args, 0, "to")?.to_string(),
            amount: decimal("amount", arg(&args, 1, "amount")?)?,
            from: args.get(2).map(|s| s.to_string()),
        },
        "balance" => SessionCommand::Balance(arg(&args, 0, "address")?.to_string()),
        "supply" => SessionCommand::Supply,
        "stats" => SessionCommand::Stats,
        "contract" => SessionCommand::Contract,
        "price" => SessionCommand::Price,
        "reserves" => SessionCommand::Reserves,
        "transactions" => SessionCommand::Transactions(match args.first() {
            Some(n) => n
                .parse()
                .map_err(|_| format!("limit must be a whole number, got '{}'", n))?,
            None => 10,
        }),
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(parsed))
}

fn to_json<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn execute(service: &UnityService, command: SessionCommand) -> ApiResult<Value> {
    match command {
        SessionCommand::Deploy {
            name,
            symbol,
            initial_supply,
        } => to_json(
            &service
                .deploy(DeployRequest {
                    name,
                    symbol,
                    initial_supply,
                })
                .await?,
        ),
        SessionCommand::Mint {
            to,
            amount,
            token,
            deposit,
        } => to_json(
            &service
                .mint(MintRequest {
                    recipient_address: to,
                    amount,
                    deposit_token: token,
                    deposit_amount: deposit,
                })
                .await?,
        ),
        SessionCommand::Burn {
            from,
            amount,
            token,
        } => to_json(
            &service
                .burn(BurnRequest {
                    user_address: from,
                    amount,
                    token_to_release: token,
                })
                .await?,
        ),
        SessionCommand::Transfer { to, amount, from } => to_json(
            &service
                .transfer(TransferRequest {
                    from_address: from,
                    to_address: to,
                    amount,
                })
                .await?,
        ),
        SessionCommand::Balance(address) => to_json(&service.balance(&address).await?),
        SessionCommand::Supply => to_json(&service.total_supply().await?),
        SessionCommand::Stats => to_json(&service.supply_stats()),
        SessionCommand::Contract => to_json(&service.contract_info().await?),
        SessionCommand::Price => to_json(&service.get_price().await?),
        SessionCommand::Reserves => to_json(&service.get_reserves()),
        SessionCommand::Transactions(limit) => to_json(&service.transactions(limit)?),
        SessionCommand::Quit => Ok(Value::Null),
    }
}

/// Run commands until end of input or `quit`; returns the number of
/// commands that failed
pub async fn run<R: BufRead>(service: &UnityService, input: R) -> std::io::Result<usize> {
    let mut failures = 0;

    for (number, line) in input.lines().enumerate() {
        let line = line?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{} line {}: {}", "✗".red(), number + 1, e);
                failures += 1;
                continue;
            }
        };
        if command == SessionCommand::Quit {
            break;
        }

        match execute(service, command).await {
            Ok(value) => println!(
                "{} {}",
                "✓".green(),
                serde_json::to_string_pretty(&value).unwrap_or_default()
            ),
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), e.code().yellow(), e);
                failures += 1;
            }
        }
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use unity_api::ApiState;
    use unity_core::UnityConfig;
    use unity_storage::MemorySnapshotStore;

    fn service() -> UnityService {
        let mut config = UnityConfig::default();
        config.feed.offline = true;
        let store = Arc::new(MemorySnapshotStore::new());
        UnityService::new(ApiState::from_config(config, store).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("  # comment").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(
            parse_line("MINT 0xa 100 VET 5").unwrap(),
            Some(SessionCommand::Mint {
                to: "0xa".to_string(),
                amount: dec!(100),
                token: "VET".to_string(),
                deposit: dec!(5),
            })
        );
        assert_eq!(
            parse_line("transfer 0xb 2.5").unwrap(),
            Some(SessionCommand::Transfer {
                to: "0xb".to_string(),
                amount: dec!(2.5),
                from: None,
            })
        );
        assert_eq!(
            parse_line("transactions").unwrap(),
            Some(SessionCommand::Transactions(10))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("burn 0xa").unwrap_err().contains("amount"));
        assert!(parse_line("mint 0xa lots VET 1").is_err());
        assert!(parse_line("launch").unwrap_err().contains("unknown command"));
    }

    #[tokio::test]
    async fn test_session_script() {
        let service = service();
        let script = "\
deploy
mint 0xa 100 VET 5
burn 0xa 40 VTHO
burn 0xa 500 VTHO
balance 0xa
quit
mint 0xa 1 VET 1
";
        let failures = run(&service, script.as_bytes()).await.unwrap();

        // Only the oversized burn fails; nothing after quit runs
        assert_eq!(failures, 1);
        assert_eq!(service.balance("0xa").await.unwrap().balance, dec!(60));
        assert_eq!(service.transactions(10).unwrap().len(), 2);
    }
}
