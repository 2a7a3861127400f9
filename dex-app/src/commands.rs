//! Command-line parsing for the `dex` binary.

use alloy_primitives::U256;
use anyhow::{anyhow, bail, Context, Result};
use dex_core::Theme;
use dex_engine::prediction::BET_DURATIONS;
use std::path::PathBuf;

pub const USAGE: &str = "\
usage: dex [--config <path>] <command>

  status                                  session, network and preferences
  connect                                 request wallet access
  disconnect                              forget the local session
  balances                                native and token balances
  pairs                                   all AMM pairs with reserves
  positions                               your liquidity positions
  bets                                    your active and settled bets
  stats                                   protocol totals and fee pool
  price <token>                           prediction market oracle price
  quote <in> <out> <amount> [slip_bps]    preview a swap
  swap <in> <out> <amount> [slip_bps]     approve and swap
  deposit-quote <a> <b> <amount_a>        matching deposit for a pair
  add-liquidity <a> <b> <amount_a> [amount_b]
  remove-liquidity <a> <b> <percent>
  bet <token> <amount> <up|down> <duration>
  resolve-bet <id> | cancel-bet <id>
  prices | news                           market ticker and headlines
  theme [dark|light|neon]                 show or persist the theme
  watch                                   follow wallet events
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Connect,
    Disconnect,
    Balances,
    Pairs,
    Positions,
    Bets,
    Stats,
    Price {
        token: String,
    },
    Quote {
        token_in: String,
        token_out: String,
        amount: String,
        slippage_bps: Option<u32>,
    },
    Swap {
        token_in: String,
        token_out: String,
        amount: String,
        slippage_bps: Option<u32>,
    },
    DepositQuote {
        token_a: String,
        token_b: String,
        amount_a: String,
    },
    AddLiquidity {
        token_a: String,
        token_b: String,
        amount_a: String,
        amount_b: Option<String>,
    },
    RemoveLiquidity {
        token_a: String,
        token_b: String,
        percent: u8,
    },
    Bet {
        token: String,
        amount: String,
        predict_up: bool,
        duration_secs: u64,
    },
    ResolveBet {
        id: U256,
    },
    CancelBet {
        id: U256,
    },
    Prices,
    News,
    Theme {
        set: Option<Theme>,
    },
    Watch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config: PathBuf,
    pub command: Command,
}

fn arg(args: &[String], idx: usize, name: &str) -> Result<String> {
    args.get(idx)
        .cloned()
        .ok_or_else(|| anyhow!("missing <{}>", name))
}

fn opt_bps(args: &[String], idx: usize) -> Result<Option<u32>> {
    args.get(idx)
        .map(|s| s.parse::<u32>().context("slippage must be whole bps"))
        .transpose()
}

/// Accepts a preset label such as `"15 min"`/`"15min"`, or seconds.
pub fn parse_duration(s: &str) -> Result<u64> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    for (label, secs) in BET_DURATIONS {
        let preset: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        if preset.eq_ignore_ascii_case(&compact) {
            return Ok(secs);
        }
    }
    compact
        .parse::<u64>()
        .with_context(|| format!("unknown duration '{}'", s))
}

fn parse_direction(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "up" | "higher" => Ok(true),
        "down" | "lower" => Ok(false),
        other => bail!("direction must be up or down, got '{}'", other),
    }
}

fn parse_id(s: &str) -> Result<U256> {
    s.parse::<U256>()
        .with_context(|| format!("invalid bet id '{}'", s))
}

/// `args` excludes the program name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut config = PathBuf::from("config.json");
    let mut rest: Vec<String> = Vec::new();
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == "--config" || a == "-c" {
            let path = it.next().ok_or_else(|| anyhow!("--config needs a path"))?;
            config = PathBuf::from(path);
        } else {
            rest.push(a.clone());
        }
    }
    let name = rest.first().map(String::as_str).unwrap_or("status");
    let command = match name {
        "status" => Command::Status,
        "connect" => Command::Connect,
        "disconnect" => Command::Disconnect,
        "balances" => Command::Balances,
        "pairs" => Command::Pairs,
        "positions" => Command::Positions,
        "bets" => Command::Bets,
        "stats" => Command::Stats,
        "prices" => Command::Prices,
        "news" => Command::News,
        "watch" => Command::Watch,
        "price" => Command::Price {
            token: arg(&rest, 1, "token")?,
        },
        "quote" | "swap" => {
            let token_in = arg(&rest, 1, "in")?;
            let token_out = arg(&rest, 2, "out")?;
            let amount = arg(&rest, 3, "amount")?;
            let slippage_bps = opt_bps(&rest, 4)?;
            if name == "quote" {
                Command::Quote {
                    token_in,
                    token_out,
                    amount,
                    slippage_bps,
                }
            } else {
                Command::Swap {
                    token_in,
                    token_out,
                    amount,
                    slippage_bps,
                }
            }
        }
        "deposit-quote" => Command::DepositQuote {
            token_a: arg(&rest, 1, "a")?,
            token_b: arg(&rest, 2, "b")?,
            amount_a: arg(&rest, 3, "amount_a")?,
        },
        "add-liquidity" => Command::AddLiquidity {
            token_a: arg(&rest, 1, "a")?,
            token_b: arg(&rest, 2, "b")?,
            amount_a: arg(&rest, 3, "amount_a")?,
            amount_b: rest.get(4).cloned(),
        },
        "remove-liquidity" => Command::RemoveLiquidity {
            token_a: arg(&rest, 1, "a")?,
            token_b: arg(&rest, 2, "b")?,
            percent: arg(&rest, 3, "percent")?
                .trim_end_matches('%')
                .parse::<u8>()
                .context("percent must be 0-100")?,
        },
        "bet" => Command::Bet {
            token: arg(&rest, 1, "token")?,
            amount: arg(&rest, 2, "amount")?,
            predict_up: parse_direction(&arg(&rest, 3, "up|down")?)?,
            duration_secs: {
                let d = rest[4..].join(" ");
                if d.is_empty() {
                    bail!("missing <duration>");
                }
                parse_duration(&d)?
            },
        },
        "resolve-bet" => Command::ResolveBet {
            id: parse_id(&arg(&rest, 1, "id")?)?,
        },
        "cancel-bet" => Command::CancelBet {
            id: parse_id(&arg(&rest, 1, "id")?)?,
        },
        "theme" => Command::Theme {
            set: rest
                .get(1)
                .map(|s| s.parse::<Theme>().map_err(|e| anyhow!(e)))
                .transpose()?,
        },
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    };
    Ok(Invocation { config, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(|a| a.to_string()).collect()
    }

    #[test]
    fn defaults_to_status() {
        let inv = parse_args(&[]).unwrap();
        assert_eq!(inv.command, Command::Status);
        assert_eq!(inv.config, PathBuf::from("config.json"));
    }

    #[test]
    fn config_flag_anywhere() {
        let inv = parse_args(&args("pairs --config /etc/dex.json")).unwrap();
        assert_eq!(inv.command, Command::Pairs);
        assert_eq!(inv.config, PathBuf::from("/etc/dex.json"));
    }

    #[test]
    fn swap_with_slippage() {
        let inv = parse_args(&args("swap RISE USDC 1.5 100")).unwrap();
        assert_eq!(
            inv.command,
            Command::Swap {
                token_in: "RISE".into(),
                token_out: "USDC".into(),
                amount: "1.5".into(),
                slippage_bps: Some(100),
            }
        );
    }

    #[test]
    fn bet_durations() {
        let inv = parse_args(&args("bet RISE 10 up 15 min")).unwrap();
        assert!(matches!(
            inv.command,
            Command::Bet {
                predict_up: true,
                duration_secs: 900,
                ..
            }
        ));
        let inv = parse_args(&args("bet USDC 1 down 3600")).unwrap();
        assert!(matches!(
            inv.command,
            Command::Bet {
                predict_up: false,
                duration_secs: 3_600,
                ..
            }
        ));
        assert!(parse_args(&args("bet USDC 1 sideways 300")).is_err());
        assert!(parse_args(&args("bet USDC 1 up")).is_err());
    }

    #[test]
    fn remove_percent_accepts_suffix() {
        let inv = parse_args(&args("remove-liquidity RISE USDC 75%")).unwrap();
        assert!(matches!(inv.command, Command::RemoveLiquidity { percent: 75, .. }));
    }

    #[test]
    fn theme_argument() {
        assert_eq!(
            parse_args(&args("theme neon")).unwrap().command,
            Command::Theme {
                set: Some(Theme::Neon)
            }
        );
        assert!(parse_args(&args("theme sepia")).is_err());
    }

    #[test]
    fn unknown_command() {
        assert!(parse_args(&args("launch")).is_err());
    }
}
