use std::{env, sync::Arc, time::Duration};

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use dex_app::{
    commands::{parse_args, Command, USAGE},
    config::load_config,
    output,
};
use dex_core::*;
use dex_engine::{
    feeds::{format_age, NewsFeed, PriceFeed},
    prediction::{now_secs, PRICE_DECIMALS},
    rpc::JsonRpcClient,
    stats, EngineConfig, Metrics, PollingWatcher, PreferenceStore, SessionRunner,
};
use prometheus::Registry;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Runner = SessionRunner<JsonRpcClient, JsonRpcClient, PollingWatcher<JsonRpcClient>>;

fn token(registry: &TokenRegistry, key: &str) -> Result<Token> {
    registry
        .lookup(key)
        .cloned()
        .ok_or_else(|| anyhow!("unknown token '{}'", key))
}

fn build_runner(cfg: &EngineConfig, registry: &Registry) -> Result<Arc<Runner>> {
    let metrics = Metrics::new(registry);
    let chain = Arc::new(JsonRpcClient::new(&cfg.network.rpc_url, cfg.rpc_timeout_ms, registry)?);
    let wallet = match &cfg.wallet.url {
        Some(url) => Some(Arc::new(
            JsonRpcClient::new(url, cfg.wallet.timeout_ms, registry)?
                .with_receipt_poll(Duration::from_millis(cfg.wallet.receipt_poll_ms)),
        )),
        None => None,
    };
    let poll = Duration::from_millis(cfg.wallet.poll_interval_ms);
    let events = Arc::new(match &wallet {
        Some(w) => PollingWatcher::new(w.clone(), poll),
        None => PollingWatcher::new(chain.clone(), poll),
    });
    Ok(Arc::new(SessionRunner::new(cfg, wallet, chain, events, metrics)))
}

/// The authorized account, prompting for access if there is none yet.
async fn ensure_account(runner: &Runner) -> Result<Address> {
    let session = match runner.wallet().restore().await? {
        Some(s) => s,
        None => runner.wallet().connect().await?,
    };
    session.address.ok_or_else(|| anyhow!("wallet returned no account"))
}

async fn restored_account(runner: &Runner) -> Result<Option<Address>> {
    Ok(runner.wallet().restore().await?.and_then(|s| s.address))
}

fn print_receipt(cfg: &EngineConfig, what: &str, receipt: &TxReceipt) {
    println!(
        "{} confirmed in block {}: {}",
        what,
        receipt
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| output::PLACEHOLDER.to_string()),
        cfg.network.tx_url(&receipt.transaction_hash.to_string())
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let inv = match parse_args(&args) {
        Ok(inv) => inv,
        Err(err) => {
            eprintln!("{}\n\n{}", err, USAGE);
            std::process::exit(2);
        }
    };
    let cfg = load_config(&inv.config).await?;
    let registry = Registry::new();
    let runner = build_runner(&cfg, &registry)?;
    let prefs = Arc::new(PreferenceStore::open(&cfg.storage_dir).await?);
    let tokens = runner.registry().clone();

    match inv.command {
        Command::Status => {
            runner.wallet().restore().await?;
            println!(
                "network: {} ({}) via {}",
                cfg.network.name, cfg.network.chain_id, cfg.network.rpc_url
            );
            let p = prefs.get();
            println!("theme: {:?}  tab: {:?}", p.theme, p.active_tab);
            for line in output::session_lines(&runner.wallet().session(), &cfg.network, &tokens) {
                println!("{}", line);
            }
        }
        Command::Connect => {
            runner.wallet().connect().await?;
            for line in output::session_lines(&runner.wallet().session(), &cfg.network, &tokens) {
                println!("{}", line);
            }
        }
        Command::Disconnect => {
            runner.wallet().disconnect();
            println!("session cleared; revoke site access in the wallet to fully disconnect");
        }
        Command::Balances => {
            if restored_account(&runner).await?.is_none() {
                println!("wallet: not connected (run `dex connect`)");
                return Ok(());
            }
            let report = runner.wallet().refresh_balances().await;
            for line in output::session_lines(&runner.wallet().session(), &cfg.network, &tokens) {
                println!("{}", line);
            }
            if !report.failed.is_empty() {
                println!("stale: {}", report.failed.join(", "));
            }
        }
        Command::Pairs => {
            let pairs = runner.liquidity().list_pairs().await?;
            if pairs.is_empty() {
                println!("no pairs");
            }
            for pair in &pairs {
                println!("{}", output::pair_line(pair));
            }
        }
        Command::Positions => {
            let Some(user) = restored_account(&runner).await? else {
                println!("wallet: not connected (run `dex connect`)");
                return Ok(());
            };
            let pairs = runner.liquidity().list_pairs().await?;
            let positions = runner.liquidity().list_user_positions(user, &pairs).await;
            if positions.is_empty() {
                println!("no liquidity positions");
            }
            for pos in &positions {
                println!("{}", output::position_line(pos, &pairs));
            }
        }
        Command::Bets => {
            let Some(user) = restored_account(&runner).await? else {
                println!("wallet: not connected (run `dex connect`)");
                return Ok(());
            };
            let book = runner.prediction().list_user_bets(user).await?;
            let now = now_secs();
            println!("active ({})", book.active.len());
            for bet in &book.active {
                println!("  {}", output::bet_line(bet, now));
            }
            println!("history ({})", book.settled.len());
            for bet in &book.settled {
                println!("  {}", output::bet_line(bet, now));
            }
        }
        Command::Stats => {
            let (protocol, pools) = tokio::join!(
                stats::protocol_stats(runner.contracts()),
                stats::pool_balances(runner.contracts(), &tokens),
            );
            for line in output::stats_lines(&protocol, pools.as_deref().ok()) {
                println!("{}", line);
            }
        }
        Command::Price { token: key } => {
            let t = token(&tokens, &key)?;
            let price = runner.prediction().current_price(&t).await?;
            println!("{} {} USD", t.symbol, output::amount(price, PRICE_DECIMALS));
        }
        Command::Quote {
            token_in,
            token_out,
            amount,
            slippage_bps,
        } => {
            let t_in = token(&tokens, &token_in)?;
            let t_out = token(&tokens, &token_out)?;
            let amount_in = parse_units(&amount, t_in.decimals)?;
            let slippage = slippage_bps.unwrap_or(cfg.slippage_bps);
            let p = runner
                .liquidity()
                .preview_swap(&t_in, &t_out, amount_in, slippage)
                .await?;
            println!(
                "{} {} -> {} {}",
                amount,
                t_in.symbol,
                output::amount(p.quote.amount_out, t_out.decimals),
                t_out.symbol
            );
            println!(
                "fee {} {}  min received {} {} ({} bps slippage)  impact {}.{:02}%",
                output::amount(p.quote.fee, t_in.decimals),
                t_in.symbol,
                output::amount(p.min_amount_out, t_out.decimals),
                t_out.symbol,
                slippage,
                p.price_impact_bps / 100,
                p.price_impact_bps % 100
            );
            if let Ok((onchain, _)) = runner.liquidity().onchain_amount_out(&t_in, &t_out, amount_in).await {
                if onchain != p.quote.amount_out {
                    println!(
                        "contract quotes {} {}",
                        output::amount(onchain, t_out.decimals),
                        t_out.symbol
                    );
                }
            }
        }
        Command::Swap {
            token_in,
            token_out,
            amount,
            slippage_bps,
        } => {
            let t_in = token(&tokens, &token_in)?;
            let t_out = token(&tokens, &token_out)?;
            let amount_in = parse_units(&amount, t_in.decimals)?;
            ensure_account(&runner).await?;
            let p = runner
                .liquidity()
                .preview_swap(&t_in, &t_out, amount_in, slippage_bps.unwrap_or(cfg.slippage_bps))
                .await?;
            println!(
                "swapping {} {} for ~{} {} (min {})",
                amount,
                t_in.symbol,
                output::amount(p.quote.amount_out, t_out.decimals),
                t_out.symbol,
                output::amount(p.min_amount_out, t_out.decimals)
            );
            let receipt = runner.wallet().swap(t_in.address, t_out.address, amount_in).await?;
            print_receipt(&cfg, "swap", &receipt);
        }
        Command::DepositQuote {
            token_a,
            token_b,
            amount_a,
        } => {
            let a = token(&tokens, &token_a)?;
            let b = token(&tokens, &token_b)?;
            let amount = parse_units(&amount_a, a.decimals)?;
            match runner.liquidity().reserves(&a, &b).await {
                Some(reserves) => {
                    let matched = runner.liquidity().matching_deposit(reserves, amount)?;
                    println!(
                        "{} {} pairs with {} {}",
                        amount_a,
                        a.symbol,
                        output::amount(matched, b.decimals),
                        b.symbol
                    );
                }
                None => println!("no pair yet; the first deposit sets the price"),
            }
        }
        Command::AddLiquidity {
            token_a,
            token_b,
            amount_a,
            amount_b,
        } => {
            let a = token(&tokens, &token_a)?;
            let b = token(&tokens, &token_b)?;
            let amt_a = parse_units(&amount_a, a.decimals)?;
            let amt_b = match amount_b {
                Some(s) => parse_units(&s, b.decimals)?,
                None => {
                    let reserves = runner
                        .liquidity()
                        .reserves(&a, &b)
                        .await
                        .ok_or(DexError::Quote(QuoteError::NoPriceRatio))?;
                    runner.liquidity().matching_deposit(reserves, amt_a)?
                }
            };
            ensure_account(&runner).await?;
            println!(
                "depositing {} {} + {} {}",
                output::amount(amt_a, a.decimals),
                a.symbol,
                output::amount(amt_b, b.decimals),
                b.symbol
            );
            let receipt = runner
                .wallet()
                .add_liquidity(a.address, b.address, amt_a, amt_b)
                .await?;
            print_receipt(&cfg, "add liquidity", &receipt);
        }
        Command::RemoveLiquidity {
            token_a,
            token_b,
            percent,
        } => {
            let a = token(&tokens, &token_a)?;
            let b = token(&tokens, &token_b)?;
            let user = ensure_account(&runner).await?;
            let pair_id = runner.liquidity().pair_id(&a, &b).await?;
            let pairs = runner.liquidity().list_pairs().await?;
            let pair = pairs
                .iter()
                .find(|p| p.id == pair_id)
                .ok_or_else(|| anyhow!("pair {}/{} not found", a.symbol, b.symbol))?;
            let position = runner
                .liquidity()
                .list_user_positions(user, std::slice::from_ref(pair))
                .await
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("no position in {}", pair.label()))?;
            let Some(q) = runner.liquidity().preview_removal(pair, &position, percent)? else {
                println!("nothing to remove");
                return Ok(());
            };
            println!(
                "removing {} liquidity for ~{} {} + {} {}",
                q.liquidity,
                output::amount(q.amount_a, pair.token_a.decimals),
                pair.token_a.symbol,
                output::amount(q.amount_b, pair.token_b.decimals),
                pair.token_b.symbol
            );
            let receipt = runner
                .wallet()
                .remove_liquidity(pair.token_a.address, pair.token_b.address, q.liquidity)
                .await?;
            print_receipt(&cfg, "remove liquidity", &receipt);
        }
        Command::Bet {
            token: key,
            amount,
            predict_up,
            duration_secs,
        } => {
            let t = token(&tokens, &key)?;
            let amt = parse_units(&amount, t.decimals)?;
            ensure_account(&runner).await?;
            let receipt = runner
                .wallet()
                .place_bet(t.address, amt, predict_up, duration_secs)
                .await?;
            print_receipt(&cfg, "bet", &receipt);
        }
        Command::ResolveBet { id } => {
            ensure_account(&runner).await?;
            let receipt = runner.wallet().resolve_bet(id).await?;
            print_receipt(&cfg, &format!("resolve #{}", id), &receipt);
        }
        Command::CancelBet { id } => {
            ensure_account(&runner).await?;
            let receipt = runner.wallet().cancel_bet(id).await?;
            print_receipt(&cfg, &format!("cancel #{}", id), &receipt);
        }
        Command::Prices => {
            let feed = PriceFeed::new(&cfg.feeds, cfg.rpc_timeout_ms)?;
            feed.refresh().await;
            for p in feed.latest() {
                println!(
                    "{:<6} {:>14.4}  {}",
                    p.symbol.to_uppercase(),
                    p.current_price,
                    p.price_change_percentage_24h
                        .map(|c| format!("{:+.2}%", c))
                        .unwrap_or_else(|| output::PLACEHOLDER.to_string())
                );
            }
        }
        Command::News => {
            let feed = NewsFeed::new();
            feed.refresh().await;
            let now = now_secs() as i64;
            for item in feed.latest() {
                println!("{} ({}, {})", item.title, item.source, format_age(item.published_at, now));
            }
        }
        Command::Theme { set } => match set {
            Some(theme) => {
                prefs.set_theme(theme).await?;
                println!("theme set to {:?} ({})", theme, prefs.path().display());
            }
            None => println!("theme: {:?}", prefs.get().theme),
        },
        Command::Watch => {
            runner.wallet().restore().await?;
            let prices = Arc::new(PriceFeed::new(&cfg.feeds, cfg.rpc_timeout_ms)?);
            let news = Arc::new(NewsFeed::new());
            let _price_task = prices.start(Duration::from_millis(cfg.feeds.price_interval_ms));
            let _news_task = news.start(Duration::from_millis(cfg.feeds.news_interval_ms));
            let (tx, rx) = watch::channel(false);
            let task = tokio::spawn(runner.clone().run(rx));
            info!("watching wallet events; ctrl-c to stop");
            let mut ticker = tokio::time::interval(Duration::from_millis(cfg.feeds.price_interval_ms));
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            loop {
                tokio::select! {
                    res = &mut ctrl_c => {
                        res.context("wait for ctrl-c")?;
                        break;
                    }
                    _ = ticker.tick() => {
                        println!("{}", output::ticker_line(&prices.latest()));
                        if let Some(item) = news.latest().first() {
                            println!("news: {} ({})", item.title, format_age(item.published_at, now_secs() as i64));
                        }
                    }
                }
            }
            tx.send(true).ok();
            task.await.context("join runner")??;
            println!("{}", output::view_summary(&runner.view().snapshot()));
        }
    }
    Ok(())
}
