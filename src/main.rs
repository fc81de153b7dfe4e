use std::sync::Arc;

use chrono::DateTime;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use coinwatch::CoinwatchError;
use coinwatch::coingecko::{CoinGeckoClient, DETAIL_CHART_DAYS};
use coinwatch::config::{AppConfig, fetch_config};
use coinwatch::feed::{QuoteFeed, QuoteSnapshot};
use coinwatch::store::{CoinList, Favorites, RecentSymbols, SortBy, SortOrder};
use coinwatch::tls::build_tls_config;

#[derive(Parser)]
#[command(name = "coinwatch", version, about = "Crypto market dashboard and live quote feed")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List coins by market cap.
    Markets {
        /// Filter by name or symbol.
        #[arg(short, long, default_value = "")]
        search: String,
        /// price, market_cap or price_change_24h.
        #[arg(long, default_value = "market_cap")]
        sort: SortBy,
        /// asc or desc.
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        /// Coin IDs to mark as favorites.
        #[arg(short, long = "favorite")]
        favorites: Vec<String>,
        /// Only show favorites.
        #[arg(long)]
        favorites_only: bool,
    },
    /// Show one coin with its 7-day price history.
    Coin {
        /// CoinGecko coin ID, e.g. `bitcoin`.
        id: String,
    },
    /// Stream live quotes. Type a symbol (or `#N` from `history`) to
    /// switch, `off` to stop, `refresh` to reconnect, `quit` to exit.
    Feed {
        /// Initial symbol, e.g. `AAPL` or `BINANCE:BTCUSDT`.
        symbol: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CoinwatchError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let app_config = fetch_config()?;

    match args.command {
        Command::Markets {
            search,
            sort,
            order,
            favorites,
            favorites_only,
        } => {
            let mut marked = Favorites::new();
            for id in &favorites {
                marked.add(id);
            }
            let mut list = CoinList::new();
            list.set_search_query(&search);
            list.set_sort_by(sort);
            list.set_sort_order(order);
            run_markets(&app_config, list, &marked, favorites_only).await
        }
        Command::Coin { id } => run_coin(&app_config, &id).await,
        Command::Feed { symbol } => run_feed(&app_config, symbol).await,
    }
}

async fn run_markets(
    config: &AppConfig,
    mut list: CoinList,
    favorites: &Favorites,
    favorites_only: bool,
) -> Result<(), CoinwatchError> {
    let tls_config = build_tls_config(config.ca_bundle.as_deref())?;
    let client = CoinGeckoClient::new(&config.coingecko, tls_config)?;

    list.begin_fetch();
    list.finish_fetch(client.fetch_markets().await);
    if let Some(error) = &list.error {
        eprintln!("Failed to load markets: {error}");
        return Ok(());
    }

    let currency = client.vs_currency().to_uppercase();
    println!(
        "{:>4}  {:<1} {:<24} {:<8} {:>16} {:>10} {:>20}",
        "#", "", "Name", "Symbol", format!("Price ({currency})"), "24h %", "Market cap"
    );
    for coin in list.visible() {
        let favorite = favorites.contains(&coin.id);
        if favorites_only && !favorite {
            continue;
        }
        println!(
            "{:>4}  {:<1} {:<24} {:<8} {:>16} {:>10} {:>20}",
            coin.market_cap_rank.map(|r| r.to_string()).unwrap_or_default(),
            if favorite { "*" } else { "" },
            coin.name,
            coin.symbol.to_uppercase(),
            display(coin.current_price),
            display(coin.price_change_percentage_24h.map(|c| c.round_dp(2))),
            display(coin.market_cap),
        );
    }

    Ok(())
}

async fn run_coin(config: &AppConfig, id: &str) -> Result<(), CoinwatchError> {
    let tls_config = build_tls_config(config.ca_bundle.as_deref())?;
    let client = CoinGeckoClient::new(&config.coingecko, tls_config)?;
    let currency = client.vs_currency().to_string();

    let detail = match client.fetch_coin_detail(id).await {
        Ok(detail) => detail,
        Err(e) => {
            eprintln!("Failed to load coin details: {e}");
            return Ok(());
        }
    };

    let market = &detail.market_data;
    println!("{} ({})", detail.name, detail.symbol.to_uppercase());
    println!("  Price:              {}", display(market.price_in(&currency)));
    println!(
        "  24h change:         {}%",
        display(market.price_change_percentage_24h.map(|c| c.round_dp(2)))
    );
    println!("  Market cap:         {}", display(market.market_cap_in(&currency)));
    println!("  Volume (24h):       {}", display(market.volume_in(&currency)));
    println!("  All-time high:      {}", display(market.ath_in(&currency)));
    println!("  All-time low:       {}", display(market.atl_in(&currency)));
    println!("  Circulating supply: {}", display(market.circulating_supply));
    if let Some(image) = &detail.image.large {
        println!("  Image:              {image}");
    }
    if let Some(description) = detail.description_in("en") {
        println!();
        println!("{description}");
    }

    println!();
    match client.fetch_market_chart(id, DETAIL_CHART_DAYS).await {
        Ok(chart) => {
            println!("Last {DETAIL_CHART_DAYS} days ({}):", currency.to_uppercase());
            let mut last_label = String::new();
            for point in chart.points() {
                // One line per day; the series is hourly.
                if point.label != last_label {
                    println!("  {:<8} {}", point.label, point.price);
                    last_label = point.label;
                }
            }
        }
        Err(e) => eprintln!("Failed to load price history: {e}"),
    }

    Ok(())
}

async fn run_feed(config: &AppConfig, symbol: Option<String>) -> Result<(), CoinwatchError> {
    if config.finnhub.token.is_none() {
        return Err(CoinwatchError::Config(
            "FINNHUB_TOKEN must be set to stream quotes".to_string(),
        ));
    }

    let tls_config = Arc::new(build_tls_config(config.ca_bundle.as_deref())?);
    let feed = QuoteFeed::connect(&config.finnhub, tls_config);
    let mut updates = feed.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut recent = RecentSymbols::new();
    let mut selected: Option<String> = None;

    print_history(&recent);
    if let Some(symbol) = symbol {
        selected = Some(select_symbol(&feed, &mut recent, &symbol));
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                println!("{}", format_snapshot(&snapshot, selected.as_deref()));
            }

            line = lines.next_line() => {
                let Ok(Some(line)) = line else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    "quit" | "exit" => break,
                    "off" => {
                        selected = None;
                        feed.select(None);
                    }
                    "refresh" => feed.refresh(),
                    "history" => print_history(&recent),
                    entry if entry.starts_with('#') => {
                        let picked = entry[1..]
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|i| recent.get(i))
                            .map(str::to_string);
                        match picked {
                            Some(symbol) => {
                                selected = Some(select_symbol(&feed, &mut recent, &symbol));
                            }
                            None => eprintln!("No history entry {entry}"),
                        }
                    }
                    symbol => selected = Some(select_symbol(&feed, &mut recent, symbol)),
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    feed.shutdown().await;
    Ok(())
}

/// Normalizes `symbol`, records it in the history and switches the feed.
fn select_symbol(feed: &QuoteFeed, recent: &mut RecentSymbols, symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    recent.record(&symbol);
    feed.select(Some(&symbol));
    symbol
}

fn print_history(recent: &RecentSymbols) {
    let entries: Vec<String> = recent
        .items()
        .iter()
        .enumerate()
        .map(|(i, symbol)| format!("#{} {symbol}", i + 1))
        .collect();
    println!("Recent: {}", entries.join("  "));
}

/// Renders one status line. A quote for anything other than the selected
/// symbol is left over from before a switch and is marked stale.
fn format_snapshot(snapshot: &QuoteSnapshot, selected: Option<&str>) -> String {
    let stale = snapshot
        .quote
        .as_ref()
        .is_some_and(|quote| selected != Some(quote.symbol.as_str()));

    let status = match (&snapshot.error, selected) {
        (Some(error), _) => format!("error: {error} (type `refresh` to retry)"),
        (None, Some(symbol)) if stale => format!("switching to {symbol}"),
        (None, _) if snapshot.connected => "live".to_string(),
        (None, _) => "offline".to_string(),
    };

    let Some(quote) = &snapshot.quote else {
        return format!("[{status}] waiting for trades");
    };
    let time = quote
        .timestamp
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.format("%H:%M:%S%.3f UTC").to_string())
        .unwrap_or_default();
    let line = format!(
        "[{status}] {} {} bid {} ask {} {time}",
        quote.symbol,
        quote.price,
        display(quote.bid),
        display(quote.ask),
    );

    if stale {
        format!("{line} (stale)")
    } else {
        line
    }
}

fn display<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
