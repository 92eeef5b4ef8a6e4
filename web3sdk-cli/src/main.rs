//! web3sdk interactive demo
//!
//! Opens a session over the configured networks (read-only, no wallet in a
//! terminal), reconnects automatically after a disconnect, and reads ERC-20
//! state through whichever provider is active.

mod config;
mod types;

use config::CliConfig;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use types::{CliResponse, MenuChoice};
use web3sdk::connect::{ConnectionPhase, HeadlessEnvironment, Web3Session};
use web3sdk::erc20::{parse_address, Erc20Token, QueryCache, USDC_MAINNET};
use web3sdk::provider::RpcClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CliConfig::from_env();
    let networks = config.load_networks()?;
    let store = config.preference_store()?;
    let transport = config.transport()?;
    info!(
        preferences = %store.path().display(),
        timeout = ?transport.request_timeout,
        throttle = ?transport.throttle,
        "Loaded configuration"
    );

    let client = Arc::new(RpcClient::with_config(transport)?);
    let session = Web3Session::with_client(
        networks,
        Arc::new(store),
        Arc::new(HeadlessEnvironment),
        client,
    )?;
    let controller = session.connection().clone();
    match controller.auto_connect().await {
        Some(Ok(network)) => println!("Connected read-only to {network}"),
        Some(Err(e)) => warn!(error = %e, "Initial connection failed"),
        None => {}
    }
    let driver = tokio::spawn(async move { controller.drive_auto_connect().await });

    let cache = Arc::new(QueryCache::default());
    loop {
        print_menu();
        // End of input quits like the exit entry.
        let choice = match prompt("\nYour choice")? {
            None => MenuChoice::Exit,
            Some(line) => match line.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            },
        };

        match handle_choice(choice, &session, &cache).await {
            Ok(CliResponse::Exit) => break,
            Ok(CliResponse::Continue) => {}
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }

    driver.abort();
    Ok(())
}

fn print_menu() {
    println!("\n══════════════════════════════════");
    for choice in MenuChoice::ALL {
        println!("  [{}] {}", choice.key(), choice.label());
    }
}

/// `None` once stdin is exhausted.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{label}: ");
    io::stdout().flush()?;
    read_answer(&mut io::stdin().lock())
}

fn read_answer(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// A prompt inside a menu action, where end of input is an error.
fn ask(label: &str) -> anyhow::Result<String> {
    prompt(label)?.ok_or_else(|| anyhow::anyhow!("input closed"))
}

async fn handle_choice(
    choice: MenuChoice,
    session: &Web3Session,
    cache: &Arc<QueryCache>,
) -> anyhow::Result<CliResponse> {
    let controller = session.connection();
    match choice {
        MenuChoice::Status => print_status(session),
        MenuChoice::Networks => print_networks(session),
        MenuChoice::SwitchChain => {
            let chain_id: u64 = ask("Chain id")?.parse()?;
            let network = controller.switch_chain(chain_id).await?;
            println!("Now on {network}");
        }
        MenuChoice::TokenBalance => {
            let token = token(session, cache)?;
            let owner = parse_address(&ask("Owner address")?)?;
            let balance = token.formatted_balance(owner).await?;
            let symbol = token.symbol().await?;
            println!("{balance} {symbol}");
        }
        MenuChoice::TokenInfo => {
            let metadata = token(session, cache)?.metadata().await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        MenuChoice::Disconnect => {
            controller.disconnect().await?;
            println!("Disconnected; a read-only session will reconnect shortly");
        }
        MenuChoice::Exit => {
            println!("\nBye!");
            return Ok(CliResponse::Exit);
        }
    }
    Ok(CliResponse::Continue)
}

fn print_status(session: &Web3Session) {
    let state = session.connection().state();
    let phase = match state.phase() {
        ConnectionPhase::Disconnected => "disconnected".to_string(),
        ConnectionPhase::Connecting => "connecting".to_string(),
        ConnectionPhase::ReadOnly { chain_id } => format!("read-only on chain {chain_id}"),
        ConnectionPhase::Connected { account, chain_id } => {
            format!("{account} on chain {chain_id}")
        }
    };
    println!("Connector:       {}", state.connector.name());
    println!("State:           {phase}");
    println!("Desired network: {}", state.desired_network);
}

fn print_networks(session: &Web3Session) {
    let selected = session.connection().selected_network();
    for network in session.networks().supported_networks() {
        let marker = if Some(network.chain_id) == selected { "*" } else { " " };
        println!(
            " {marker} {:>8}  {:<20} {}",
            network.chain_id, network.chain_name, network.rpc_url
        );
    }
}

/// Token from a prompted address (USDC when blank), cached under the chain
/// the session is on.
fn token(session: &Web3Session, cache: &Arc<QueryCache>) -> anyhow::Result<Erc20Token> {
    let raw = ask(&format!("Token address [{USDC_MAINNET}]"))?;
    let address = if raw.is_empty() {
        USDC_MAINNET
    } else {
        parse_address(&raw)?
    };
    let controller = session.connection();
    let chain_id = controller
        .selected_network()
        .unwrap_or_else(|| controller.desired_network());
    Ok(Erc20Token::new(address, session.provider(None)?).with_cache(cache.clone(), chain_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_answer_trims_and_stops_at_eof() {
        let mut input = Cursor::new("  3 \n\n");
        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some("3"));
        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some(""));
        assert_eq!(read_answer(&mut input).unwrap(), None);
        assert_eq!(read_answer(&mut input).unwrap(), None);
    }
}
