use std::time::Instant;

use dht_api::testnet::Testnet;

use clap::Parser;

use tracing::Level;
use tracing_subscriber;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of nodes in the in-memory testnet
    #[arg(short, long, default_value_t = 30)]
    nodes: usize,
    /// Base58 peer id to look up, defaults to the last node of the testnet
    peer: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        // Switch to DEBUG to see every command and its arguments
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let testnet = Testnet::new(cli.nodes.max(2));
    let api = testnet.nodes[0].api();

    let peer = cli.peer.unwrap_or_else(|| {
        testnet.nodes[testnet.nodes.len() - 1]
            .peer_id()
            .to_base58()
    });

    println!("Looking up peer: {} ...", peer);

    let start = Instant::now();

    match api.find_peer(peer.as_str()) {
        Ok(response) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&response).expect("serializable response")
            );
        }
        Err(error) => {
            println!("findpeer failed with {}: {}", error.code(), error);
        }
    }

    println!("\n=== CLOSEST PEERS ===");

    match api.query(peer.as_str()) {
        Ok(closest) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&closest).expect("serializable response")
            );
        }
        Err(error) => {
            println!("query failed with {}: {}", error.code(), error);
        }
    }

    println!("\nDone in {:?} milliseconds", start.elapsed().as_millis());
}
