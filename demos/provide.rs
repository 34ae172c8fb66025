use std::time::Instant;

use dht_api::{testnet::Testnet, Options};

use clap::Parser;

use tracing::Level;
use tracing_subscriber;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Content to store as a leaf block, one block per argument
    #[arg(required = true)]
    content: Vec<String>,
    /// Also provide every linked block
    #[arg(short, long)]
    recursive: bool,
}

fn main() {
    tracing_subscriber::fmt()
        // Switch to TRACE to see every announcement
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let testnet = Testnet::new(10);
    let provider = &testnet.nodes[0];

    let leaves: Vec<_> = cli
        .content
        .iter()
        .map(|content| provider.insert_block(content.as_bytes(), vec![]))
        .collect();
    let root = provider.insert_block(b"directory", leaves.clone());

    println!("Providing root {} ...", root);

    let start = Instant::now();

    provider
        .api()
        .provide(root, Options::default().recursive(cli.recursive))
        .expect("provide failed");

    println!(
        "Provided in {:?} milliseconds",
        start.elapsed().as_millis()
    );

    let api = testnet.nodes[9].api();

    for cid in std::iter::once(root).chain(leaves) {
        let providers = api
            .find_providers(cid, Options::default())
            .expect("findprovs failed");

        println!(
            "{} -> {}",
            cid,
            serde_json::to_string(
                &providers
                    .iter()
                    .map(|record| record.id.to_base58())
                    .collect::<Vec<_>>()
            )
            .expect("serializable ids")
        );
    }
}
