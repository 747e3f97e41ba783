use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use futures::{SinkExt, StreamExt};
use quic_rpc::{client::QuinnConnector, transport::quinn::make_insecure_client_endpoint};
use quic_transfer::{
    protocol::{HashUpdate, IngestUpdate, TransferChunk},
    DataClient, DataService, DEFAULT_PORT,
};

/// Drive every operation of the data service once against a running server.
#[derive(Debug, Parser)]
struct Args {
    /// Address of the server.
    #[arg(long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let endpoint = make_insecure_client_endpoint("0.0.0.0:0".parse()?)?;
    let conn = QuinnConnector::<DataService>::new(endpoint, args.addr, "localhost".to_string());
    let client = DataClient::new(conn);

    // unary
    let sum = client.sum(10, 32).await?;
    println!("sum: 10 + 32 = {sum}");

    // server streaming
    println!("greet:");
    let mut greetings = client.greet("Ada", "Lovelace", 36).await?;
    while let Some(greeting) = greetings.next().await {
        println!("  {}", greeting?);
    }

    // client streaming
    let (mut records, done) = client.ingest().await?;
    for (index, value) in ["alpha", "beta", "gamma"].into_iter().enumerate() {
        records
            .send(IngestUpdate {
                index: index as u64,
                value: value.to_string(),
            })
            .await?;
    }
    drop(records);
    println!("ingest: {}", done.await?);

    // bidi streaming: chunked upload with progress echo
    let payload = &b"Hello from the transfer demo\n"[..];
    let (mut chunks, mut progress) = client.transfer("demo.txt", payload.len() as u64).await?;
    let feeder = tokio::task::spawn(async move {
        for chunk in payload.chunks(8) {
            chunks.send(TransferChunk(chunk.to_vec())).await?;
        }
        anyhow::Ok(())
    });
    while let Some(percent) = progress.next().await {
        println!("transfer: {:.1}%", percent?.0);
    }
    feeder.await??;

    // bidi streaming: hash echo
    let (mut names, mut hashes) = client.hash_names().await?;
    let feeder = tokio::task::spawn(async move {
        names
            .send(HashUpdate {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            })
            .await?;
        anyhow::Ok(())
    });
    while let Some(hash) = hashes.next().await {
        println!("hash: {}", hash?);
    }
    feeder.await??;

    Ok(())
}
