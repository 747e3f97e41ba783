use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use quic_rpc::{server::QuinnListener, transport::quinn::make_server_endpoint, RpcServer};
use quic_transfer::{serve, DataHandler, DataService, DEFAULT_PORT};
use tracing::info;

/// Serve the data service over QUIC with a self-signed certificate.
///
/// Completed transfers are written to the current working directory.
#[derive(Debug, Parser)]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let bind_addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let (endpoint, _cert) = make_server_endpoint(bind_addr)?;
    info!(%bind_addr, "listening");
    let listener = QuinnListener::<DataService>::new(endpoint)?;
    serve(RpcServer::new(listener), DataHandler::new(".")).await?;
    Ok(())
}
