//! End-to-end test over a real QUIC socket on localhost.

use std::time::Duration;

use anyhow::Result;
use futures::{SinkExt, TryStreamExt};
use quic_rpc::{
    client::QuinnConnector,
    server::QuinnListener,
    transport::quinn::{make_client_endpoint, make_server_endpoint},
    RpcServer,
};
use quic_transfer::{
    protocol::{DataService, TransferChunk},
    serve, DataClient, DataHandler,
};

#[tokio::test]
async fn quinn_end_to_end() -> Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let dir = tempfile::tempdir()?;

    // bind to a concrete loopback port and connect to the reported address
    let (server_endpoint, cert_der) = make_server_endpoint("127.0.0.1:0".parse()?)?;
    let server_addr = server_endpoint.local_addr()?;
    let listener = QuinnListener::<DataService>::new(server_endpoint)?;
    let server_handle = tokio::task::spawn(serve(
        RpcServer::new(listener),
        DataHandler::new(dir.path()),
    ));

    let client_endpoint = make_client_endpoint("127.0.0.1:0".parse()?, &[&cert_der])?;
    let conn = QuinnConnector::<DataService>::new(client_endpoint, server_addr, "localhost".into());
    let client = DataClient::new(conn);

    tokio::time::timeout(Duration::from_secs(30), async {
        assert_eq!(client.sum(1200, 34).await?, 1234);

        let (mut sink, progress) = client.transfer("remote.txt", 5).await?;
        let feeder = tokio::task::spawn(async move {
            for chunk in [&b"He"[..], &b"llo"[..]] {
                sink.send(TransferChunk(chunk.to_vec())).await?;
            }
            anyhow::Ok(())
        });
        let percents: Vec<f32> = progress.map_ok(|p| p.0).try_collect().await?;
        feeder.await??;

        assert_eq!(percents, vec![40.0, 100.0]);
        assert_eq!(
            tokio::fs::read_to_string(dir.path().join("remote.txt")).await?,
            "Hello"
        );
        anyhow::Ok(())
    })
    .await??;

    // the listener endpoint outlives individual client connections, so the
    // accept loop has to be shut down explicitly
    server_handle.abort();
    Ok(())
}
