//! Server side of the data service.
//!
//! [`DataHandler`] has one method per operation and a dispatcher that maps
//! each start message to the matching interaction pattern. [`serve`] is the
//! accept loop; it spawns one task per accepted request channel.

use std::{path::PathBuf, time::Duration};

use async_stream::stream;
use futures::{Stream, StreamExt};
use quic_rpc::{
    server::{RpcChannel, RpcServerError},
    Listener, RpcServer,
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
    protocol::{
        DataRequest, DataService, Greet, GreetResponse, HashNames, HashResponse, HashUpdate,
        Ingest, IngestResponse, IngestUpdate, Sum, SumResponse, Transfer, TransferChunk,
        TransferError, TransferProgress, GREET_COUNT, INGEST_DONE,
    },
    transfer::TransferSession,
};

/// Handler for all data service requests.
///
/// Cheap to clone; one clone serves one request channel. Completed transfers
/// are written into `out_dir`.
#[derive(Debug, Clone)]
pub struct DataHandler {
    out_dir: PathBuf,
    greet_interval: Duration,
}

impl DataHandler {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            greet_interval: Duration::from_secs(1),
        }
    }

    /// Overrides the pause between greetings. Mostly useful for tests.
    pub fn with_greet_interval(mut self, interval: Duration) -> Self {
        self.greet_interval = interval;
        self
    }

    /// Dispatch a single request to the handler method for its pattern.
    pub async fn handle_rpc_request<C: Listener<DataService>>(
        self,
        req: DataRequest,
        chan: RpcChannel<DataService, C>,
    ) -> Result<(), RpcServerError<C>> {
        use DataRequest::*;
        match req {
            Sum(msg) => chan.rpc(msg, self, Self::sum).await,
            Greet(msg) => chan.server_streaming(msg, self, Self::greet).await,
            Ingest(msg) => chan.client_streaming(msg, self, Self::ingest).await,
            Transfer(msg) => chan.bidi_streaming(msg, self, Self::transfer).await,
            HashNames(msg) => chan.bidi_streaming(msg, self, Self::hash_names).await,
            IngestUpdate(_) | TransferChunk(_) | HashUpdate(_) => {
                Err(RpcServerError::UnexpectedStartMessage)
            }
        }
    }

    async fn sum(self, req: Sum) -> SumResponse {
        debug!(first = req.first, second = req.second, "sum requested");
        SumResponse(req.first + req.second)
    }

    fn greet(self, req: Greet) -> impl Stream<Item = GreetResponse> + Send + 'static {
        stream! {
            for counter in 0..GREET_COUNT {
                yield GreetResponse(format!(
                    "Hello {} , {} whose age is {} : counter => {}",
                    req.first_name, req.last_name, req.age, counter
                ));
                tokio::time::sleep(self.greet_interval).await;
            }
        }
    }

    async fn ingest(
        self,
        _req: Ingest,
        updates: impl Stream<Item = IngestUpdate> + Send + 'static,
    ) -> IngestResponse {
        let mut records = 0u64;
        tokio::pin!(updates);
        while let Some(IngestUpdate { index, value }) = updates.next().await {
            debug!(index, value = %value, "ingest record");
            records += 1;
        }
        debug!(records, "ingest stream drained");
        IngestResponse(INGEST_DONE.to_string())
    }

    /// Chunked upload with progress echo.
    ///
    /// One progress message per chunk, in arrival order. After the update
    /// stream ends the accumulated bytes are written out in a single write;
    /// a failed write is reported to the caller as a final error item.
    fn transfer(
        self,
        req: Transfer,
        chunks: impl Stream<Item = TransferChunk> + Send + 'static,
    ) -> impl Stream<Item = Result<TransferProgress, TransferError>> + Send + 'static {
        stream! {
            let mut session = match TransferSession::new(&self.out_dir, &req) {
                Ok(session) => session,
                Err(err) => {
                    warn!(%err, "transfer rejected");
                    yield Err(err);
                    return;
                }
            };
            tokio::pin!(chunks);
            while let Some(TransferChunk(payload)) = chunks.next().await {
                yield Ok(session.push(&payload));
            }
            if let Err(err) = session.finish().await {
                warn!(%err, "transfer failed");
                yield Err(err);
            }
        }
    }

    fn hash_names(
        self,
        _req: HashNames,
        updates: impl Stream<Item = HashUpdate> + Send + 'static,
    ) -> impl Stream<Item = HashResponse> + Send + 'static {
        stream! {
            tokio::pin!(updates);
            while let Some(HashUpdate { first_name, last_name }) = updates.next().await {
                let combined = format!("{last_name} , {first_name}");
                yield HashResponse(hex::encode(Sha256::digest(combined.as_bytes())));
            }
        }
    }
}

/// Accept loop: reads the first message of each incoming request channel and
/// spawns a handler task for it.
///
/// Returns when the endpoint itself fails to accept, e.g. because the
/// transport was shut down. Per-request failures are logged and do not stop
/// the loop.
pub async fn serve<C: Listener<DataService>>(
    server: RpcServer<DataService, C>,
    handler: DataHandler,
) -> Result<(), RpcServerError<C>> {
    loop {
        let (req, chan) = match server.accept().await?.read_first().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(?err, "could not read first request");
                continue;
            }
        };
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(err) = handler.handle_rpc_request(req, chan).await {
                warn!(?err, "request handler failed");
            }
        });
    }
}
