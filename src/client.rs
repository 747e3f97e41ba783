//! Typed client for the data service.
//!
//! Thin wrapper around [`RpcClient`] that hides the request/response enums
//! and maps transport errors into [`anyhow::Error`].

use std::future::Future;

use anyhow::Result;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use quic_rpc::{client::UpdateSink, Connector, RpcClient};

use crate::protocol::{
    DataService, Greet, HashNames, HashUpdate, Ingest, IngestUpdate, Sum, Transfer, TransferChunk,
    TransferProgress,
};

#[derive(Debug, Clone)]
pub struct DataClient<C: Connector<DataService>> {
    inner: RpcClient<DataService, C>,
}

impl<C: Connector<DataService>> From<RpcClient<DataService, C>> for DataClient<C> {
    fn from(inner: RpcClient<DataService, C>) -> Self {
        Self { inner }
    }
}

impl<C: Connector<DataService>> DataClient<C> {
    pub fn new(conn: C) -> Self {
        Self {
            inner: RpcClient::new(conn),
        }
    }

    /// Unary call: add two numbers on the server.
    pub async fn sum(&self, first: i64, second: i64) -> Result<i64> {
        let res = self.inner.rpc(Sum { first, second }).await?;
        Ok(res.0)
    }

    /// Server-streaming call: a timed stream of greetings.
    pub async fn greet(
        &self,
        first_name: &str,
        last_name: &str,
        age: u32,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let stream = self
            .inner
            .server_streaming(Greet {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                age,
            })
            .await?;
        Ok(stream
            .map_ok(|res| res.0)
            .map_err(anyhow::Error::from)
            .boxed())
    }

    /// Client-streaming call: send records, get the completion marker back
    /// once the sink is dropped.
    pub async fn ingest(
        &self,
    ) -> Result<(
        UpdateSink<C, IngestUpdate>,
        impl Future<Output = Result<String>>,
    )> {
        let (sink, res) = self.inner.client_streaming(Ingest).await?;
        let res = async move {
            let response = res.await?;
            Ok(response.0)
        };
        Ok((sink, res))
    }

    /// Bidi call: upload chunks, receive one progress message per chunk.
    ///
    /// The progress stream ends after a successful write of the accumulated
    /// data; a server-side failure surfaces as a final `Err` item.
    pub async fn transfer(
        &self,
        file_name: &str,
        total_size: u64,
    ) -> Result<(
        UpdateSink<C, TransferChunk>,
        BoxStream<'static, Result<TransferProgress>>,
    )> {
        let (sink, progress) = self
            .inner
            .bidi(Transfer {
                file_name: file_name.to_string(),
                total_size,
            })
            .await?;
        let progress = progress
            .map(|item| match item {
                Ok(Ok(progress)) => Ok(progress),
                Ok(Err(err)) => Err(err.into()),
                Err(err) => Err(err.into()),
            })
            .boxed();
        Ok((sink, progress))
    }

    /// Bidi call: stream name pairs, receive one hex digest per pair.
    pub async fn hash_names(
        &self,
    ) -> Result<(
        UpdateSink<C, HashUpdate>,
        BoxStream<'static, Result<String>>,
    )> {
        let (sink, hashes) = self.inner.bidi(HashNames).await?;
        Ok((
            sink,
            hashes
                .map_ok(|res| res.0)
                .map_err(anyhow::Error::from)
                .boxed(),
        ))
    }
}
