//! Wire types for the data service.
//!
//! There is one request enum and one response enum for the whole service.
//! Individual message types declare their interaction pattern by implementing
//! the matching message trait, and [derive_more](https://crates.io/crates/derive_more)
//! provides the conversions between the enums and the message types.

use derive_more::{Display, From, TryInto};
use quic_rpc::{
    message::{
        BidiStreaming, BidiStreamingMsg, ClientStreaming, ClientStreamingMsg, Msg, RpcMsg,
        ServerStreaming, ServerStreamingMsg,
    },
    Service,
};
use serde::{Deserialize, Serialize};

/// Default port the server listens on.
pub const DEFAULT_PORT: u16 = 50051;

/// Marker string returned to the client once an ingest stream is drained.
pub const INGEST_DONE: &str = "DONE_FROM_SERVER";

/// Number of greetings produced per [`Greet`] request.
pub const GREET_COUNT: u32 = 10;

/// Add two numbers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Sum {
    pub first: i64,
    pub second: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SumResponse(pub i64);

/// Ask for a stream of greetings for one person.
#[derive(Debug, Serialize, Deserialize)]
pub struct Greet {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GreetResponse(pub String);

/// Open a client stream of records for the server to consume.
#[derive(Debug, Serialize, Deserialize)]
pub struct Ingest;

/// One record in an ingest stream.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestUpdate {
    pub index: u64,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestResponse(pub String);

/// Start a chunked upload.
///
/// Target file name and declared total size are supplied exactly once, here.
/// Chunks carry payload only, so the metadata cannot change mid-transfer.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transfer {
    pub file_name: String,
    pub total_size: u64,
}

/// One payload chunk of an upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferChunk(pub Vec<u8>);

/// Cumulative progress after one chunk, in percent of the declared total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TransferProgress(pub f32);

/// Serializable wire error for the transfer operation.
///
/// The remote caller sees this directly, so a failed write is observable
/// instead of being logged and swallowed on the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Display)]
pub enum TransferError {
    /// The requested name is not a bare file name.
    #[display("invalid file name {name:?}")]
    InvalidFileName { name: String },
    /// The accumulated data could not be persisted.
    #[display("could not write {name:?}: {reason}")]
    Write { name: String, reason: String },
}

impl std::error::Error for TransferError {}

/// Open a name stream to be hashed by the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct HashNames;

/// One name pair in a hash stream.
#[derive(Debug, Serialize, Deserialize)]
pub struct HashUpdate {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashResponse(pub String);

/// Request enum.
#[derive(Debug, Serialize, Deserialize, From, TryInto)]
pub enum DataRequest {
    Sum(Sum),
    Greet(Greet),
    Ingest(Ingest),
    IngestUpdate(IngestUpdate),
    Transfer(Transfer),
    TransferChunk(TransferChunk),
    HashNames(HashNames),
    HashUpdate(HashUpdate),
}

/// Response enum.
#[derive(Debug, Serialize, Deserialize, From, TryInto)]
pub enum DataResponse {
    Sum(SumResponse),
    Greet(GreetResponse),
    Ingest(IngestResponse),
    Transfer(Result<TransferProgress, TransferError>),
    Hash(HashResponse),
}

/// The data service, exposing one operation per interaction pattern.
#[derive(Debug, Clone)]
pub struct DataService;

impl Service for DataService {
    type Req = DataRequest;
    type Res = DataResponse;
}

impl RpcMsg<DataService> for Sum {
    type Response = SumResponse;
}

impl Msg<DataService> for Greet {
    type Pattern = ServerStreaming;
}

impl ServerStreamingMsg<DataService> for Greet {
    type Response = GreetResponse;
}

impl Msg<DataService> for Ingest {
    type Pattern = ClientStreaming;
}

impl ClientStreamingMsg<DataService> for Ingest {
    type Update = IngestUpdate;
    type Response = IngestResponse;
}

impl Msg<DataService> for Transfer {
    type Pattern = BidiStreaming;
}

impl BidiStreamingMsg<DataService> for Transfer {
    type Update = TransferChunk;
    type Response = Result<TransferProgress, TransferError>;
}

impl Msg<DataService> for HashNames {
    type Pattern = BidiStreaming;
}

impl BidiStreamingMsg<DataService> for HashNames {
    type Update = HashUpdate;
    type Response = HashResponse;
}
