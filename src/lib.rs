//! Demo of the four streaming rpc interaction patterns, backed by
//! [quic-rpc](https://crates.io/crates/quic-rpc).
//!
//! The service exposes one operation per pattern: a unary sum, a timed
//! greeting stream, a client-streamed record ingest, and a bidirectional
//! chunked file transfer that echoes cumulative progress per chunk and
//! persists the upload when the client closes its side. A second bidi
//! operation hashes streamed name pairs.
//!
//! The wire types live in [`protocol`], the server side in [`handler`] and
//! [`transfer`], and a typed client wrapper in [`client`]. The binaries run
//! the service over QUIC; the tests run it over the in-memory flume
//! transport.

pub mod client;
pub mod handler;
pub mod protocol;
pub mod transfer;

pub use client::DataClient;
pub use handler::{serve, DataHandler};
pub use protocol::{DataService, DEFAULT_PORT};
