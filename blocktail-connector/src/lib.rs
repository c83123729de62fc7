//! A Rust library that follows the tip of a Solana cluster block by block.
//!
//! This crate turns the request/response RPC interface of a Solana node into a continuous,
//! ordered stream of block records. It tracks the last indexed slot, discovers newly
//! produced slots at a fixed commitment level, fetches each block and emits one summary
//! (or absence) per slot together with per-cycle latency figures.
//!
//! # Key Components
//!
//! *   [`workers::TailManager`]: The main entry point. It runs the background worker that
//!     polls the node and drives the cursor and the indexer.
//! *   [`cursor::CursorTracker`]: Owns the watermark and discovers new slots.
//! *   [`indexer::BlockIndexer`]: Turns a slot number into a [`block::SlotOutcome`].
//! *   [`client::NodeClient`]: The node capabilities the connector consumes, implemented
//!     for the nonblocking `RpcClient`.
//! *   [`sink`] and [`listener`]: Where emitted records go.
pub mod block;
pub mod client;
/// Defines configuration structures for the connector.
pub mod config;
pub mod cursor;
pub mod error;
pub mod indexer;
/// A channel-backed sink with a stream of emitted records.
pub mod listener;
pub mod retry;
pub mod sink;
/// The background worker that follows the chain tip.
pub mod workers;
