//! Alchemy backend client
//!
//! This crate describes the blockchain-data backend that the MCP server
//! forwards tool calls to, and ships a thin binding onto Alchemy's hosted
//! endpoints.
//!
//! # Method groups
//!
//! - [`NftApi`]: NFT ownership, metadata, sales and spam queries (NFT REST v3)
//! - [`CoreApi`]: blocks, transactions, logs, token balances, asset transfers
//! - [`EnsApi`]: forward and reverse ENS resolution
//! - [`GasApi`]: gas price, fee data and gas estimation
//! - [`SubscriptionApi`]: WebSocket event subscriptions
//!
//! Every group is an `async_trait` so the server can be driven by any
//! implementation of [`Backend`], including in-process mocks.
//!
//! The binding performs exactly one request per call. It does not retry,
//! batch, paginate or cache.

pub mod api;
pub mod client;
pub mod ens;
pub mod error;
pub mod network;

mod chain;
mod gas;
mod nft;
mod ws;

pub use api::{
    AssetTransfersParams, Backend, CancelHandle, CoreApi, EnsApi, EventCallback,
    GasApi, LogFilter, NftApi, NftMetadataOptions, NftPageOptions, NftSalesOptions,
    SubscriptionApi, SubscriptionRequest, TransactionReceiptsParams, TransactionRequest,
};
pub use client::AlchemyClient;
pub use error::{ClientError, Result};
pub use network::Network;
