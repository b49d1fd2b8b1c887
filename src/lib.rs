//! Methane: Alkanes mint templates and the wallet handshake that signs them.
//!
//! # Architecture
//!
//! ```text
//! Browser                                     Server
//! ───────                                     ──────
//! MethaneMinter (wasm)                        axum router
//!   │                                           │
//!   └── MintSession ── POST /api/create-mint-psbt ──▶ PsbtBuilder
//!         │                                           │
//!         │                                           └── Runestone ◀── Protostone ◀── Cellpack
//!         │
//!         └── WalletProvider (window.oyl, window.unisat, ...)
//!               └── WalletCapability resolved once per attempt
//! ```
//!
//! # Mint Flow
//!
//! | Step | Who | Description |
//! |------|-----|-------------|
//! | connect | wallet | `isConnected`, then `connect`/`requestAccounts`, then `getAddresses` |
//! | fetch | builder | unsigned template: 546 sat to the recipient + OP_RETURN protostone |
//! | sign | wallet | `signPsbt(hex)`, then `signPsbt({psbt: hex})` |
//! | broadcast | wallet | `pushPsbt` / `bitcoin.pushPsbt` / `pushTx` → txid |
//!
//! # Features
//!
//! - `native` - Server, CLI and tokio runtime (implies `bitcoin`)
//! - `wasm` - Browser wallet bridge via wasm-bindgen
//! - `bitcoin` - PSBT builder and protostone codec
//!
//! # Usage
//!
//! ```ignore
//! use methane::{PsbtBuilder, Network};
//!
//! let template = PsbtBuilder::new(Network::Bitcoin)
//!     .build_mint_template(5, "2,1,77", "bc1p...")?;
//! println!("{}", template.hex());
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod core;
pub mod mint;
pub mod wallet;

// Encoding and PSBT construction need the bitcoin crate
#[cfg(feature = "bitcoin")]
pub mod protostone;
#[cfg(feature = "bitcoin")]
pub mod psbt;

// =============================================================================
// Native-only modules (server, CLI, tokio)
// =============================================================================
#[cfg(feature = "native")]
pub mod config;
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod runtime;
#[cfg(feature = "native")]
pub mod server;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use mint::{MintData, MintError, MintPsbtRequest, MintPsbtResponse, MintRequest, Network, DEFAULT_MINT_DATA};
pub use wallet::{
    BuilderError, FailureKind, HandshakeError, HttpTemplateSource, MintReceipt, MintSession, MintState, ProbeReport,
    ProviderError, TemplateSource, WalletCapability, WalletProvider,
};

#[cfg(feature = "bitcoin")]
pub use psbt::{MintTemplate, PsbtBuilder, DUST_LIMIT};
#[cfg(feature = "bitcoin")]
pub use wallet::LocalTemplateSource;

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use config::ServerConfig;
#[cfg(feature = "native")]
pub use runtime::{install_signal_handlers, Shutdown};
#[cfg(feature = "native")]
pub use server::{create_router, create_router_with_name};

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{JsWalletProvider, MethaneMinter};
