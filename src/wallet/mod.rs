//! Wallet module - handshake between a browser wallet and the mint builder
//!
//! The client never holds keys. It asks an injected wallet to connect, fetches
//! an unsigned template, hands it to the wallet to sign, and asks the wallet
//! to broadcast the result.
//!
//! # Architecture
//!
//! ```text
//! MintSession ──▶ TemplateSource ──▶ HttpTemplateSource (POST /api/create-mint-psbt)
//!     │                         └──▶ LocalTemplateSource (PsbtBuilder, in-process)
//!     │
//!     └──▶ ResolvedWallet ──▶ WalletCapability (Direct | BitcoinNamespace | RawTx | ...)
//!                 │
//!                 ▼
//!          WalletProvider (JsWalletProvider in the browser, mocks in tests)
//! ```
//!
//! # Wallet Paths
//!
//! | Capability | Sign | Broadcast |
//! |------------|------|-----------|
//! | `direct` | `signPsbt` | `pushPsbt` |
//! | `bitcoin-namespace` | `bitcoin.signPsbt` | `bitcoin.pushPsbt` |
//! | `raw-tx` | `signPsbt` | `pushTx` |
//! | `mixed` | first of `signPsbt`, `bitcoin.signPsbt` | first of `pushPsbt`, `bitcoin.pushPsbt`, `pushTx` |
//! | `sign-only` | whichever exists | none |
//! | `connect-only` | none | none |

mod capability;
mod provider;
mod session;
mod template;

pub use capability::{ResolvedWallet, WalletCapability};
pub use provider::{ProbeReport, ProviderError, WalletProvider};
pub use session::{FailureKind, HandshakeError, MintReceipt, MintSession, MintState, SignedTransaction};
#[cfg(feature = "bitcoin")]
pub use template::LocalTemplateSource;
pub use template::{BuilderError, HttpTemplateSource, TemplateRequest, TemplateSource};
