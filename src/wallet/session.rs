//! MintSession - connect → fetch → sign → broadcast against one wallet
//!
//! ```text
//! Disconnected ──▶ Connecting ──▶ Connected ──▶ Signing ──▶ Broadcasting ──▶ Done
//!                      │              │            │             │
//!                      └──────────────┴────────────┴─────────────┴──▶ Error
//! ```
//!
//! Every failure is terminal for the attempt. The state is published on a
//! `watch` channel so any UI can follow along without owning the session.

use super::capability::{ResolvedWallet, WalletCapability};
use super::provider::{ProbeReport, ProviderError, WalletProvider};
use super::template::{BuilderError, TemplateRequest, TemplateSource};
use crate::core::paths::wallet as paths;
use crate::mint::{check_taproot_prefix, MintData, Network};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    WalletUnavailable,
    BuilderError,
    SigningRejected,
    BroadcastFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum MintState {
    Disconnected,
    Connecting,
    Connected { address: String },
    Signing,
    Broadcasting,
    Done { txid: String },
    Error { kind: FailureKind, message: String },
}

impl MintState {
    /// True while an attempt is in flight; a UI disables its trigger on this
    pub fn is_busy(&self) -> bool {
        matches!(self, MintState::Connecting | MintState::Signing | MintState::Broadcasting)
    }
}

/// Terminal failures. `Display` is user-facing; the probe is for logs only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("Wallet unavailable: {reason}")]
    WalletUnavailable { reason: String, probe: ProbeReport },
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error("Failed to sign transaction: {reason}")]
    SigningRejected { reason: String, probe: ProbeReport },
    #[error("Failed to broadcast transaction: {reason}")]
    BroadcastFailed { reason: String, probe: ProbeReport },
}

impl HandshakeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            HandshakeError::WalletUnavailable { .. } => FailureKind::WalletUnavailable,
            HandshakeError::Builder(_) => FailureKind::BuilderError,
            HandshakeError::SigningRejected { .. } => FailureKind::SigningRejected,
            HandshakeError::BroadcastFailed { .. } => FailureKind::BroadcastFailed,
        }
    }

    pub fn probe(&self) -> Option<&ProbeReport> {
        match self {
            HandshakeError::WalletUnavailable { probe, .. }
            | HandshakeError::SigningRejected { probe, .. }
            | HandshakeError::BroadcastFailed { probe, .. } => Some(probe),
            HandshakeError::Builder(_) => None,
        }
    }
}

/// Whatever the wallet returned from signing, passed through to broadcast
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction(pub Value);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub txid: String,
    pub address: String,
    pub fee_rate: u64,
}

pub struct MintSession<W, T> {
    wallet: W,
    source: T,
    network: Network,
    mint_data: MintData,
    preset_address: Option<String>,
    address: Option<String>,
    resolved: Option<ResolvedWallet>,
    state: watch::Sender<MintState>,
    observers: Vec<Box<dyn Fn(&MintState)>>,
}

impl<W: WalletProvider, T: TemplateSource> MintSession<W, T> {
    pub fn new(wallet: W, source: T, network: Network) -> Self {
        let (state, _) = watch::channel(MintState::Disconnected);
        Self {
            wallet,
            source,
            network,
            mint_data: MintData::default(),
            preset_address: None,
            address: None,
            resolved: None,
            state,
            observers: Vec::new(),
        }
    }

    pub fn with_mint_data(mut self, mint_data: MintData) -> Self { self.mint_data = mint_data; self }

    /// Use this address instead of asking the wallet for one
    pub fn with_address(mut self, address: impl Into<String>) -> Self { self.preset_address = Some(address.into()); self }

    /// Latest-value view of the state; intermediate states may be skipped
    pub fn subscribe(&self) -> watch::Receiver<MintState> { self.state.subscribe() }

    /// Called synchronously on every transition, in order
    pub fn on_state(&mut self, observer: impl Fn(&MintState) + 'static) { self.observers.push(Box::new(observer)); }

    pub fn state(&self) -> MintState { self.state.borrow().clone() }
    pub fn address(&self) -> Option<&str> { self.address.as_deref() }
    pub fn capability(&self) -> Option<WalletCapability> { self.resolved.as_ref().map(|r| r.capability) }
    pub fn wallet(&self) -> &W { &self.wallet }

    /// Forget the connection; the next attempt starts from `Disconnected`
    pub fn disconnect(&mut self) {
        self.address = None;
        self.resolved = None;
        self.set(MintState::Disconnected);
    }

    fn set(&self, state: MintState) {
        debug!(?state, "mint state");
        self.observers.iter().for_each(|observer| observer(&state));
        self.state.send_replace(state);
    }

    fn fail(&self, err: HandshakeError) -> HandshakeError {
        match err.probe() {
            Some(probe) => warn!(kind = ?err.kind(), %probe, "mint attempt failed: {}", err),
            None => warn!(kind = ?err.kind(), "mint attempt failed: {}", err),
        }
        self.set(MintState::Error { kind: err.kind(), message: err.to_string() });
        err
    }

    fn unavailable(&self, probe: &ProbeReport, reason: impl Into<String>) -> HandshakeError {
        self.fail(HandshakeError::WalletUnavailable { reason: reason.into(), probe: probe.clone() })
    }

    /// Resolve the wallet's capability and make sure it is connected
    pub async fn connect(&mut self) -> Result<String, HandshakeError> {
        self.set(MintState::Connecting);
        let resolved = ResolvedWallet::resolve(&self.wallet);
        debug!(capability = resolved.capability.as_str(), probe = %resolved.probe, "wallet resolved");

        let connected = if resolved.has_is_connected() {
            match self.wallet.call(paths::IS_CONNECTED, vec![]).await {
                Ok(value) => is_truthy(&value),
                Err(e) => {
                    debug!(error = %e, "isConnected failed");
                    false
                }
            }
        } else {
            false
        };

        let mut candidates = Vec::new();
        if !connected {
            let Some(method) = resolved.connect_method() else {
                return Err(self.unavailable(&resolved.probe, "No connect method found. Please install or update your wallet."));
            };
            match self.wallet.call(method, vec![]).await {
                Ok(value) => collect_addresses(&value, &mut candidates),
                Err(e) => return Err(self.unavailable(&resolved.probe, format!("Error connecting wallet: {}", e))),
            }
        }

        let address = match self.preset_address.clone() {
            Some(address) => Some(address),
            None => {
                for method in resolved.address_methods().collect::<Vec<_>>() {
                    match self.wallet.call(method, vec![]).await {
                        Ok(value) => collect_addresses(&value, &mut candidates),
                        Err(e) => debug!(method, error = %e, "address lookup failed"),
                    }
                }
                pick_address(&candidates, self.network)
            }
        };
        let Some(address) = address else {
            return Err(self.unavailable(&resolved.probe, "Wallet did not provide an address"));
        };

        info!(wallet = self.wallet.name(), capability = resolved.capability.as_str(), %address, "wallet connected");
        self.address = Some(address.clone());
        self.resolved = Some(resolved);
        self.set(MintState::Connected { address: address.clone() });
        Ok(address)
    }

    /// Run one attempt. Connects first if needed.
    pub async fn mint(&mut self, fee_rate: u64) -> Result<MintReceipt, HandshakeError> {
        let address = match self.address.clone().filter(|_| self.resolved.is_some()) {
            Some(address) => {
                // Re-probe presence only; no wallet calls before the template arrives
                self.resolved = Some(ResolvedWallet::resolve(&self.wallet));
                self.set(MintState::Connected { address: address.clone() });
                address
            }
            None => self.connect().await?,
        };
        let resolved = self.resolved.clone().unwrap_or_else(|| ResolvedWallet::resolve(&self.wallet));

        let request = TemplateRequest { fee_rate, mint_data: self.mint_data, address: address.clone() };
        let psbt = match self.source.fetch_template(&request).await {
            Ok(psbt) => psbt,
            Err(e) => return Err(self.fail(e.into())),
        };
        debug!(psbt_prefix = psbt.get(..30).unwrap_or(psbt.as_str()), "template received");

        let signed = self.sign(&resolved, &psbt).await?;
        let txid = self.broadcast(&resolved, signed).await?;

        info!(%txid, "mint broadcast");
        self.set(MintState::Done { txid: txid.clone() });
        Ok(MintReceipt { txid, address, fee_rate })
    }

    /// Try each call shape in order: raw hex, then `{psbt: hex}`
    async fn sign(&self, resolved: &ResolvedWallet, psbt: &str) -> Result<SignedTransaction, HandshakeError> {
        self.set(MintState::Signing);
        let rejected = |reason: String| HandshakeError::SigningRejected { reason, probe: resolved.probe.clone() };
        let Some(method) = resolved.capability.sign_method() else {
            return Err(self.fail(rejected("Wallet does not support PSBT signing. Please update your wallet.".into())));
        };

        let mut last = ProviderError::Missing(method.to_string());
        for arg in [json!(psbt), json!({ "psbt": psbt })] {
            match self.wallet.call(method, vec![arg]).await {
                Ok(Value::Null) => last = ProviderError::Response("wallet returned nothing".into()),
                Ok(value) => return Ok(SignedTransaction(value)),
                Err(e) => {
                    debug!(method, error = %e, "sign call shape failed");
                    last = e;
                }
            }
        }
        Err(self.fail(rejected(last.to_string())))
    }

    async fn broadcast(&self, resolved: &ResolvedWallet, signed: SignedTransaction) -> Result<String, HandshakeError> {
        let failed = |reason: String| HandshakeError::BroadcastFailed { reason, probe: resolved.probe.clone() };
        let Some(method) = resolved.capability.broadcast_method() else {
            return Err(self.fail(failed("Wallet does not support transaction broadcasting. Please update your wallet.".into())));
        };
        self.set(MintState::Broadcasting);
        match self.wallet.call(method, vec![signed.0]).await {
            Ok(value) => match extract_txid(&value) {
                Some(txid) => Ok(txid),
                None => Err(self.fail(failed("Wallet did not return a transaction id".into()))),
            },
            Err(e) => Err(self.fail(failed(e.to_string()))),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Object(map) => map.get("connected").and_then(Value::as_bool).unwrap_or(false),
        _ => false,
    }
}

/// Addresses from strings, arrays, and `{address}` objects at any depth
fn collect_addresses(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_addresses(v, out)),
        Value::Object(map) => {
            if let Some(Value::String(address)) = map.get("address") {
                out.push(address.clone());
            }
            map.values()
                .filter(|v| v.is_array() || v.is_object())
                .for_each(|v| collect_addresses(v, out));
        }
        _ => {}
    }
}

/// Prefer a taproot address for the network, else the first one offered
fn pick_address(candidates: &[String], network: Network) -> Option<String> {
    candidates
        .iter()
        .find(|a| check_taproot_prefix(a, network).is_ok())
        .or_else(|| candidates.first())
        .cloned()
}

fn extract_txid(value: &Value) -> Option<String> {
    let txid = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["txid", "txId", "txHash"].iter().find_map(|k| map.get(*k).and_then(Value::as_str)),
        _ => None,
    }?;
    (!txid.is_empty()).then(|| txid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAPROOT: &str = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";

    #[test]
    fn test_collect_addresses_shapes() {
        let mut out = Vec::new();
        collect_addresses(&json!(["bc1qxyz", TAPROOT]), &mut out);
        collect_addresses(&json!({"taproot": {"address": "bc1pabc", "publicKey": "02ff"}}), &mut out);
        assert_eq!(out, vec!["bc1qxyz".to_string(), TAPROOT.into(), "bc1pabc".into()]);
    }

    #[test]
    fn test_pick_address_prefers_taproot() {
        let candidates = vec!["bc1qxyz".to_string(), TAPROOT.to_string()];
        assert_eq!(pick_address(&candidates, Network::Bitcoin).as_deref(), Some(TAPROOT));
        assert_eq!(pick_address(&candidates, Network::Signet).as_deref(), Some("bc1qxyz"));
        assert_eq!(pick_address(&[], Network::Bitcoin), None);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!({"connected": true})));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!({"connected": false})));
        assert!(!is_truthy(&json!({"connected": "yes"})));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(1)));
    }

    #[test]
    fn test_extract_txid() {
        assert_eq!(extract_txid(&json!("abcd")), Some("abcd".into()));
        assert_eq!(extract_txid(&json!({"txId": "ef01"})), Some("ef01".into()));
        assert_eq!(extract_txid(&json!("")), None);
        assert_eq!(extract_txid(&json!(42)), None);
    }

    #[test]
    fn test_error_display_hides_report() {
        let probe = ProbeReport { wallet: "oyl".into(), methods: vec![("signPsbt".into(), false)] };
        let err = HandshakeError::SigningRejected { reason: "User rejected".into(), probe };
        assert_eq!(err.to_string(), "Failed to sign transaction: User rejected");
        assert_eq!(err.kind(), FailureKind::SigningRejected);
        assert!(err.probe().unwrap().absent().contains(&"signPsbt"));
    }

    #[test]
    fn test_state_serializes_tagged() {
        let state = MintState::Error { kind: FailureKind::BuilderError, message: "boom".into() };
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({"state": "error", "kind": "builderError", "message": "boom"}));
        assert!(MintState::Signing.is_busy());
        assert!(!MintState::Done { txid: "x".into() }.is_busy());
    }
}
