//! WalletCapability - vendor API shape, resolved once per attempt

use super::provider::{ProbeReport, WalletProvider};
use crate::core::paths::wallet as paths;

/// Known wallet API shapes, in discovery order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletCapability {
    /// Top-level `signPsbt` + `pushPsbt` (OYL, Unisat)
    Direct,
    /// `bitcoin.signPsbt` + `bitcoin.pushPsbt` (older OYL builds)
    BitcoinNamespace,
    /// `signPsbt` + `pushTx` broadcasting raw hex
    RawTx,
    /// Sign and push methods split across namespaces
    Mixed { sign: &'static str, broadcast: &'static str },
    /// A sign method with nothing to broadcast through
    SignOnly { sign: &'static str },
    /// No signing surface at all
    ConnectOnly,
}

const DISCOVERY: &[WalletCapability] = &[
    WalletCapability::Direct,
    WalletCapability::BitcoinNamespace,
    WalletCapability::RawTx,
];

impl WalletCapability {
    /// Walk the discovery list, then pair whatever sign and push methods exist
    pub fn discover<P: WalletProvider + ?Sized>(provider: &P) -> Self {
        let found = DISCOVERY.iter().copied().find(|shape| {
            let (sign, push) = (shape.sign_method(), shape.broadcast_method());
            sign.map(|m| provider.has_method(m)).unwrap_or(false) && push.map(|m| provider.has_method(m)).unwrap_or(false)
        });
        if let Some(shape) = found {
            return shape;
        }
        let Some(sign) = paths::SIGN_METHODS.iter().copied().find(|m| provider.has_method(m)) else {
            return WalletCapability::ConnectOnly;
        };
        match paths::PUSH_METHODS.iter().copied().find(|m| provider.has_method(m)) {
            Some(broadcast) => WalletCapability::Mixed { sign, broadcast },
            None => WalletCapability::SignOnly { sign },
        }
    }

    pub fn sign_method(&self) -> Option<&'static str> {
        match self {
            WalletCapability::Direct | WalletCapability::RawTx => Some(paths::SIGN_PSBT),
            WalletCapability::BitcoinNamespace => Some(paths::BITCOIN_SIGN_PSBT),
            WalletCapability::Mixed { sign, .. } | WalletCapability::SignOnly { sign } => Some(*sign),
            WalletCapability::ConnectOnly => None,
        }
    }

    pub fn broadcast_method(&self) -> Option<&'static str> {
        match self {
            WalletCapability::Direct => Some(paths::PUSH_PSBT),
            WalletCapability::BitcoinNamespace => Some(paths::BITCOIN_PUSH_PSBT),
            WalletCapability::RawTx => Some(paths::PUSH_TX),
            WalletCapability::Mixed { broadcast, .. } => Some(*broadcast),
            WalletCapability::SignOnly { .. } | WalletCapability::ConnectOnly => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletCapability::Direct => "direct",
            WalletCapability::BitcoinNamespace => "bitcoin-namespace",
            WalletCapability::RawTx => "raw-tx",
            WalletCapability::Mixed { .. } => "mixed",
            WalletCapability::SignOnly { .. } => "sign-only",
            WalletCapability::ConnectOnly => "connect-only",
        }
    }
}

/// Capability plus the probe that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWallet {
    pub capability: WalletCapability,
    pub probe: ProbeReport,
}

impl ResolvedWallet {
    pub fn resolve<P: WalletProvider + ?Sized>(provider: &P) -> Self {
        Self { capability: WalletCapability::discover(provider), probe: ProbeReport::probe(provider, paths::ALL) }
    }

    /// First present connect-style method
    pub fn connect_method(&self) -> Option<&'static str> {
        paths::CONNECT_METHODS.iter().copied().find(|m| self.probe.is_present(m))
    }

    pub fn address_methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        paths::ADDRESS_METHODS.iter().copied().filter(|m| self.probe.is_present(m))
    }

    pub fn has_is_connected(&self) -> bool { self.probe.is_present(paths::IS_CONNECTED) }
}
