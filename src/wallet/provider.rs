//! WalletProvider - the seam to an injected wallet object
//!
//! A provider is an untyped bag of maybe-present methods. Everything above
//! this trait works with `WalletCapability` instead of probing ad hoc.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("method not available: {0}")]
    Missing(String),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Response(String),
}

#[async_trait(?Send)]
pub trait WalletProvider {
    /// Vendor name, as discovered (e.g. `oyl`)
    fn name(&self) -> &str;

    /// Whether a (possibly dotted) method path resolves to a function
    fn has_method(&self, path: &str) -> bool;

    /// Invoke a method path; promises are awaited by the implementation
    async fn call(&self, path: &str, args: Vec<Value>) -> Result<Value, ProviderError>;
}

#[async_trait(?Send)]
impl<P: WalletProvider + ?Sized> WalletProvider for Box<P> {
    fn name(&self) -> &str { (**self).name() }
    fn has_method(&self, path: &str) -> bool { (**self).has_method(path) }
    async fn call(&self, path: &str, args: Vec<Value>) -> Result<Value, ProviderError> { (**self).call(path, args).await }
}

/// Which method paths were present when a wallet was probed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub wallet: String,
    pub methods: Vec<(String, bool)>,
}

impl ProbeReport {
    pub fn probe<P: WalletProvider + ?Sized>(provider: &P, paths: &[&str]) -> Self {
        Self {
            wallet: provider.name().to_string(),
            methods: paths.iter().map(|p| (p.to_string(), provider.has_method(p))).collect(),
        }
    }

    pub fn present(&self) -> Vec<&str> {
        self.methods.iter().filter(|(_, ok)| *ok).map(|(p, _)| p.as_str()).collect()
    }

    pub fn absent(&self) -> Vec<&str> {
        self.methods.iter().filter(|(_, ok)| !*ok).map(|(p, _)| p.as_str()).collect()
    }

    pub fn is_present(&self, path: &str) -> bool {
        self.methods.iter().any(|(p, ok)| *ok && p == path)
    }
}

impl std::fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: present=[{}] absent=[{}]", self.wallet, self.present().join(", "), self.absent().join(", "))
    }
}
