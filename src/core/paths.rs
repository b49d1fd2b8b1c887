//! Path and method-name constants
//!
//! Centralized registry for HTTP routes and the wallet method paths the
//! handshake client probes. Dotted paths address vendor namespaces.

/// HTTP routes served by the PSBT builder
pub mod api {
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const CREATE_MINT_PSBT: &str = "/api/create-mint-psbt";

    pub const HEALTH_TEXT: &str = "Server is running";
    pub const PSBT_FORMAT: &str = "hex";
}

/// Wallet method paths
pub mod wallet {
    pub const IS_CONNECTED: &str = "isConnected";
    pub const CONNECT: &str = "connect";
    pub const REQUEST_ACCOUNTS: &str = "requestAccounts";
    pub const GET_ADDRESSES: &str = "getAddresses";
    pub const GET_ACCOUNTS: &str = "getAccounts";

    pub const SIGN_PSBT: &str = "signPsbt";
    pub const PUSH_PSBT: &str = "pushPsbt";
    pub const PUSH_TX: &str = "pushTx";

    pub const BITCOIN_SIGN_PSBT: &str = "bitcoin.signPsbt";
    pub const BITCOIN_PUSH_PSBT: &str = "bitcoin.pushPsbt";

    /// Connect-style methods, tried in order
    pub const CONNECT_METHODS: &[&str] = &[CONNECT, REQUEST_ACCOUNTS];
    /// Address-listing methods, tried in order
    pub const ADDRESS_METHODS: &[&str] = &[GET_ADDRESSES, GET_ACCOUNTS];
    /// Sign methods, tried in order when no full shape matches
    pub const SIGN_METHODS: &[&str] = &[SIGN_PSBT, BITCOIN_SIGN_PSBT];
    /// Broadcast methods, tried in order when no full shape matches
    pub const PUSH_METHODS: &[&str] = &[PUSH_PSBT, BITCOIN_PUSH_PSBT, PUSH_TX];

    /// Every path a probe report covers
    pub const ALL: &[&str] = &[
        IS_CONNECTED, CONNECT, REQUEST_ACCOUNTS, GET_ADDRESSES, GET_ACCOUNTS,
        SIGN_PSBT, PUSH_PSBT, PUSH_TX, BITCOIN_SIGN_PSBT, BITCOIN_PUSH_PSBT,
    ];
}

/// Injected wallet globals, in discovery order
pub mod injected {
    pub const OYL: &str = "oyl";
    pub const UNISAT: &str = "unisat";
    pub const XVERSE: &str = "xverse";
    pub const LEATHER: &str = "leather";
    pub const PHANTOM: &str = "phantom";

    pub const DISCOVERY_ORDER: &[&str] = &[OYL, UNISAT, XVERSE, LEATHER, PHANTOM];
}
