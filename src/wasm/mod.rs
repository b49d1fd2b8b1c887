//! WASM module: the handshake client in the browser
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        MethaneMinter (JS API)           │
//! │  connect, mint, onState, state          │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   MintSession (wallet::session)         │
//! │  connect → fetch → sign → broadcast     │
//! └────────┬───────────────────────┬────────┘
//!          │                       │
//! ┌────────▼────────┐   ┌──────────▼────────┐
//! │ JsWalletProvider│   │ HttpTemplateSource│
//! │ window.<wallet> │   │ fetch (reqwest)   │
//! └─────────────────┘   └───────────────────┘
//! ```

mod minter;
mod provider;

pub use minter::MethaneMinter;
pub use provider::{available_wallets, JsWalletProvider};

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Injected wallets present on `window`, in discovery order
#[wasm_bindgen(js_name = "detectWallets")]
pub fn detect_wallets() -> js_sys::Array {
    available_wallets().into_iter().map(JsValue::from).collect()
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
