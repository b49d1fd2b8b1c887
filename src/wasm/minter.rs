//! MethaneMinter: the handshake client as a JS class
//!
//! ```js
//! const minter = new MethaneMinter("http://localhost:3001");
//! minter.onState((s) => render(s));
//! const { txid } = await minter.mint(5);
//! ```

use super::log;
use super::provider::{js_error_message, JsWalletProvider};
use crate::mint::{MintData, Network};
use crate::wallet::{HandshakeError, HttpTemplateSource, MintSession, MintState};
use futures::lock::Mutex;
use serde::Serialize;
use std::rc::Rc;
use tokio::sync::watch;
use wasm_bindgen::prelude::*;

const DEFAULT_API_URL: &str = "http://localhost:3001";

type Session = MintSession<JsWalletProvider, HttpTemplateSource>;

#[wasm_bindgen]
pub struct MethaneMinter {
    session: Rc<Mutex<Session>>,
    state: watch::Receiver<MintState>,
    wallet: String,
}

#[wasm_bindgen]
impl MethaneMinter {
    /// Bind to an injected wallet (`wallet` name, else the first detected)
    #[wasm_bindgen(constructor)]
    pub fn new(api_url: Option<String>, wallet: Option<String>, network: Option<String>, mint_data: Option<String>) -> Result<MethaneMinter, JsValue> {
        let provider = match wallet.as_deref() {
            Some(name) => JsWalletProvider::from_window(name),
            None => JsWalletProvider::discover(),
        }
        .ok_or_else(|| JsError::new("No compatible wallet found. Please install the OYL wallet."))?;

        let network = match network.as_deref() {
            Some(raw) => raw.parse::<Network>().map_err(|e| JsError::new(&e))?,
            None => Network::default(),
        };
        let mint_data = match mint_data.as_deref() {
            Some(raw) => raw.parse::<MintData>().map_err(|e| JsError::new(&e.to_string()))?,
            None => MintData::default(),
        };

        let wallet = provider_name(&provider);
        let source = HttpTemplateSource::new(api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()));
        let session = MintSession::new(provider, source, network).with_mint_data(mint_data);
        let state = session.subscribe();
        log!("[MethaneMinter] wallet={} network={} mint={}", wallet, network, mint_data);
        Ok(Self { session: Rc::new(Mutex::new(session)), state, wallet })
    }

    #[wasm_bindgen(getter)]
    pub fn wallet(&self) -> String { self.wallet.clone() }

    /// Current `MintState` as a plain object
    pub fn state(&self) -> JsValue { to_js(&*self.state.borrow()) }

    /// Resolves to the connected address
    pub async fn connect(&self) -> Result<String, JsValue> {
        let mut session = self.session.try_lock().ok_or_else(busy)?;
        session.connect().await.map_err(handshake_error)
    }

    /// Resolves to `{txid, address, feeRate}`
    pub async fn mint(&self, fee_rate: u32) -> Result<JsValue, JsValue> {
        let mut session = self.session.try_lock().ok_or_else(busy)?;
        let receipt = session.mint(u64::from(fee_rate)).await.map_err(handshake_error)?;
        Ok(to_js(&receipt))
    }

    /// Call `callback(state)` now and on every later change
    #[wasm_bindgen(js_name = "onState")]
    pub fn on_state(&self, callback: js_sys::Function) {
        let mut rx = self.state.clone();
        wasm_bindgen_futures::spawn_local(async move {
            loop {
                let state = to_js(&*rx.borrow_and_update());
                if let Err(e) = callback.call1(&JsValue::NULL, &state) {
                    log!("[MethaneMinter] onState callback threw: {}", js_error_message(&e));
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
    }
}

fn provider_name(provider: &JsWalletProvider) -> String {
    use crate::wallet::WalletProvider;
    provider.name().to_string()
}

fn busy() -> JsValue { JsError::new("A mint is already in progress").into() }

fn handshake_error(err: HandshakeError) -> JsValue {
    if let Some(probe) = err.probe() {
        log!("[MethaneMinter] {:?}: {}", err.kind(), probe);
    }
    JsError::new(&err.to_string()).into()
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}
