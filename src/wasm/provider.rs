//! JsWalletProvider - reflection over an injected `window.<wallet>` object

use crate::core::paths::injected;
use crate::wallet::{ProviderError, WalletProvider};
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

pub struct JsWalletProvider {
    name: String,
    object: JsValue,
}

impl JsWalletProvider {
    pub fn new(name: impl Into<String>, object: JsValue) -> Self {
        Self { name: name.into(), object }
    }

    /// `window[name]`, if it is an object
    pub fn from_window(name: &str) -> Option<Self> {
        let window = web_sys::window()?;
        let object = Reflect::get(&window, &JsValue::from_str(name)).ok()?;
        object.is_object().then(|| Self::new(name, object))
    }

    /// First injected wallet in discovery order
    pub fn discover() -> Option<Self> {
        injected::DISCOVERY_ORDER.iter().find_map(|name| Self::from_window(name))
    }

    /// Walk a dotted path; returns the receiver and the function
    fn resolve(&self, path: &str) -> Option<(JsValue, Function)> {
        let mut this = JsValue::UNDEFINED;
        let mut target = self.object.clone();
        for part in path.split('.') {
            if !target.is_object() {
                return None;
            }
            this = target;
            target = Reflect::get(&this, &JsValue::from_str(part)).ok()?;
        }
        target.dyn_into::<Function>().ok().map(|f| (this, f))
    }
}

#[async_trait(?Send)]
impl WalletProvider for JsWalletProvider {
    fn name(&self) -> &str { &self.name }

    fn has_method(&self, path: &str) -> bool { self.resolve(path).is_some() }

    async fn call(&self, path: &str, args: Vec<Value>) -> Result<Value, ProviderError> {
        let (this, function) = self.resolve(path).ok_or_else(|| ProviderError::Missing(path.to_string()))?;
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let js_args = Array::new();
        for arg in &args {
            let value = arg.serialize(&serializer).map_err(|e| ProviderError::Response(e.to_string()))?;
            js_args.push(&value);
        }

        let result = function.apply(&this, &js_args).map_err(|e| ProviderError::Rejected(js_error_message(&e)))?;
        let result = match result.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(|e| ProviderError::Rejected(js_error_message(&e)))?,
            Err(value) => value,
        };
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::Response(e.to_string()))
    }
}

/// Names of injected wallets present on `window`, in discovery order
pub fn available_wallets() -> Vec<String> {
    injected::DISCOVERY_ORDER
        .iter()
        .filter(|name| JsWalletProvider::from_window(name).is_some())
        .map(|name| name.to_string())
        .collect()
}

pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    if let Some(text) = value.as_string() {
        return text;
    }
    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
