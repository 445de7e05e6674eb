use wasm_bindgen::{JsError, JsValue};

pub type WasmResult<T> = std::result::Result<T, JsError>;

/// For callbacks handed to JS, which must reject with a plain `JsValue`.
pub(crate) fn to_js_value<E: std::error::Error>(err: E) -> JsValue {
    JsError::from(err).into()
}
