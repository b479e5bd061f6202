use crate::eip1193::error::Eip1193Error;
use js_sys::{Object, Reflect};
use wasm_bindgen::JsValue;

/// Builds the `{ method, params }` argument of `window.ethereum.request`
pub(crate) fn request_args(method: &str, params: &JsValue) -> Result<Object, Eip1193Error> {
    let args = Object::new();
    Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(method))?;
    Reflect::set(&args, &JsValue::from_str("params"), params)?;
    Ok(args)
}
