use crate::eip1193::error::Eip1193Error;
use js_sys::Object;
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsValue};

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, Debug)]
    /// An EIP-1193 provider object. Available by convention at `window.ethereum`
    pub(crate) type InjectedEthereum;

    #[wasm_bindgen(catch, method)]
    pub(crate) async fn request(_: &InjectedEthereum, args: Object) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method)]
    pub(crate) fn on(
        _: &InjectedEthereum,
        eventName: &str,
        listener: &Closure<dyn FnMut(JsValue)>,
    );

    #[wasm_bindgen(method, js_name = "removeListener")]
    pub(crate) fn remove_listener(
        _: &InjectedEthereum,
        eventName: &str,
        listener: &Closure<dyn FnMut(JsValue)>,
    );
}

impl InjectedEthereum {
    pub(crate) fn default_opt() -> Result<Self, Eip1193Error> {
        if let Ok(Some(eth)) = get_provider_js() {
            Ok(eth)
        } else {
            Err(Eip1193Error::NotInjected)
        }
    }
}

#[wasm_bindgen(inline_js = "export function get_provider_js() {return window.ethereum}")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn get_provider_js() -> Result<Option<InjectedEthereum>, JsValue>;
}
