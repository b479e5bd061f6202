use log::Level;

/// Routes `log` records to the browser console and panics to `console.error`.
///
/// Outside of wasm32 the host application owns the logger and this does nothing.
pub fn init(level: Level) {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(level) {
            log::warn!("Logger already initialized: {err}");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = level;
}
