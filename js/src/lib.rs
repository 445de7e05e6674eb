#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod error;
pub mod format;
pub mod utils;

use log::LevelFilter;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_logger(LevelFilter::Info);
}

/// Set the console log level: `"off"`, `"error"`, `"warn"`, `"info"`, `"debug"` or `"trace"`.
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsError> {
    let level: LevelFilter = level
        .parse()
        .map_err(|_| JsError::new(&format!("Unknown log level: {level}")))?;
    utils::init_logger(level);
    Ok(())
}
