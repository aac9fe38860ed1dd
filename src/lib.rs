pub mod core;
pub mod services;
#[cfg(not(target_arch = "wasm32"))]
pub mod ui;
