//! CommunityDAO - Leptos Frontend
//!
//! Browser front end for the community funding contracts: MetaMask connection,
//! DAO membership, communities and their funding polls.

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

mod app;
mod components;
mod pages;
mod services;
mod state;

use app::App;

#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("[APP] CommunityDAO starting");

    // Bad build-time configuration falls back to the defaults; the contracts will
    // reject calls against wrong addresses, so keep the page usable.
    if let Err(e) = lib_core::init_config() {
        log::error!("[APP] invalid configuration: {}", e);
    }

    leptos::mount::mount_to_body(|| view! { <App/> });
}
