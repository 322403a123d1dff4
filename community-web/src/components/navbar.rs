//! Navigation Bar Component

use leptos::prelude::*;
use leptos_router::components::A;
use shared::short_address;

use crate::state::wallet::use_wallet_context;

#[component]
pub fn Navbar() -> impl IntoView {
    let wallet_ctx = use_wallet_context();

    let account_badge = move || {
        wallet_ctx
            .connection
            .with(|state| state.account.as_deref().map(short_address))
    };

    view! {
        <nav>
            <div style="max-width: 1200px; margin: 0 auto; padding: 0 24px; display: flex; justify-content: space-between; align-items: center;">
                <A href="/" attr:class="nav-link-clean">
                    <span class="nav-title">"CommunityDAO"</span>
                </A>
                {move || match account_badge() {
                    Some(short) => view! { <span class="account-badge">{short}</span> }.into_any(),
                    None => view! {
                        <button
                            class="btn"
                            disabled=move || wallet_ctx.connecting.get()
                            on:click=move |_| wallet_ctx.connect()
                        >
                            {move || if wallet_ctx.connecting.get() { "Connecting..." } else { "Connect MetaMask" }}
                        </button>
                    }.into_any(),
                }}
            </div>
        </nav>
    }
}
