//! Inline message banner

use leptos::prelude::*;

/// Error or success banner; renders nothing while `message` is `None`.
#[component]
pub fn Notice(message: RwSignal<Option<String>>, #[prop(optional)] success: bool) -> impl IntoView {
    let class = if success { "notice notice-success" } else { "notice notice-error" };

    move || {
        message.get().map(|text| {
            view! {
                <div class=class>
                    <span>{text}</span>
                    <button class="notice-close" on:click=move |_| message.set(None)>"×"</button>
                </div>
            }
        })
    }
}
