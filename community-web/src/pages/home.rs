//! Home Page - wallet connection, DAO membership and the community list

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use lib_core::core_config;
use lib_evm::detector::vendor_list;
use lib_evm::ConnectionPhase;
use lib_web::{CommunityService, MembershipService};
use shared::{format_ether, short_address, Community, MembershipStatus, NewCommunity};

use crate::components::Notice;
use crate::state::wallet::{open_in_new_tab, use_wallet_context};

#[component]
pub fn HomePage() -> impl IntoView {
    let wallet_ctx = use_wallet_context();

    view! {
        <div class="page">
            {move || {
                if wallet_ctx.is_connected() {
                    view! { <Dashboard/> }.into_any()
                } else {
                    view! { <Welcome/> }.into_any()
                }
            }}
        </div>
    }
}

/// Not connected: install or connect prompt.
#[component]
fn Welcome() -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let install_url = core_config().wallet_install_url.clone();

    let phase = move || wallet_ctx.connection.with(|state| state.phase);
    let available = move || wallet_ctx.connection.with(|state| state.vendor_available);
    let detected = move || {
        wallet_ctx
            .connection
            .with(|state| vendor_list(&state.detected_vendors))
    };

    view! {
        <div class="card welcome-card">
            <h1>"Welcome to CommunityDAO"</h1>
            <p class="muted">
                "Connect your MetaMask wallet to join communities and participate in funding decisions"
            </p>
            <Notice message=wallet_ctx.notice/>
            {move || match phase() {
                ConnectionPhase::Uninitialized | ConnectionPhase::Scanning => {
                    view! { <p class="muted">"Checking for MetaMask..."</p> }.into_any()
                }
                _ if !available() => {
                    let install_url = install_url.clone();
                    let found = detected();
                    view! {
                        <div class="warning-box">
                            <strong>"MetaMask not found"</strong>
                            <p>"Please install MetaMask to continue"</p>
                            {(!found.is_empty()).then(|| view! { <p class="muted">"Detected: " {found}</p> })}
                        </div>
                        <button class="btn btn-warning" on:click=move |_| open_in_new_tab(&install_url)>
                            "Install MetaMask"
                        </button>
                    }.into_any()
                }
                _ => view! {
                    <button
                        class="btn"
                        disabled=move || wallet_ctx.connecting.get()
                        on:click=move |_| wallet_ctx.connect()
                    >
                        "Connect MetaMask Wallet"
                    </button>
                    <p class="muted small">"You will be prompted to connect your wallet securely"</p>
                }.into_any(),
            }}
        </div>
    }
}

/// Connected: membership, community creation and the community list.
#[component]
fn Dashboard() -> impl IntoView {
    let wallet_ctx = use_wallet_context();

    let communities = RwSignal::new(Vec::<Community>::new());
    let membership = RwSignal::new(MembershipStatus::default());
    let total_members = RwSignal::new(None::<u64>);
    let loading = RwSignal::new(false);
    let busy = RwSignal::new(false);
    let show_create = RwSignal::new(false);
    let form = RwSignal::new(NewCommunity::default());
    let contribution = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let success = RwSignal::new(None::<String>);

    let fee = format_ether(core_config().registration_fee_wei);

    let load_communities = move || {
        let Some(signer) = wallet_ctx.signer() else {
            return;
        };
        loading.set(true);
        spawn_local(async move {
            match CommunityService::from_config(core_config()).list(&signer).await {
                Ok(list) => communities.set(list),
                Err(e) => log::error!("[HOME] Error loading communities: {}", e),
            }
            loading.set(false);
        });
    };

    let check_membership = move || {
        let Some(signer) = wallet_ctx.signer() else {
            return;
        };
        spawn_local(async move {
            let service = MembershipService::from_config(core_config());
            membership.set(service.status(&signer).await);
            match service.total_members(&signer).await {
                Ok(total) => total_members.set(Some(total)),
                Err(e) => log::warn!("[HOME] Error reading member count: {}", e),
            }
        });
    };

    // Reload whenever the account or its signer changes.
    Effect::new(move |_| {
        let ready = wallet_ctx
            .connection
            .with(|state| (state.account.clone(), state.signer_ready));
        if let (Some(_), true) = ready {
            load_communities();
            check_membership();
        }
    });

    let register = move |_| {
        let Some(signer) = wallet_ctx.signer() else {
            error.set(Some("Wallet not connected".to_string()));
            return;
        };
        busy.set(true);
        spawn_local(async move {
            match MembershipService::from_config(core_config()).register(&signer).await {
                Ok(status) => {
                    membership.set(status);
                    success.set(Some("Successfully registered as member!".to_string()));
                }
                Err(e) => {
                    log::error!("[HOME] Error registering: {}", e);
                    error.set(Some(e.user_message_or("Registration failed")));
                }
            }
            busy.set(false);
        });
    };

    let add_contribution = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(signer) = wallet_ctx.signer() else {
            error.set(Some("Wallet not connected".to_string()));
            return;
        };
        let amount = contribution.get_untracked();
        busy.set(true);
        spawn_local(async move {
            match MembershipService::from_config(core_config())
                .add_contribution(&signer, &amount)
                .await
            {
                Ok(status) => {
                    membership.set(status);
                    contribution.set(String::new());
                    success.set(Some("Contribution added!".to_string()));
                }
                Err(e) => {
                    log::error!("[HOME] Error adding contribution: {}", e);
                    error.set(Some(e.user_message_or("Contribution failed")));
                }
            }
            busy.set(false);
        });
    };

    let create_community = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(signer) = wallet_ctx.signer() else {
            error.set(Some("Wallet not connected".to_string()));
            return;
        };
        let draft = form.get_untracked();
        busy.set(true);
        spawn_local(async move {
            match CommunityService::from_config(core_config()).create(&signer, &draft).await {
                Ok(id) => {
                    log::info!("[HOME] community created: {:?}", id);
                    form.set(NewCommunity::default());
                    show_create.set(false);
                    success.set(Some("Community created successfully!".to_string()));
                    load_communities();
                }
                Err(e) => {
                    log::error!("[HOME] Error creating community: {}", e);
                    error.set(Some(e.user_message_or("Community creation failed")));
                }
            }
            busy.set(false);
        });
    };

    view! {
        <header class="dashboard-header">
            <span class="account-badge">
                {move || wallet_ctx.account().map(|a| short_address(&a)).unwrap_or_default()}
            </span>
            {move || membership.get().is_member.then(|| view! {
                <span class="power-badge">"Voting Power: " {membership.get().voting_power}</span>
            })}
            {move || total_members.get().map(|total| view! {
                <span class="muted small">{total} " DAO members"</span>
            })}
        </header>

        <Notice message=error/>
        <Notice message=success success=true/>

        {move || (!membership.get().is_member).then(|| {
            let fee = fee.clone();
            view! {
                <div class="card membership-card">
                    <h2>"Become a DAO Member"</h2>
                    <p>
                        "Join the DAO by contributing " {fee.clone()}
                        " ETH to get voting rights and participate in community decisions"
                    </p>
                    <button class="btn btn-warning" disabled=move || busy.get() on:click=register>
                        "Register Member (" {fee} " ETH)"
                    </button>
                </div>
            }
        })}

        {move || membership.get().is_member.then(|| view! {
            <div class="card">
                <h2>"Add Contribution"</h2>
                <p class="muted">"Contributing more ETH to the DAO raises your voting power"</p>
                <form class="form inline" on:submit=add_contribution>
                    <input
                        type="text"
                        inputmode="decimal"
                        placeholder="Amount in ETH"
                        prop:value=move || contribution.get()
                        on:input=move |ev| contribution.set(event_target_value(&ev))
                    />
                    <button type="submit" class="btn" disabled=move || busy.get()>"Contribute"</button>
                </form>
            </div>
        })}

        {move || membership.get().is_member.then(|| view! {
            <div class="card">
                <div class="card-header">
                    <h2>"Create New Community"</h2>
                    <button class="link-button" on:click=move |_| show_create.update(|open| *open = !*open)>
                        {move || if show_create.get() { "Cancel" } else { "New Community" }}
                    </button>
                </div>
                <Show when=move || show_create.get()>
                    <form class="form" on:submit=create_community>
                        <label>"Community Name"</label>
                        <input
                            type="text"
                            placeholder="Enter community name"
                            required
                            prop:value=move || form.with(|f| f.name.clone())
                            on:input=move |ev| form.update(|f| f.name = event_target_value(&ev))
                        />
                        <label>"Description"</label>
                        <textarea
                            rows="3"
                            placeholder="Describe your community's purpose"
                            required
                            prop:value=move || form.with(|f| f.description.clone())
                            on:input=move |ev| form.update(|f| f.description = event_target_value(&ev))
                        ></textarea>
                        <button type="submit" class="btn" disabled=move || busy.get()>"Create Community"</button>
                    </form>
                </Show>
            </div>
        })}

        <div class="card">
            <div class="card-header">
                <h2>"Communities"</h2>
                <span class="muted small">{move || format!("{} communities", communities.with(Vec::len))}</span>
            </div>
            <Show
                when=move || !loading.get()
                fallback=|| view! { <p class="muted">"Loading communities..."</p> }
            >
                <Show
                    when=move || communities.with(|list| !list.is_empty())
                    fallback=|| view! { <p class="muted">"No communities yet."</p> }
                >
                    <div class="community-grid">
                        <For
                            each=move || communities.get()
                            key=|community| community.id
                            children=move |community| view! { <CommunityCard community=community/> }
                        />
                    </div>
                </Show>
            </Show>
        </div>
    }
}

#[component]
fn CommunityCard(community: Community) -> impl IntoView {
    let href = format!("/communities/{}", community.id);

    view! {
        <A href=href>
            <div class="community-card">
                <h3>{community.name}</h3>
                <p class="muted">{community.description}</p>
                <div class="community-meta">
                    <span>"Treasury: " {community.treasury} " ETH"</span>
                    <span>"Created: " {community.creation_time}</span>
                </div>
                <span class="muted small">"Creator: " {short_address(&community.creator)}</span>
            </div>
        </A>
    }
}
