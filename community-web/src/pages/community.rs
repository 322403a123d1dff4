//! Community Page - treasury, funding polls and poll creation

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use lib_core::core_config;
use lib_web::{CommunityService, PollDraft, PollService};
use shared::{short_address, Community, Poll};

use crate::components::Notice;
use crate::services::BrowserStore;
use crate::state::wallet::use_wallet_context;

/// A listed poll plus what the connected account needs to act on it.
#[derive(Debug, Clone, PartialEq)]
struct PollEntry {
    poll: Poll,
    has_voted: bool,
    winner: Option<u64>,
}

fn poll_service() -> PollService<BrowserStore> {
    PollService::from_config(core_config(), BrowserStore)
}

#[component]
pub fn CommunityPage() -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let params = use_params_map();
    let community_id = Memo::new(move |_| {
        params.with(|p| p.get("id").and_then(|id| id.parse::<u64>().ok()))
    });

    view! {
        <div class="page">
            <A href="/">
                <span class="link-button">"Back to Communities"</span>
            </A>
            {move || match (community_id.get(), wallet_ctx.is_connected()) {
                (None, _) => view! {
                    <div class="card"><p>"Community not found"</p></div>
                }.into_any(),
                (Some(_), false) => view! {
                    <div class="card">
                        <p class="muted">"Connect your wallet to view this community"</p>
                        <Notice message=wallet_ctx.notice/>
                        <button class="btn" on:click=move |_| wallet_ctx.connect()>
                            "Connect MetaMask"
                        </button>
                    </div>
                }.into_any(),
                (Some(id), true) => view! { <CommunityDetail community_id=id/> }.into_any(),
            }}
        </div>
    }
}

#[component]
fn CommunityDetail(community_id: u64) -> impl IntoView {
    let wallet_ctx = use_wallet_context();

    let community = RwSignal::new(None::<Community>);
    let polls = RwSignal::new(Vec::<PollEntry>::new());
    let loading = RwSignal::new(true);
    let busy = RwSignal::new(false);
    let refresh = RwSignal::new(0u32);
    let contribution = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let success = RwSignal::new(None::<String>);

    let load = move || {
        let Some(signer) = wallet_ctx.signer() else {
            return;
        };
        loading.set(true);
        spawn_local(async move {
            match CommunityService::from_config(core_config()).get(&signer, community_id).await {
                Ok(found) => community.set(Some(found)),
                Err(e) => {
                    log::error!("[COMMUNITY] Error loading community {}: {}", community_id, e);
                    error.set(Some(e.user_message_or("Failed to load community")));
                }
            }

            let service = poll_service();
            match service.list(&signer, community_id).await {
                Ok(list) => {
                    let mut entries = Vec::with_capacity(list.len());
                    for poll in list {
                        let has_voted = service
                            .has_voted(&signer, community_id, poll.id)
                            .await
                            .unwrap_or_else(|e| {
                                log::warn!("[COMMUNITY] hasVoted({}) failed: {}", poll.id, e);
                                false
                            });
                        let winner = if poll.is_closed {
                            service.winning_option(&signer, community_id, poll.id).await.ok()
                        } else {
                            None
                        };
                        entries.push(PollEntry { poll, has_voted, winner });
                    }
                    polls.set(entries);
                }
                Err(e) => log::error!("[COMMUNITY] Error loading polls: {}", e),
            }
            loading.set(false);
        });
    };

    // Re-load on account changes and after every confirmed transaction.
    Effect::new(move |_| {
        refresh.track();
        let ready = wallet_ctx
            .connection
            .with(|state| state.account.is_some() && state.signer_ready);
        if ready {
            load();
        }
    });

    let contribute = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(signer) = wallet_ctx.signer() else {
            error.set(Some("Wallet not connected".to_string()));
            return;
        };
        let amount = contribution.get_untracked();
        busy.set(true);
        spawn_local(async move {
            match CommunityService::from_config(core_config())
                .contribute(&signer, community_id, &amount)
                .await
            {
                Ok(()) => {
                    contribution.set(String::new());
                    success.set(Some("Contribution successful!".to_string()));
                    refresh.update(|n| *n += 1);
                }
                Err(e) => {
                    log::error!("[COMMUNITY] Error contributing: {}", e);
                    error.set(Some(e.user_message_or("Contribution failed")));
                }
            }
            busy.set(false);
        });
    };

    view! {
        <Notice message=error/>
        <Notice message=success success=true/>

        {move || community.get().map(|c| view! {
            <div class="card">
                <h1>{c.name}</h1>
                <p class="muted">{c.description}</p>
                <div class="community-meta">
                    <span>"Creator: " {short_address(&c.creator)}</span>
                    <span>"Created: " {c.creation_time}</span>
                </div>
                <div class="treasury">
                    <span class="muted">"Treasury"</span>
                    <strong>{c.treasury} " ETH"</strong>
                </div>
                <form class="form inline" on:submit=contribute>
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

        <CreatePollForm
            community_id=community_id
            polls=polls
            error=error
            success=success
            refresh=refresh
        />

        <div class="card">
            <h2>"Funding Polls"</h2>
            <Show
                when=move || !loading.get()
                fallback=|| view! { <p class="muted">"Loading polls..."</p> }
            >
                <Show
                    when=move || polls.with(|list| !list.is_empty())
                    fallback=|| view! { <p class="muted">"No polls yet."</p> }
                >
                    <For
                        each=move || polls.get()
                        key=|entry| {
                            (entry.poll.id, entry.has_voted, entry.poll.is_closed, entry.poll.total_votes)
                        }
                        children=move |entry| view! {
                            <PollCard community_id=community_id entry=entry error=error success=success refresh=refresh/>
                        }
                    />
                </Show>
            </Show>
        </div>
    }
}

#[component]
fn PollCard(
    community_id: u64,
    entry: PollEntry,
    error: RwSignal<Option<String>>,
    success: RwSignal<Option<String>>,
    refresh: RwSignal<u32>,
) -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let busy = RwSignal::new(false);
    let PollEntry { poll, has_voted, winner } = entry;
    let poll_id = poll.id;
    let can_vote = !poll.is_closed && !has_voted;

    let vote = move |option: u64| {
        let Some(signer) = wallet_ctx.signer() else {
            error.set(Some("Wallet not connected".to_string()));
            return;
        };
        busy.set(true);
        spawn_local(async move {
            match poll_service().vote(&signer, community_id, poll_id, option).await {
                Ok(()) => {
                    success.set(Some("Vote cast successfully!".to_string()));
                    refresh.update(|n| *n += 1);
                }
                Err(e) => {
                    log::error!("[COMMUNITY] Error voting on poll {}: {}", poll_id, e);
                    error.set(Some(e.user_message_or("Voting failed")));
                }
            }
            busy.set(false);
        });
    };

    let close = move |_| {
        let Some(signer) = wallet_ctx.signer() else {
            error.set(Some("Wallet not connected".to_string()));
            return;
        };
        busy.set(true);
        spawn_local(async move {
            match poll_service().close(&signer, community_id, poll_id).await {
                Ok(()) => {
                    success.set(Some("Poll closed and funds distributed".to_string()));
                    refresh.update(|n| *n += 1);
                }
                Err(e) => {
                    log::error!("[COMMUNITY] Error closing poll {}: {}", poll_id, e);
                    error.set(Some(e.user_message_or("Closing poll failed")));
                }
            }
            busy.set(false);
        });
    };

    let status = if poll.is_closed { "Closed" } else { "Active" };
    let options = poll
        .options
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let recipient = poll.recipients.get(index).map(|r| short_address(r));
            let won = winner == Some(index as u64);
            view! {
                <li class="poll-option" class:winner=won>
                    <span>{label.clone()}</span>
                    {recipient.map(|r| view! { <span class="muted small">" -> " {r}</span> })}
                    {can_vote.then(|| view! {
                        <button
                            class="btn btn-small"
                            disabled=move || busy.get()
                            on:click=move |_| vote(index as u64)
                        >
                            "Vote"
                        </button>
                    })}
                </li>
            }
        })
        .collect_view();

    view! {
        <div class="poll-card">
            <div class="card-header">
                <h3>{poll.question.clone()}</h3>
                <span class="status-badge">{status}</span>
            </div>
            <div class="community-meta">
                <span>"Fund: " {poll.total_fund.clone()} " ETH"</span>
                <span>"Votes: " {poll.total_votes}</span>
                <span>"Ends: " {poll.end_time.clone()}</span>
            </div>
            {(!poll.details_cached).then(|| view! {
                <p class="muted small">"Option details are not available in this browser"</p>
            })}
            <ul class="poll-options">{options}</ul>
            {has_voted.then(|| view! { <p class="muted small">"You have voted on this poll"</p> })}
            {(!poll.is_closed).then(|| view! {
                <button class="link-button" disabled=move || busy.get() on:click=close>
                    "Close Poll"
                </button>
            })}
        </div>
    }
}

#[component]
fn CreatePollForm(
    community_id: u64,
    polls: RwSignal<Vec<PollEntry>>,
    error: RwSignal<Option<String>>,
    success: RwSignal<Option<String>>,
    refresh: RwSignal<u32>,
) -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let draft = RwSignal::new(PollDraft::default());
    let show = RwSignal::new(false);
    let busy = RwSignal::new(false);

    let create_poll = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(signer) = wallet_ctx.signer() else {
            error.set(Some("Wallet not connected".to_string()));
            return;
        };
        let form = draft.get_untracked();
        // Report form mistakes before the wallet prompt.
        if let Err(e) = form.validate() {
            error.set(Some(e.user_message_or("Failed to create poll")));
            return;
        }
        let listed = polls.with_untracked(|list| list.len() as u64);
        busy.set(true);
        spawn_local(async move {
            match poll_service().create(&signer, community_id, &form, listed).await {
                Ok(poll_id) => {
                    log::info!("[COMMUNITY] poll {} created", poll_id);
                    draft.set(PollDraft::default());
                    show.set(false);
                    success.set(Some("Poll created successfully!".to_string()));
                    refresh.update(|n| *n += 1);
                }
                Err(e) => {
                    log::error!("[COMMUNITY] Error creating poll: {}", e);
                    error.set(Some(e.user_message_or("Failed to create poll")));
                }
            }
            busy.set(false);
        });
    };

    let row = move |index: usize| {
        let validity = move || draft.with(|d| d.recipient_validity(index));
        view! {
            <div class="poll-row">
                <input
                    type="text"
                    placeholder=format!("Option {}", index + 1)
                    prop:value=move || draft.with(|d| d.options.get(index).cloned().unwrap_or_default())
                    on:input=move |ev| draft.update(|d| d.set_option(index, event_target_value(&ev)))
                />
                <input
                    type="text"
                    placeholder="Recipient address (0x...)"
                    class:invalid=move || validity() == Some(false)
                    class:valid=move || validity() == Some(true)
                    prop:value=move || draft.with(|d| d.recipients.get(index).cloned().unwrap_or_default())
                    on:input=move |ev| draft.update(|d| d.set_recipient(index, event_target_value(&ev)))
                />
                <button
                    type="button"
                    class="link-button"
                    disabled=move || draft.with(|d| d.rows() <= lib_web::MIN_OPTIONS)
                    on:click=move |_| draft.update(|d| {
                        d.remove_row(index);
                    })
                >
                    "Remove"
                </button>
            </div>
        }
    };

    view! {
        <div class="card">
            <div class="card-header">
                <h2>"Create Funding Poll"</h2>
                <button class="link-button" on:click=move |_| show.update(|open| *open = !*open)>
                    {move || if show.get() { "Cancel" } else { "New Poll" }}
                </button>
            </div>
            <Show when=move || show.get()>
                <form class="form" on:submit=create_poll>
                    <label>"Question"</label>
                    <input
                        type="text"
                        placeholder="What should we fund?"
                        prop:value=move || draft.with(|d| d.question.clone())
                        on:input=move |ev| draft.update(|d| d.question = event_target_value(&ev))
                    />

                    <label>"Options and recipients"</label>
                    <For
                        each=move || 0..draft.with(PollDraft::rows)
                        key=|index| *index
                        children=row
                    />
                    <button type="button" class="link-button" on:click=move |_| draft.update(PollDraft::add_row)>
                        "Add Option"
                    </button>

                    <label>"Duration (days)"</label>
                    <input
                        type="number"
                        min="1"
                        prop:value=move || draft.with(|d| d.duration_days.to_string())
                        on:input=move |ev| {
                            let days = event_target_value(&ev).trim().parse::<u64>().unwrap_or(0);
                            draft.update(|d| d.duration_days = days);
                        }
                    />

                    <label>"Total Fund (ETH)"</label>
                    <input
                        type="text"
                        inputmode="decimal"
                        placeholder="0.5"
                        prop:value=move || draft.with(|d| d.total_fund.clone())
                        on:input=move |ev| draft.update(|d| d.total_fund = event_target_value(&ev))
                    />

                    <button type="submit" class="btn" disabled=move || busy.get()>"Create Poll"</button>
                </form>
            </Show>
        </div>
    }
}
