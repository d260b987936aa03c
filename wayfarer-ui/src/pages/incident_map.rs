//! Incident Map Page
//!
//! Incidents on the map widget, a legend with per-type counts, and the report
//! dialog opened by double-clicking the map.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;

use wayfarer::api::recover;
use wayfarer::catalog::listing::{self, FilterQuery};
use wayfarer::map::{self, Incident, IncidentDraft, IncidentKind, DEFAULT_CENTER, DEFAULT_ZOOM};

use crate::api;
use crate::components::{InlineError, InlineLoading, ListSkeleton};
use crate::map_bridge::MapView;
use crate::state::{mounted_flag, use_global_state};

#[component]
pub fn IncidentMap() -> impl IntoView {
    let state = use_global_state();
    let incidents = create_rw_signal(Vec::<Incident>::new());
    let loading = create_rw_signal(true);
    let banner = create_rw_signal(None::<String>);
    let search = create_rw_signal(String::new());
    let draft = create_rw_signal(None::<IncidentDraft>);
    let refresh = create_rw_signal(0u32);
    let mounted = mounted_flag();

    let fetch_mounted = mounted.clone();
    create_effect(move |_| {
        let _ = refresh.get();
        let session = state.session.get_untracked();
        let mounted = fetch_mounted.clone();
        spawn_local(async move {
            let result = api::fetch_incidents(&session).await;
            if !mounted.get() {
                return;
            }
            let (fetched, error) = recover(result, "incidents");
            incidents.set(fetched);
            banner.set(error);
            loading.set(false);
        });
    });

    let map_view: Rc<RefCell<Option<MapView>>> = Rc::new(RefCell::new(None));
    let container = create_node_ref::<html::Div>();

    if let Some(api_key) = api::MAP_API_KEY {
        let mounting = Rc::clone(&map_view);
        container.on_load(move |element| {
            let view = MapView::mount(&element, api_key, DEFAULT_CENTER, DEFAULT_ZOOM, move |position| {
                // A second double-click moves the open draft instead of resetting it
                draft.update(|current| {
                    let next = match current.take() {
                        Some(mut open) => {
                            open.relocate(position);
                            open
                        }
                        None => IncidentDraft::at(position),
                    };
                    *current = Some(next);
                });
            });
            view.show(&incidents.with_untracked(|list| map::markers(list)));
            *mounting.borrow_mut() = Some(view);
        });
    }

    let drawing = Rc::clone(&map_view);
    create_effect(move |_| {
        let markers = incidents.with(|list| map::markers(list));
        if let Some(view) = drawing.borrow().as_ref() {
            view.show(&markers);
        }
    });

    let unmounting = Rc::clone(&map_view);
    on_cleanup(move || {
        if let Some(view) = unmounting.borrow_mut().take() {
            view.destroy();
        }
    });

    let shown = create_memo(move |_| {
        let query = FilterQuery::search(search.get());
        incidents.with(|list| listing::filter(list, &query))
    });
    let counts = create_memo(move |_| incidents.with(|list| map::counts_by_kind(list)));
    let dialog_open = create_memo(move |_| draft.with(Option::is_some));

    view! {
        <div class="space-y-6">
            <div>
                <h1 class="text-3xl font-bold">"Incident Map"</h1>
                <p class="text-gray-400 mt-1">"Double-click the map to report an incident"</p>
            </div>

            <InlineError message=banner />

            <div class="flex flex-wrap gap-3">
                {move || counts.get().into_iter().map(|(kind, count)| {
                    let color = wayfarer::map::MarkerIcon::for_kind(kind).color;
                    view! {
                        <span class="flex items-center space-x-2 bg-gray-800 rounded-full px-3 py-1 text-sm">
                            <span class="w-3 h-3 rounded-full" style=format!("background:{}", color) />
                            <span>{kind.label()}</span>
                            <span class="text-gray-400">{count}</span>
                        </span>
                    }
                }).collect_view()}
            </div>

            {match api::MAP_API_KEY {
                Some(_) => view! {
                    <div node_ref=container class="w-full h-[28rem] rounded-xl overflow-hidden bg-gray-800" />
                }.into_view(),
                None => view! {
                    <div class="w-full rounded-xl bg-gray-800 p-8 text-center text-gray-400">
                        "Map unavailable: build with WAYFARER_MAP_API_KEY set."
                    </div>
                }.into_view(),
            }}

            {move || dialog_open.get().then(|| view! {
                <ReportDialog draft=draft on_reported=move |_| refresh.update(|n| *n += 1) />
            })}

            <section class="space-y-3">
                <input
                    type="search"
                    placeholder="Search incidents..."
                    class="w-full bg-gray-800 border border-gray-700 rounded-lg px-3 py-2"
                    prop:value=move || search.get()
                    on:input=move |ev| search.set(event_target_value(&ev))
                />
                {move || {
                    if loading.get() {
                        return view! { <ListSkeleton /> }.into_view();
                    }
                    let list = shown.get();
                    if list.is_empty() {
                        view! { <p class="text-center text-gray-400 py-8">"No incidents reported."</p> }.into_view()
                    } else {
                        list.into_iter().map(|incident| view! { <IncidentRow incident=incident /> }).collect_view()
                    }
                }}
            </section>
        </div>
    }
}

#[component]
fn IncidentRow(incident: Incident) -> impl IntoView {
    let reported = incident
        .reported_at()
        .map(|ts| map::format_reported(&ts, &chrono::Local))
        .unwrap_or_default();

    view! {
        <div class="bg-gray-800 rounded-lg p-4 flex items-start justify-between">
            <div>
                <div class="font-medium">{incident.incident_type.label()}</div>
                <div class="text-sm text-gray-400">
                    {incident.description.clone().unwrap_or_default()}
                </div>
            </div>
            <div class="text-right text-xs text-gray-500">
                <div>{format!("{:.5}, {:.5}", incident.latitude, incident.longitude)}</div>
                <div>{reported}</div>
            </div>
        </div>
    }
}

#[component]
fn ReportDialog(
    draft: RwSignal<Option<IncidentDraft>>,
    #[prop(into)]
    on_reported: Callback<()>,
) -> impl IntoView {
    let state = use_global_state();
    let submitting = create_rw_signal(false);
    let mounted = mounted_flag();

    let field = move |read: fn(&IncidentDraft) -> String| {
        move || draft.with(|d| d.as_ref().map(read).unwrap_or_default())
    };
    let edit = move |write: fn(&mut IncidentDraft, String)| {
        move |ev: ev::Event| {
            let value = event_target_value(&ev);
            draft.update(|d| {
                if let Some(d) = d.as_mut() {
                    write(d, value);
                }
            });
        }
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if submitting.get_untracked() {
            return;
        }
        let Some(current) = draft.get_untracked() else { return };
        let session = state.session.get_untracked();
        let incident = match current.validate(session.user_id()) {
            Ok(incident) => incident,
            Err(e) => {
                state.show_error(&e.to_string());
                return;
            }
        };

        submitting.set(true);
        let mounted = mounted.clone();
        spawn_local(async move {
            let result = api::create_incident(&incident, &session).await;
            if !mounted.get() {
                return;
            }
            submitting.set(false);
            match result {
                Ok(()) => {
                    draft.set(None);
                    state.show_success("Incident reported");
                    on_reported.call(());
                }
                Err(e) => state.show_error(&e.user_message()),
            }
        });
    };

    view! {
        <div class="fixed inset-0 bg-black/60 z-40 flex items-center justify-center">
            <form on:submit=submit class="bg-gray-800 rounded-xl p-6 w-full max-w-md space-y-4">
                <div class="flex items-center justify-between">
                    <h2 class="text-xl font-semibold">"Report an incident"</h2>
                    <button type="button" on:click=move |_| draft.set(None) class="text-gray-400 hover:text-white">"✕"</button>
                </div>

                <select
                    class="w-full bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                    on:change=move |ev| {
                        let kind = IncidentKind::from_id(&event_target_value(&ev));
                        draft.update(|d| if let Some(d) = d.as_mut() { d.kind = kind; });
                    }
                >
                    <option value="" selected=move || draft.with(|d| d.as_ref().and_then(|d| d.kind).is_none())>
                        "Select a type"
                    </option>
                    {IncidentKind::ALL.into_iter().map(|kind| view! {
                        <option
                            value=kind.id()
                            selected=move || draft.with(|d| d.as_ref().and_then(|d| d.kind) == Some(kind))
                        >
                            {kind.label()}
                        </option>
                    }).collect_view()}
                </select>

                <textarea
                    rows="3"
                    placeholder="What happened?"
                    class="w-full bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                    prop:value=field(|d| d.description.clone())
                    on:input=edit(|d, v| d.description = v)
                />

                <div class="grid grid-cols-2 gap-3">
                    <input
                        type="text"
                        inputmode="decimal"
                        class="bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                        prop:value=field(|d| d.latitude.clone())
                        on:input=edit(|d, v| d.latitude = v)
                    />
                    <input
                        type="text"
                        inputmode="decimal"
                        class="bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                        prop:value=field(|d| d.longitude.clone())
                        on:input=edit(|d, v| d.longitude = v)
                    />
                </div>

                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="w-full px-6 py-3 bg-primary-600 hover:bg-primary-700 disabled:opacity-50 rounded-lg font-medium"
                >
                    {move || if submitting.get() {
                        view! { <InlineLoading /> " Reporting..." }.into_view()
                    } else {
                        "Report".into_view()
                    }}
                </button>
            </form>
        </div>
    }
}
