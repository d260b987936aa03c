//! City Detail Page
//!
//! Facts, community scores, the rating form and the city's chat room.

use leptos::*;
use leptos_router::*;

use wayfarer::catalog::CityDetail;
use wayfarer::chat::RoomId;

use crate::api;
use crate::components::{ChatPanel, InlineError, Loading, RatingForm};
use crate::state::{mounted_flag, use_global_state};

#[component]
pub fn CityDetailPage() -> impl IntoView {
    let state = use_global_state();
    let params = use_params_map();
    let slug = move || params.with(|p| p.get("slug").cloned().unwrap_or_default());

    let detail = create_rw_signal(None::<CityDetail>);
    let loading = create_rw_signal(true);
    let banner = create_rw_signal(None::<String>);
    let refresh = create_rw_signal(0u32);
    let mounted = mounted_flag();

    create_effect(move |_| {
        let wanted = slug();
        let _ = refresh.get();
        let session = state.session.get_untracked();
        let mounted = mounted.clone();
        spawn_local(async move {
            let result = api::fetch_city(&wanted, &session).await;
            if !mounted.get() || slug_untracked(params) != wanted {
                return;
            }
            match result {
                Ok(city) => {
                    detail.set(Some(city));
                    banner.set(None);
                }
                Err(e) => {
                    detail.set(None);
                    banner.set(Some(e.user_message()));
                }
            }
            loading.set(false);
        });
    });

    let city_id = Signal::derive(move || detail.with(|d| d.as_ref().map(|d| d.city.id.clone())));
    let room = create_memo(move |_| city_id.get().and_then(|id| RoomId::new(id).ok()));

    view! {
        <div class="space-y-8">
            <A href="/" class="text-sm text-gray-400 hover:text-white">"← All cities"</A>

            <InlineError message=banner />

            {move || {
                if loading.get() {
                    return view! { <Loading label="Loading city..." /> }.into_view();
                }
                match detail.get() {
                    Some(city) => view! { <CityFacts detail=city /> }.into_view(),
                    None => view! {
                        <p class="text-center text-gray-400 py-12">"City not found."</p>
                    }.into_view(),
                }
            }}

            <div class="grid lg:grid-cols-2 gap-8">
                <RatingForm
                    city_id=city_id
                    on_submitted=move |_| refresh.update(|n| *n += 1)
                />

                {move || room.get().map(|room| {
                    let name = detail.with_untracked(|d| {
                        d.as_ref().map(|d| d.city.name.clone()).unwrap_or_default()
                    });
                    view! { <ChatPanel room=room city_name=name /> }
                })}
            </div>
        </div>
    }
}

fn slug_untracked(params: Memo<ParamsMap>) -> String {
    params.with_untracked(|p| p.get("slug").cloned().unwrap_or_default())
}

#[component]
fn CityFacts(detail: CityDetail) -> impl IntoView {
    let city = detail.city.clone();

    view! {
        <section class="space-y-6">
            <div class="flex items-center justify-between">
                <div>
                    <h1 class="text-3xl font-bold">{city.name.clone()}</h1>
                    <p class="text-gray-400 mt-1 capitalize">{city.category.clone()}</p>
                </div>
                <div class="text-right">
                    <div class="text-2xl font-bold text-yellow-400">{format!("★ {}", city.rating_label())}</div>
                    <div class="text-sm text-gray-400">
                        {format!("{} · {} ratings", detail.rank_label(), city.total_ratings)}
                    </div>
                </div>
            </div>

            {(!detail.images.is_empty()).then(|| view! {
                <div class="flex space-x-3 overflow-x-auto">
                    {detail.images.iter().map(|src| view! {
                        <img src=src.clone() class="h-48 rounded-lg object-cover" />
                    }).collect_view()}
                </div>
            })}

            <p class="text-gray-300">{city.description.clone()}</p>

            <div class="grid grid-cols-3 gap-4">
                <Fact label="Population" value=detail.population.to_string() />
                <Fact label="Temperature" value=format!("{:.1}°C", detail.temperature) />
                <Fact label="Internet" value=format!("{:.1} Mbps", detail.internet_speed) />
            </div>

            <div class="grid md:grid-cols-2 lg:grid-cols-4 gap-3">
                {detail.score_lines().into_iter().map(|line| view! {
                    <div class="bg-gray-800 rounded-lg p-3">
                        <div class="text-sm text-gray-400">
                            {format!("{} {}", line.category.emoji(), line.category.label())}
                        </div>
                        <div class="text-lg font-semibold">{line.value}</div>
                    </div>
                }).collect_view()}
            </div>

            {(!detail.amenities.is_empty()).then(|| view! {
                <div class="flex flex-wrap gap-2">
                    {detail.amenities.iter().map(|a| view! {
                        <span class="bg-gray-700 text-sm px-3 py-1 rounded-full">{a.clone()}</span>
                    }).collect_view()}
                </div>
            })}
        </section>
    }
}

#[component]
fn Fact(label: &'static str, value: String) -> impl IntoView {
    view! {
        <div class="bg-gray-800 rounded-lg p-4 text-center">
            <div class="text-sm text-gray-400">{label}</div>
            <div class="text-xl font-semibold">{value}</div>
        </div>
    }
}
