//! Cities Page
//!
//! Rankings grid with search, category filter and sort.

use leptos::*;

use wayfarer::api::recover;
use wayfarer::catalog::listing::{self, FilterQuery, ALL_CATEGORIES};
use wayfarer::catalog::City;
use wayfarer::SortKey;

use crate::api;
use crate::components::{CityCard, CityGridSkeleton, InlineError};
use crate::state::{mounted_flag, use_global_state};

#[component]
pub fn Cities() -> impl IntoView {
    let state = use_global_state();
    let cities = create_rw_signal(Vec::<City>::new());
    let loading = create_rw_signal(true);
    let banner = create_rw_signal(None::<String>);

    let search = create_rw_signal(String::new());
    let category = create_rw_signal(ALL_CATEGORIES.to_string());
    let sort_key = create_rw_signal(SortKey::Rank);

    let mounted = mounted_flag();
    let session = state.session.get_untracked();
    spawn_local(async move {
        let result = api::fetch_cities(&session).await;
        if !mounted.get() {
            return;
        }
        let (fetched, error) = recover(result, "cities");
        cities.set(fetched);
        banner.set(error);
        loading.set(false);
    });

    let categories = create_memo(move |_| cities.with(|c| listing::categories(c)));
    let shown = create_memo(move |_| {
        let query = FilterQuery::new(search.get(), category.get().as_str());
        cities.with(|c| listing::apply(c, &query, sort_key.get()))
    });

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"City Rankings"</h1>
                <p class="text-gray-400 mt-1">"Find your next home, ranked by the community"</p>
            </div>

            <InlineError message=banner />

            <div class="flex flex-wrap gap-3">
                <input
                    type="search"
                    placeholder="Search cities..."
                    class="flex-1 min-w-[12rem] bg-gray-800 border border-gray-700 rounded-lg px-3 py-2"
                    prop:value=move || search.get()
                    on:input=move |ev| search.set(event_target_value(&ev))
                />
                <select
                    class="bg-gray-800 border border-gray-700 rounded-lg px-3 py-2 capitalize"
                    on:change=move |ev| category.set(event_target_value(&ev))
                >
                    {move || categories.get().into_iter().map(|c| {
                        let selected = c == category.get_untracked();
                        view! { <option value=c.clone() selected=selected>{c.clone()}</option> }
                    }).collect_view()}
                </select>
                <select
                    class="bg-gray-800 border border-gray-700 rounded-lg px-3 py-2"
                    on:change=move |ev| {
                        if let Ok(key) = event_target_value(&ev).parse::<SortKey>() {
                            sort_key.set(key);
                        }
                    }
                >
                    {SortKey::ALL.into_iter().map(|key| view! {
                        <option value=key.as_str() selected=key == SortKey::Rank>
                            {format!("Sort by {}", key.label())}
                        </option>
                    }).collect_view()}
                </select>
            </div>

            {move || {
                if loading.get() {
                    return view! { <CityGridSkeleton /> }.into_view();
                }
                let list = shown.get();
                if list.is_empty() {
                    view! {
                        <div class="text-center py-12">
                            <p class="text-gray-400">"No cities match your search."</p>
                        </div>
                    }.into_view()
                } else {
                    view! {
                        <div class="grid md:grid-cols-2 lg:grid-cols-3 gap-4">
                            {list.into_iter().map(|city| view! { <CityCard city=city /> }).collect_view()}
                        </div>
                    }.into_view()
                }
            }}
        </div>
    }
}
