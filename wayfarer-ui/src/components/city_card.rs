//! City Card Component
//!
//! One entry in the rankings grid.

use leptos::*;
use leptos_router::*;

use wayfarer::catalog::City;

#[component]
pub fn CityCard(city: City) -> impl IntoView {
    let href = format!("/cities/{}", city.slug);
    let rank_class = if city.rank > 0 {
        "bg-primary-600"
    } else {
        "bg-gray-600"
    };

    view! {
        <A
            href=href
            class="block bg-gray-800 rounded-xl overflow-hidden border border-gray-700 hover:border-gray-500 transition-colors"
        >
            {city.image.clone().map(|src| view! {
                <img src=src alt=city.name.clone() class="w-full h-40 object-cover" />
            })}
            <div class="p-4 space-y-2">
                <div class="flex items-center justify-between">
                    <h3 class="text-lg font-semibold">{city.name.clone()}</h3>
                    <span class=format!("{} text-xs px-2 py-0.5 rounded-full text-white", rank_class)>
                        {city.rank_label()}
                    </span>
                </div>
                <p class="text-sm text-gray-400 line-clamp-2">{city.description.clone()}</p>
                <div class="flex items-center justify-between text-sm">
                    <span class="text-yellow-400">{format!("★ {}", city.rating_label())}</span>
                    <span class="text-gray-500">{format!("{} ratings", city.total_ratings)}</span>
                    <span class="text-gray-400 capitalize">{city.category.clone()}</span>
                </div>
            </div>
        </A>
    }
}
