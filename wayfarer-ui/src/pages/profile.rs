//! Profile Page
//!
//! Home location (picked through place search) and mobile number. Writes need
//! a signed-in session; guests get the sign-in form instead.

use leptos::*;

use wayfarer::profile::{profile_owner, GeocodeFeature, ProfileUpdate, SelectedLocation, UserProfile};
use wayfarer::session::SessionUser;

use crate::api;
use crate::components::{InlineError, InlineLoading, Loading};
use crate::state::{mounted_flag, use_global_state};

#[component]
pub fn Profile() -> impl IntoView {
    let state = use_global_state();

    view! {
        <div class="space-y-8 max-w-2xl">
            <h1 class="text-3xl font-bold">"Profile"</h1>
            {move || match profile_owner(&state.session.get()) {
                Ok(user_id) => view! { <ProfileEditor user_id=user_id /> }.into_view(),
                Err(e) => view! { <SignIn reason=e.to_string() /> }.into_view(),
            }}
        </div>
    }
}

#[component]
fn ProfileEditor(user_id: String) -> impl IntoView {
    let state = use_global_state();
    let profile = create_rw_signal(None::<UserProfile>);
    let banner = create_rw_signal(None::<String>);
    let refresh = create_rw_signal(0u32);
    let mounted = mounted_flag();
    let user_id = store_value(user_id);

    let fetch_mounted = mounted.clone();
    create_effect(move |_| {
        let _ = refresh.get();
        let session = state.session.get_untracked();
        let mounted = fetch_mounted.clone();
        let id = user_id.get_value();
        spawn_local(async move {
            let result = api::fetch_profile(&id, &session).await;
            if !mounted.get() {
                return;
            }
            match result {
                Ok(fetched) => {
                    profile.set(Some(fetched));
                    banner.set(None);
                }
                Err(e) => {
                    profile.set(Some(UserProfile::default()));
                    banner.set(Some(e.user_message()));
                }
            }
        });
    });

    let saving = create_rw_signal(false);
    let save = move |update: ProfileUpdate, done: &'static str| {
        if saving.get_untracked() {
            return;
        }
        saving.set(true);
        let session = state.session.get_untracked();
        let mounted = mounted.clone();
        let id = user_id.get_value();
        spawn_local(async move {
            let result = api::update_profile(&id, &update, &session).await;
            if !mounted.get() {
                return;
            }
            saving.set(false);
            match result {
                Ok(()) => {
                    state.show_success(done);
                    refresh.update(|n| *n += 1);
                }
                Err(e) => state.show_error(&e.user_message()),
            }
        });
    };
    let save = store_value(save);

    view! {
        <InlineError message=banner />

        {move || match profile.get() {
            None => view! { <Loading label="Loading profile..." /> }.into_view(),
            Some(current) => view! {
                <section class="bg-gray-800 rounded-xl p-6 space-y-2">
                    <h2 class="text-xl font-semibold">"Saved details"</h2>
                    <p class="text-gray-300">
                        {current.location()
                            .map(|l| format!("📍 {}", l.display_name()))
                            .unwrap_or_else(|| "📍 No home location yet".to_string())}
                    </p>
                    <p class="text-gray-300">
                        {format!("📱 {}", current.mobile_number().unwrap_or("No mobile number yet"))}
                    </p>
                </section>
            }.into_view(),
        }}

        <LocationPicker
            saving=saving
            on_save=move |update| save.with_value(|save| save(update, "Location saved"))
        />

        <MobileForm
            saving=saving
            on_save=move |update| save.with_value(|save| save(update, "Mobile number saved"))
        />

        <button
            on:click=move |_| state.sign_out()
            class="px-4 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg"
        >
            "Sign out"
        </button>
    }
}

#[component]
fn LocationPicker(
    saving: RwSignal<bool>,
    #[prop(into)]
    on_save: Callback<ProfileUpdate>,
) -> impl IntoView {
    let state = use_global_state();
    let query = create_rw_signal(String::new());
    let results = create_rw_signal(Vec::<GeocodeFeature>::new());
    let searching = create_rw_signal(false);
    let selected = create_rw_signal(None::<SelectedLocation>);
    let mounted = mounted_flag();

    let search = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let text = query.get_untracked();
        searching.set(true);
        let mounted = mounted.clone();
        spawn_local(async move {
            let result = api::search_places(&text).await;
            if !mounted.get() {
                return;
            }
            searching.set(false);
            match result {
                Ok(found) => results.set(found.features),
                Err(e) => state.show_error(&e.user_message()),
            }
        });
    };

    let pick = move |feature: GeocodeFeature| match SelectedLocation::from_feature(&feature) {
        Ok(location) => {
            selected.set(Some(location));
            results.set(Vec::new());
        }
        Err(e) => state.show_error(&e.to_string()),
    };

    let submit = move |_: ev::MouseEvent| match ProfileUpdate::location(selected.get_untracked().as_ref()) {
        Ok(update) => on_save.call(update),
        Err(e) => state.show_error(&e.to_string()),
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Home location"</h2>
            {api::GEOCODER_TOKEN.is_none().then(|| view! {
                <p class="text-sm text-yellow-400">"Place search is disabled: build with WAYFARER_GEOCODER_TOKEN set."</p>
            })}
            <form on:submit=search class="flex space-x-2">
                <input
                    type="search"
                    placeholder="Search for your city..."
                    class="flex-1 bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                    prop:value=move || query.get()
                    on:input=move |ev| query.set(event_target_value(&ev))
                />
                <button type="submit" class="px-4 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg">
                    {move || if searching.get() { view! { <InlineLoading /> }.into_view() } else { "Search".into_view() }}
                </button>
            </form>

            <ul class="space-y-1">
                {move || results.get().into_iter().map(|feature| {
                    let label = feature.place_name.clone().unwrap_or_else(|| "Unnamed place".to_string());
                    view! {
                        <li>
                            <button
                                type="button"
                                on:click=move |_| pick(feature.clone())
                                class="w-full text-left px-3 py-2 rounded-lg hover:bg-gray-700"
                            >
                                {label}
                            </button>
                        </li>
                    }
                }).collect_view()}
            </ul>

            {move || selected.get().map(|location| view! {
                <p class="text-sm text-gray-300">
                    {format!(
                        "Selected: {} ({:.4}, {:.4})",
                        location.display_name(),
                        location.position.lat,
                        location.position.lng
                    )}
                </p>
            })}

            <button
                on:click=submit
                disabled=move || saving.get() || selected.with(Option::is_none)
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 disabled:opacity-50 rounded-lg font-medium"
            >
                "Save location"
            </button>
        </section>
    }
}

#[component]
fn MobileForm(
    saving: RwSignal<bool>,
    #[prop(into)]
    on_save: Callback<ProfileUpdate>,
) -> impl IntoView {
    let state = use_global_state();
    let number = create_rw_signal(String::new());

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        match ProfileUpdate::mobile(&number.get_untracked()) {
            Ok(update) => on_save.call(update),
            Err(e) => state.show_error(&e.to_string()),
        }
    };

    view! {
        <form on:submit=submit class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Mobile number"</h2>
            <input
                type="tel"
                placeholder="+94 77 123 4567"
                class="w-full bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                prop:value=move || number.get()
                on:input=move |ev| number.set(event_target_value(&ev))
            />
            <button
                type="submit"
                disabled=move || saving.get()
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 disabled:opacity-50 rounded-lg font-medium"
            >
                "Save mobile number"
            </button>
        </form>
    }
}

/// Paste-in form for a credential issued by the auth provider
#[component]
fn SignIn(reason: String) -> impl IntoView {
    let state = use_global_state();
    let token = create_rw_signal(String::new());
    let email = create_rw_signal(String::new());
    let given = create_rw_signal(String::new());
    let family = create_rw_signal(String::new());

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let token = token.get_untracked();
        if token.trim().is_empty() {
            state.show_error("Access token is required");
            return;
        }
        let optional = |value: String| (!value.trim().is_empty()).then(|| value.trim().to_string());
        let user = SessionUser {
            id: None,
            email: optional(email.get_untracked()),
            given_name: optional(given.get_untracked()),
            family_name: optional(family.get_untracked()),
        };
        state.sign_in(&token, user);
    };

    let input = |label: &'static str, kind: &'static str, signal: RwSignal<String>| view! {
        <label class="block">
            <span class="text-sm text-gray-400">{label}</span>
            <input
                type=kind
                class="mt-1 w-full bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                prop:value=move || signal.get()
                on:input=move |ev| signal.set(event_target_value(&ev))
            />
        </label>
    };

    view! {
        <form on:submit=submit class="bg-gray-800 rounded-xl p-6 space-y-4">
            <p class="text-gray-300">{reason}</p>
            {input("Access token", "password", token)}
            {input("Email", "email", email)}
            {input("Given name", "text", given)}
            {input("Family name", "text", family)}
            <button type="submit" class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium">
                "Sign in"
            </button>
        </form>
    }
}
