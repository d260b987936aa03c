//! Rating Form Component
//!
//! Eight category pickers and an optional review. Untouched categories are
//! submitted as the neutral score.

use leptos::*;

use wayfarer::rating::{RatingCategory, RatingDraft, Score};

use crate::api;
use crate::components::InlineLoading;
use crate::state::{mounted_flag, use_global_state};

#[component]
pub fn RatingForm(
    /// City being rated; submission is blocked while `None`
    #[prop(into)]
    city_id: Signal<Option<String>>,
    #[prop(into)]
    on_submitted: Callback<()>,
) -> impl IntoView {
    let state = use_global_state();
    let draft = create_rw_signal(RatingDraft::new());
    let submitting = create_rw_signal(false);
    let mounted = mounted_flag();

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if submitting.get_untracked() {
            return;
        }

        let session = state.session.get_untracked();
        let submission = match draft
            .get_untracked()
            .prepare(city_id.get_untracked().as_deref(), session.user_id())
        {
            Ok(submission) => submission,
            Err(e) => {
                state.show_error(&e.to_string());
                return;
            }
        };

        submitting.set(true);
        let mounted = mounted.clone();
        spawn_local(async move {
            let result = api::submit_rating(&submission, &session).await;
            if !mounted.get() {
                return;
            }
            submitting.set(false);
            match result {
                Ok(()) => {
                    draft.update(RatingDraft::clear);
                    state.show_success("Thanks! Your rating was submitted.");
                    on_submitted.call(());
                }
                Err(e) => state.show_error(&e.user_message()),
            }
        });
    };

    view! {
        <form on:submit=submit class="bg-gray-800 rounded-xl p-6 space-y-6">
            <h2 class="text-xl font-semibold">"Rate this city"</h2>

            <div class="grid md:grid-cols-2 gap-4">
                {RatingCategory::ALL
                    .into_iter()
                    .map(|category| view! { <CategoryPicker category=category draft=draft /> })
                    .collect_view()}
            </div>

            <div>
                <label class="block text-sm text-gray-400 mb-2">"Review (optional)"</label>
                <textarea
                    rows="3"
                    class="w-full bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                    prop:value=move || draft.with(|d| d.review().to_string())
                    on:input=move |ev| {
                        let text = event_target_value(&ev);
                        draft.update(|d| d.set_review(text));
                    }
                />
            </div>

            <button
                type="submit"
                disabled=move || submitting.get() || city_id.with(Option::is_none)
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 disabled:opacity-50 rounded-lg font-medium transition-colors"
            >
                {move || if submitting.get() {
                    view! { <InlineLoading /> " Submitting..." }.into_view()
                } else {
                    "Submit rating".into_view()
                }}
            </button>
        </form>
    }
}

#[component]
fn CategoryPicker(category: RatingCategory, draft: RwSignal<RatingDraft>) -> impl IntoView {
    view! {
        <div class="bg-gray-900 rounded-lg p-3">
            <div class="flex items-center space-x-2">
                <span>{category.emoji()}</span>
                <span class="font-medium">{category.label()}</span>
            </div>
            <p class="text-xs text-gray-500 mb-2">{category.description()}</p>
            <div class="flex space-x-1">
                {Score::all()
                    .map(|score| {
                        let selected = move || draft.with(|d| d.effective(category) == score);
                        view! {
                            <button
                                type="button"
                                title=score.label()
                                on:click=move |_| draft.update(|d| d.set(category, score))
                                class=move || if selected() {
                                    "w-9 h-9 rounded-lg bg-primary-600 text-white"
                                } else {
                                    "w-9 h-9 rounded-lg bg-gray-700 text-gray-300 hover:bg-gray-600"
                                }
                            >
                                {score.value()}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>
            <p class="text-xs text-gray-400 mt-1">
                {move || draft.with(|d| d.effective(category).label())}
            </p>
        </div>
    }
}
