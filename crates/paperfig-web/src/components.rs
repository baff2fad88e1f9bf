//! UI Components

use leptos::prelude::*;

use crate::api::PlanInfo;

/// Plan card with a subscribe action
#[component]
pub fn PlanCard(plan: PlanInfo, on_subscribe: Callback<String>) -> impl IntoView {
    let plan_id = plan.id.clone();
    let featured = plan.id == "pro";
    let class = if featured { "plan featured" } else { "plan" };
    let button_class = if featured { "btn btn-primary" } else { "btn" };

    view! {
        <div class=class>
            <Show when=move || featured>
                <span class="badge">"Popular"</span>
            </Show>
            <h2>{plan.display_name.clone()}</h2>
            <div class="price">
                {format!("${}", plan.monthly_price)}
                <span>"/month"</span>
            </div>
            <ul>
                {plan
                    .features
                    .iter()
                    .map(|f| view! { <li>{f.clone()}</li> })
                    .collect::<Vec<_>>()}
            </ul>
            <button
                class=button_class
                on:click=move |_| on_subscribe.run(plan_id.clone())
            >
                "Subscribe"
            </button>
        </div>
    }
}

/// Inline error banner; hidden while the message is empty
#[component]
pub fn ErrorBanner(message: ReadSignal<String>) -> impl IntoView {
    view! {
        <Show when=move || !message.get().is_empty()>
            <div class="error-banner">{move || message.get()}</div>
        </Show>
    }
}
