//! Pricing / Paywall Page

use leptos::prelude::*;

use crate::api;
use crate::components::{ErrorBanner, PlanCard};

#[component]
pub fn PricingPage() -> impl IntoView {
    let (plans, set_plans) = signal(Vec::<api::PlanInfo>::new());
    let (email, set_email) = signal(Option::<String>::None);
    let (error, set_error) = signal(String::new());

    // Load the catalog and route away if this session doesn't belong here.
    leptos::task::spawn_local(async move {
        match api::fetch_view().await {
            Ok(snapshot) if snapshot.view == "landing" => {
                api::redirect("/");
                return;
            }
            Ok(snapshot) if snapshot.view == "workspace" => {
                api::redirect("/workspace");
                return;
            }
            Ok(snapshot) => set_email.set(snapshot.email),
            Err(_) => {}
        }
        match api::fetch_plans().await {
            Ok(catalog) => set_plans.set(catalog),
            Err(e) => set_error.set(e),
        }
    });

    let subscribe = Callback::new(move |plan: String| {
        set_error.set(String::new());
        leptos::task::spawn_local(async move {
            match api::create_checkout(&plan).await {
                Ok(Some(url)) => api::redirect(&url),
                Ok(None) => api::redirect("/"),
                Err(e) => set_error.set(e),
            }
        });
    });

    let logout = move |_| {
        leptos::task::spawn_local(async move {
            let _ = api::logout().await;
            api::redirect("/");
        });
    };

    view! {
        <div class="pricing">
            <header class="topbar">
                <span class="account">{move || email.get().unwrap_or_default()}</span>
                <button class="btn btn-link" on:click=logout>"Log out"</button>
            </header>

            <h1>"Choose a plan"</h1>
            <p class="subtitle">"Subscribe to unlock the diagram workspace"</p>

            <ErrorBanner message=error />

            <div class="plans">
                <For
                    each=move || plans.get()
                    key=|plan| plan.id.clone()
                    children=move |plan| view! { <PlanCard plan=plan on_subscribe=subscribe /> }
                />
            </div>
        </div>
    }
}
