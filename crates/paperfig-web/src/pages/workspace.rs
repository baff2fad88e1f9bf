//! Workspace Page
//!
//! The diagram studio: method text in, publication-ready figure out.
//! On mount the subscription is re-verified, which also covers the return
//! from a completed checkout and routes expired subscriptions back to the
//! paywall.

use leptos::prelude::*;

use crate::api;
use crate::components::ErrorBanner;

#[component]
pub fn WorkspacePage() -> impl IntoView {
    let (method_text, set_method_text) = signal(String::new());
    let (title, set_title) = signal(String::new());
    let (caption, set_caption) = signal(String::new());
    let (diagram_type, set_diagram_type) = signal("methodology".to_string());
    let (busy, set_busy) = signal(false);
    let (error, set_error) = signal(String::new());
    let (plan, set_plan) = signal(Option::<String>::None);
    let (diagram_version, set_diagram_version) = signal(0_u32);
    let (has_diagram, set_has_diagram) = signal(false);

    leptos::task::spawn_local(async move {
        match api::refresh_subscription().await {
            Ok(snapshot) if snapshot.view == "workspace" => {
                set_plan.set(snapshot.plan);
                set_has_diagram.set(snapshot.has_diagram);
            }
            Ok(snapshot) if snapshot.view == "paywall" => api::redirect("/pricing"),
            Ok(_) => api::redirect("/"),
            Err(e) => set_error.set(e),
        }
    });

    let generate = move |_| {
        if busy.get() {
            return;
        }
        set_busy.set(true);
        set_error.set(String::new());

        let text = method_text.get();
        let cap = caption.get();
        let fig_title = title.get();
        let style = diagram_type.get();

        leptos::task::spawn_local(async move {
            match api::generate(&text, &cap, &fig_title, &style).await {
                Ok(outcome) if outcome.generated => {
                    set_has_diagram.set(true);
                    set_diagram_version.update(|v| *v += 1);
                }
                Ok(outcome) => {
                    // The action was inert: this session no longer owns the
                    // workspace, so route to where it belongs.
                    match outcome.view.view.as_str() {
                        "paywall" => api::redirect("/pricing"),
                        _ => api::redirect("/"),
                    }
                }
                Err(e) => set_error.set(e),
            }
            set_busy.set(false);
        });
    };

    let logout = move |_| {
        leptos::task::spawn_local(async move {
            let _ = api::logout().await;
            api::redirect("/");
        });
    };

    view! {
        <div class="workspace">
            <header class="topbar">
                <h1>"Diagram workspace"</h1>
                <span class="account">
                    {move || plan.get().map(|p| format!("Plan: {}", p)).unwrap_or_default()}
                </span>
                <button class="btn btn-link" on:click=logout>"Log out"</button>
            </header>

            <ErrorBanner message=error />

            <section class="editor">
                <div class="field">
                    <label>"Method text"</label>
                    <textarea
                        placeholder="Paste your method description here..."
                        prop:value=move || method_text.get()
                        on:input=move |ev| set_method_text.set(event_target_value(&ev))
                    />
                </div>

                <div class="field-row">
                    <div class="field">
                        <label>"Title (optional)"</label>
                        <input
                            type="text"
                            placeholder="Figure 1"
                            prop:value=move || title.get()
                            on:input=move |ev| set_title.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="field">
                        <label>"Caption"</label>
                        <input
                            type="text"
                            placeholder="Overview of the proposed method"
                            prop:value=move || caption.get()
                            on:input=move |ev| set_caption.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="field">
                        <label>"Diagram type"</label>
                        <select
                            prop:value=move || diagram_type.get()
                            on:change=move |ev| set_diagram_type.set(event_target_value(&ev))
                        >
                            <option value="methodology">"Methodology"</option>
                            <option value="flowchart">"Flowchart"</option>
                            <option value="architecture">"Architecture"</option>
                        </select>
                    </div>
                </div>

                <button class="btn btn-primary" on:click=generate disabled=move || busy.get()>
                    {move || if busy.get() { "Generating..." } else { "Generate diagram" }}
                </button>
                <Show when=move || busy.get()>
                    <p class="hint">"Retriever → Planner → Stylist → Visualizer → Critic"</p>
                </Show>
            </section>

            <Show when=move || has_diagram.get()>
                <section class="result">
                    <img
                        src=move || format!("/api/diagram?v={}", diagram_version.get())
                        alt="Generated diagram"
                    />
                    <a class="btn" href="/api/diagram" download="paperfig-diagram.png">
                        "Download PNG"
                    </a>
                </section>
            </Show>
        </div>
    }
}
