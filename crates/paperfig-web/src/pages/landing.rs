//! Landing Page

use leptos::prelude::*;

use crate::api;
use crate::components::ErrorBanner;

#[component]
pub fn LandingPage() -> impl IntoView {
    let (email, set_email) = signal(String::new());
    let (error, set_error) = signal(String::new());
    let (busy, set_busy) = signal(false);

    let submit = move || {
        let address = email.get();
        if address.trim().is_empty() || busy.get() {
            return;
        }
        set_busy.set(true);
        set_error.set(String::new());

        leptos::task::spawn_local(async move {
            match api::login(&address).await {
                Ok(snapshot) if snapshot.view == "workspace" => api::redirect("/workspace"),
                Ok(_) => api::redirect("/pricing"),
                Err(e) => {
                    set_error.set(e);
                    set_busy.set(false);
                }
            }
        });
    };

    view! {
        <div class="landing">
            <header class="hero">
                <h1>"paperfig"</h1>
                <p class="tagline">
                    "Paste your method description, get a publication-ready diagram."
                </p>
            </header>

            <section class="features">
                <div class="feature">
                    <h3>"📝 From text"</h3>
                    <p>"Describe your methodology the way you wrote it for the paper."</p>
                </div>
                <div class="feature">
                    <h3>"🖼️ Five-stage pipeline"</h3>
                    <p>"Retriever, planner, stylist, visualizer and critic refine every figure."</p>
                </div>
                <div class="feature">
                    <h3>"⬇️ Ready to submit"</h3>
                    <p>"Download high-resolution PNGs styled for publication."</p>
                </div>
            </section>

            <section class="login">
                <h2>"Sign in"</h2>
                <ErrorBanner message=error />
                <div class="field">
                    <input
                        type="email"
                        placeholder="you@university.edu"
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                        on:keydown=move |ev| {
                            if ev.key() == "Enter" {
                                ev.prevent_default();
                                submit();
                            }
                        }
                    />
                    <button class="btn btn-primary" on:click=move |_| submit() disabled=move || busy.get()>
                        {move || if busy.get() { "..." } else { "Continue" }}
                    </button>
                </div>
            </section>
        </div>
    }
}
