//! Main App Component

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::pages::{LandingPage, PricingPage, WorkspacePage};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <main class="app">
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=path!("/") view=LandingPage />
                    <Route path=path!("/pricing") view=PricingPage />
                    <Route path=path!("/workspace") view=WorkspacePage />
                </Routes>
            </main>
        </Router>
    }
}
