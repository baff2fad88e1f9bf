//! API Client

use serde::{Deserialize, Serialize};

/// Session snapshot as served by `/api/view`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub view: String,
    pub email: Option<String>,
    pub is_subscribed: bool,
    pub plan: Option<String>,
    pub has_diagram: bool,
}

/// Plan card data from `/api/plans`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanInfo {
    pub id: String,
    pub display_name: String,
    pub monthly_price: String,
    pub currency: String,
    pub features: Vec<String>,
}

/// Outcome of `/api/generate`
#[derive(Clone, Debug, Deserialize)]
pub struct GenerateOutcome {
    pub generated: bool,
    pub view: ViewSnapshot,
}

/// Navigate the browser
pub fn redirect(path: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(path);
    }
}

/// Absolute URL for an API path (reqwest needs a base, even on WASM)
fn api_url(path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());
    format!("{}{}", origin, path)
}

async fn error_message(response: reqwest::Response) -> String {
    let data: serde_json::Value = response.json().await.unwrap_or_default();
    data["error"].as_str().unwrap_or("Request failed").to_string()
}

/// Fetch the current view state
pub async fn fetch_view() -> Result<ViewSnapshot, String> {
    let response = reqwest::Client::new()
        .get(api_url("/api/view"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err(error_message(response).await)
    }
}

/// Log in with an email address
pub async fn login(email: &str) -> Result<ViewSnapshot, String> {
    let response = reqwest::Client::new()
        .post(api_url("/api/login"))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err(error_message(response).await)
    }
}

/// Log out
pub async fn logout() -> Result<ViewSnapshot, String> {
    let response = reqwest::Client::new()
        .post(api_url("/api/logout"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err(error_message(response).await)
    }
}

/// Fetch the plan catalog
pub async fn fetch_plans() -> Result<Vec<PlanInfo>, String> {
    let response = reqwest::Client::new()
        .get(api_url("/api/plans"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err(error_message(response).await)
    }
}

/// Create a Stripe checkout session; `None` means the action was inert
pub async fn create_checkout(plan: &str) -> Result<Option<String>, String> {
    let response = reqwest::Client::new()
        .post(api_url("/api/checkout"))
        .json(&serde_json::json!({ "plan": plan }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        let data: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(data["checkout_url"].as_str().map(String::from))
    } else {
        Err(error_message(response).await)
    }
}

/// Re-verify the subscription with the billing provider
pub async fn refresh_subscription() -> Result<ViewSnapshot, String> {
    let response = reqwest::Client::new()
        .post(api_url("/api/subscription/refresh"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err(error_message(response).await)
    }
}

/// Run diagram generation
pub async fn generate(
    source_text: &str,
    caption: &str,
    title: &str,
    diagram_type: &str,
) -> Result<GenerateOutcome, String> {
    let mut body = serde_json::json!({
        "source_text": source_text,
        "caption": caption,
        "diagram_type": diagram_type,
    });
    if !title.trim().is_empty() {
        body["title"] = serde_json::json!(title);
    }

    let response = reqwest::Client::new()
        .post(api_url("/api/generate"))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err(error_message(response).await)
    }
}
