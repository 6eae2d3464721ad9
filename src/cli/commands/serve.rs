//! Web UI server.
//!
//! Serves a form that collects both API keys and a query, runs the shared
//! research service, and renders the conversation.

use crate::agent::{ResearchRequest, ResearchService, RunOutcome};
use crate::cli::page::{render_page, FormState};
use crate::cli::Output;
use crate::config::Settings;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    service: ResearchService,
    settings: Settings,
}

/// Run the web UI server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let app = router(ResearchService::hosted(settings.clone())?, settings);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Delve Web UI");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Form", "GET  /");
    Output::kv("Submit", "POST /research");
    Output::kv("API", "POST /api/research");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
fn router(service: ResearchService, settings: Settings) -> Router {
    let state = Arc::new(AppState { service, settings });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/research", post(research_form))
        .route("/api/research", post(research_api))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

// === Request Types ===

#[derive(Debug, Default, Deserialize)]
struct ResearchInput {
    #[serde(default)]
    groq_api_key: Option<String>,
    #[serde(default)]
    tavily_api_key: Option<String>,
    #[serde(default)]
    query: Option<String>,
}

impl ResearchInput {
    fn into_request(self, settings: &Settings) -> ResearchRequest {
        ResearchRequest {
            model_api_key: self.groq_api_key,
            search_api_key: self.tavily_api_key,
            query: self.query,
        }
        .with_fallback_credentials(settings)
    }
}

// === Handlers ===

async fn index() -> Html<String> {
    Html(render_page(&FormState::default(), None))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn research_form(
    State(state): State<Arc<AppState>>,
    Form(input): Form<ResearchInput>,
) -> Html<String> {
    let form = FormState {
        query: input.query.clone().unwrap_or_default(),
    };

    let outcome = state.service.research(input.into_request(&state.settings)).await;
    Html(render_page(&form, Some(&outcome)))
}

async fn research_api(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ResearchInput>,
) -> impl IntoResponse {
    let outcome = state.service.research(input.into_request(&state.settings)).await;

    let status = match &outcome {
        RunOutcome::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RunOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
        RunOutcome::Completed { .. } => StatusCode::OK,
    };

    (status, Json(outcome))
}
