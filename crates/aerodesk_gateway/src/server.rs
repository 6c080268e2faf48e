use crate::types::{
    CustomerCareRequest, CustomerCareResponse, ErrorBody, MessageRequest, MessageResponse,
    SessionCreated,
};
use aerodesk_agent::{Agent, AgentError, CustomerSimulation};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub simulation: Arc<CustomerSimulation>,
}

/// The gateway HTTP server.
///
/// - `GET /health`: health check
/// - `POST /sessions`: mint a session id
/// - `POST /sessions/:id/messages`: one agent turn
/// - `POST /customer-care`: run a customer simulation
pub struct GatewayServer {
    state: AppState,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(state: AppState, host: &str, port: u16) -> Self {
        Self {
            state,
            host: host.to_string(),
            port,
        }
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/sessions", post(create_session))
            .route("/sessions/:id/messages", post(post_message))
            .route("/customer-care", post(customer_care))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and serve until the process exits.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Gateway failed to bind {}", addr))?;
        tracing::info!("Gateway listening on {}", addr);
        axum::serve(listener, Self::router(self.state))
            .await
            .context("Gateway server error")
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Agent(AgentError),
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        ApiError::Agent(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Agent(AgentError::TurnTimeout(_) | AgentError::SessionTimeout(_)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::Agent(AgentError::ModelProtocol(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Agent(AgentError::ToolNotFound(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Agent(
                AgentError::ModelUnavailable(_)
                | AgentError::ModelRateLimited(_)
                | AgentError::SessionStore(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(msg) => ErrorBody {
                error: msg.clone(),
                retryable: false,
            },
            ApiError::Agent(err) => {
                tracing::warn!("Request failed with {}: {:#}", status, err);
                ErrorBody {
                    error: err.to_string(),
                    retryable: err.is_retryable(),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn create_session() -> Json<SessionCreated> {
    Json(SessionCreated {
        session_id: Uuid::new_v4().to_string(),
    })
}

/// POST /sessions/:id/messages: run one turn and return the answer.
async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".into()));
    }
    let answer = state.agent.submit(&session_id, &req.text).await?;
    Ok(Json(MessageResponse { session_id, answer }))
}

/// POST /customer-care: simulate a customer conversation from `prompt`.
async fn customer_care(
    State(state): State<AppState>,
    Json(req): Json<CustomerCareRequest>,
) -> Result<Json<CustomerCareResponse>, ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".into()));
    }
    let transcript = state.simulation.run(&req.prompt).await?;
    Ok(Json(CustomerCareResponse { transcript }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodesk_agent::providers::mock::MockProvider;
    use aerodesk_agent::{ModelError, ModelReply, Speaker, ToolRegistry};
    use aerodesk_core::config::{AgentConfig, SimulationConfig};
    use aerodesk_store::InMemorySessionStore;

    fn state_with(model: MockProvider, customer: MockProvider) -> AppState {
        let agent = Arc::new(Agent::new(
            Arc::new(model),
            ToolRegistry::new(),
            Arc::new(InMemorySessionStore::new()),
            AgentConfig::default(),
        ));
        let simulation = Arc::new(CustomerSimulation::new(
            agent.clone(),
            Arc::new(customer),
            SimulationConfig::default(),
        ));
        AppState { agent, simulation }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_create_session_mints_distinct_ids() {
        let a = create_session().await.0.session_id;
        let b = create_session().await.0.session_id;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_post_message_returns_answer() {
        let state = state_with(MockProvider::new("echo"), MockProvider::new("customer"));
        let Json(resp) = post_message(
            State(state),
            Path("s-1".to_string()),
            Json(MessageRequest { text: "hello".into() }),
        )
        .await
        .unwrap();
        assert_eq!(resp.session_id, "s-1");
        assert_eq!(resp.answer, "(Mock echo Response) I received: hello");
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        let state = state_with(MockProvider::new("echo"), MockProvider::new("customer"));
        let err = post_message(
            State(state),
            Path("s-1".to_string()),
            Json(MessageRequest { text: "  ".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_model_outage_maps_to_503() {
        let model = MockProvider::scripted_results(
            "down",
            vec![Err(ModelError::RateLimited("slow down".into()))],
        );
        let state = state_with(model, MockProvider::new("customer"));
        let err = post_message(
            State(state),
            Path("s-1".to_string()),
            Json(MessageRequest { text: "hi".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |e: AgentError| ApiError::from(e).status();
        assert_eq!(status(AgentError::TurnTimeout(120)), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status(AgentError::SessionTimeout(600)), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status(AgentError::ModelProtocol("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(AgentError::ToolNotFound("refundTicket".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AgentError::SessionStore(anyhow::anyhow!("locked"))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_customer_care_runs_simulation() {
        let customer = MockProvider::scripted(vec![ModelReply::text("FINISHED")]);
        let state = state_with(MockProvider::new("echo"), customer);
        let Json(resp) = customer_care(
            State(state),
            Json(CustomerCareRequest {
                prompt: "I want a refund".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.transcript.len(), 3);
        assert_eq!(resp.transcript[0].speaker, Speaker::Customer);
        assert_eq!(resp.transcript[1].speaker, Speaker::Agent);
        assert_eq!(resp.transcript[2].text, "FINISHED");
    }

    #[tokio::test]
    async fn test_router_builds() {
        let state = state_with(MockProvider::new("echo"), MockProvider::new("customer"));
        let _router = GatewayServer::router(state);
    }
}
