use aerodesk_agent::TranscriptEntry;
use serde::{Deserialize, Serialize};

/// Body of `POST /sessions/:id/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub session_id: String,
    pub answer: String,
}

/// Reply to `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

/// Body of `POST /customer-care`: the simulated customer's opening line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCareRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCareResponse {
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// True when the same request may succeed if sent again later.
    pub retryable: bool,
}
