use serde::{Deserialize, Serialize};
use crate::core::assistant::{AssistantState, ReplyKind};
use crate::core::scoring::ScoredRecord;
use crate::models::domain::{
    Category, Evaluation, EvaluationResult, KnowledgeEntry, SupportTicket, TicketComment,
};

/// Response for the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub categories: Vec<Category>,
    pub entries: Vec<ScoredRecord<KnowledgeEntry>>,
    pub total_candidates: usize,
}

/// Assistant reply plus the state the client sends back next turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessageResponse {
    pub kind: ReplyKind,
    pub reply: String,
    pub state: AssistantState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Outcome of a ticket state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketActionResponse {
    pub ticket: SupportTicket,
    pub comment: Option<TicketComment>,
    pub email_sent: bool,
    pub email_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub evaluation: Evaluation,
    pub results: Vec<EvaluationResult>,
}
