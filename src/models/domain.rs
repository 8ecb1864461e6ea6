use serde::{Deserialize, Serialize};

/// A record the matching core can search.
///
/// Field keys are a closed enum per record type, so asking for a field the
/// record does not have is a compile error rather than a runtime coercion.
pub trait Searchable: Clone {
    type Field: Copy;

    /// Stable identity used when merging result sets.
    fn id(&self) -> i64;

    /// Text of a single searchable field.
    fn field_text(&self, field: Self::Field) -> &str;

    /// The `description`-like text used for relevance ranking.
    fn primary_text(&self) -> &str;
}

/// Knowledge-base category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    Name,
}

impl Searchable for Category {
    type Field = CategoryField;

    fn id(&self) -> i64 {
        self.id
    }

    fn field_text(&self, field: CategoryField) -> &str {
        match field {
            CategoryField::Name => &self.name,
        }
    }

    fn primary_text(&self) -> &str {
        &self.name
    }
}

/// Photo attached to a knowledge entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPhoto {
    pub id: i64,
    pub photo_url: String,
}

/// Error/solution article, stored in the `errors` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub description: String,
    pub solution: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub last_edited_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub helpful_count: i64,
    #[serde(default)]
    pub not_helpful_count: i64,
    #[serde(default, alias = "error_photos")]
    pub photos: Vec<EntryPhoto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Description,
    Solution,
}

impl Searchable for KnowledgeEntry {
    type Field = EntryField;

    fn id(&self) -> i64 {
        self.id
    }

    fn field_text(&self, field: EntryField) -> &str {
        match field {
            EntryField::Description => &self.description,
            EntryField::Solution => &self.solution,
        }
    }

    fn primary_text(&self) -> &str {
        &self.description
    }
}

/// Row payload for a new knowledge entry
#[derive(Debug, Clone, Serialize)]
pub struct NewEntry {
    pub description: String,
    pub solution: String,
    pub category_id: i64,
    pub created_by: String,
    pub last_edited_by: String,
}

/// Partial update of a knowledge entry
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edited_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helpful_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_helpful_count: Option<i64>,
}

/// Support ticket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TicketStatus {
    New,
    InProgress,
    Completed,
}

impl TicketStatus {
    /// Whether a ticket in this status may be taken over or completed.
    pub fn is_open(self) -> bool {
        !matches!(self, TicketStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "inProgress",
            TicketStatus::Completed => "completed",
        }
    }
}

/// Support ticket filed by an end user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub error_description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub status: TicketStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl SupportTicket {
    /// Image URLs are stored comma-joined in a single column.
    pub fn image_urls(&self) -> Vec<&str> {
        self.image_url
            .as_deref()
            .map(|urls| urls.split(',').filter(|u| !u.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// Row payload for a new ticket
#[derive(Debug, Clone, Serialize)]
pub struct NewTicket {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub error_description: String,
    pub image_url: Option<String>,
}

/// Ticket counters for the staff notification badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCounts {
    pub unread: usize,
    pub new: usize,
}

/// Partial update of a ticket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketComment {
    pub id: i64,
    pub ticket_id: i64,
    pub text: String,
    pub author: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub ticket_id: i64,
    pub text: String,
    pub author: String,
}

/// Helpful / not helpful vote on a knowledge entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryFeedback {
    pub error_id: i64,
    pub is_helpful: bool,
}

/// Thumbs up/down on an assistant reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantFeedback {
    pub query: String,
    pub response: String,
    pub is_positive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub agent_id: String,
}

/// Row payload for creating or replacing an agent
#[derive(Debug, Clone, Serialize)]
pub struct NewAgent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub agent_id: String,
}

/// Agent columns embedded in evaluation listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRef {
    pub first_name: String,
    pub last_name: String,
    pub agent_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCriteria {
    pub id: i64,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub background_color: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,
    pub agent_id: i64,
    pub evaluated_at: String,
    pub evaluator: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEvaluation {
    pub agent_id: i64,
    pub evaluated_at: String,
    pub evaluator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub evaluation_id: i64,
    pub criteria_id: i64,
    pub is_ok: bool,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Evaluation row joined with its agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub id: i64,
    #[serde(default)]
    pub agent_id: Option<i64>,
    pub evaluated_at: String,
    pub evaluator: String,
    #[serde(default, alias = "agents")]
    pub agent: Option<AgentRef>,
}

/// Criteria columns embedded in an evaluation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaRef {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub background_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResultDetail {
    #[serde(default)]
    pub criteria_id: Option<i64>,
    pub is_ok: bool,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "evaluation_criteria")]
    pub criteria: Option<CriteriaRef>,
}

/// Evaluation with its agent and every per-criteria result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDetail {
    #[serde(flatten)]
    pub summary: EvaluationSummary,
    #[serde(default, alias = "evaluation_results")]
    pub results: Vec<EvaluationResultDetail>,
}

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Authenticated staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

/// Session returned by the backend's password grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// How the fuzzy and partial result sets are merged before ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionPolicy {
    /// Keep the first occurrence of each record id
    #[default]
    DedupById,
    /// Concatenate both sets as-is; a record matched by both paths appears twice
    Preserve,
}

/// Matching parameters
#[derive(Debug, Clone, Copy)]
pub struct MatchingParams {
    pub category_threshold: f64,
    pub entry_threshold: f64,
    pub union_policy: UnionPolicy,
}

impl Default for MatchingParams {
    fn default() -> Self {
        Self {
            category_threshold: 0.3,
            entry_threshold: 0.3,
            union_policy: UnionPolicy::DedupById,
        }
    }
}
