use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::core::assistant::AssistantState;
use crate::models::domain::ChatMessage;

/// Free-text knowledge-base search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 500))]
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u16,
}

fn default_limit() -> u16 {
    5
}

/// One user turn in the assistant conversation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssistantMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default)]
    pub state: AssistantState,
    /// Earlier turns, forwarded to the chat service when the knowledge base has no answer
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssistantFeedbackRequest {
    pub query: String,
    #[validate(length(min = 1))]
    pub response: String,
    pub is_positive: bool,
}

/// Free-form chat completion request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1))]
    pub messages: Vec<ChatMessage>,
}

/// Ticket filed by an end user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// A phone number needs at least six digits once formatting is stripped.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.chars().filter(|c| c.is_ascii_digit()).count() >= 6 {
        Ok(())
    } else {
        Err(ValidationError::new("phone_too_short"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub solution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateEntryRequest {
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryFeedbackRequest {
    pub helpful: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Query string of a photo upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// Create or replace an agent
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaResultRequest {
    pub criteria_id: i64,
    pub is_ok: bool,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    pub agent_id: i64,
    #[validate(length(min = 1))]
    pub evaluated_at: String,
    #[serde(default)]
    #[validate(nested)]
    pub results: Vec<CriteriaResultRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("+49 (0) 30 1234").is_ok());
        assert!(validate_phone("12-34").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_ticket_request_validation() {
        let request = CreateTicketRequest {
            name: "Anna".to_string(),
            email: "anna@example.com".to_string(),
            phone: "0301234567".to_string(),
            description: "Drucker druckt nicht".to_string(),
            image_urls: vec![],
        };
        assert!(request.validate().is_ok());

        let bad_email = CreateTicketRequest {
            email: "anna.example.com".to_string(),
            ..request
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_evaluation_rating_range() {
        let request: CreateEvaluationRequest = serde_json::from_str(
            r#"{"agentId":4,"evaluatedAt":"2024-05-02","results":[
                {"criteriaId":1,"isOk":true,"rating":5},
                {"criteriaId":2,"isOk":true}
            ]}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        for rating in [0, 6] {
            let mut bad = request.clone();
            bad.results[0].rating = Some(rating);
            assert!(bad.validate().is_err(), "rating {}", rating);
        }
    }

    #[test]
    fn test_search_request_default_limit() {
        let request: SearchRequest = serde_json::from_str(r#"{"query":"drucker"}"#).unwrap();
        assert_eq!(request.limit, 5);
    }
}
