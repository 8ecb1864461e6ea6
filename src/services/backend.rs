use crate::models::{
    Agent, AssistantFeedback, Category, EntryFeedback, EntryPhoto, EntryUpdate, Evaluation,
    EvaluationCriteria, EvaluationDetail, EvaluationResult, EvaluationSummary, KnowledgeEntry,
    NewAgent, NewComment, NewEntry, NewEvaluation, NewTicket, SupportTicket, TicketComment,
    TicketCounts, TicketUpdate,
};
use reqwest::{header::CONTENT_RANGE, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the data backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the backend
#[derive(Debug, Clone)]
pub struct BackendTables {
    pub categories: String,
    pub entries: String,
    pub entry_photos: String,
    pub entry_feedback: String,
    pub assistant_feedback: String,
    pub tickets: String,
    pub comments: String,
    pub agents: String,
    pub criteria: String,
    pub evaluations: String,
    pub evaluation_results: String,
}

impl Default for BackendTables {
    fn default() -> Self {
        Self {
            categories: "categories".to_string(),
            entries: "errors".to_string(),
            entry_photos: "error_photos".to_string(),
            entry_feedback: "error_feedback".to_string(),
            assistant_feedback: "feedback".to_string(),
            tickets: "support_tickets".to_string(),
            comments: "ticket_comments".to_string(),
            agents: "agents".to_string(),
            criteria: "evaluation_criteria".to_string(),
            evaluations: "evaluations".to_string(),
            evaluation_results: "evaluation_results".to_string(),
        }
    }
}

/// Data backend client
///
/// Talks to a PostgREST-style table API (`/rest/v1`) and an object store
/// (`/storage/v1`). Handles:
/// - Categories and knowledge entries
/// - Support tickets and their comments
/// - Feedback and agent evaluations
/// - File uploads
pub struct BackendClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: BackendTables,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(base_url: String, api_key: String, tables: BackendTables) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            tables,
        })
    }

    pub fn tables(&self) -> &BackendTables {
        &self.tables
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Select rows from a table
    ///
    /// `query` holds PostgREST parameters, e.g. `("id", "eq.3")` or `("order", "created_at.desc")`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        tracing::debug!("Selecting from {} with {:?}", table, query);

        let response = self
            .authorize(self.client.get(self.rest_url(table)))
            .query(query)
            .send()
            .await?;

        parse_rows(check_status(response, table).await?).await
    }

    /// Select the single row whose `id` equals `id`
    pub async fn select_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
        id: i64,
    ) -> Result<T, BackendError> {
        let rows: Vec<T> = self
            .select(
                table,
                &[
                    ("select", select.to_string()),
                    ("id", format!("eq.{}", id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("{} row {}", table, id)))
    }

    /// Insert one or more rows and return the stored representation
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .authorize(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        parse_rows(check_status(response, table).await?).await
    }

    /// Insert a single row and return it
    pub async fn insert_one<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        self.insert::<B, T>(table, body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse(format!("Insert into {} returned no row", table)))
    }

    /// Patch the row with the given id and return the updated row
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self
            .authorize(self.client.patch(self.rest_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let rows: Vec<T> = parse_rows(check_status(response, table).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("{} row {}", table, id)))
    }

    /// Delete every row where `column` equals `value`; returns the number of deleted rows
    pub async fn delete_where(&self, table: &str, column: &str, value: i64) -> Result<usize, BackendError> {
        let response = self
            .authorize(self.client.delete(self.rest_url(table)))
            .query(&[(column, format!("eq.{}", value))])
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = parse_rows(check_status(response, table).await?).await?;
        tracing::debug!("Deleted {} rows from {} where {}={}", rows.len(), table, column, value);

        Ok(rows.len())
    }

    /// Delete the row with the given id
    pub async fn delete(&self, table: &str, id: i64) -> Result<(), BackendError> {
        match self.delete_where(table, "id", id).await? {
            0 => Err(BackendError::NotFound(format!("{} row {}", table, id))),
            _ => Ok(()),
        }
    }

    /// Number of rows matching `filters`, read from the `Content-Range` header
    pub async fn count(&self, table: &str, filters: &[(&str, String)]) -> Result<usize, BackendError> {
        let response = self
            .authorize(self.client.get(self.rest_url(table)))
            .query(&[("select", "id"), ("limit", "1")])
            .query(filters)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let response = check_status(response, table).await?;
        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| BackendError::InvalidResponse(format!("Count on {} without Content-Range", table)))?;

        parse_total(range)
            .ok_or_else(|| BackendError::InvalidResponse(format!("Unexpected Content-Range: {}", range)))
    }

    // Categories

    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        self.select(
            &self.tables.categories,
            &[("select", "id,name".to_string()), ("order", "id.asc".to_string())],
        )
        .await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, BackendError> {
        self.select_by_id(&self.tables.categories, "id,name", id).await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, BackendError> {
        self.insert_one(&self.tables.categories, &json!({ "name": name })).await
    }

    pub async fn rename_category(&self, id: i64, name: &str, editor: &str) -> Result<Category, BackendError> {
        let update = json!({
            "name": name,
            "last_edited_by": editor,
            "updated_at": chrono::Utc::now(),
        });
        self.update(&self.tables.categories, id, &update).await
    }

    /// Delete a category that no entry references any more
    pub async fn delete_category(&self, id: i64) -> Result<(), BackendError> {
        let entries = self
            .count(&self.tables.entries, &[("category_id", format!("eq.{}", id))])
            .await?;
        if entries > 0 {
            return Err(BackendError::Conflict(format!(
                "category {} still has {} entries",
                id, entries
            )));
        }

        self.delete(&self.tables.categories, id).await
    }

    // Knowledge entries

    fn entry_select(&self) -> String {
        format!("*,{}(id,photo_url)", self.tables.entry_photos)
    }

    pub async fn list_entries(&self) -> Result<Vec<KnowledgeEntry>, BackendError> {
        self.select(
            &self.tables.entries,
            &[("select", self.entry_select()), ("order", "id.asc".to_string())],
        )
        .await
    }

    pub async fn list_entries_by_category(&self, category_id: i64) -> Result<Vec<KnowledgeEntry>, BackendError> {
        self.select(
            &self.tables.entries,
            &[
                ("select", self.entry_select()),
                ("category_id", format!("eq.{}", category_id)),
                ("order", "id.asc".to_string()),
            ],
        )
        .await
    }

    pub async fn get_entry(&self, id: i64) -> Result<KnowledgeEntry, BackendError> {
        self.select_by_id(&self.tables.entries, &self.entry_select(), id).await
    }

    pub async fn create_entry(&self, entry: &NewEntry) -> Result<KnowledgeEntry, BackendError> {
        self.insert_one(&self.tables.entries, entry).await
    }

    pub async fn update_entry(&self, id: i64, update: &EntryUpdate) -> Result<KnowledgeEntry, BackendError> {
        self.update(&self.tables.entries, id, update).await
    }

    /// Delete an entry together with its photo rows
    pub async fn delete_entry(&self, id: i64) -> Result<(), BackendError> {
        self.delete_where(&self.tables.entry_photos, "error_id", id).await?;
        self.delete(&self.tables.entries, id).await
    }

    pub async fn add_entry_photo(&self, entry_id: i64, photo_url: &str) -> Result<EntryPhoto, BackendError> {
        self.insert_one(
            &self.tables.entry_photos,
            &json!({ "error_id": entry_id, "photo_url": photo_url }),
        )
        .await
    }

    /// Store a helpful/not helpful vote and bump the entry's counters
    pub async fn record_entry_feedback(
        &self,
        entry: &KnowledgeEntry,
        helpful: bool,
    ) -> Result<KnowledgeEntry, BackendError> {
        let feedback = EntryFeedback {
            error_id: entry.id,
            is_helpful: helpful,
        };
        let _: Vec<serde_json::Value> = self.insert(&self.tables.entry_feedback, &feedback).await?;

        let update = if helpful {
            EntryUpdate {
                helpful_count: Some(entry.helpful_count + 1),
                ..EntryUpdate::default()
            }
        } else {
            EntryUpdate {
                not_helpful_count: Some(entry.not_helpful_count + 1),
                ..EntryUpdate::default()
            }
        };

        self.update_entry(entry.id, &update).await
    }

    pub async fn record_assistant_feedback(&self, feedback: &AssistantFeedback) -> Result<(), BackendError> {
        let _: Vec<serde_json::Value> = self.insert(&self.tables.assistant_feedback, feedback).await?;
        Ok(())
    }

    // Tickets

    /// All tickets, newest first
    pub async fn list_tickets(&self) -> Result<Vec<SupportTicket>, BackendError> {
        self.select(
            &self.tables.tickets,
            &[("select", "*".to_string()), ("order", "created_at.desc".to_string())],
        )
        .await
    }

    pub async fn get_ticket(&self, id: i64) -> Result<SupportTicket, BackendError> {
        self.select_by_id(&self.tables.tickets, "*", id).await
    }

    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<SupportTicket, BackendError> {
        self.insert_one(&self.tables.tickets, ticket).await
    }

    pub async fn update_ticket(&self, id: i64, update: &TicketUpdate) -> Result<SupportTicket, BackendError> {
        self.update(&self.tables.tickets, id, update).await
    }

    pub async fn delete_ticket(&self, id: i64) -> Result<(), BackendError> {
        self.delete(&self.tables.tickets, id).await
    }

    /// Unread and new ticket counts for the staff notification badge
    pub async fn ticket_counts(&self) -> Result<TicketCounts, BackendError> {
        let table = &self.tables.tickets;
        let unread_filters = [("is_read", "eq.false".to_string())];
        let new_filters = [("status", "eq.new".to_string())];
        let (unread, new) = tokio::try_join!(
            self.count(table, &unread_filters),
            self.count(table, &new_filters),
        )?;

        Ok(TicketCounts { unread, new })
    }

    /// Comments of a ticket, oldest first
    pub async fn list_comments(&self, ticket_id: i64) -> Result<Vec<TicketComment>, BackendError> {
        self.select(
            &self.tables.comments,
            &[
                ("select", "*".to_string()),
                ("ticket_id", format!("eq.{}", ticket_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    pub async fn add_comment(&self, comment: &NewComment) -> Result<TicketComment, BackendError> {
        self.insert_one(&self.tables.comments, comment).await
    }

    // Evaluations

    pub async fn list_agents(&self) -> Result<Vec<Agent>, BackendError> {
        self.select(
            &self.tables.agents,
            &[("select", "*".to_string()), ("order", "last_name.asc".to_string())],
        )
        .await
    }

    pub async fn create_agent(&self, agent: &NewAgent) -> Result<Agent, BackendError> {
        self.insert_one(&self.tables.agents, agent).await
    }

    pub async fn update_agent(&self, id: i64, agent: &NewAgent) -> Result<Agent, BackendError> {
        self.update(&self.tables.agents, id, agent).await
    }

    pub async fn delete_agent(&self, id: i64) -> Result<(), BackendError> {
        self.delete(&self.tables.agents, id).await
    }

    pub async fn list_criteria(&self) -> Result<Vec<EvaluationCriteria>, BackendError> {
        self.select(
            &self.tables.criteria,
            &[("select", "*".to_string()), ("order", "sort_order.asc".to_string())],
        )
        .await
    }

    /// Store an evaluation row, then its per-criteria results
    ///
    /// `results` carry a placeholder `evaluation_id`; it is replaced with the
    /// id of the stored evaluation.
    pub async fn create_evaluation(
        &self,
        evaluation: &NewEvaluation,
        results: Vec<EvaluationResult>,
    ) -> Result<(Evaluation, Vec<EvaluationResult>), BackendError> {
        let stored: Evaluation = self.insert_one(&self.tables.evaluations, evaluation).await?;

        if results.is_empty() {
            return Ok((stored, vec![]));
        }

        let results: Vec<EvaluationResult> = results
            .into_iter()
            .map(|result| EvaluationResult {
                evaluation_id: stored.id,
                ..result
            })
            .collect();

        let stored_results = match self.insert(&self.tables.evaluation_results, &results).await {
            Ok(rows) => rows,
            Err(e) => {
                // No evaluation without its results
                if let Err(cleanup) = self.delete(&self.tables.evaluations, stored.id).await {
                    tracing::error!("Failed to remove evaluation {} after error: {}", stored.id, cleanup);
                }
                return Err(e);
            }
        };

        tracing::debug!(
            "Stored evaluation {} with {} results",
            stored.id,
            results.len()
        );

        Ok((stored, stored_results))
    }

    /// Evaluations with their agent, newest first
    pub async fn list_evaluations(&self) -> Result<Vec<EvaluationSummary>, BackendError> {
        let select = format!(
            "id,agent_id,evaluated_at,evaluator,{}(first_name,last_name,agent_id)",
            self.tables.agents
        );
        self.select(
            &self.tables.evaluations,
            &[("select", select), ("order", "evaluated_at.desc".to_string())],
        )
        .await
    }

    /// One evaluation with its agent and per-criteria results
    pub async fn get_evaluation(&self, id: i64) -> Result<EvaluationDetail, BackendError> {
        let select = format!(
            "id,agent_id,evaluated_at,evaluator,{}(first_name,last_name,agent_id),\
             {}(criteria_id,is_ok,rating,notes,{}(name,category,background_color))",
            self.tables.agents, self.tables.evaluation_results, self.tables.criteria
        );
        self.select_by_id(&self.tables.evaluations, &select, id).await
    }

    // Storage

    /// Public URL of an object in a public bucket
    pub fn public_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            urlencoding::encode(name)
        )
    }

    /// Upload an object and return its public URL
    pub async fn upload(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            bucket,
            urlencoding::encode(name)
        );

        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Upload of {}/{} failed: {} - {}", bucket, name, status, body);
            return Err(BackendError::StorageError(format!("{}: {}", status, body)));
        }

        tracing::debug!("Uploaded {}/{}", bucket, name);

        Ok(self.public_url(bucket, name))
    }
}

/// Map error statuses to typed errors
async fn check_status(response: Response, table: &str) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
    tracing::error!("Request on {} failed: {} - {}", table, status, body);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
        StatusCode::NOT_FOUND => BackendError::NotFound(table.to_string()),
        StatusCode::CONFLICT => BackendError::Conflict(body),
        _ => BackendError::ApiError {
            status: status.as_u16(),
            message: body,
        },
    })
}

/// Total from a `Content-Range` value such as `0-0/12` or `*/0`
fn parse_total(range: &str) -> Option<usize> {
    range.rsplit_once('/').and_then(|(_, total)| total.parse().ok())
}

async fn parse_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, BackendError> {
    let json: serde_json::Value = response.json().await?;

    serde_json::from_value(json)
        .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse rows: {}", e)))
}
