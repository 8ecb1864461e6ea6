// Core algorithm exports
pub mod assistant;
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod workflow;

pub use assistant::{fallback_response, Assistant, AssistantReply, AssistantState, ReplyKind};
pub use distance::{edit_distance, within_threshold};
pub use filters::{fuzzy_match, partial_match, DEFAULT_FUZZY_THRESHOLD};
pub use matcher::{union_matches, MatchResult, Matcher};
pub use scoring::{rank_by_relevance, rank_scored, relevance_score, ScoredRecord};
pub use workflow::{TicketAction, WorkflowError};
