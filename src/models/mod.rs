// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Agent, AgentRef, AssistantFeedback, AuthUser, Category, CategoryField, ChatMessage,
    ChatRole, CriteriaRef, EntryFeedback, EntryField, EntryPhoto, EntryUpdate, Evaluation,
    EvaluationCriteria, EvaluationDetail, EvaluationResult, EvaluationResultDetail,
    EvaluationSummary, KnowledgeEntry, MatchingParams, NewAgent, NewComment, NewEntry,
    NewEvaluation, NewTicket, Searchable, Session, SupportTicket, TicketComment, TicketCounts,
    TicketStatus, TicketUpdate, UnionPolicy,
};
pub use requests::{
    AgentRequest, AssistantFeedbackRequest, AssistantMessageRequest, ChatRequest, CommentRequest,
    CategoryRequest, CreateEntryRequest, CreateEvaluationRequest, CreateTicketRequest,
    CriteriaResultRequest, EntryFeedbackRequest, SearchRequest, SignInRequest,
    UpdateEntryRequest, UploadQuery,
};
pub use responses::{
    AssistantMessageResponse, ChatResponse, EvaluationResponse,
    FeedbackResponse, HealthResponse, SearchResponse, TicketActionResponse, UploadResponse,
};
