// Service exports
pub mod auth;
pub mod backend;
pub mod cache;
pub mod chat;
pub mod email;

pub use auth::{AuthClient, AuthError, Claims, TokenVerifier};
pub use backend::{BackendClient, BackendError, BackendTables};
pub use cache::{KnowledgeCache, KnowledgeSnapshot};
pub use chat::{ChatClient, ChatError};
pub use email::{EmailClient, EmailError, EmailMessage, EmailOutcome};
