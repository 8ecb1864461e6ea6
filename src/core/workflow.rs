use crate::models::{SupportTicket, TicketStatus, TicketUpdate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Ticket #{id} is already {status}")]
    InvalidTransition { id: i64, status: &'static str },
}

/// Staff action on a support ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    MarkRead,
    TakeOver,
    Complete,
}

impl TicketAction {
    /// Build the update for `ticket`, performed by the staff member `actor`
    ///
    /// Completed tickets are closed: taking them over or completing them
    /// again is rejected. Marking as read always succeeds.
    pub fn plan(self, ticket: &SupportTicket, actor: &str) -> Result<TicketUpdate, WorkflowError> {
        match self {
            TicketAction::MarkRead => Ok(TicketUpdate {
                is_read: Some(true),
                ..TicketUpdate::default()
            }),
            TicketAction::TakeOver | TicketAction::Complete if !ticket.status.is_open() => {
                Err(WorkflowError::InvalidTransition {
                    id: ticket.id,
                    status: ticket.status.as_str(),
                })
            }
            TicketAction::TakeOver => Ok(TicketUpdate {
                status: Some(TicketStatus::InProgress),
                assigned_to: Some(actor.to_string()),
                ..TicketUpdate::default()
            }),
            TicketAction::Complete => Ok(TicketUpdate {
                status: Some(TicketStatus::Completed),
                ..TicketUpdate::default()
            }),
        }
    }

    /// Comment appended to the ticket history, if the action leaves one
    pub fn audit_comment(self, actor: &str) -> Option<String> {
        match self {
            TicketAction::MarkRead => None,
            TicketAction::TakeOver => Some(format!("Ticket übernommen von {}", actor)),
            TicketAction::Complete => Some(format!("Ticket erledigt von {}", actor)),
        }
    }
}
