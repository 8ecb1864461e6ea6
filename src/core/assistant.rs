//! Rule-based helpdesk assistant.
//!
//! The assistant is a small state machine on top of the query pipeline. It
//! keeps no state of its own: every turn takes the previous
//! [`AssistantState`] and returns the next one, so the HTTP layer can hand
//! it to the client and get it back with the following message.

use serde::{Deserialize, Serialize};
use crate::core::matcher::Matcher;
use crate::models::{Category, KnowledgeEntry};

const GREETING: &str = "Guten Tag! Ich bin Ihr KI-Assistent und stehe Ihnen gerne zur Verfügung. Wie kann ich Ihnen heute helfen?";

const FALLBACK_PASSWORD: &str = "Für Passwortprobleme empfehle ich Ihnen, das Passwort zurückzusetzen. Gehen Sie dazu auf die Login-Seite und klicken Sie auf 'Passwort vergessen'. Folgen Sie dann den Anweisungen in der E-Mail, die Sie erhalten.";
const FALLBACK_LOGIN: &str = "Bei Problemen mit der Anmeldung überprüfen Sie bitte zunächst, ob Ihre Zugangsdaten korrekt sind. Wenn Sie sich immer noch nicht anmelden können, versuchen Sie, Ihren Browser-Cache zu leeren oder ein anderes Gerät zu verwenden.";
const FALLBACK_ACCOUNT: &str = "Für Fragen zu Ihrem Konto wenden Sie sich bitte an unseren Support.";
const FALLBACK_GENERIC: &str = "Entschuldigung, ich konnte keine spezifische Antwort auf Ihre Frage finden. Können Sie Ihr Anliegen bitte genauer beschreiben oder umformulieren? Alternativ können Sie auch unseren Support kontaktieren für persönliche Unterstützung.";

/// Conversation state carried between turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantState {
    /// Number of user turns answered so far
    pub turns: usize,
    pub awaiting_confirmation: bool,
    pub current_category: Option<String>,
    pub current_error: Option<String>,
    pub current_solution: Option<String>,
}

/// What kind of answer the assistant gave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Greeting,
    CategoryClarification,
    SolutionOffer,
    SolutionReveal,
    DetailRequest,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub kind: ReplyKind,
    pub text: String,
    pub state: AssistantState,
}

#[derive(Debug, Clone)]
pub struct Assistant {
    matcher: Matcher,
}

impl Assistant {
    pub fn new(matcher: Matcher) -> Self {
        Self { matcher }
    }

    /// Answer one user message
    ///
    /// # Arguments
    /// * `state` - State returned by the previous turn (default for a new conversation)
    /// * `message` - The user's message, already checked to be non-blank
    /// * `categories` - All categories
    /// * `entries` - All knowledge entries
    pub fn respond(
        &self,
        state: &AssistantState,
        message: &str,
        categories: &[Category],
        entries: &[KnowledgeEntry],
    ) -> AssistantReply {
        let mut next = state.clone();
        next.turns = state.turns + 1;

        if state.turns == 0 {
            return reply(ReplyKind::Greeting, GREETING.to_string(), next);
        }

        if state.awaiting_confirmation {
            next.awaiting_confirmation = false;
            let error = state.current_error.as_deref().unwrap_or_default();

            return if is_confirmation(message) {
                let solution = state.current_solution.as_deref().unwrap_or_default();
                let text = format!(
                    "Hier ist eine mögliche Lösung für Ihr Problem mit \"{error}\":\n\n{solution}\n\nIch hoffe, das hilft Ihnen weiter. Lassen Sie mich wissen, ob Sie weitere Fragen haben oder zusätzliche Hilfe benötigen."
                );
                reply(ReplyKind::SolutionReveal, text, next)
            } else {
                let text = format!(
                    "Ich verstehe. Lassen Sie uns Ihr Problem mit \"{error}\" genauer betrachten. Können Sie mir mehr Details dazu geben? Welche spezifischen Schwierigkeiten erleben Sie?"
                );
                reply(ReplyKind::DetailRequest, text, next)
            };
        }

        let result = self.matcher.find_matches(message, categories, entries, 1);

        if let Some(category) = result.categories.first() {
            let text = format!(
                "Ich sehe, dass Sie Hilfe im Bereich \"{}\" benötigen. Können Sie mir mehr Details zu Ihrem spezifischen Problem oder Ihrer Frage in dieser Kategorie geben?",
                category.name
            );
            next.current_category = Some(category.name.clone());
            return reply(ReplyKind::CategoryClarification, text, next);
        }

        if let Some(entry) = result.top_entry() {
            let text = format!(
                "Ich sehe, dass Sie Probleme mit \"{}\" haben. Ich habe eine mögliche Lösung gefunden. Möchten Sie, dass ich Ihnen diese Lösung zeige?",
                entry.description
            );
            next.current_error = Some(entry.description.clone());
            next.current_solution = Some(entry.solution.clone());
            next.awaiting_confirmation = true;
            return reply(ReplyKind::SolutionOffer, text, next);
        }

        reply(ReplyKind::Fallback, fallback_response(message).to_string(), next)
    }
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new(Matcher::default())
    }
}

fn reply(kind: ReplyKind, text: String, state: AssistantState) -> AssistantReply {
    AssistantReply { kind, text, state }
}

/// Substring check, so "Ja, gerne" and "jawohl" both confirm.
fn is_confirmation(message: &str) -> bool {
    message.to_lowercase().contains("ja")
}

/// Canned answer for queries nothing in the knowledge base matched
pub fn fallback_response(query: &str) -> &'static str {
    let query = query.to_lowercase();

    if query.contains("passwort") {
        FALLBACK_PASSWORD
    } else if query.contains("anmelden") || query.contains("login") {
        FALLBACK_LOGIN
    } else if query.contains("konto") || query.contains("account") {
        FALLBACK_ACCOUNT
    } else {
        FALLBACK_GENERIC
    }
}
