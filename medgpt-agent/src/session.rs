//! One user's conversation with the assistant.

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::assistant::{Answer, MedicalAssistant};
use crate::error::AnswerError;
use crate::render::ResponseRenderer;
use crate::transcript::Transcript;

/// Availability flags shown alongside the transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    pub index_reachable: bool,
    pub credential_present: bool,
    pub model: Option<String>,
}

/// Outcome of [`Session::ask`].
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Blank question; the transcript is unchanged.
    Rejected,
    /// Stopped before any pipeline step ran; only the user turn was recorded.
    Halted { notice: String },
    /// The answer (generated, fallback or interrupted) was recorded.
    Answered(Answer),
    /// A pipeline failure; `notice` was recorded as the assistant turn.
    Failed { error: AnswerError, notice: String },
}

/// Owns exactly one [`Transcript`]. Sessions share nothing with each other.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    transcript: Transcript,
    status: SystemStatus,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SystemStatus::default())
    }
}

impl Session {
    pub fn new(status: SystemStatus) -> Self {
        Self { id: Uuid::new_v4(), transcript: Transcript::default(), status }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn status(&self) -> &SystemStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: SystemStatus) {
        self.status = status;
    }

    /// Run one interaction and record it.
    ///
    /// The transcript grows by two turns for an answered or failed
    /// interaction, by one when halted, and not at all when rejected.
    pub async fn ask(
        &mut self,
        assistant: &MedicalAssistant,
        query: &str,
        renderer: &mut dyn ResponseRenderer,
    ) -> Interaction {
        if query.trim().is_empty() {
            debug!(session = %self.id, "rejected blank query");
            return Interaction::Rejected;
        }

        self.transcript.push_user(query);

        match assistant.answer(query, renderer).await {
            Ok(answer) => {
                self.transcript.push_assistant(answer.text.clone());
                Interaction::Answered(answer)
            }
            Err(AnswerError::MissingCredential) => {
                warn!(session = %self.id, "no credential, interaction halted");
                Interaction::Halted { notice: AnswerError::MissingCredential.user_message() }
            }
            Err(error) => {
                let notice = error.user_message();
                self.transcript.push_assistant(notice.clone());
                Interaction::Failed { error, notice }
            }
        }
    }
}
