//! Call-control documents
//!
//! A [`ControlDocument`] is the ordered list of instructions the telephony
//! runtime executes for a call leg. Documents are immutable once built and
//! always end with a terminating instruction (`Dial` or `Reject`): the only
//! ways to obtain one are [`ControlDocument::new`], which checks this, and
//! [`ControlDocumentBuilder`], whose outputs satisfy it by construction.

use thiserror::Error;

use super::routing::RoutingDecision;

/// Announcement played before rejecting a call that could not be routed
pub const ERROR_ANNOUNCEMENT: &str = "An error occurred while processing your call.";

/// Greeting for calls arriving on the plain voice endpoint
pub const WAITING_GREETING: &str = "Thanks for calling! Please wait while we connect your call.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("control document has no instructions")]
    Empty,

    #[error("control document must end with a Dial or Reject instruction")]
    Unterminated,

    #[error("failed to serialize control document: {0}")]
    Serialization(String),
}

/// A single step of a call-control document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlInstruction {
    /// Read text to the caller
    Speak { text: String },
    /// Connect the call to `target`, presenting `caller_id_override` to the far end
    Dial {
        target: String,
        caller_id_override: Option<String>,
    },
    /// Refuse the call
    Reject,
}

impl ControlInstruction {
    pub fn speak(text: impl Into<String>) -> Self {
        Self::Speak { text: text.into() }
    }

    pub fn dial(target: impl Into<String>, caller_id_override: Option<String>) -> Self {
        Self::Dial {
            target: target.into(),
            caller_id_override,
        }
    }

    /// Whether this instruction ends the call-handling sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dial { .. } | Self::Reject)
    }
}

/// Ordered, terminated sequence of [`ControlInstruction`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDocument {
    instructions: Vec<ControlInstruction>,
}

impl ControlDocument {
    /// Build a document, checking that its last instruction terminates the call
    pub fn new(instructions: Vec<ControlInstruction>) -> Result<Self, DocumentError> {
        match instructions.last() {
            None => Err(DocumentError::Empty),
            Some(last) if !last.is_terminal() => Err(DocumentError::Unterminated),
            Some(_) => Ok(Self { instructions }),
        }
    }

    /// The document served whenever a request cannot be routed
    pub fn error() -> Self {
        Self {
            instructions: vec![
                ControlInstruction::speak(ERROR_ANNOUNCEMENT),
                ControlInstruction::Reject,
            ],
        }
    }

    pub fn instructions(&self) -> &[ControlInstruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Serialize to the provider's XML markup
    pub fn to_twiml(&self) -> Result<String, DocumentError> {
        super::twiml::to_twiml(self)
    }
}

/// Renders routing decisions into control documents
pub struct ControlDocumentBuilder;

impl ControlDocumentBuilder {
    /// Render the document for a routing decision
    ///
    /// Dial targets are passed through untouched.
    pub fn render(decision: &RoutingDecision) -> ControlDocument {
        let instructions = match decision {
            RoutingDecision::BrowserOriginatedDial {
                callee_identity,
                caller_id_override,
            } => vec![ControlInstruction::dial(
                callee_identity.clone(),
                caller_id_override.clone(),
            )],
            RoutingDecision::InboundGreetAndDial {
                callee_identity,
                caller_id_override,
                greeting,
            } => vec![
                ControlInstruction::speak(greeting.clone()),
                ControlInstruction::dial(callee_identity.clone(), caller_id_override.clone()),
            ],
            RoutingDecision::Error { .. } => return ControlDocument::error(),
        };

        ControlDocument { instructions }
    }

    /// Render the waiting greeting for the plain voice endpoint
    ///
    /// The greeting is followed by a dial to `forward_to` when one is
    /// configured, and by a rejection otherwise.
    pub fn greeting(
        text: &str,
        forward_to: Option<&str>,
        caller_id_override: Option<&str>,
    ) -> ControlDocument {
        let terminal = match forward_to.filter(|target| !target.trim().is_empty()) {
            Some(target) => {
                ControlInstruction::dial(target, caller_id_override.map(str::to_string))
            }
            None => ControlInstruction::Reject,
        };

        ControlDocument {
            instructions: vec![ControlInstruction::speak(text), terminal],
        }
    }

    /// Render a single dial, used for outbound calls placed through the provider
    pub fn dial(target: &str, caller_id_override: Option<&str>) -> ControlDocument {
        ControlDocument {
            instructions: vec![ControlInstruction::dial(
                target,
                caller_id_override.map(str::to_string),
            )],
        }
    }
}
