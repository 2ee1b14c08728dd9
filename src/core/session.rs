//! Browser device session lifecycle
//!
//! Tracks one soft-client device from token registration through its calls:
//!
//! ```text
//! Idle -> Registering -> Ready -> Connecting -> InCall -> Ended
//! ```
//!
//! A call that hangs up or fails ends in `Ended` with the device still
//! registered, so the next `Connect` is accepted directly. A device error
//! (`Fail`) or `Teardown` ends the session; it must `Register` again.

use std::fmt;

use thiserror::Error;

/// Why a session or call reached [`SessionState::Ended`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndCause {
    /// Either side hung up
    Hangup,
    /// The call leg failed
    CallError(String),
    /// The device failed; it is no longer registered
    DeviceError(String),
    /// The device was destroyed
    Teardown,
}

impl EndCause {
    /// Whether the device stays registered after this ending
    pub fn keeps_device(&self) -> bool {
        matches!(self, Self::Hangup | Self::CallError(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Registering,
    Ready,
    Connecting { callee: String },
    InCall { callee: String },
    Ended { cause: EndCause },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Registering => "registering",
            Self::Ready => "ready",
            Self::Connecting { .. } => "connecting",
            Self::InCall { .. } => "in_call",
            Self::Ended { .. } => "ended",
        }
    }

    /// Whether the device is registered with the voice runtime
    pub fn device_registered(&self) -> bool {
        match self {
            Self::Ready | Self::Connecting { .. } | Self::InCall { .. } => true,
            Self::Ended { cause } => cause.keeps_device(),
            Self::Idle | Self::Registering => false,
        }
    }

    fn in_call(&self) -> bool {
        matches!(self, Self::Connecting { .. } | Self::InCall { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Token fetched, device registration started
    Register,
    /// Device registered with the voice runtime
    Registered,
    /// Outbound call requested
    Connect { callee: String },
    /// Remote side answered
    Accepted,
    /// Either side hung up
    Disconnect,
    /// Call leg error
    CallFailed(String),
    /// Device error
    Fail(String),
    /// Device destroyed
    Teardown,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Registered => "registered",
            Self::Connect { .. } => "connect",
            Self::Accepted => "accepted",
            Self::Disconnect => "disconnect",
            Self::CallFailed(_) => "call_failed",
            Self::Fail(_) => "fail",
            Self::Teardown => "teardown",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid transition: {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// One browser device and its current call, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSession {
    identity: String,
    state: SessionState,
}

impl DeviceSession {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            state: SessionState::Idle,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply an event, returning the new state
    pub fn apply(&mut self, event: SessionEvent) -> Result<&SessionState, SessionError> {
        use SessionEvent as E;
        use SessionState as S;

        let next = match (&self.state, event) {
            (S::Idle | S::Ended { .. }, E::Register) => S::Registering,
            (S::Registering, E::Registered) => S::Ready,
            (S::Ready, E::Connect { callee }) => S::Connecting { callee },
            (S::Ended { cause }, E::Connect { callee }) if cause.keeps_device() => {
                S::Connecting { callee }
            }
            (S::Connecting { callee }, E::Accepted) => S::InCall {
                callee: callee.clone(),
            },
            (state, E::Disconnect) if state.in_call() => S::Ended {
                cause: EndCause::Hangup,
            },
            (state, E::CallFailed(message)) if state.in_call() => S::Ended {
                cause: EndCause::CallError(message),
            },
            (state, E::Fail(message))
                if state.device_registered() || *state == S::Registering =>
            {
                S::Ended {
                    cause: EndCause::DeviceError(message),
                }
            }
            (_, E::Teardown) => S::Ended {
                cause: EndCause::Teardown,
            },
            (state, event) => {
                return Err(SessionError::InvalidTransition {
                    state: state.name(),
                    event: event.name(),
                });
            }
        };

        tracing::debug!(
            identity = %self.identity,
            from = %self.state,
            to = %next,
            "Device session transition"
        );
        self.state = next;
        Ok(&self.state)
    }

    /// Status line shown to the user for the current state
    pub fn status_text(&self) -> String {
        match &self.state {
            SessionState::Idle => "Initializing...".to_string(),
            SessionState::Registering => "Registering device...".to_string(),
            SessionState::Ready => "Ready for calls".to_string(),
            SessionState::Connecting { .. } => "Calling...".to_string(),
            SessionState::InCall { .. } => "Call in progress".to_string(),
            SessionState::Ended { cause } => match cause {
                EndCause::Hangup | EndCause::Teardown => "Call ended".to_string(),
                EndCause::CallError(message) => format!("Call error: {message}"),
                EndCause::DeviceError(message) => format!("Error: {message}"),
            },
        }
    }
}
