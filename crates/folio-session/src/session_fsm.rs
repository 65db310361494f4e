//! Session lifecycle state machine using rust-fsm.
//!
//! ```text
//!              NoCredentials / IdentityRejected / SignedOut
//!  Restoring ───────────────────────────────────────────────► Anonymous
//!      │                                                       │    ▲
//!      │ IdentityVerified / SessionEstablished                 │    │ SignedOut
//!      ▼                                                       │    │
//!  Authenticated ◄───────────── SessionEstablished ────────────┘    │
//!      │                                                            │
//!      └────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Restoring` is the initial state and is never re-entered, so leaving it
//! is what marks the session as initialized.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Restoring)

    Restoring => {
        NoCredentials => Anonymous,
        IdentityVerified => Authenticated,
        IdentityRejected => Anonymous,
        SessionEstablished => Authenticated,
        CredentialsRotated => Restoring,
        SignedOut => Anonymous
    },
    Anonymous => {
        SessionEstablished => Authenticated,
        SignedOut => Anonymous
    },
    Authenticated => {
        SessionEstablished => Authenticated,
        CredentialsRotated => Authenticated,
        SignedOut => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Public view of where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Persisted credentials have not been checked yet.
    Restoring,
    /// No signed-in user.
    Anonymous,
    /// A verified user is signed in.
    Authenticated,
}

impl SessionPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }

    /// Restoration has finished, one way or another.
    pub fn is_initialized(&self) -> bool {
        !matches!(self, SessionPhase::Restoring)
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Restoring => SessionPhase::Restoring,
            SessionMachineState::Anonymous => SessionPhase::Anonymous,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Restoring => "restoring",
            SessionPhase::Anonymous => "anonymous",
            SessionPhase::Authenticated => "authenticated",
        };
        f.write_str(s)
    }
}
