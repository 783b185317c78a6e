use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a submission was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    Cooldown,
    TurnViolation,
    InvalidMove,
    RemoteRejection,
    InfrastructureFailure,
    DivergenceRisk,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectionReason::Cooldown => "cooldown",
            RejectionReason::TurnViolation => "turn_violation",
            RejectionReason::InvalidMove => "invalid_move",
            RejectionReason::RemoteRejection => "remote_rejection",
            RejectionReason::InfrastructureFailure => "infrastructure_failure",
            RejectionReason::DivergenceRisk => "divergence_risk",
        };
        write!(f, "{}", name)
    }
}

/// Terminal result of processing one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Accepted {
        message: String,
    },
    Rejected {
        reason: RejectionReason,
        message: String,
    },
}

impl MoveOutcome {
    pub fn accepted(message: impl Into<String>) -> Self {
        MoveOutcome::Accepted {
            message: message.into(),
        }
    }

    pub fn rejected(reason: RejectionReason, message: impl Into<String>) -> Self {
        MoveOutcome::Rejected {
            reason,
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            MoveOutcome::Accepted { message } | MoveOutcome::Rejected { message, .. } => message,
        }
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            MoveOutcome::Accepted { .. } => None,
            MoveOutcome::Rejected { reason, .. } => Some(*reason),
        }
    }
}
