//! # Kitchen Order Tickets
//!
//! Status machine for restaurant kitchen tickets.
//!
//! ```text
//! pending ──► preparing ──► ready ──► served
//!    │            │
//!    └────────────┴──► cancelled
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Where a kitchen ticket is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TicketStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl TicketStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Preparing => "preparing",
            TicketStatus::Ready => "ready",
            TicketStatus::Served => "served",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Served and cancelled tickets accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Served | TicketStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Preparing, Ready)
                | (Ready, Served)
                | (Pending, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    /// Validates a transition, returning the new status.
    pub fn transition(self, next: TicketStatus) -> CoreResult<TicketStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTicketTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
