use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of a competitive match. Transitions are only legal along the
/// edges returned by `allowed_transitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Created,
    WaitingForPlayers,
    Countdown,
    Memorization,
    Recall,
    Completed,
    Cancelled,
    Paused,
}

/// What the orchestrator does about a dropped connection in a given phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisconnectAction {
    Pause,
    Forfeit,
    Wait,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectPolicy {
    pub grace_period_ms: u64,
    pub action: DisconnectAction,
    pub allow_reconnect: bool,
}

impl MatchStatus {
    pub fn allowed_transitions(&self) -> &'static [MatchStatus] {
        use MatchStatus::*;
        match self {
            Created => &[WaitingForPlayers, Cancelled],
            WaitingForPlayers => &[Countdown, Cancelled],
            Countdown => &[Memorization, Paused, Cancelled],
            Memorization => &[Recall, Paused, Cancelled],
            Recall => &[Completed, Paused, Cancelled],
            Paused => &[Countdown, Memorization, Recall, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: MatchStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Disconnection handling for this phase. Lobby phases just wait;
    /// timed phases pause, except recall where the clock keeps running
    /// and the disconnected player forfeits after the grace period.
    pub fn disconnect_policy(&self) -> DisconnectPolicy {
        use MatchStatus::*;
        match self {
            Created | WaitingForPlayers | Paused => DisconnectPolicy {
                grace_period_ms: 60_000,
                action: DisconnectAction::Wait,
                allow_reconnect: true,
            },
            Countdown => DisconnectPolicy {
                grace_period_ms: 10_000,
                action: DisconnectAction::Pause,
                allow_reconnect: true,
            },
            Memorization => DisconnectPolicy {
                grace_period_ms: 15_000,
                action: DisconnectAction::Pause,
                allow_reconnect: true,
            },
            Recall => DisconnectPolicy {
                grace_period_ms: 10_000,
                action: DisconnectAction::Forfeit,
                allow_reconnect: true,
            },
            Completed | Cancelled => DisconnectPolicy {
                grace_period_ms: 0,
                action: DisconnectAction::None,
                allow_reconnect: false,
            },
        }
    }
}

#[derive(Debug)]
pub enum StateTransitionError {
    InvalidTransition {
        current: MatchStatus,
        requested: MatchStatus,
        allowed: &'static [MatchStatus],
    },
}

impl std::fmt::Display for StateTransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateTransitionError::InvalidTransition {
                current,
                requested,
                allowed,
            } => {
                write!(
                    f,
                    "Invalid transition {:?} -> {:?}, allowed: {:?}",
                    current, requested, allowed
                )
            }
        }
    }
}

impl std::error::Error for StateTransitionError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub state: MatchStatus,
    pub at: DateTime<Utc>,
}

/// Per-match finite automaton. Keeps an append-only log of every
/// successful transition for audit and disconnection-timing forensics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStateMachine {
    status: MatchStatus,
    history: Vec<StateHistoryEntry>,
}

impl MatchStateMachine {
    pub fn new() -> Self {
        MatchStateMachine {
            status: MatchStatus::Created,
            history: vec![StateHistoryEntry {
                state: MatchStatus::Created,
                at: Utc::now(),
            }],
        }
    }

    /// Restores an automaton from a persisted status, e.g. a match record
    /// loaded mid-flight. History restarts from the restored state.
    pub fn from_status(status: MatchStatus) -> Self {
        MatchStateMachine {
            status,
            history: vec![StateHistoryEntry {
                state: status,
                at: Utc::now(),
            }],
        }
    }

    /// Restores an automaton carrying its persisted history, so further
    /// transitions keep appending to the same log.
    pub fn resume(status: MatchStatus, history: Vec<StateHistoryEntry>) -> Self {
        MatchStateMachine { status, history }
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn history(&self) -> &[StateHistoryEntry] {
        &self.history
    }

    pub fn into_history(self) -> Vec<StateHistoryEntry> {
        self.history
    }

    /// Attempts a transition. On rejection the automaton is untouched and
    /// the error carries the current state plus the legal destination set.
    pub fn transition(&mut self, target: MatchStatus) -> Result<(), StateTransitionError> {
        if !self.status.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                current: self.status,
                requested: target,
                allowed: self.status.allowed_transitions(),
            });
        }

        self.status = target;
        self.history.push(StateHistoryEntry {
            state: target,
            at: Utc::now(),
        });
        Ok(())
    }
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
