use serde::{Deserialize, Serialize};
use std::fmt;

/// Task state definitions.
///
/// Transitions are one-directional: `Pending` -> `Running` -> one of the
/// terminal states. A task in a terminal state never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Initial state when the task is created and queued
    Pending,
    /// Task is currently being executed by a pool worker
    Running,
    /// Task completed and the converted file was written
    Complete,
    /// Task was cancelled before completing its work
    Cancelled,
    /// Output write failed
    Failed,
}

impl TaskState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Failed)
    }

    /// Check if this is an active state (task is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Complete => write!(f, "complete"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "complete" => Ok(Self::Complete),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task state: {s}")),
        }
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_check() {
        assert!(TaskState::Complete.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn test_active_check() {
        assert!(TaskState::Running.is_active());
        assert!(!TaskState::Pending.is_active());
        assert!(!TaskState::Complete.is_active());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(TaskState::Running.to_string(), "running");
        assert_eq!("complete".parse::<TaskState>().unwrap(), TaskState::Complete);
        assert!("paused".parse::<TaskState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let state = TaskState::Cancelled;
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let parsed: TaskState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
