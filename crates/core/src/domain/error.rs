// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no such node '{0}'")]
    UnknownNode(String),

    #[error("no such group '{0}'")]
    UnknownGroup(String),

    #[error("address '{0}' does not belong to any node")]
    UnknownAddress(String),

    #[error("node '{0}' is defined more than once")]
    DuplicateNode(String),

    #[error("group '{0}' is defined more than once")]
    DuplicateGroup(String),

    #[error("name '{0}' is used both as a node and as a group")]
    GroupNodeConflict(String),

    #[error("group '{0}' refers back to itself")]
    GroupCycle(String),

    #[error("invalid probe command: {0}")]
    InvalidCommand(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
