//! Error types for planning requests.

use std::time::Duration;

use grid_util::point::Point;
use thiserror::Error;

use crate::NO_PATH_FOUND;

/// Everything that can go wrong while updating the map or planning a path.
///
/// Planning failures are terminal for the request that produced them; the planner keeps no
/// error state between requests.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// The start or goal cell lies outside the grid. Detected before any search work.
    #[error("cell {cell:?} is outside the {width}x{height} grid")]
    OutOfBounds {
        cell: Point,
        width: usize,
        height: usize,
    },

    /// The search deadline elapsed before the goal was popped.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    /// The open set emptied (or the goal was proven unreachable) without reaching the goal.
    #[error("no path found to {goal:?}")]
    Exhausted { goal: Point },

    /// A goal arrived before any start position was received.
    #[error("start position is unknown")]
    StartUnknown,

    #[error("invalid grid update: {0}")]
    InvalidGrid(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Config(e.to_string())
    }
}

impl PlannerError {
    /// Returns `true` for the two search failures: timeout and exhaustion.
    pub const fn is_no_path_found(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Exhausted { .. })
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The failure code delivered to path consumers. Every planning failure maps to the same
    /// code; the reason is carried separately in [PlanFailure](crate::planner::PlanFailure).
    pub const fn failure_code(&self) -> &'static str {
        NO_PATH_FOUND
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
