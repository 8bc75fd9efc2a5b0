use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ResourceCategory;

/// Why an edited category was rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidationReason {
    NegativeTotal { total: i64 },
    NegativeAvailable { available: i64 },
    AvailableExceedsTotal { available: i64, total: i64 },
    ExceedsLimit { value: i64 },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeTotal { total } => write!(f, "total cannot be negative (got {total})"),
            Self::NegativeAvailable { available } => {
                write!(f, "available cannot be negative (got {available})")
            }
            Self::AvailableExceedsTotal { available, total } => {
                write!(f, "available ({available}) cannot exceed total ({total})")
            }
            Self::ExceedsLimit { value } => write!(f, "value {value} is out of range"),
        }
    }
}

/// Errors shared by the engines, the stores and the bridges.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BedFinderError {
    #[error("Invalid coordinate (lat {latitude}, lng {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("Invalid radius: {0} km")]
    InvalidRadius(f64),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid {category} update: {reason}")]
    Validation {
        category: ResourceCategory,
        reason: ValidationReason,
    },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Could not parse input: {0}")]
    Parse(String),
}

impl BedFinderError {
    /// Transient failures that a caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::LocationUnavailable(_)
        )
    }

    /// Short message suitable for showing to a searcher or an operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied | Self::LocationUnavailable(_) => {
                "Unable to access your location. Check your browser settings.".to_string()
            }
            Self::StoreUnavailable(_) => {
                "Hospital data is temporarily unavailable. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}
