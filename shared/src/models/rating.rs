//! Rating Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TeacherId;
use crate::error::{AppError, ErrorCode};

/// Star rating, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, AppError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::new(ErrorCode::RatingOutOfRange).with_detail("rating", value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RatingValue {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

/// Body of `POST rating`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRating {
    pub teacher_id: TeacherId,
    pub rating: RatingValue,
}

/// Stored rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub teacher_id: TeacherId,
    pub rating: RatingValue,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
