//! Unified error codes for the tutoring engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Booking errors
//! - 5xxx: Rating errors
//! - 6xxx: Teacher / schedule errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for compact serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Another call for the same gesture is still in flight
    Busy = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 4xxx: Booking ====================
    /// Booking not found
    BookingNotFound = 4001,
    /// Requested slot is not offered by the teacher's schedule
    SlotNotInSchedule = 4002,
    /// Requested place does not match the schedule
    PlaceMismatch = 4003,
    /// Requested subject does not match the teacher's subject
    SubjectMismatch = 4004,
    /// User already holds a seat at this slot
    AlreadyBooked = 4005,
    /// Cancellation is only allowed well before the session
    CancellationWindowClosed = 4006,
    /// Booking time label could not be parsed
    InvalidTimeLabel = 4007,
    /// Booking is already cancelled
    BookingAlreadyCancelled = 4008,

    // ==================== 5xxx: Rating ====================
    /// Rating value outside 1..=5
    RatingOutOfRange = 5001,
    /// No rating prompt is currently visible
    NoActivePrompt = 5002,

    // ==================== 6xxx: Teacher ====================
    /// Teacher not found
    TeacherNotFound = 6001,
    /// Teacher capacity is not a positive integer
    InvalidCapacity = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    /// Local storage could not be read or written
    StorageFailed = 9401,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::Busy => "A request for this action is already in progress",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Booking
            ErrorCode::BookingNotFound => "Booking not found",
            ErrorCode::SlotNotInSchedule => "Selected slot is not available in the teacher's schedule",
            ErrorCode::PlaceMismatch => "Selected place does not match the teacher's schedule",
            ErrorCode::SubjectMismatch => "Subject does not match the teacher's subject",
            ErrorCode::AlreadyBooked => "You have already booked this slot",
            ErrorCode::CancellationWindowClosed => {
                "Cancellation is only allowed at least 48 hours before the session"
            }
            ErrorCode::InvalidTimeLabel => "Invalid session time format",
            ErrorCode::BookingAlreadyCancelled => "Booking is already cancelled",

            // Rating
            ErrorCode::RatingOutOfRange => "Rating must be between 1 and 5",
            ErrorCode::NoActivePrompt => "No rating prompt is currently shown",

            // Teacher
            ErrorCode::TeacherNotFound => "Teacher not found",
            ErrorCode::InvalidCapacity => "Teacher capacity must be a positive integer",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageFailed => "Local storage operation failed",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::Busy),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Booking
            4001 => Ok(ErrorCode::BookingNotFound),
            4002 => Ok(ErrorCode::SlotNotInSchedule),
            4003 => Ok(ErrorCode::PlaceMismatch),
            4004 => Ok(ErrorCode::SubjectMismatch),
            4005 => Ok(ErrorCode::AlreadyBooked),
            4006 => Ok(ErrorCode::CancellationWindowClosed),
            4007 => Ok(ErrorCode::InvalidTimeLabel),
            4008 => Ok(ErrorCode::BookingAlreadyCancelled),

            // Rating
            5001 => Ok(ErrorCode::RatingOutOfRange),
            5002 => Ok(ErrorCode::NoActivePrompt),

            // Teacher
            6001 => Ok(ErrorCode::TeacherNotFound),
            6002 => Ok(ErrorCode::InvalidCapacity),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            // Storage
            9401 => Ok(ErrorCode::StorageFailed),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
