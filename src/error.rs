use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    InvalidDateRange(String),
    InvalidTransition(String),
    NotFound(String),
    Validation(String),
}

impl BoardError {
    pub fn code(&self) -> &'static str {
        match self {
            BoardError::InvalidDateRange(_) => "E001",
            BoardError::InvalidTransition(_) => "E002",
            BoardError::NotFound(_) => "E003",
            BoardError::Validation(_) => "E004",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            BoardError::InvalidDateRange(_) => "Invalid Date Range",
            BoardError::InvalidTransition(_) => "Invalid Status Transition",
            BoardError::NotFound(_) => "Resource Not Found",
            BoardError::Validation(_) => "Validation Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            BoardError::InvalidDateRange(msg) => msg,
            BoardError::InvalidTransition(msg) => msg,
            BoardError::NotFound(msg) => msg,
            BoardError::Validation(msg) => msg,
        }
    }

    pub fn invalid_date_range<T: Into<String>>(msg: T) -> Self {
        BoardError::InvalidDateRange(msg.into())
    }

    pub fn invalid_transition<T: Into<String>>(msg: T) -> Self {
        BoardError::InvalidTransition(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        BoardError::NotFound(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        BoardError::Validation(msg.into())
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for BoardError {}

pub type Result<T> = std::result::Result<T, BoardError>;
