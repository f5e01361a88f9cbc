use crate::domain::Notice;

/// Failure classes a run can end in.
///
/// Every kind maps to a distinct exit code so scripts can tell a bad input
/// file apart from a file that simply has nothing to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be read, decoded, or written.
    Io,
    /// The first sheet has no data rows.
    EmptyTable,
    /// One or more required columns are absent.
    MissingColumns,
    /// No row carries a parseable amount.
    NoValidData,
    /// Too few points for a trend line.
    InsufficientData,
    Internal,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Io | ErrorKind::EmptyTable | ErrorKind::MissingColumns => 2,
            ErrorKind::NoValidData | ErrorKind::InsufficientData => 3,
            ErrorKind::Internal => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<Notice> for AppError {
    fn from(notice: Notice) -> Self {
        let kind = match notice {
            Notice::NoValidData | Notice::NoDatedData => ErrorKind::NoValidData,
            Notice::InsufficientData { .. } => ErrorKind::InsufficientData,
        };
        AppError::new(kind, notice.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_class() {
        assert_eq!(AppError::io("x").exit_code(), 2);
        assert_eq!(AppError::new(ErrorKind::MissingColumns, "x").exit_code(), 2);
        assert_eq!(AppError::new(ErrorKind::NoValidData, "x").exit_code(), 3);
        assert_eq!(AppError::internal("x").exit_code(), 4);
    }

    #[test]
    fn notices_escalate_to_aggregate_exit_code() {
        let err = AppError::from(Notice::InsufficientData { points: 1 });
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(AppError::from(Notice::NoDatedData).kind(), ErrorKind::NoValidData);
    }
}
