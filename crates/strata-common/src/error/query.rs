//! Query error codes.

use std::fmt;

/// Error codes for failures carried in data block exception maps.
///
/// These codes are written to the wire as `i32` and are stable across
/// versions. Unknown codes received from a newer peer are kept as raw
/// integers by the data block; [`QueryErrorCode::from_code`] returns `None`
/// for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum QueryErrorCode {
    // Request errors (100 - 199)
    /// The query text could not be parsed.
    SqlParsing = 150,
    /// The caller is not allowed to run this query.
    AccessDenied = 180,
    /// A referenced table does not exist.
    TableDoesNotExist = 190,

    // Execution errors (200 - 299)
    /// Generic failure while executing a stage.
    QueryExecution = 200,
    /// The server is shutting down.
    ServerShuttingDown = 210,
    /// The server has no capacity left for this query.
    ServerOutOfCapacity = 211,
    /// A segment the plan expected is missing.
    SegmentMissing = 235,
    /// The query waited too long to be scheduled.
    SchedulingTimeout = 240,
    /// Execution exceeded its deadline.
    ExecutionTimeout = 250,
    /// A data block could not be serialized.
    DataBlockSerialization = 260,

    // Exchange errors (300 - 399)
    /// Results from a sender stage could not be gathered.
    Gather = 300,
    /// A received data block could not be deserialized.
    DataBlockDeserialization = 310,
    /// A mailbox did not deliver within its deadline.
    MailboxTimeout = 320,

    // Internal errors (400 - 499)
    /// Internal error - this indicates a bug.
    Internal = 450,
    /// The query was cancelled.
    Cancelled = 460,

    /// Unclassified error.
    Unknown = 1000,
}

impl QueryErrorCode {
    /// Returns the numeric code written to the wire.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Looks up a known code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            150 => Some(Self::SqlParsing),
            180 => Some(Self::AccessDenied),
            190 => Some(Self::TableDoesNotExist),
            200 => Some(Self::QueryExecution),
            210 => Some(Self::ServerShuttingDown),
            211 => Some(Self::ServerOutOfCapacity),
            235 => Some(Self::SegmentMissing),
            240 => Some(Self::SchedulingTimeout),
            250 => Some(Self::ExecutionTimeout),
            260 => Some(Self::DataBlockSerialization),
            300 => Some(Self::Gather),
            310 => Some(Self::DataBlockDeserialization),
            320 => Some(Self::MailboxTimeout),
            450 => Some(Self::Internal),
            460 => Some(Self::Cancelled),
            1000 => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self as i32 / 100 {
            1 => "Request",
            2 => "Execution",
            3 => "Exchange",
            4 => "Internal",
            _ => "Unknown",
        }
    }

    /// Returns true if the failure is tied to a deadline rather than to the
    /// query itself.
    #[must_use]
    pub const fn is_timeout(self) -> bool {
        matches!(
            self,
            Self::SchedulingTimeout | Self::ExecutionTimeout | Self::MailboxTimeout
        )
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

impl From<QueryErrorCode> for i32 {
    fn from(code: QueryErrorCode) -> Self {
        code.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            QueryErrorCode::SqlParsing,
            QueryErrorCode::QueryExecution,
            QueryErrorCode::ExecutionTimeout,
            QueryErrorCode::DataBlockDeserialization,
            QueryErrorCode::Internal,
            QueryErrorCode::Unknown,
        ] {
            assert_eq!(QueryErrorCode::from_code(code.code()), Some(code));
        }
        assert_eq!(QueryErrorCode::from_code(7), None);
    }

    #[test]
    fn test_category() {
        assert_eq!(QueryErrorCode::SqlParsing.category(), "Request");
        assert_eq!(QueryErrorCode::ExecutionTimeout.category(), "Execution");
        assert_eq!(QueryErrorCode::Gather.category(), "Exchange");
        assert_eq!(QueryErrorCode::Internal.category(), "Internal");
        assert_eq!(QueryErrorCode::Unknown.category(), "Unknown");
    }

    #[test]
    fn test_timeout() {
        assert!(QueryErrorCode::MailboxTimeout.is_timeout());
        assert!(!QueryErrorCode::QueryExecution.is_timeout());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            QueryErrorCode::ExecutionTimeout.to_string(),
            "ExecutionTimeout(250)"
        );
    }
}
