//! Standard execution statistics carried in block metadata.

use std::fmt;

/// Well-known metadata keys.
///
/// Producers may add other keys. These are the ones every stage reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataKey {
    /// Documents scanned.
    NumDocsScanned,
    /// Entries scanned while filtering.
    NumEntriesScannedInFilter,
    /// Entries scanned after filtering.
    NumEntriesScannedPostFilter,
    /// Total documents in the queried segments.
    TotalDocs,
    /// Wall-clock time spent, in milliseconds.
    TimeUsedMs,
    /// Segments processed.
    NumSegmentsProcessed,
    /// Segments with at least one match.
    NumSegmentsMatched,
    /// Whether the group-by limit was reached.
    NumGroupsLimitReached,
    /// Serialized trace.
    TraceInfo,
}

impl MetadataKey {
    /// Every key, in declaration order.
    pub const ALL: [MetadataKey; 9] = [
        Self::NumDocsScanned,
        Self::NumEntriesScannedInFilter,
        Self::NumEntriesScannedPostFilter,
        Self::TotalDocs,
        Self::TimeUsedMs,
        Self::NumSegmentsProcessed,
        Self::NumSegmentsMatched,
        Self::NumGroupsLimitReached,
        Self::TraceInfo,
    ];

    /// Key string written to the metadata map.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NumDocsScanned => "numDocsScanned",
            Self::NumEntriesScannedInFilter => "numEntriesScannedInFilter",
            Self::NumEntriesScannedPostFilter => "numEntriesScannedPostFilter",
            Self::TotalDocs => "totalDocs",
            Self::TimeUsedMs => "timeUsedMs",
            Self::NumSegmentsProcessed => "numSegmentsProcessed",
            Self::NumSegmentsMatched => "numSegmentsMatched",
            Self::NumGroupsLimitReached => "numGroupsLimitReached",
            Self::TraceInfo => "traceInfo",
        }
    }

    /// Looks up a key by its string.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

impl AsRef<str> for MetadataKey {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
