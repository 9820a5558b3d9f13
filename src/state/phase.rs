/// Fetch and walk phase definitions
///
/// `FetchStage` drives the per-URL fetch strategy chain, `StopReason`
/// records why a keyword's pagination walk ended.
use std::fmt;

/// Stage of the fetch strategy chain for one URL
///
/// `Direct → Rendered → Exhausted`; a successful stage ends the chain early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStage {
    /// Lightweight HTTP fetch
    Direct,

    /// Scripted browser fetch
    Rendered,

    /// Every strategy has been tried
    Exhausted,
}

impl FetchStage {
    /// Returns the stage to try after this one failed
    pub fn next(self) -> Self {
        match self {
            Self::Direct => Self::Rendered,
            Self::Rendered | Self::Exhausted => Self::Exhausted,
        }
    }

    /// Returns true once no strategy is left
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Rendered => "rendered",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a keyword's pagination walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The keyword reached `results_per_keyword`
    QuotaReached,

    /// `max_pages` listing pages were requested
    PageCeiling,

    /// A listing page had no result entries at all
    NoMoreResults,

    /// The listing had no next-page link
    NoNextPage,

    /// Retries and the rendered escalation all failed for a page
    PageFailed,

    /// The run was cancelled or timed out
    Cancelled,
}

impl StopReason {
    /// Returns true if the walk ended because something went wrong
    pub fn is_error(&self) -> bool {
        matches!(self, Self::PageFailed)
    }

    /// Converts the reason to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::QuotaReached => "quota_reached",
            Self::PageCeiling => "page_ceiling",
            Self::NoMoreResults => "no_more_results",
            Self::NoNextPage => "no_next_page",
            Self::PageFailed => "page_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a reason from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "quota_reached" => Some(Self::QuotaReached),
            "page_ceiling" => Some(Self::PageCeiling),
            "no_more_results" => Some(Self::NoMoreResults),
            "no_next_page" => Some(Self::NoNextPage),
            "page_failed" => Some(Self::PageFailed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns all stop reasons
    pub fn all() -> Vec<Self> {
        vec![
            Self::QuotaReached,
            Self::PageCeiling,
            Self::NoMoreResults,
            Self::NoNextPage,
            Self::PageFailed,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_stage_order() {
        assert_eq!(FetchStage::Direct.next(), FetchStage::Rendered);
        assert_eq!(FetchStage::Rendered.next(), FetchStage::Exhausted);
        assert_eq!(FetchStage::Exhausted.next(), FetchStage::Exhausted);
    }

    #[test]
    fn test_fetch_stage_terminal() {
        assert!(!FetchStage::Direct.is_terminal());
        assert!(!FetchStage::Rendered.is_terminal());
        assert!(FetchStage::Exhausted.is_terminal());
    }

    #[test]
    fn test_stop_reason_roundtrip() {
        for reason in StopReason::all() {
            assert_eq!(
                StopReason::from_db_string(reason.to_db_string()),
                Some(reason),
                "Failed roundtrip for {:?}",
                reason
            );
        }
        assert_eq!(StopReason::from_db_string("invalid"), None);
    }

    #[test]
    fn test_stop_reason_is_error() {
        assert!(StopReason::PageFailed.is_error());
        assert!(!StopReason::QuotaReached.is_error());
        assert!(!StopReason::NoMoreResults.is_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", FetchStage::Rendered), "rendered");
        assert_eq!(format!("{}", StopReason::PageCeiling), "page_ceiling");
    }
}
