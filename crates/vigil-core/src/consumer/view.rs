use chrono::{DateTime, Utc};

/// Where the displayed data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing to show yet.
    Empty,
    /// Latest successful live fetch.
    Live { fetched_at: DateTime<Utc> },
    /// Backend-held snapshot from the cached fetch.
    Backend { fetched_at: DateTime<Utc> },
    /// Local fallback written by an earlier live fetch.
    Cached { captured_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView<T> {
    pub data: Option<T>,
    pub freshness: Freshness,
    /// Set only when there is nothing at all to show.
    pub error: Option<String>,
}

impl<T> PanelView<T> {
    pub fn empty() -> Self {
        Self {
            data: None,
            freshness: Freshness::Empty,
            error: None,
        }
    }

    /// Displayed data did not come from the latest live fetch.
    pub fn is_stale(&self) -> bool {
        matches!(
            self.freshness,
            Freshness::Backend { .. } | Freshness::Cached { .. }
        )
    }

    /// The persistent "showing cached data" banner, if one applies.
    pub fn stale_notice(&self) -> Option<String> {
        let as_of = match self.freshness {
            Freshness::Backend { fetched_at } => fetched_at,
            Freshness::Cached { captured_at } => captured_at,
            Freshness::Empty | Freshness::Live { .. } => return None,
        };
        Some(format!(
            "Showing cached data as of {}",
            as_of.format("%Y-%m-%d %H:%M:%S UTC")
        ))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl<T> Default for PanelView<T> {
    fn default() -> Self {
        Self::empty()
    }
}
