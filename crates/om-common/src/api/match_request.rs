use serde::Deserialize;

pub const DEFAULT_MATCH_LIMIT: usize = 10;
pub const MAX_MATCH_LIMIT: usize = 50;

/// `?limit=` on the ranking endpoints. Kept as raw text so that malformed
/// values reach the handler and are rejected with the usual error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<String>,
}

impl LimitQuery {
    pub fn new(limit: impl Into<String>) -> Self {
        Self {
            limit: Some(limit.into()),
        }
    }

    /// Effective limit, or `None` when the caller asked for something that is
    /// not an integer in `1..=MAX_MATCH_LIMIT`.
    pub fn resolve(&self) -> Option<usize> {
        let Some(raw) = self.limit.as_deref() else {
            return Some(DEFAULT_MATCH_LIMIT);
        };

        let limit: i64 = raw.trim().parse().ok()?;
        usize::try_from(limit)
            .ok()
            .filter(|limit| (1..=MAX_MATCH_LIMIT).contains(limit))
    }
}
