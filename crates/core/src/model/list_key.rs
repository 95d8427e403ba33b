use std::fmt;
use std::str::FromStr;

use crate::model::settings::PlayOrder;

/// Identifies a built phrase list: `{list_type}_{order}_{count}`.
///
/// Progress is stored per key, so a list whose length changed (phrases added
/// or removed upstream) starts over from the beginning.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListKey {
    list_type: String,
    order: PlayOrder,
    count: usize,
}

impl ListKey {
    #[must_use]
    pub fn new(list_type: impl Into<String>, order: PlayOrder, count: usize) -> Self {
        Self {
            list_type: list_type.into(),
            order,
            count,
        }
    }

    #[must_use]
    pub fn list_type(&self) -> &str {
        &self.list_type
    }

    #[must_use]
    pub fn order(&self) -> PlayOrder {
        self.order
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl fmt::Debug for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListKey({self})")
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.list_type, self.order, self.count)
    }
}

// ─── FromStr ───────────────────────────────────────────────────────────────────

/// Error type for parsing a `ListKey` from its stored form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseListKeyError {
    raw: String,
}

impl fmt::Display for ParseListKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse list key from {:?}", self.raw)
    }
}

impl std::error::Error for ParseListKeyError {}

impl FromStr for ListKey {
    type Err = ParseListKeyError;

    // Category names may contain underscores, so split from the right.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseListKeyError { raw: s.to_owned() };
        let mut parts = s.rsplitn(3, '_');
        let count = parts
            .next()
            .and_then(|c| c.parse::<usize>().ok())
            .ok_or_else(err)?;
        let order = parts
            .next()
            .and_then(|o| o.parse::<PlayOrder>().ok())
            .ok_or_else(err)?;
        let list_type = parts.next().filter(|t| !t.is_empty()).ok_or_else(err)?;
        Ok(Self::new(list_type, order, count))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
