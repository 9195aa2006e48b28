//! Static allowlist of qualifying original token ids.
//!
//! Ingested once from an ordered list of records whose first column is the
//! qualifying id; the remaining columns are ignored. Immutable afterwards.

use std::collections::BTreeSet;

use arbi_core::types::TokenId;

use crate::error::CaseError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Allowlist {
    ids: BTreeSet<TokenId>,
}

impl Allowlist {
    pub fn new(ids: impl IntoIterator<Item = TokenId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Build from pre-split records. Line numbers in errors are 1-based
    /// positions in `records`.
    ///
    /// # Errors
    ///
    /// [`CaseError::InvalidRecord`] if a record is empty or its first
    /// column is not a decimal id.
    pub fn from_records<I, R, S>(records: I) -> Result<Self, CaseError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut ids = BTreeSet::new();
        for (idx, record) in records.into_iter().enumerate() {
            let line = idx + 1;
            let first = record
                .as_ref()
                .first()
                .map(|col| col.as_ref().trim())
                .unwrap_or("");
            ids.insert(parse_id(first, line)?);
        }
        Ok(Self { ids })
    }

    /// Parse comma-separated text: one record per line, id in column 0.
    ///
    /// Blank lines (including a trailing newline) are skipped; `\r` line
    /// endings are tolerated.
    ///
    /// ```
    /// use arbi_cases::Allowlist;
    /// use arbi_core::TokenId;
    /// let list = Allowlist::parse_csv("5,gold\n10,silver\n17,bronze\n").unwrap();
    /// assert!(list.contains(TokenId(10)));
    /// assert_eq!(list.len(), 3);
    /// ```
    pub fn parse_csv(text: &str) -> Result<Self, CaseError> {
        let mut ids = BTreeSet::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let first = line.split(',').next().unwrap_or("").trim();
            ids.insert(parse_id(first, idx + 1)?);
        }
        Ok(Self { ids })
    }

    /// Check every id against the original collection's supply.
    ///
    /// # Errors
    ///
    /// [`CaseError::IdOutOfRange`] for the first id `>= max_supply`.
    pub fn bounded(self, max_supply: u64) -> Result<Self, CaseError> {
        if let Some(&id) = self.ids.range(TokenId(max_supply)..).next() {
            return Err(CaseError::IdOutOfRange { id, max_supply });
        }
        Ok(self)
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.ids.iter().copied()
    }
}

fn parse_id(field: &str, line: usize) -> Result<TokenId, CaseError> {
    if field.is_empty() {
        return Err(CaseError::InvalidRecord {
            line,
            reason: "missing id column".into(),
        });
    }
    field
        .parse::<u64>()
        .map(TokenId)
        .map_err(|e| CaseError::InvalidRecord {
            line,
            reason: format!("{field:?}: {e}"),
        })
}
