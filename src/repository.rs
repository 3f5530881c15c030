//! Repository trait and surrogate-key parsing
//!
//! Each entity gets a `*Repository` struct owning a `PgPool` and
//! implementing [`Repository`]. The trait uses return-position impl-trait so
//! implementations stay plain async fns without boxing.

use std::future::Future;

use crate::error::Result;
use crate::pagination::PageRequest;

/// CRUD capability over one entity type
pub trait Repository<Id, Entity, Create, Update>: Send + Sync {
    /// Fetch by primary key; `Ok(None)` when no row matches
    fn find_by_id(&self, id: Id) -> impl Future<Output = Result<Option<Entity>>> + Send;

    /// List all, or one page when a request is given
    fn list(
        &self,
        page: Option<PageRequest>,
    ) -> impl Future<Output = Result<Vec<Entity>>> + Send;

    /// Total row count
    fn count(&self) -> impl Future<Output = Result<i64>> + Send;

    /// Insert and return the stored entity
    fn create(&self, data: Create) -> impl Future<Output = Result<Entity>> + Send;

    /// Apply a partial update and return the stored entity
    fn update(&self, id: Id, data: Update) -> impl Future<Output = Result<Entity>> + Send;

    /// Delete by primary key; `Ok(false)` when no row matched
    fn delete(&self, id: Id) -> impl Future<Output = Result<bool>> + Send;
}

/// Lenient surrogate-key parsing for path segments.
///
/// Accepts a non-empty all-digit string; anything else is `None`, never an
/// error, so `"abc"` looks the same as a missing row to callers.
pub fn parse_record_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_string_parses() {
        assert_eq!(parse_record_id("42"), Some(42));
        assert_eq!(parse_record_id(" 7 "), Some(7));
    }

    #[test]
    fn test_non_numeric_is_none() {
        assert_eq!(parse_record_id("abc"), None);
        assert_eq!(parse_record_id("12abc"), None);
        assert_eq!(parse_record_id(""), None);
        assert_eq!(parse_record_id("-1"), None);
        assert_eq!(parse_record_id("4.2"), None);
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(parse_record_id("99999999999999999999999999"), None);
    }
}
