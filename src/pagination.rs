//! Offset pagination over listing endpoints
//!
//! `page` and `per_page` are optional query arguments; listings paginate only
//! when both are supplied, otherwise they return the full result set with no
//! metadata. Page numbers are 1-based. Asking for a page past the end is a
//! not-found condition, except that page 1 of an empty collection is a valid
//! empty page.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::parser::{ArgKind, Argument, ParsedArgs, ParserSchema, RequestInput};

/// Shared schema for the pagination query arguments
static PAGINATION_SCHEMA: Lazy<ParserSchema> = Lazy::new(|| {
    ParserSchema::builder()
        .arg(Argument::new("page").with_kind(ArgKind::Int))
        .arg(Argument::new("per_page").with_kind(ArgKind::Int))
        .build()
        .expect("pagination schema is statically valid")
});

/// Parse the pagination arguments out of a request
pub fn parse_pagination(input: &RequestInput) -> Result<ParsedArgs> {
    PAGINATION_SCHEMA.parse(input)
}

/// A concrete page request; only exists when both arguments were supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// `Some` when both `page` and `per_page` parsed to values
    pub fn from_args(args: &ParsedArgs) -> Option<Self> {
        if !args.has_all(&["page", "per_page"]) {
            return None;
        }
        Some(Self {
            page: args.opt_int("page")?,
            per_page: args.opt_int("per_page")?,
        })
    }

    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// SQL LIMIT for this page
    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Pagination metadata attached to paginated listing responses
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    /// Validate the requested page against the collection size.
    ///
    /// `per_page < 1` is a bad request; a page outside `1..=total_pages` is
    /// not found, with the exception that page 1 is always valid so an empty
    /// collection can be listed.
    pub fn compute(request: PageRequest, total_items: i64) -> Result<Self> {
        if request.per_page < 1 {
            return Err(Error::bad_args(format!(
                "argument 'per_page' must be at least 1, got '{}'",
                request.per_page
            )));
        }

        // ceiling division without the additive form, which can overflow
        // for a huge caller-supplied per_page
        let total_pages =
            total_items / request.per_page + i64::from(total_items % request.per_page != 0);

        if request.page != 1 && (request.page < 1 || request.page > total_pages) {
            return Err(Error::NotFound(format!(
                "page {} not found",
                request.page
            )));
        }

        Ok(Self {
            page: request.page,
            per_page: request.per_page,
            total_pages,
            total_items,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        })
    }
}
