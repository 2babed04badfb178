//! Helpers shared across platform catalogs.

use serde_json::Value;

use crate::domains::tools::FieldSpec;

/// Upper bound for page sizes on every paginated endpoint.
pub const MAX_PAGE_SIZE: i64 = 100;

/// `per_page` and `page` fields, as GitHub and GitLab name them.
pub fn page_fields(default_per_page: i64) -> [FieldSpec; 2] {
    [
        FieldSpec::integer("per_page", "Results per page")
            .range(1, MAX_PAGE_SIZE)
            .default(default_per_page),
        FieldSpec::integer("page", "Page number, starting at 1")
            .min(1)
            .default(1),
    ]
}

/// Replace an empty remote answer with a short summary of what was done.
pub fn or_summary(payload: Value, summary: Value) -> Value {
    if payload.is_null() { summary } else { payload }
}
