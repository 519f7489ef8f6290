//! # Pagination Plan Builder
//!
//! Pages are 1-based: page 1 starts at offset 0.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spec::QuerySpec;

use super::errors::PlanResult;
use super::query::QueryBuilder;

/// Default page when pagination is enabled
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when pagination is enabled
pub const DEFAULT_SIZE: i64 = 30;

/// Page and size used when the request does not supply them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDefaults {
    pub page: i64,
    pub size: i64,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_SIZE,
        }
    }
}

/// Request an offset/limit window.
///
/// Without defaults the window is only applied when the request supplies a
/// `size`. Effective page and size are written back into `spec`.
pub fn apply_pagination(
    query: &mut dyn QueryBuilder,
    spec: &mut QuerySpec,
    defaults: Option<PageDefaults>,
) -> PlanResult<()> {
    let Some(size) = spec.size.or(defaults.map(|d| d.size)) else {
        return Ok(());
    };
    let page = spec
        .page
        .or(defaults.map(|d| d.page))
        .unwrap_or(DEFAULT_PAGE);

    let offset = page.saturating_sub(1).saturating_mul(size);
    debug!(page, size, offset, "applying pagination");

    spec.page = Some(page);
    spec.size = Some(size);
    query.offset_limit(offset, size)
}
