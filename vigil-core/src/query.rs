//! Filter and Pagination Descriptors

use crate::check::Check;
use crate::id::Id;

/// Restricts the checks returned by the find operations.
///
/// Fields compose with logical AND; absent fields are wildcards. `org` is an
/// organization *name* and is resolved to an id through the organization
/// service before matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckFilter {
    pub id: Option<Id>,
    pub name: Option<String>,
    pub org_id: Option<Id>,
    pub org: Option<String>,
    /// Result-size cap; zero means uncapped.
    pub limit: usize,
}

impl CheckFilter {
    /// Whether `check` satisfies this filter, given the already-resolved
    /// organization id (`None` when the filter does not constrain the org).
    pub(crate) fn matches(&self, check: &Check, resolved_org: Option<Id>) -> bool {
        if let Some(id) = self.id {
            if check.id != id {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &check.name != name {
                return false;
            }
        }
        if let Some(org_id) = resolved_org {
            if check.org_id != org_id {
                return false;
            }
        }
        true
    }
}

/// Pagination and sort descriptor shared across list operations.
///
/// The ordering key is the check id, which is stable and total, so repeated
/// calls against an unchanged data set paginate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    /// Skip count.
    pub offset: usize,
    /// Page size; `None` means unlimited (direct service callers only — the
    /// HTTP layer always supplies one).
    pub limit: Option<usize>,
    /// Reverse the sort order.
    pub descending: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: None,
            descending: false,
        }
    }
}

impl FindOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }
}
