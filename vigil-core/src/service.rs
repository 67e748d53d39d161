//! Service Contracts
//!
//! The capability interfaces every storage backend implements, plus the
//! external collaborators the check service and HTTP layer depend on. All
//! callers program against these traits, never a concrete backend, which is
//! what lets the conformance suite (see [`crate::conformance`]) run against
//! any implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::check::{Check, CheckUpdate};
use crate::errors::Result;
use crate::id::Id;
use crate::query::{CheckFilter, FindOptions};

/// Storage-agnostic contract for managing checks.
///
/// Implementations must enforce the record invariants themselves: per-org
/// name uniqueness (atomically with the write that depends on it), org
/// existence at creation, service-owned ids and timestamps. Every error is
/// returned wrapped with the failing operation's name.
#[async_trait]
pub trait CheckService: Send + Sync {
    /// Return a single check by id.
    async fn find_check_by_id(&self, id: Id) -> Result<Check>;

    /// Return the first check matching `filter`, per the ordering used by
    /// [`CheckService::find_checks`].
    async fn find_check(&self, filter: CheckFilter) -> Result<Check>;

    /// Return the checks matching `filter` after sorting and slicing per
    /// `opts`, together with the unsliced match count.
    async fn find_checks(
        &self,
        filter: CheckFilter,
        opts: FindOptions,
    ) -> Result<(Vec<Check>, usize)>;

    /// Validate and persist a new check, assigning its id and timestamps.
    /// Callers must not pre-populate either.
    async fn create_check(&self, check: Check) -> Result<Check>;

    /// Apply a partial update and return the resulting record.
    async fn update_check(&self, id: Id, upd: CheckUpdate) -> Result<Check>;

    /// Hard-delete a check.
    async fn delete_check(&self, id: Id) -> Result<()>;
}

/// An organization owning checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Id,
    pub name: String,
}

/// Lookup descriptor for organizations: by id, by name, or both.
#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    pub id: Option<Id>,
    pub name: Option<String>,
}

/// The slice of the organization service the check service needs: existence
/// validation at create time and resolution of name filters.
#[async_trait]
pub trait OrganizationService: Send + Sync {
    async fn find_organization(&self, filter: OrganizationFilter) -> Result<Organization>;
}

/// The task generated from a check's query. Execution semantics live in the
/// task subsystem; the check service only holds a pointer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    pub query: String,
}

/// Task subsystem hooks the check service triggers but does not own.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Derive and persist a task for a freshly created check.
    async fn create_task(&self, check: &Check) -> Result<Task>;

    /// Regenerate the task after a meaningful check update. The check's
    /// fields are the source of truth and overwrite any direct task edits.
    async fn regenerate_task(&self, check: &Check) -> Result<Task>;

    /// Drop the task belonging to a deleted check.
    async fn delete_task(&self, id: Id) -> Result<()>;
}

/// A label attached to a resource; decoration data for API responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

/// Read side of the label service used by the HTTP layer (never by the
/// check service itself) to decorate single-check responses.
#[async_trait]
pub trait LabelService: Send + Sync {
    async fn find_resource_labels(&self, resource_id: Id) -> Result<Vec<Label>>;
}

/// Source of the current time; injected so tests can freeze it.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock [`TimeSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
