//! In-Memory Backend
//!
//! [`MemoryStore`] implements the check, organization and label contracts
//! over `BTreeMap`s behind a single `RwLock`. Iterating the check table in
//! key order yields the id-ascending ordering the contract requires, and
//! every uniqueness probe runs inside the same write-lock acquisition as the
//! write that depends on it, so concurrent creates or renames of the same
//! name cannot both succeed. Mutations never hold the lock across an await
//! point; a cancelled (dropped) operation leaves no partial write behind.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::check::{Check, CheckUpdate, CrudLog};
use crate::errors::{
    Error, Result, OP_CREATE_CHECK, OP_DELETE_CHECK, OP_FIND_CHECK, OP_FIND_CHECKS,
    OP_FIND_CHECK_BY_ID, OP_UPDATE_CHECK,
};
use crate::id::{Id, IdGenerator, RandomIdGenerator};
use crate::query::{CheckFilter, FindOptions};
use crate::service::{
    CheckService, Label, LabelService, Organization, OrganizationFilter, OrganizationService,
    SystemClock, TaskService, TimeSource,
};

#[derive(Default)]
struct Tables {
    checks: BTreeMap<Id, Check>,
    organizations: BTreeMap<Id, Organization>,
    /// Labels attached to a resource, keyed by resource id.
    labels: BTreeMap<Id, Vec<Label>>,
}

impl Tables {
    fn resolve_org(&self, filter: &CheckFilter) -> Result<Option<Id>> {
        if let Some(id) = filter.org_id {
            return Ok(Some(id));
        }
        if let Some(name) = &filter.org {
            let org = self
                .organizations
                .values()
                .find(|o| &o.name == name)
                .ok_or_else(|| Error::not_found("organization not found"))?;
            return Ok(Some(org.id));
        }
        Ok(None)
    }

    /// Filter, then sort, then slice. The order matters: `total` is the
    /// pre-slice match count that pagination links are computed from.
    fn list(&self, filter: &CheckFilter, opts: FindOptions) -> Result<(Vec<Check>, usize)> {
        let resolved_org = self.resolve_org(filter)?;

        // BTreeMap iteration is already id-ascending.
        let mut matches: Vec<Check> = self
            .checks
            .values()
            .filter(|c| filter.matches(c, resolved_org))
            .cloned()
            .collect();
        if opts.descending {
            matches.reverse();
        }

        let total = matches.len();
        let mut page: Vec<Check> = matches
            .into_iter()
            .skip(opts.offset)
            .take(opts.limit.unwrap_or(usize::MAX))
            .collect();
        if filter.limit > 0 {
            page.truncate(filter.limit);
        }
        Ok((page, total))
    }

    fn name_taken(&self, org_id: Id, name: &str, excluding: Id) -> bool {
        self.checks
            .values()
            .any(|c| c.org_id == org_id && c.name == name && c.id != excluding)
    }
}

/// In-memory implementation of the service contracts.
pub struct MemoryStore {
    id_generator: Arc<dyn IdGenerator>,
    time_source: Arc<dyn TimeSource>,
    /// Optional task subsystem hook; when absent, `task_id` stays unset.
    task_service: Option<Arc<dyn TaskService>>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_generators(Arc::new(RandomIdGenerator), Arc::new(SystemClock))
    }

    /// Construct with explicit id/time sources (deterministic in tests).
    pub fn with_generators(
        id_generator: Arc<dyn IdGenerator>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            id_generator,
            time_source,
            task_service: None,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Wire in the task subsystem collaborator.
    pub fn with_task_service(mut self, task_service: Arc<dyn TaskService>) -> Self {
        self.task_service = Some(task_service);
        self
    }

    /// Seed an organization, bypassing service validation. Test setup only.
    pub fn put_organization(&self, org: Organization) {
        self.tables.write().organizations.insert(org.id, org);
    }

    /// Seed a check as-is, bypassing service validation. Test setup only.
    pub fn put_check(&self, check: Check) {
        self.tables.write().checks.insert(check.id, check);
    }

    /// Seed the labels attached to a resource.
    pub fn put_labels(&self, resource_id: Id, labels: Vec<Label>) {
        self.tables.write().labels.insert(resource_id, labels);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckService for MemoryStore {
    async fn find_check_by_id(&self, id: Id) -> Result<Check> {
        self.tables
            .read()
            .checks
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("check not found").with_op(OP_FIND_CHECK_BY_ID))
    }

    async fn find_check(&self, filter: CheckFilter) -> Result<Check> {
        let name = filter.name.clone();
        let (page, _) = self
            .tables
            .read()
            .list(&filter, FindOptions::default())
            .map_err(|e| e.with_op(OP_FIND_CHECK))?;
        page.into_iter().next().ok_or_else(|| {
            let msg = match name {
                Some(name) => format!("check \"{name}\" not found"),
                None => "check not found".to_string(),
            };
            Error::not_found(msg).with_op(OP_FIND_CHECK)
        })
    }

    async fn find_checks(
        &self,
        filter: CheckFilter,
        opts: FindOptions,
    ) -> Result<(Vec<Check>, usize)> {
        self.tables
            .read()
            .list(&filter, opts)
            .map_err(|e| e.with_op(OP_FIND_CHECKS))
    }

    async fn create_check(&self, mut check: Check) -> Result<Check> {
        check.valid().map_err(|e| e.with_op(OP_CREATE_CHECK))?;

        let created = {
            let mut tables = self.tables.write();
            if !tables.organizations.contains_key(&check.org_id) {
                return Err(Error::not_found("organization not found").with_op(OP_CREATE_CHECK));
            }
            if tables.name_taken(check.org_id, &check.name, Id::default()) {
                return Err(Error::conflict(format!(
                    "check with name {} already exists",
                    check.name
                ))
                .with_op(OP_CREATE_CHECK));
            }

            check.id = self.id_generator.id();
            let now = self.time_source.now();
            check.crud_log = CrudLog {
                created_at: now,
                updated_at: now,
            };
            tables.checks.insert(check.id, check.clone());
            check
        };
        debug!(check = %created.id, org = %created.org_id, "check created");

        if let Some(tasks) = &self.task_service {
            // A failed task hook must not leave the check behind.
            let task = match tasks.create_task(&created).await {
                Ok(task) => task,
                Err(e) => {
                    self.tables.write().checks.remove(&created.id);
                    return Err(e.with_op(OP_CREATE_CHECK));
                }
            };
            let mut tables = self.tables.write();
            if let Some(stored) = tables.checks.get_mut(&created.id) {
                stored.task_id = task.id;
                return Ok(stored.clone());
            }
        }
        Ok(created)
    }

    async fn update_check(&self, id: Id, upd: CheckUpdate) -> Result<Check> {
        let updated = {
            let mut tables = self.tables.write();
            let current = tables
                .checks
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::not_found("check not found").with_op(OP_UPDATE_CHECK))?;

            // Rename must re-establish per-org uniqueness before the write,
            // inside the same lock scope.
            if let Some(name) = &upd.name {
                if name != &current.name && tables.name_taken(current.org_id, name, id) {
                    return Err(
                        Error::conflict("check name is not unique").with_op(OP_UPDATE_CHECK)
                    );
                }
            }

            let mut next = current;
            upd.apply(&mut next);
            next.valid().map_err(|e| e.with_op(OP_UPDATE_CHECK))?;
            next.crud_log.updated_at = self.time_source.now();
            tables.checks.insert(id, next.clone());
            next
        };
        debug!(check = %id, "check updated");

        if upd.requires_task_regeneration() {
            if let Some(tasks) = &self.task_service {
                tasks
                    .regenerate_task(&updated)
                    .await
                    .map_err(|e| e.with_op(OP_UPDATE_CHECK))?;
            }
        }
        Ok(updated)
    }

    async fn delete_check(&self, id: Id) -> Result<()> {
        let removed = {
            let mut tables = self.tables.write();
            match tables.checks.remove(&id) {
                Some(check) => check,
                None => {
                    return Err(Error::not_found("check not found").with_op(OP_DELETE_CHECK));
                }
            }
        };
        debug!(check = %id, "check deleted");

        // The task subsystem owns the cascade; this only triggers it.
        if removed.task_id.valid() {
            if let Some(tasks) = &self.task_service {
                tasks
                    .delete_task(removed.task_id)
                    .await
                    .map_err(|e| e.with_op(OP_DELETE_CHECK))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationService for MemoryStore {
    async fn find_organization(&self, filter: OrganizationFilter) -> Result<Organization> {
        let tables = self.tables.read();
        tables
            .organizations
            .values()
            .find(|org| {
                filter.id.map_or(true, |id| org.id == id)
                    && filter.name.as_ref().map_or(true, |name| &org.name == name)
            })
            .cloned()
            .ok_or_else(|| Error::not_found("organization not found"))
    }
}

#[async_trait]
impl LabelService for MemoryStore {
    async fn find_resource_labels(&self, resource_id: Id) -> Result<Vec<Label>> {
        Ok(self
            .tables
            .read()
            .labels
            .get(&resource_id)
            .cloned()
            .unwrap_or_default())
    }
}
