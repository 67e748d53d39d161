//! Check Entity Model
//!
//! A [`Check`] is a named, organization-scoped configuration that drives a
//! periodic evaluation task. The record owns the source-of-truth fields for
//! that task (query, tags, status message template); the task itself is
//! managed by the task subsystem and only referenced through `task_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::id::Id;

/// Default page size applied by the HTTP layer when no limit is given.
pub const CHECK_DEFAULT_PAGE_SIZE: usize = 100;
/// Hard ceiling on a requested page size.
pub const CHECK_MAX_PAGE_SIZE: usize = 500;

/// Created-at / updated-at audit pair embedded in every CRUD-managed entity.
///
/// The owning service is the sole mutator: `created_at` is set exactly once
/// at creation, `updated_at` is refreshed on every successful update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudLog {
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// A tag k/v pair attached when the check's task writes its results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTag {
    pub key: String,
    pub value: String,
}

impl CheckTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A tag is only meaningful with both halves present.
    pub fn valid(&self) -> Result<()> {
        if self.key.is_empty() || self.value.is_empty() {
            return Err(Error::invalid("checktag must contain a key and a value"));
        }
        Ok(())
    }
}

/// The check record.
///
/// `task_id` points at the generated task (owned 1:1) and never appears in
/// request or response bodies; the task subsystem reconstructs the task for
/// API decoration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    #[serde(default)]
    pub id: Id,
    #[serde(rename = "orgID", default, skip_serializing_if = "Id::is_zero")]
    pub org_id: Id,
    #[serde(skip)]
    pub task_id: Id,
    #[serde(default)]
    pub tags: Vec<CheckTag>,
    #[serde(default)]
    pub status_message_template: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(flatten)]
    pub crud_log: CrudLog,
}

impl Check {
    /// Validate the caller-supplied fields of a check.
    pub fn valid(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid("check name cannot be empty"));
        }
        for tag in &self.tags {
            tag.valid()?;
        }
        Ok(())
    }
}

/// Partial-update descriptor for a check.
///
/// Each field is presence-wrapped: `Some` replaces the stored value (for
/// `tags`, wholesale — no element-wise merge), `None` leaves it untouched.
/// `Some("".into())` is a legitimate way to clear a text field. `status` is
/// not stored on the check at all; it only steers regeneration of the
/// underlying task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<CheckTag>>,
    #[serde(rename = "flux", default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CheckUpdate {
    /// Apply every present field onto `check`. Timestamps are left alone;
    /// refreshing `updated_at` is the service's job.
    pub fn apply(&self, check: &mut Check) {
        if let Some(name) = &self.name {
            check.name = name.clone();
        }
        if let Some(template) = &self.status_message_template {
            check.status_message_template = template.clone();
        }
        if let Some(tags) = &self.tags {
            check.tags = tags.clone();
        }
        if let Some(query) = &self.query {
            check.query = query.clone();
        }
        if let Some(description) = &self.description {
            check.description = description.clone();
        }
    }

    /// Whether this update touches the fields the generated task is derived
    /// from, requiring the task subsystem to regenerate it.
    pub fn requires_task_regeneration(&self) -> bool {
        self.query.is_some() || self.status.is_some() || self.tags.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_requires_a_name() {
        let check = Check::default();
        let err = check.valid().unwrap_err();
        assert_eq!(err, Error::invalid("check name cannot be empty"));
    }

    #[test]
    fn check_rejects_half_empty_tags() {
        let check = Check {
            name: "cpu".into(),
            tags: vec![CheckTag::new("host", "")],
            ..Default::default()
        };
        let err = check.valid().unwrap_err();
        assert_eq!(
            err,
            Error::invalid("checktag must contain a key and a value")
        );
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut check = Check {
            name: "cpu".into(),
            description: "old".into(),
            query: "from(bucket: \"b\")".into(),
            ..Default::default()
        };
        let upd = CheckUpdate {
            description: Some(String::new()),
            ..Default::default()
        };
        upd.apply(&mut check);
        assert_eq!(check.name, "cpu");
        assert_eq!(check.description, "");
        assert_eq!(check.query, "from(bucket: \"b\")");
    }

    #[test]
    fn update_replaces_tags_wholesale() {
        let mut check = Check {
            name: "cpu".into(),
            tags: vec![CheckTag::new("a", "1"), CheckTag::new("b", "2")],
            ..Default::default()
        };
        let upd = CheckUpdate {
            tags: Some(vec![CheckTag::new("c", "3")]),
            ..Default::default()
        };
        upd.apply(&mut check);
        assert_eq!(check.tags, vec![CheckTag::new("c", "3")]);
    }

    #[test]
    fn task_regeneration_tracks_the_derived_fields() {
        let query = CheckUpdate {
            query: Some("from(bucket: \"b\")".into()),
            ..Default::default()
        };
        assert!(query.requires_task_regeneration());

        let status = CheckUpdate {
            status: Some("active".into()),
            ..Default::default()
        };
        assert!(status.requires_task_regeneration());

        let tags = CheckUpdate {
            tags: Some(vec![CheckTag::new("a", "1")]),
            ..Default::default()
        };
        assert!(tags.requires_task_regeneration());

        let cosmetic = CheckUpdate {
            name: Some("renamed".into()),
            description: Some("desc".into()),
            ..Default::default()
        };
        assert!(!cosmetic.requires_task_regeneration());
    }

    #[test]
    fn check_serializes_with_wire_names() {
        let check = Check {
            id: Id::new(1),
            org_id: Id::new(2),
            task_id: Id::new(3),
            name: "cpu".into(),
            status_message_template: "Check: ${r._check_name} is: ${r._level}".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(value["orgID"], "0000000000000002");
        assert_eq!(value["statusMessageTemplate"], check.status_message_template);
        // The generated task is internal and never serialized.
        assert!(value.get("taskID").is_none());
        assert!(value.get("taskId").is_none());
        assert!(value.get("description").is_none());
        assert!(value.get("createdAt").is_some());
    }
}
