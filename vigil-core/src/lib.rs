//! Vigil Core - Check Resource Management
//!
//! Domain model and storage-agnostic service contract for "checks": named,
//! organization-scoped records that drive periodic evaluation tasks.
//!
//! # Module structure
//!
//! ```text
//! vigil-core/src/
//! ├── id.rs          # resource identifiers + generator trait
//! ├── errors.rs      # structured error taxonomy
//! ├── check.rs       # Check entity, tags, CrudLog, partial updates
//! ├── query.rs       # filters and pagination options
//! ├── service.rs     # service contracts + collaborator traits
//! ├── memory.rs      # in-memory backend
//! ├── mock.rs        # deterministic id/time doubles
//! └── conformance.rs # backend-agnostic behavioral suite
//! ```

pub mod check;
pub mod conformance;
pub mod errors;
pub mod id;
pub mod memory;
pub mod mock;
pub mod query;
pub mod service;

// Re-export the public surface.
pub use check::{Check, CheckTag, CheckUpdate, CrudLog, CHECK_DEFAULT_PAGE_SIZE, CHECK_MAX_PAGE_SIZE};
pub use errors::{Error, ErrorCode, Result};
pub use id::{Id, IdGenerator, RandomIdGenerator};
pub use memory::MemoryStore;
pub use query::{CheckFilter, FindOptions};
pub use service::{
    CheckService, Label, LabelService, Organization, OrganizationFilter, OrganizationService,
    SystemClock, Task, TaskService, TimeSource,
};
