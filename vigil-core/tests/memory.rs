//! Conformance and property tests for the in-memory backend.

use std::sync::Arc;

use vigil_core::conformance::{self, CheckFields, ORG_ONE_ID};
use vigil_core::errors::OP_CREATE_CHECK;
use vigil_core::mock::{RecordingTaskService, SequenceIdGenerator, TaskCall};
use vigil_core::{
    Check, CheckFilter, CheckService, CheckUpdate, FindOptions, Id, MemoryStore, Organization,
    OrganizationFilter, OrganizationService, SystemClock,
};

async fn seeded_store(fields: CheckFields) -> MemoryStore {
    let store = MemoryStore::with_generators(fields.id_generator, fields.time_source);
    for org in fields.organizations {
        store.put_organization(org);
    }
    for check in fields.checks {
        store.put_check(check);
    }
    store
}

#[tokio::test]
async fn memory_store_passes_the_conformance_suite() {
    conformance::check_service(seeded_store).await;
}

/// Build a store with `n` checks named check0..check{n-1} under one org.
async fn store_with_checks(n: usize) -> MemoryStore {
    let store = MemoryStore::with_generators(
        Arc::new(SequenceIdGenerator::new(Id::new(0x1000))),
        Arc::new(SystemClock),
    );
    store.put_organization(Organization {
        id: ORG_ONE_ID,
        name: "theorg".into(),
    });
    for i in 0..n {
        store
            .create_check(Check {
                org_id: ORG_ONE_ID,
                name: format!("check{i}"),
                ..Default::default()
            })
            .await
            .expect("create seed check");
    }
    store
}

#[tokio::test]
async fn single_item_pages_concatenate_to_the_full_list() {
    let store = store_with_checks(7).await;
    let (all, total) = store
        .find_checks(CheckFilter::default(), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(total, 7);

    let mut concatenated = Vec::new();
    for offset in 0..total {
        let (page, page_total) = store
            .find_checks(
                CheckFilter::default(),
                FindOptions {
                    offset,
                    limit: Some(1),
                    descending: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(page_total, total, "total is the unsliced match count");
        concatenated.extend(page);
    }
    assert_eq!(concatenated, all);
}

#[tokio::test]
async fn descending_is_the_exact_reverse_of_ascending() {
    let store = store_with_checks(5).await;
    let (ascending, _) = store
        .find_checks(CheckFilter::default(), FindOptions::default())
        .await
        .unwrap();
    let (descending, _) = store
        .find_checks(
            CheckFilter::default(),
            FindOptions {
                descending: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut reversed = ascending;
    reversed.reverse();
    assert_eq!(descending, reversed);
}

#[tokio::test]
async fn created_check_round_trips_with_server_assigned_fields() {
    let store = MemoryStore::new();
    store.put_organization(Organization {
        id: ORG_ONE_ID,
        name: "theorg".into(),
    });

    let created = store
        .create_check(Check {
            org_id: ORG_ONE_ID,
            name: "name1".into(),
            description: "desc1".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(created.id.valid());
    assert_ne!(
        created.crud_log.created_at,
        chrono::DateTime::<chrono::Utc>::default()
    );
    assert_eq!(created.crud_log.created_at, created.crud_log.updated_at);

    let found = store.find_check_by_id(created.id).await.unwrap();
    assert_eq!(found, created);
    assert_eq!(found.name, "name1");
    assert_eq!(found.description, "desc1");
}

#[tokio::test]
async fn concurrent_creates_of_the_same_name_admit_exactly_one() {
    let store = Arc::new(store_with_checks(0).await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .create_check(Check {
                    org_id: ORG_ONE_ID,
                    name: "contended".into(),
                    ..Default::default()
                })
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let (checks, _) = store
        .find_checks(CheckFilter::default(), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(checks.len(), 1);
}

/// Build a store wired to the given task collaborator, with one org seeded.
fn task_backed_store(tasks: Arc<RecordingTaskService>) -> MemoryStore {
    let store = MemoryStore::with_generators(
        Arc::new(SequenceIdGenerator::new(Id::new(0x2000))),
        Arc::new(SystemClock),
    )
    .with_task_service(tasks);
    store.put_organization(Organization {
        id: ORG_ONE_ID,
        name: "theorg".into(),
    });
    store
}

fn cpu_check() -> Check {
    Check {
        org_id: ORG_ONE_ID,
        name: "cpu".into(),
        query: "from(bucket: \"system\")".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_wires_the_generated_task() {
    let tasks = Arc::new(RecordingTaskService::new(Id::new(0x9000)));
    let store = task_backed_store(Arc::clone(&tasks));

    let created = store.create_check(cpu_check()).await.unwrap();
    assert_eq!(created.task_id, Id::new(0x9000));
    assert_eq!(tasks.calls(), vec![TaskCall::Created(created.id)]);

    let stored = store.find_check_by_id(created.id).await.unwrap();
    assert_eq!(stored.task_id, Id::new(0x9000));
}

#[tokio::test]
async fn failed_task_creation_leaves_no_check_behind() {
    let store = task_backed_store(Arc::new(RecordingTaskService::failing()));

    let err = store.create_check(cpu_check()).await.unwrap_err();
    assert_eq!(err.code(), vigil_core::ErrorCode::Internal);
    assert_eq!(err.op(), Some(OP_CREATE_CHECK));

    let (checks, total) = store
        .find_checks(CheckFilter::default(), FindOptions::default())
        .await
        .unwrap();
    assert!(checks.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn derived_field_updates_regenerate_the_task() {
    let tasks = Arc::new(RecordingTaskService::new(Id::new(0x9000)));
    let store = task_backed_store(Arc::clone(&tasks));
    let created = store.create_check(cpu_check()).await.unwrap();

    // Cosmetic updates leave the task alone.
    store
        .update_check(
            created.id,
            CheckUpdate {
                description: Some("cpu pressure".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    // Touching the query regenerates.
    store
        .update_check(
            created.id,
            CheckUpdate {
                query: Some("from(bucket: \"other\")".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        tasks.calls(),
        vec![
            TaskCall::Created(created.id),
            TaskCall::Regenerated(created.id),
        ]
    );
}

#[tokio::test]
async fn delete_drops_the_generated_task() {
    let tasks = Arc::new(RecordingTaskService::new(Id::new(0x9000)));
    let store = task_backed_store(Arc::clone(&tasks));
    let created = store.create_check(cpu_check()).await.unwrap();

    store.delete_check(created.id).await.unwrap();
    assert_eq!(
        tasks.calls(),
        vec![
            TaskCall::Created(created.id),
            TaskCall::Deleted(Id::new(0x9000)),
        ]
    );
}

#[tokio::test]
async fn organization_lookup_resolves_by_name_or_id() {
    let store = store_with_checks(1).await;

    let by_name = store
        .find_organization(OrganizationFilter {
            name: Some("theorg".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_name.id, ORG_ONE_ID);

    let by_id = store
        .find_organization(OrganizationFilter {
            id: Some(ORG_ONE_ID),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_id.name, "theorg");

    let miss = store
        .find_organization(OrganizationFilter {
            name: Some("missing".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(miss.code(), vigil_core::ErrorCode::NotFound);
}

#[tokio::test]
async fn second_delete_fails_without_changing_state() {
    let store = store_with_checks(2).await;
    let (checks, _) = store
        .find_checks(CheckFilter::default(), FindOptions::default())
        .await
        .unwrap();
    let victim = checks[0].id;

    store.delete_check(victim).await.unwrap();
    let err = store.delete_check(victim).await.unwrap_err();
    assert_eq!(err.code(), vigil_core::ErrorCode::NotFound);

    let (remaining, total) = store
        .find_checks(CheckFilter::default(), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(remaining[0].id, checks[1].id);
}
