//! Conformance Suite
//!
//! A backend-agnostic behavioral suite for [`CheckService`] implementations.
//! A storage backend is correct exactly insofar as it passes
//! [`check_service`] unmodified: the suite drives the service contract
//! directly (no HTTP) through a factory that produces a fresh, pre-seeded
//! instance per case.
//!
//! ```ignore
//! #[tokio::test]
//! async fn memory_store_conforms() {
//!     conformance::check_service(|fields| async move {
//!         // build your backend from `fields`
//!     })
//!     .await;
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::check::{Check, CheckUpdate, CrudLog};
use crate::errors::{
    Error, Result, OP_CREATE_CHECK, OP_DELETE_CHECK, OP_FIND_CHECK, OP_FIND_CHECK_BY_ID,
    OP_UPDATE_CHECK,
};
use crate::id::{Id, IdGenerator, RandomIdGenerator};
use crate::mock::{FixedClock, StaticIdGenerator};
use crate::query::{CheckFilter, FindOptions};
use crate::service::{CheckService, Organization, SystemClock, TimeSource};

// Well-known fixture ids, ascending within each table.
pub const CHECK_ONE_ID: Id = Id::new(0x020f755c3c082000);
pub const CHECK_TWO_ID: Id = Id::new(0x020f755c3c082001);
pub const CHECK_THREE_ID: Id = Id::new(0x020f755c3c082002);
pub const ORG_ONE_ID: Id = Id::new(0x020f755c3c083000);
pub const ORG_TWO_ID: Id = Id::new(0x020f755c3c083001);

/// Seed data and injected dependencies handed to the backend factory.
pub struct CheckFields {
    pub id_generator: Arc<dyn IdGenerator>,
    pub time_source: Arc<dyn TimeSource>,
    pub checks: Vec<Check>,
    pub organizations: Vec<Organization>,
}

impl Default for CheckFields {
    fn default() -> Self {
        Self {
            id_generator: Arc::new(RandomIdGenerator),
            time_source: Arc::new(SystemClock),
            checks: Vec::new(),
            organizations: Vec::new(),
        }
    }
}

/// The instant every deterministic fixture clock is frozen at.
pub fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2006, 5, 4, 1, 2, 3).unwrap()
}

fn org(id: Id, name: &str) -> Organization {
    Organization {
        id,
        name: name.to_string(),
    }
}

fn named_check(id: Id, org_id: Id, name: &str) -> Check {
    Check {
        id,
        org_id,
        name: name.to_string(),
        ..Default::default()
    }
}

/// A check as it looks right after creation by a fixture-driven service.
fn stamped(mut check: Check) -> Check {
    check.crud_log = CrudLog {
        created_at: fixture_time(),
        updated_at: fixture_time(),
    };
    check
}

fn assert_error(case: &str, got: &Result<()>, want: &Option<Error>) {
    match (got, want) {
        (Err(err), Some(want)) => assert_eq!(err, want, "{case}: wrong error"),
        (Err(err), None) => panic!("{case}: unexpected error: {err}"),
        (Ok(()), Some(want)) => panic!("{case}: expected error \"{want}\", got success"),
        (Ok(()), None) => {}
    }
}

async fn all_checks<S: CheckService>(case: &str, service: &S) -> Vec<Check> {
    let (checks, _) = service
        .find_checks(CheckFilter::default(), FindOptions::default())
        .await
        .unwrap_or_else(|e| panic!("{case}: failed to retrieve checks: {e}"));
    checks
}

/// Run the full suite against the backend produced by `init`.
pub async fn check_service<S, F, Fut>(init: F)
where
    S: CheckService,
    F: Fn(CheckFields) -> Fut,
    Fut: Future<Output = S>,
{
    create_check(&init).await;
    find_check_by_id(&init).await;
    find_checks(&init).await;
    find_check(&init).await;
    update_check(&init).await;
    delete_check(&init).await;
}

/// Creation: id/timestamp assignment, per-org uniqueness, org existence.
pub async fn create_check<S, F, Fut>(init: &F)
where
    S: CheckService,
    F: Fn(CheckFields) -> Fut,
    Fut: Future<Output = S>,
{
    struct Case {
        name: &'static str,
        fields: CheckFields,
        check: Check,
        want_err: Option<Error>,
        want_checks: Vec<Check>,
    }

    let cases = vec![
        Case {
            name: "create check with empty set",
            fields: CheckFields {
                id_generator: Arc::new(StaticIdGenerator::new(CHECK_ONE_ID)),
                time_source: Arc::new(FixedClock(fixture_time())),
                checks: vec![],
                organizations: vec![org(ORG_ONE_ID, "theorg")],
            },
            check: Check {
                org_id: ORG_ONE_ID,
                name: "name1".into(),
                description: "desc1".into(),
                ..Default::default()
            },
            want_err: None,
            want_checks: vec![stamped(Check {
                description: "desc1".into(),
                ..named_check(CHECK_ONE_ID, ORG_ONE_ID, "name1")
            })],
        },
        Case {
            name: "basic create check",
            fields: CheckFields {
                id_generator: Arc::new(StaticIdGenerator::new(CHECK_TWO_ID)),
                time_source: Arc::new(FixedClock(fixture_time())),
                checks: vec![named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1")],
                organizations: vec![org(ORG_ONE_ID, "theorg"), org(ORG_TWO_ID, "otherorg")],
            },
            check: Check {
                org_id: ORG_TWO_ID,
                name: "check2".into(),
                ..Default::default()
            },
            want_err: None,
            want_checks: vec![
                named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1"),
                stamped(named_check(CHECK_TWO_ID, ORG_TWO_ID, "check2")),
            ],
        },
        Case {
            name: "names should be unique within an organization",
            fields: CheckFields {
                id_generator: Arc::new(StaticIdGenerator::new(CHECK_TWO_ID)),
                time_source: Arc::new(FixedClock(fixture_time())),
                checks: vec![named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1")],
                organizations: vec![org(ORG_ONE_ID, "theorg"), org(ORG_TWO_ID, "otherorg")],
            },
            check: Check {
                org_id: ORG_ONE_ID,
                name: "check1".into(),
                ..Default::default()
            },
            want_err: Some(
                Error::conflict("check with name check1 already exists").with_op(OP_CREATE_CHECK),
            ),
            want_checks: vec![named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1")],
        },
        Case {
            name: "names should not be unique across organizations",
            fields: CheckFields {
                id_generator: Arc::new(StaticIdGenerator::new(CHECK_TWO_ID)),
                time_source: Arc::new(FixedClock(fixture_time())),
                checks: vec![named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1")],
                organizations: vec![org(ORG_ONE_ID, "theorg"), org(ORG_TWO_ID, "otherorg")],
            },
            check: Check {
                org_id: ORG_TWO_ID,
                name: "check1".into(),
                ..Default::default()
            },
            want_err: None,
            want_checks: vec![
                named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1"),
                stamped(named_check(CHECK_TWO_ID, ORG_TWO_ID, "check1")),
            ],
        },
        Case {
            name: "create check with orgID not exist",
            fields: CheckFields {
                id_generator: Arc::new(StaticIdGenerator::new(CHECK_ONE_ID)),
                time_source: Arc::new(FixedClock(fixture_time())),
                checks: vec![],
                organizations: vec![],
            },
            check: Check {
                org_id: ORG_ONE_ID,
                name: "name1".into(),
                ..Default::default()
            },
            want_err: Some(Error::not_found("organization not found").with_op(OP_CREATE_CHECK)),
            want_checks: vec![],
        },
    ];

    for case in cases {
        let service = init(case.fields).await;
        let got = service.create_check(case.check).await.map(|_| ());
        assert_error(case.name, &got, &case.want_err);
        assert_eq!(
            all_checks(case.name, &service).await,
            case.want_checks,
            "{}: stored checks differ",
            case.name
        );
    }
}

/// Exact lookup: hit and miss.
pub async fn find_check_by_id<S, F, Fut>(init: &F)
where
    S: CheckService,
    F: Fn(CheckFields) -> Fut,
    Fut: Future<Output = S>,
{
    struct Case {
        name: &'static str,
        fields: CheckFields,
        id: Id,
        want: Result<Check>,
    }

    let two_checks = || {
        vec![
            named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1"),
            named_check(CHECK_TWO_ID, ORG_ONE_ID, "check2"),
        ]
    };

    let cases = vec![
        Case {
            name: "basic find check by id",
            fields: CheckFields {
                checks: two_checks(),
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                ..Default::default()
            },
            id: CHECK_TWO_ID,
            want: Ok(named_check(CHECK_TWO_ID, ORG_ONE_ID, "check2")),
        },
        Case {
            name: "find check by id not exist",
            fields: CheckFields {
                checks: two_checks(),
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                ..Default::default()
            },
            id: CHECK_THREE_ID,
            want: Err(Error::not_found("check not found").with_op(OP_FIND_CHECK_BY_ID)),
        },
    ];

    for case in cases {
        let service = init(case.fields).await;
        let got = service.find_check_by_id(case.id).await;
        assert_eq!(got, case.want, "{}: result differs", case.name);
    }
}

/// Listing: filters, offset/limit slicing, descending order, total count.
pub async fn find_checks<S, F, Fut>(init: &F)
where
    S: CheckService,
    F: Fn(CheckFields) -> Fut,
    Fut: Future<Output = S>,
{
    struct Case {
        name: &'static str,
        fields: CheckFields,
        filter: CheckFilter,
        opts: FindOptions,
        want: Vec<Check>,
        want_total: usize,
    }

    let both_orgs = || vec![org(ORG_ONE_ID, "theorg"), org(ORG_TWO_ID, "otherorg")];
    let abc_def_xyz = || {
        vec![
            named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
            named_check(CHECK_TWO_ID, ORG_ONE_ID, "def"),
            named_check(CHECK_THREE_ID, ORG_ONE_ID, "xyz"),
        ]
    };
    let mixed_orgs = || {
        vec![
            named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
            named_check(CHECK_TWO_ID, ORG_TWO_ID, "xyz"),
            named_check(CHECK_THREE_ID, ORG_ONE_ID, "123"),
        ]
    };

    let cases = vec![
        Case {
            name: "find all checks",
            fields: CheckFields {
                organizations: both_orgs(),
                checks: vec![
                    named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
                    named_check(CHECK_TWO_ID, ORG_TWO_ID, "xyz"),
                ],
                ..Default::default()
            },
            filter: CheckFilter::default(),
            opts: FindOptions::default(),
            want: vec![
                named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
                named_check(CHECK_TWO_ID, ORG_TWO_ID, "xyz"),
            ],
            want_total: 2,
        },
        Case {
            name: "find all checks by offset and limit",
            fields: CheckFields {
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                checks: abc_def_xyz(),
                ..Default::default()
            },
            filter: CheckFilter::default(),
            opts: FindOptions {
                offset: 1,
                limit: Some(1),
                descending: false,
            },
            want: vec![named_check(CHECK_TWO_ID, ORG_ONE_ID, "def")],
            want_total: 3,
        },
        Case {
            name: "find all checks by descending",
            fields: CheckFields {
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                checks: abc_def_xyz(),
                ..Default::default()
            },
            filter: CheckFilter::default(),
            opts: FindOptions {
                offset: 1,
                limit: None,
                descending: true,
            },
            want: vec![
                named_check(CHECK_TWO_ID, ORG_ONE_ID, "def"),
                named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
            ],
            want_total: 3,
        },
        Case {
            name: "find checks by organization name",
            fields: CheckFields {
                organizations: both_orgs(),
                checks: mixed_orgs(),
                ..Default::default()
            },
            filter: CheckFilter {
                org: Some("theorg".into()),
                ..Default::default()
            },
            opts: FindOptions::default(),
            want: vec![
                named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
                named_check(CHECK_THREE_ID, ORG_ONE_ID, "123"),
            ],
            want_total: 2,
        },
        Case {
            name: "find checks by organization id",
            fields: CheckFields {
                organizations: both_orgs(),
                checks: mixed_orgs(),
                ..Default::default()
            },
            filter: CheckFilter {
                org_id: Some(ORG_ONE_ID),
                ..Default::default()
            },
            opts: FindOptions::default(),
            want: vec![
                named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
                named_check(CHECK_THREE_ID, ORG_ONE_ID, "123"),
            ],
            want_total: 2,
        },
        Case {
            name: "find check by name",
            fields: CheckFields {
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                checks: vec![
                    named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
                    named_check(CHECK_TWO_ID, ORG_ONE_ID, "xyz"),
                ],
                ..Default::default()
            },
            filter: CheckFilter {
                name: Some("xyz".into()),
                ..Default::default()
            },
            opts: FindOptions::default(),
            want: vec![named_check(CHECK_TWO_ID, ORG_ONE_ID, "xyz")],
            want_total: 1,
        },
        Case {
            name: "missing check returns no checks",
            fields: CheckFields {
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                checks: vec![],
                ..Default::default()
            },
            filter: CheckFilter {
                name: Some("xyz".into()),
                ..Default::default()
            },
            opts: FindOptions::default(),
            want: vec![],
            want_total: 0,
        },
    ];

    for case in cases {
        let service = init(case.fields).await;
        let (checks, total) = service
            .find_checks(case.filter, case.opts)
            .await
            .unwrap_or_else(|e| panic!("{}: unexpected error: {e}", case.name));
        assert_eq!(checks, case.want, "{}: checks differ", case.name);
        assert_eq!(total, case.want_total, "{}: total differs", case.name);
    }
}

/// Single-match lookup via filter, including the quoted-name miss message.
pub async fn find_check<S, F, Fut>(init: &F)
where
    S: CheckService,
    F: Fn(CheckFields) -> Fut,
    Fut: Future<Output = S>,
{
    struct Case {
        name: &'static str,
        fields: CheckFields,
        filter: CheckFilter,
        want: Result<Check>,
    }

    let cases = vec![
        Case {
            name: "find check by name",
            fields: CheckFields {
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                checks: vec![
                    named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
                    named_check(CHECK_TWO_ID, ORG_ONE_ID, "xyz"),
                ],
                ..Default::default()
            },
            filter: CheckFilter {
                name: Some("abc".into()),
                org_id: Some(ORG_ONE_ID),
                ..Default::default()
            },
            want: Ok(named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc")),
        },
        Case {
            name: "under-specified filter returns the first match in list order",
            fields: CheckFields {
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                checks: vec![
                    named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc"),
                    named_check(CHECK_TWO_ID, ORG_ONE_ID, "xyz"),
                ],
                ..Default::default()
            },
            filter: CheckFilter {
                org_id: Some(ORG_ONE_ID),
                ..Default::default()
            },
            want: Ok(named_check(CHECK_ONE_ID, ORG_ONE_ID, "abc")),
        },
        Case {
            name: "missing check returns error",
            fields: CheckFields {
                organizations: vec![org(ORG_ONE_ID, "theorg")],
                checks: vec![],
                ..Default::default()
            },
            filter: CheckFilter {
                name: Some("xyz".into()),
                org_id: Some(ORG_ONE_ID),
                ..Default::default()
            },
            want: Err(Error::not_found("check \"xyz\" not found").with_op(OP_FIND_CHECK)),
        },
    ];

    for case in cases {
        let service = init(case.fields).await;
        let got = service.find_check(case.filter).await;
        assert_eq!(got, case.want, "{}: result differs", case.name);
    }
}

/// Partial update: rename, rename conflict, field updates, combinations.
pub async fn update_check<S, F, Fut>(init: &F)
where
    S: CheckService,
    F: Fn(CheckFields) -> Fut,
    Fut: Future<Output = S>,
{
    struct Case {
        name: &'static str,
        fields: CheckFields,
        id: Id,
        upd: CheckUpdate,
        want: Result<Check>,
    }

    let fixture = || CheckFields {
        time_source: Arc::new(FixedClock(fixture_time())),
        organizations: vec![org(ORG_ONE_ID, "theorg")],
        checks: vec![
            named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1"),
            named_check(CHECK_TWO_ID, ORG_ONE_ID, "check2"),
        ],
        ..Default::default()
    };

    // Fixtures carry zero timestamps, so only updated_at moves.
    let touched = |mut check: Check| {
        check.crud_log.updated_at = fixture_time();
        check
    };

    let cases = vec![
        Case {
            name: "update name",
            fields: fixture(),
            id: CHECK_ONE_ID,
            upd: CheckUpdate {
                name: Some("changed".into()),
                ..Default::default()
            },
            want: Ok(touched(named_check(CHECK_ONE_ID, ORG_ONE_ID, "changed"))),
        },
        Case {
            name: "update name unique",
            fields: fixture(),
            id: CHECK_ONE_ID,
            upd: CheckUpdate {
                name: Some("check2".into()),
                ..Default::default()
            },
            want: Err(Error::conflict("check name is not unique").with_op(OP_UPDATE_CHECK)),
        },
        Case {
            name: "update description",
            fields: fixture(),
            id: CHECK_ONE_ID,
            upd: CheckUpdate {
                description: Some("desc1".into()),
                ..Default::default()
            },
            want: Ok(touched(Check {
                description: "desc1".into(),
                ..named_check(CHECK_ONE_ID, ORG_ONE_ID, "check1")
            })),
        },
        Case {
            name: "update query and name",
            fields: fixture(),
            id: CHECK_TWO_ID,
            upd: CheckUpdate {
                name: Some("changed".into()),
                query: Some("from(bucket: \"system\")".into()),
                ..Default::default()
            },
            want: Ok(touched(Check {
                query: "from(bucket: \"system\")".into(),
                ..named_check(CHECK_TWO_ID, ORG_ONE_ID, "changed")
            })),
        },
        Case {
            name: "update query and same name",
            fields: fixture(),
            id: CHECK_TWO_ID,
            upd: CheckUpdate {
                name: Some("check2".into()),
                query: Some("from(bucket: \"system\")".into()),
                ..Default::default()
            },
            want: Ok(touched(Check {
                query: "from(bucket: \"system\")".into(),
                ..named_check(CHECK_TWO_ID, ORG_ONE_ID, "check2")
            })),
        },
        Case {
            name: "update check that does not exist",
            fields: fixture(),
            id: CHECK_THREE_ID,
            upd: CheckUpdate {
                description: Some("desc".into()),
                ..Default::default()
            },
            want: Err(Error::not_found("check not found").with_op(OP_UPDATE_CHECK)),
        },
    ];

    for case in cases {
        let service = init(case.fields).await;
        let got = service.update_check(case.id, case.upd).await;
        assert_eq!(got, case.want, "{}: result differs", case.name);

        // A failed update must not have created anything.
        if case.want.is_err() {
            let checks = all_checks(case.name, &service).await;
            assert_eq!(checks.len(), 2, "{}: stored state changed", case.name);
        }
    }
}

/// Deletion: hit with post-state verification, and idempotent-in-effect miss.
pub async fn delete_check<S, F, Fut>(init: &F)
where
    S: CheckService,
    F: Fn(CheckFields) -> Fut,
    Fut: Future<Output = S>,
{
    struct Case {
        name: &'static str,
        fields: CheckFields,
        id: Id,
        want_err: Option<Error>,
        want_checks: Vec<Check>,
    }

    let a_and_b = || CheckFields {
        organizations: vec![org(ORG_ONE_ID, "theorg")],
        checks: vec![
            named_check(CHECK_ONE_ID, ORG_ONE_ID, "A"),
            named_check(CHECK_THREE_ID, ORG_ONE_ID, "B"),
        ],
        ..Default::default()
    };

    let cases = vec![
        Case {
            name: "delete checks using exist id",
            fields: a_and_b(),
            id: CHECK_ONE_ID,
            want_err: None,
            want_checks: vec![named_check(CHECK_THREE_ID, ORG_ONE_ID, "B")],
        },
        Case {
            name: "delete checks using id that does not exist",
            fields: a_and_b(),
            id: Id::new(0x1234567890654321),
            want_err: Some(Error::not_found("check not found").with_op(OP_DELETE_CHECK)),
            want_checks: vec![
                named_check(CHECK_ONE_ID, ORG_ONE_ID, "A"),
                named_check(CHECK_THREE_ID, ORG_ONE_ID, "B"),
            ],
        },
    ];

    for case in cases {
        let service = init(case.fields).await;
        let got = service.delete_check(case.id).await;
        assert_error(case.name, &got, &case.want_err);
        assert_eq!(
            all_checks(case.name, &service).await,
            case.want_checks,
            "{}: stored checks differ",
            case.name
        );
    }
}
