use svcreq_core::db::{open_db, open_db_in_memory, DbError};
use svcreq_core::{
    ActionAuth, InMemoryRequestRepository, Owner, RecordStore, RepoError, RequestFields,
    RequestRepository, ServiceRequest, SqliteRequestRepository, StoreError, UpsertOutcome,
};

fn owners_auth() -> ActionAuth {
    ActionAuth::signed_by(Owner(42)).with_signer(Owner(7))
}

fn run_submit_then_update_scenario<R: RequestRepository>(store: &mut RecordStore<R>) {
    let auth = owners_auth();

    let first = store
        .submit_or_update(&auth, Owner(42), RequestFields::new("T1", "D1", "t1"), 100)
        .unwrap();
    assert_eq!(first.outcome, UpsertOutcome::Inserted);
    assert_eq!(
        first.request,
        ServiceRequest {
            prim_key: 0,
            owner: Owner(42),
            title: "T1".to_string(),
            description: "D1".to_string(),
            time: "t1".to_string(),
            last_updated: 100,
        }
    );

    let second = store
        .submit_or_update(&auth, Owner(42), RequestFields::new("T2", "D2", "t2"), 150)
        .unwrap();
    assert_eq!(second.outcome, UpsertOutcome::Updated);
    assert_eq!(
        second.request,
        ServiceRequest {
            prim_key: 0,
            owner: Owner(42),
            title: "T2".to_string(),
            description: "D2".to_string(),
            time: "t2".to_string(),
            last_updated: 150,
        }
    );
    assert_eq!(store.len().unwrap(), 1);

    let third = store
        .submit_or_update(&auth, Owner(7), RequestFields::new("T3", "D3", "t3"), 200)
        .unwrap();
    assert_eq!(third.outcome, UpsertOutcome::Inserted);
    assert_eq!(third.request.prim_key, 1);
    assert_eq!(
        store.get_by_owner(Owner(42)).unwrap(),
        Some(second.request.clone())
    );
    assert_eq!(store.get(1).unwrap(), Some(third.request));
    assert_eq!(store.len().unwrap(), 2);

    let before = store.list().unwrap();
    let err = store
        .submit_or_update(&auth, Owner(99), RequestFields::new("x", "y", "z"), 300)
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized(Owner(99))));
    assert_eq!(store.list().unwrap(), before);
    assert!(store.is_new_user(Owner(99)).unwrap());
}

#[test]
fn memory_backend_submit_then_update_scenario() {
    let mut store = RecordStore::new(InMemoryRequestRepository::new());
    run_submit_then_update_scenario(&mut store);
    store.repository().check_index_consistency().unwrap();
}

#[test]
fn sqlite_backend_submit_then_update_scenario() {
    let conn = open_db_in_memory().unwrap();
    let mut store = RecordStore::new(SqliteRequestRepository::try_new(&conn).unwrap());
    run_submit_then_update_scenario(&mut store);
}

#[test]
fn is_new_user_flips_once_per_owner() {
    let mut store = RecordStore::new(InMemoryRequestRepository::new());
    let auth = owners_auth();

    assert!(store.is_new_user(Owner(42)).unwrap());
    store
        .submit_or_update(&auth, Owner(42), RequestFields::default(), 1)
        .unwrap();
    assert!(!store.is_new_user(Owner(42)).unwrap());
    store
        .submit_or_update(&auth, Owner(42), RequestFields::default(), 2)
        .unwrap();
    assert!(!store.is_new_user(Owner(42)).unwrap());
    assert!(store.is_new_user(Owner(7)).unwrap());
}

#[test]
fn sqlite_requests_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requests.db");
    let auth = owners_auth();

    {
        let conn = open_db(&path).unwrap();
        let mut store = RecordStore::new(SqliteRequestRepository::try_new(&conn).unwrap());
        store
            .submit_or_update(&auth, Owner(42), RequestFields::new("T1", "D1", "t1"), 100)
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let mut store = RecordStore::new(SqliteRequestRepository::try_new(&conn).unwrap());
    let updated = store
        .submit_or_update(&auth, Owner(42), RequestFields::new("T2", "D2", "t2"), 150)
        .unwrap();
    assert_eq!(updated.outcome, UpsertOutcome::Updated);
    assert_eq!(updated.request.prim_key, 0);

    let created = store
        .submit_or_update(&auth, Owner(7), RequestFields::default(), 160)
        .unwrap();
    assert_eq!(created.request.prim_key, 1);
}

#[test]
fn sqlite_stores_full_u64_owner_range() {
    let conn = open_db_in_memory().unwrap();
    let mut store = RecordStore::new(SqliteRequestRepository::try_new(&conn).unwrap());
    let auth = ActionAuth::signed_by(Owner(u64::MAX)).with_signer(Owner(0));

    store
        .submit_or_update(&auth, Owner(u64::MAX), RequestFields::default(), u64::MAX)
        .unwrap();
    store
        .submit_or_update(&auth, Owner(0), RequestFields::default(), 0)
        .unwrap();

    let loaded = store.get_by_owner(Owner(u64::MAX)).unwrap().unwrap();
    assert_eq!(loaded.owner, Owner(u64::MAX));
    assert_eq!(loaded.last_updated, u64::MAX);
    assert_eq!(store.get_by_owner(Owner(0)).unwrap().unwrap().prim_key, 1);
}

#[test]
fn sqlite_key_space_exhaustion_is_reported_without_partial_effect() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO service_requests VALUES (?1, 1, '', '', '', 0);",
        [i64::MAX],
    )
    .unwrap();
    let mut store = RecordStore::new(SqliteRequestRepository::try_new(&conn).unwrap());

    let err = store
        .submit_or_update(&ActionAuth::signed_by(Owner(2)), Owner(2), RequestFields::default(), 5)
        .unwrap_err();

    assert!(matches!(err, StoreError::StorageExhausted));
    assert_eq!(store.len().unwrap(), 1);
    assert!(store.is_new_user(Owner(2)).unwrap());
}

#[test]
fn sqlite_repository_refuses_unmigrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let err = SqliteRequestRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::Db(DbError::SchemaNotReady {
            found: 0,
            expected: 1
        })
    ));
}

#[test]
fn sqlite_full_database_reports_exhaustion_for_insert_and_update() {
    let conn = open_db_in_memory().unwrap();
    let auth = owners_auth();
    let mut store = RecordStore::new(SqliteRequestRepository::try_new(&conn).unwrap());
    let original = store
        .submit_or_update(&auth, Owner(42), RequestFields::new("T1", "D1", "t1"), 100)
        .unwrap()
        .request;

    let page_count: i64 = conn
        .query_row("PRAGMA page_count;", [], |row| row.get(0))
        .unwrap();
    conn.pragma_update(None, "max_page_count", page_count + 1)
        .unwrap();
    let oversized = "x".repeat(1024 * 1024);

    let insert_err = store
        .submit_or_update(
            &auth,
            Owner(7),
            RequestFields::new(oversized.clone(), "D", "t"),
            200,
        )
        .unwrap_err();
    assert!(matches!(insert_err, StoreError::StorageExhausted));

    let update_err = store
        .submit_or_update(
            &auth,
            Owner(42),
            RequestFields::new(oversized, "D2", "t2"),
            300,
        )
        .unwrap_err();
    assert!(matches!(update_err, StoreError::StorageExhausted));

    assert_eq!(store.len().unwrap(), 1);
    assert!(store.is_new_user(Owner(7)).unwrap());
    assert_eq!(store.get_by_owner(Owner(42)).unwrap(), Some(original));
    assert!(conn.is_autocommit());
}

#[test]
fn sqlite_failed_atomic_unit_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRequestRepository::try_new(&conn).unwrap();
    let row = ServiceRequest::new(0, Owner(1), RequestFields::default(), 1);

    let result: svcreq_core::RepoResult<()> = repo.atomically(|repo| {
        repo.insert(&row)?;
        repo.insert(&row)
    });

    assert!(result.is_err());
    assert_eq!(repo.len().unwrap(), 0);
    assert!(conn.is_autocommit());
}
