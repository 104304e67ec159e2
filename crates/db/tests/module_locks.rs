//! Integration tests for module locks, drafts, and version history.

use darbast_db::repositories::{
    ModuleDraftRepo, ModuleLockRepo, ModuleVersionRepo, UserRepo,
};
use serde_json::json;
use sqlx::PgPool;

async fn seed_user(pool: &PgPool, phone: &str, name: &str) -> i64 {
    UserRepo::create(pool, phone, name).await.unwrap().id
}

// ---------------------------------------------------------------------------
// Locks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn acquire_unlocked_scope(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;

    let lock = ModuleLockRepo::try_insert(&pool, "salary_sheet", None, alice)
        .await
        .unwrap();
    assert_eq!(lock.unwrap().holder_id, alice);

    let current = ModuleLockRepo::get(&pool, "salary_sheet", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.holder_id, alice);
}

#[sqlx::test(migrations = "./migrations")]
async fn insert_against_held_scope_yields_none(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    let bob = seed_user(&pool, "09120000002", "Bob").await;

    ModuleLockRepo::try_insert(&pool, "salary_sheet", None, alice)
        .await
        .unwrap()
        .unwrap();

    // The conflict path: caller must go through take_over instead.
    let denied = ModuleLockRepo::try_insert(&pool, "salary_sheet", None, bob)
        .await
        .unwrap();
    assert!(denied.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn date_scoped_locks_are_independent(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    let bob = seed_user(&pool, "09120000002", "Bob").await;
    let monday = "2026-08-03".parse().unwrap();
    let tuesday = "2026-08-04".parse().unwrap();

    ModuleLockRepo::try_insert(&pool, "crew_schedule", Some(monday), alice)
        .await
        .unwrap()
        .unwrap();

    // A different date is a different scope; no conflict.
    let other_day = ModuleLockRepo::try_insert(&pool, "crew_schedule", Some(tuesday), bob)
        .await
        .unwrap();
    assert!(other_day.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn take_over_reassigns_the_holder(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    let bob = seed_user(&pool, "09120000002", "Bob").await;

    ModuleLockRepo::try_insert(&pool, "salary_sheet", None, alice)
        .await
        .unwrap()
        .unwrap();

    let taken = ModuleLockRepo::take_over(&pool, "salary_sheet", None, alice, bob)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(taken.holder_id, bob);

    // Alice lost the lock; a takeover naming her as previous holder now
    // matches nothing.
    let stale = ModuleLockRepo::take_over(&pool, "salary_sheet", None, alice, bob)
        .await
        .unwrap();
    assert!(stale.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn release_is_holder_only_and_not_idempotent(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    let bob = seed_user(&pool, "09120000002", "Bob").await;

    ModuleLockRepo::try_insert(&pool, "salary_sheet", None, alice)
        .await
        .unwrap()
        .unwrap();

    // Not the holder.
    assert!(!ModuleLockRepo::release(&pool, "salary_sheet", None, bob)
        .await
        .unwrap());

    // The holder releases.
    assert!(ModuleLockRepo::release(&pool, "salary_sheet", None, alice)
        .await
        .unwrap());

    // Double release: the lock is already gone.
    assert!(!ModuleLockRepo::release(&pool, "salary_sheet", None, alice)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn draft_upsert_overwrites_in_place(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    let bob = seed_user(&pool, "09120000002", "Bob").await;

    let first = ModuleDraftRepo::upsert(&pool, "price_list", None, &json!({"rev": 1}), alice)
        .await
        .unwrap();
    let second = ModuleDraftRepo::upsert(&pool, "price_list", None, &json!({"rev": 2}), bob)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.payload, json!({"rev": 2}));
    assert_eq!(second.edited_by, bob);
}

#[sqlx::test(migrations = "./migrations")]
async fn draft_clear_removes_the_row(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;

    ModuleDraftRepo::upsert(&pool, "price_list", None, &json!({"rev": 1}), alice)
        .await
        .unwrap();
    assert!(ModuleDraftRepo::clear(&pool, "price_list", None).await.unwrap());
    assert!(ModuleDraftRepo::get(&pool, "price_list", None)
        .await
        .unwrap()
        .is_none());
    assert!(!ModuleDraftRepo::clear(&pool, "price_list", None).await.unwrap());
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn save_and_load_round_trip(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    let payload = json!({"rows": [{"name": "scaffold 2m", "price": 120}]});

    let saved = ModuleVersionRepo::save(&pool, "price_list", None, &payload, alice)
        .await
        .unwrap();
    assert_eq!(saved.version, 1);

    let loaded = ModuleVersionRepo::find(&pool, "price_list", None, saved.version)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.payload, payload);
}

#[sqlx::test(migrations = "./migrations")]
async fn versions_increase_monotonically_even_on_restore(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;

    let v1 = ModuleVersionRepo::save(&pool, "price_list", None, &json!({"rev": "a"}), alice)
        .await
        .unwrap();
    let v2 = ModuleVersionRepo::save(&pool, "price_list", None, &json!({"rev": "b"}), alice)
        .await
        .unwrap();
    assert_eq!((v1.version, v2.version), (1, 2));

    // "Restore" v1 by saving its payload again: a new, higher version.
    let old = ModuleVersionRepo::find(&pool, "price_list", None, 1)
        .await
        .unwrap()
        .unwrap();
    let restored = ModuleVersionRepo::save(&pool, "price_list", None, &old.payload, alice)
        .await
        .unwrap();
    assert_eq!(restored.version, 3);
    assert_eq!(restored.payload, json!({"rev": "a"}));

    // Forward history is intact.
    assert_eq!(
        ModuleVersionRepo::latest_version_number(&pool, "price_list", None)
            .await
            .unwrap(),
        3
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn version_scopes_are_independent(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    let monday = "2026-08-03".parse().unwrap();

    ModuleVersionRepo::save(&pool, "price_list", None, &json!({}), alice)
        .await
        .unwrap();
    let scoped = ModuleVersionRepo::save(&pool, "crew_schedule", Some(monday), &json!({}), alice)
        .await
        .unwrap();

    // Each scope has its own counter.
    assert_eq!(scoped.version, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn listing_is_newest_first_and_caller_limited(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;

    for i in 1..=4 {
        ModuleVersionRepo::save(&pool, "price_list", None, &json!({"rev": i}), alice)
            .await
            .unwrap();
    }

    let listed = ModuleVersionRepo::list(&pool, "price_list", None, 2).await.unwrap();
    let versions: Vec<i32> = listed.iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![4, 3]);
}

#[sqlx::test(migrations = "./migrations")]
async fn missing_version_is_none(pool: PgPool) {
    let alice = seed_user(&pool, "09120000001", "Alice").await;
    ModuleVersionRepo::save(&pool, "price_list", None, &json!({}), alice)
        .await
        .unwrap();

    assert!(ModuleVersionRepo::find(&pool, "price_list", None, 99)
        .await
        .unwrap()
        .is_none());
}
