//! Integration tests for the collaborator invitation workflow.

use darbast_core::collaborator::statuses;
use darbast_db::models::order::CreateOrder;
use darbast_db::repositories::collaborator_repo::InviteOutcome;
use darbast_db::repositories::{CollaboratorRepo, OrderRepo, UserRepo};
use sqlx::PgPool;

async fn seed_user(pool: &PgPool, phone: &str, name: &str) -> i64 {
    UserRepo::create(pool, phone, name).await.unwrap().id
}

async fn seed_order(pool: &PgPool, owner_id: i64) -> i64 {
    let input = CreateOrder {
        province: "Tehran".into(),
        city: "Tehran".into(),
        address_line: "Valiasr St 12".into(),
        postal_code: None,
    };
    OrderRepo::create(pool, owner_id, "ORD-TEST0001", &input)
        .await
        .unwrap()
        .id
}

fn created(outcome: InviteOutcome) -> darbast_db::models::collaborator::Collaborator {
    match outcome {
        InviteOutcome::Created(row) => row,
        other => panic!("expected Created, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn invite_creates_pending_row(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let order = seed_order(&pool, owner).await;

    let row = created(
        CollaboratorRepo::invite(&pool, order, owner, None, "09123456789")
            .await
            .unwrap(),
    );

    assert_eq!(row.status, statuses::PENDING);
    assert_eq!(row.invitee_user_id, None);
    assert!(row.responded_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_phone_trips_unique_index(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let order = seed_order(&pool, owner).await;

    created(
        CollaboratorRepo::invite(&pool, order, owner, None, "09123456789")
            .await
            .unwrap(),
    );

    let second = CollaboratorRepo::invite(&pool, order, owner, None, "09123456789").await;
    match second.unwrap_err() {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.code().as_deref(), Some("23505"));
            assert_eq!(db_err.constraint(), Some("uq_order_collaborators_phone"));
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn rejected_row_frees_the_phone_for_a_fresh_invite(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let invitee = seed_user(&pool, "09123456789", "Invitee").await;
    let order = seed_order(&pool, owner).await;

    let row = created(
        CollaboratorRepo::invite(&pool, order, owner, Some(invitee), "09123456789")
            .await
            .unwrap(),
    );
    CollaboratorRepo::respond(&pool, row.id, invitee, false)
        .await
        .unwrap()
        .unwrap();

    // The partial index ignores rejected rows; a new invite is allowed
    // and creates a brand new row.
    let fresh = created(
        CollaboratorRepo::invite(&pool, order, owner, Some(invitee), "09123456789")
            .await
            .unwrap(),
    );
    assert_ne!(fresh.id, row.id);
    assert_eq!(fresh.status, statuses::PENDING);
}

#[sqlx::test(migrations = "./migrations")]
async fn sixth_invite_hits_the_roster_cap(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let order = seed_order(&pool, owner).await;

    for i in 0..5 {
        let phone = format!("0912000100{i}");
        created(
            CollaboratorRepo::invite(&pool, order, owner, None, &phone)
                .await
                .unwrap(),
        );
    }
    assert_eq!(CollaboratorRepo::count_active(&pool, order).await.unwrap(), 5);

    let sixth = CollaboratorRepo::invite(&pool, order, owner, None, "09120002000")
        .await
        .unwrap();
    assert!(matches!(sixth, InviteOutcome::RosterFull));

    // No row was created.
    assert_eq!(CollaboratorRepo::count_active(&pool, order).await.unwrap(), 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn invite_on_missing_order_reports_it(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;

    let outcome = CollaboratorRepo::invite(&pool, 9999, owner, None, "09123456789")
        .await
        .unwrap();
    assert!(matches!(outcome, InviteOutcome::OrderMissing));
}

#[sqlx::test(migrations = "./migrations")]
async fn accept_stamps_responded_at(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let invitee = seed_user(&pool, "09123456789", "Invitee").await;
    let order = seed_order(&pool, owner).await;

    let row = created(
        CollaboratorRepo::invite(&pool, order, owner, Some(invitee), "09123456789")
            .await
            .unwrap(),
    );
    let accepted = CollaboratorRepo::respond(&pool, row.id, invitee, true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(accepted.status, statuses::ACCEPTED);
    assert!(accepted.responded_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn responding_twice_is_a_conflict(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let invitee = seed_user(&pool, "09123456789", "Invitee").await;
    let order = seed_order(&pool, owner).await;

    let row = created(
        CollaboratorRepo::invite(&pool, order, owner, Some(invitee), "09123456789")
            .await
            .unwrap(),
    );
    CollaboratorRepo::respond(&pool, row.id, invitee, true)
        .await
        .unwrap()
        .unwrap();

    let again = CollaboratorRepo::respond(&pool, row.id, invitee, false)
        .await
        .unwrap();
    assert!(again.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn only_the_invitee_may_respond(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let invitee = seed_user(&pool, "09123456789", "Invitee").await;
    let stranger = seed_user(&pool, "09120000009", "Stranger").await;
    let order = seed_order(&pool, owner).await;

    let row = created(
        CollaboratorRepo::invite(&pool, order, owner, Some(invitee), "09123456789")
            .await
            .unwrap(),
    );

    let hijack = CollaboratorRepo::respond(&pool, row.id, stranger, true)
        .await
        .unwrap();
    assert!(hijack.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn remove_only_works_while_pending(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let invitee = seed_user(&pool, "09123456789", "Invitee").await;
    let order = seed_order(&pool, owner).await;

    let row = created(
        CollaboratorRepo::invite(&pool, order, owner, Some(invitee), "09123456789")
            .await
            .unwrap(),
    );
    CollaboratorRepo::respond(&pool, row.id, invitee, true)
        .await
        .unwrap()
        .unwrap();

    // Accepted collaborators are not removable through the inviter path.
    let removed = CollaboratorRepo::remove_pending(&pool, row.id, owner)
        .await
        .unwrap();
    assert!(!removed);

    // The explicit owner-gated revoke path does remove them.
    let revoked = CollaboratorRepo::revoke_accepted(&pool, row.id).await.unwrap();
    assert!(revoked);
}

#[sqlx::test(migrations = "./migrations")]
async fn listing_joins_display_names_newest_first(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let invitee = seed_user(&pool, "09123456789", "Maryam").await;
    let order = seed_order(&pool, owner).await;

    created(
        CollaboratorRepo::invite(&pool, order, owner, Some(invitee), "09123456789")
            .await
            .unwrap(),
    );
    created(
        CollaboratorRepo::invite(&pool, order, owner, None, "09120003000")
            .await
            .unwrap(),
    );

    let rows = CollaboratorRepo::list_for_order(&pool, order).await.unwrap();
    assert_eq!(rows.len(), 2);
    // Newest first; the phone-only invite has no display name yet.
    assert_eq!(rows[0].invitee_phone_number, "09120003000");
    assert_eq!(rows[0].invitee_display_name, None);
    assert_eq!(rows[1].invitee_display_name.as_deref(), Some("Maryam"));
}

#[sqlx::test(migrations = "./migrations")]
async fn registration_attaches_phone_only_rows(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let order = seed_order(&pool, owner).await;

    let row = created(
        CollaboratorRepo::invite(&pool, order, owner, None, "09125550000")
            .await
            .unwrap(),
    );

    let newcomer = seed_user(&pool, "09125550000", "Newcomer").await;
    let matched = CollaboratorRepo::attach_registered_user(&pool, "09125550000", newcomer)
        .await
        .unwrap();
    assert_eq!(matched, 1);

    let refreshed = CollaboratorRepo::find_by_id(&pool, row.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.invitee_user_id, Some(newcomer));
    // Still pending: registration matches the row, it does not answer it.
    assert_eq!(refreshed.status, statuses::PENDING);
}
