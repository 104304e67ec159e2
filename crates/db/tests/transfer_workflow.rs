//! Integration tests for the transfer request workflow.
//!
//! Exercises the guarded transitions and the one-open-request-per-order
//! invariant directly against the repositories.

use darbast_core::transfer::statuses;
use darbast_db::models::order::CreateOrder;
use darbast_db::repositories::{OrderRepo, TransferRepo, UserRepo};
use sqlx::PgPool;

async fn seed_user(pool: &PgPool, phone: &str, name: &str) -> i64 {
    UserRepo::create(pool, phone, name).await.unwrap().id
}

async fn seed_order(pool: &PgPool, owner_id: i64, code: &str) -> i64 {
    let input = CreateOrder {
        province: "Tehran".into(),
        city: "Tehran".into(),
        address_line: "Valiasr St 12".into(),
        postal_code: None,
    };
    OrderRepo::create(pool, owner_id, code, &input).await.unwrap().id
}

#[sqlx::test(migrations = "./migrations")]
async fn create_with_known_recipient_enters_manager_gate(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();

    assert_eq!(request.status, statuses::PENDING_MANAGER);
    assert_eq!(request.to_user_id, Some(recipient));
}

#[sqlx::test(migrations = "./migrations")]
async fn create_with_unknown_recipient_parks_in_registration(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, None, "09129999999")
        .await
        .unwrap();

    assert_eq!(request.status, statuses::PENDING_REGISTRATION);
    assert_eq!(request.to_user_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn second_open_request_trips_unique_index(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();

    let second = TransferRepo::create(&pool, order, owner, None, "09128888888").await;
    let err = second.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.code().as_deref(), Some("23505"));
            assert_eq!(db_err.constraint(), Some("uq_transfer_requests_open"));
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn terminal_request_frees_the_order_for_a_new_one(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let manager = seed_user(&pool, "09120000003", "Manager").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();
    TransferRepo::manager_reject(&pool, request.id, manager, Some("insufficient funds"))
        .await
        .unwrap()
        .unwrap();

    // The partial index no longer sees an open row; a retry may be filed.
    let retry = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002").await;
    assert!(retry.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn manager_approve_moves_to_recipient_gate(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let manager = seed_user(&pool, "09120000003", "Manager").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();
    let approved = TransferRepo::manager_approve(&pool, request.id, manager)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(approved.status, statuses::PENDING_RECIPIENT);
    assert_eq!(approved.approved_by, Some(manager));
    assert!(approved.manager_responded_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn manager_approve_twice_affects_nothing(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let manager = seed_user(&pool, "09120000003", "Manager").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();
    TransferRepo::manager_approve(&pool, request.id, manager)
        .await
        .unwrap()
        .unwrap();

    // Second approval races against the first: guarded update matches
    // zero rows.
    let second = TransferRepo::manager_approve(&pool, request.id, manager)
        .await
        .unwrap();
    assert!(second.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn accept_moves_ownership_and_stamps_provenance(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let manager = seed_user(&pool, "09120000003", "Manager").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();
    TransferRepo::manager_approve(&pool, request.id, manager)
        .await
        .unwrap()
        .unwrap();

    let accepted = TransferRepo::accept(&pool, request.id, recipient)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accepted.status, statuses::ACCEPTED);

    let order_row = OrderRepo::find_by_id(&pool, order).await.unwrap().unwrap();
    assert_eq!(order_row.owner_id, recipient);
    assert_eq!(order_row.transferred_from_user_id, Some(owner));
}

#[sqlx::test(migrations = "./migrations")]
async fn accept_on_rejected_request_is_a_conflict(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let manager = seed_user(&pool, "09120000003", "Manager").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();
    TransferRepo::manager_reject(&pool, request.id, manager, Some("insufficient funds"))
        .await
        .unwrap()
        .unwrap();

    // Terminal state is permanent: acceptance matches zero rows and the
    // order is untouched.
    let accepted = TransferRepo::accept(&pool, request.id, recipient)
        .await
        .unwrap();
    assert!(accepted.is_none());

    let order_row = OrderRepo::find_by_id(&pool, order).await.unwrap().unwrap();
    assert_eq!(order_row.owner_id, owner);
}

#[sqlx::test(migrations = "./migrations")]
async fn only_the_named_recipient_may_accept(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let stranger = seed_user(&pool, "09120000004", "Stranger").await;
    let manager = seed_user(&pool, "09120000003", "Manager").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();
    TransferRepo::manager_approve(&pool, request.id, manager)
        .await
        .unwrap()
        .unwrap();

    let hijack = TransferRepo::accept(&pool, request.id, stranger).await.unwrap();
    assert!(hijack.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn registration_promotes_parked_requests(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    let request = TransferRepo::create(&pool, order, owner, None, "09125550000")
        .await
        .unwrap();
    assert_eq!(request.status, statuses::PENDING_REGISTRATION);

    let newcomer = seed_user(&pool, "09125550000", "Newcomer").await;
    let promoted = TransferRepo::attach_registered_user(&pool, "09125550000", newcomer)
        .await
        .unwrap();
    assert_eq!(promoted, 1);

    let refreshed = TransferRepo::find_by_id(&pool, request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status, statuses::PENDING_MANAGER);
    assert_eq!(refreshed.to_user_id, Some(newcomer));
}

#[sqlx::test(migrations = "./migrations")]
async fn open_request_lookup_sees_only_live_rows(pool: PgPool) {
    let owner = seed_user(&pool, "09120000001", "Owner").await;
    let recipient = seed_user(&pool, "09120000002", "Recipient").await;
    let manager = seed_user(&pool, "09120000003", "Manager").await;
    let order = seed_order(&pool, owner, "ORD-TEST0001").await;

    assert!(TransferRepo::find_open_for_order(&pool, order)
        .await
        .unwrap()
        .is_none());

    let request = TransferRepo::create(&pool, order, owner, Some(recipient), "09120000002")
        .await
        .unwrap();
    assert!(TransferRepo::find_open_for_order(&pool, order)
        .await
        .unwrap()
        .is_some());

    TransferRepo::manager_reject(&pool, request.id, manager, None)
        .await
        .unwrap()
        .unwrap();
    assert!(TransferRepo::find_open_for_order(&pool, order)
        .await
        .unwrap()
        .is_none());
}
