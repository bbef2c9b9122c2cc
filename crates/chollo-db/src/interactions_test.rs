use chollo_core::Store;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::*;
use crate::deals::NewDeal;

async fn seed_deal(pool: &PgPool) -> Uuid {
    crate::stores::upsert_store(
        pool,
        &Store {
            id: "example.com".to_string(),
            name: "Test Store".to_string(),
            icon: "🏪".to_string(),
            domain: "example.com".to_string(),
            color: "#3B82F6".to_string(),
        },
    )
    .await
    .expect("seed store");

    let new = NewDeal {
        id: Uuid::new_v4(),
        title: "Oferta".to_string(),
        description: String::new(),
        previous_price: None,
        current_price: Decimal::from(100),
        discount_percentage: None,
        category: "otros".to_string(),
        purchase_link: "https://example.com/p/1".to_string(),
        image_url: None,
        created_by: "owner".to_string(),
        created_by_name: "Owner".to_string(),
        store_id: "example.com".to_string(),
        search_keywords: vec![],
    };
    crate::deals::create_deal(pool, &new).await.expect("seed deal");
    new.id
}

#[sqlx::test(migrations = "../../migrations")]
async fn vote_then_same_vote_retracts(pool: PgPool) {
    let deal_id = seed_deal(&pool).await;

    let first = cast_vote(&pool, "u1", deal_id, VoteDirection::Up)
        .await
        .expect("vote");
    assert_eq!(first.vote, Some(VoteDirection::Up));
    assert_eq!((first.upvotes, first.downvotes), (1, 0));

    let second = cast_vote(&pool, "u1", deal_id, VoteDirection::Up)
        .await
        .expect("vote");
    assert_eq!(second.vote, None);
    assert_eq!((second.upvotes, second.downvotes), (0, 0));

    // the record survives the retraction
    let row = get_interaction(&pool, "u1", deal_id)
        .await
        .expect("get")
        .expect("row");
    assert_eq!(row.vote_direction().expect("parse"), None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn vote_swap_moves_both_counters(pool: PgPool) {
    let deal_id = seed_deal(&pool).await;

    cast_vote(&pool, "u1", deal_id, VoteDirection::Up)
        .await
        .expect("vote up");
    let swapped = cast_vote(&pool, "u1", deal_id, VoteDirection::Down)
        .await
        .expect("vote down");
    assert_eq!(swapped.vote, Some(VoteDirection::Down));
    assert_eq!((swapped.upvotes, swapped.downvotes), (0, 1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn votes_from_different_users_accumulate(pool: PgPool) {
    let deal_id = seed_deal(&pool).await;

    cast_vote(&pool, "u1", deal_id, VoteDirection::Up)
        .await
        .expect("vote");
    let second = cast_vote(&pool, "u2", deal_id, VoteDirection::Up)
        .await
        .expect("vote");
    assert_eq!(second.upvotes, 2);

    // one interaction row per pair
    assert!(get_interaction(&pool, "u1", deal_id)
        .await
        .expect("get")
        .is_some());
    assert!(get_interaction(&pool, "u2", deal_id)
        .await
        .expect("get")
        .is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn vote_on_missing_deal_is_not_found(pool: PgPool) {
    let result = cast_vote(&pool, "u1", Uuid::new_v4(), VoteDirection::Up).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn report_is_idempotent(pool: PgPool) {
    let deal_id = seed_deal(&pool).await;

    let first = set_report(&pool, "u1", deal_id, true).await.expect("report");
    assert!(first.reported);
    assert_eq!(first.unavailable_reports, 1);

    // second report without an unreport in between changes nothing
    let second = set_report(&pool, "u1", deal_id, true).await.expect("report");
    assert_eq!(second.unavailable_reports, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unreport_reverses_the_counter(pool: PgPool) {
    let deal_id = seed_deal(&pool).await;

    set_report(&pool, "u1", deal_id, true).await.expect("report");
    let cleared = set_report(&pool, "u1", deal_id, false)
        .await
        .expect("unreport");
    assert!(!cleared.reported);
    assert_eq!(cleared.unavailable_reports, 0);

    let row = get_interaction(&pool, "u1", deal_id)
        .await
        .expect("get")
        .expect("row");
    assert!(!row.reported_unavailable);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unreport_without_report_is_noop(pool: PgPool) {
    let deal_id = seed_deal(&pool).await;

    let outcome = set_report(&pool, "u1", deal_id, false)
        .await
        .expect("unreport");
    assert!(!outcome.reported);
    assert_eq!(outcome.unavailable_reports, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn report_does_not_disturb_vote(pool: PgPool) {
    let deal_id = seed_deal(&pool).await;

    cast_vote(&pool, "u1", deal_id, VoteDirection::Up)
        .await
        .expect("vote");
    set_report(&pool, "u1", deal_id, true).await.expect("report");

    let row = get_interaction(&pool, "u1", deal_id)
        .await
        .expect("get")
        .expect("row");
    assert_eq!(row.vote_direction().expect("parse"), Some(VoteDirection::Up));
    assert!(row.reported_unavailable);
}

#[test]
fn transition_table_is_exhaustive_and_paired() {
    use VoteDirection::{Down, Up};

    // every transition's deltas sum to the change in active votes
    for prior in [None, Some(Up), Some(Down)] {
        for target in [Up, Down] {
            let (new, d_up, d_down) = super::vote_transition(prior, target);
            let before = i32::from(prior.is_some());
            let after = i32::from(new.is_some());
            assert_eq!(d_up + d_down, after - before, "{prior:?} -> {target:?}");
            assert!(d_up.abs() <= 1 && d_down.abs() <= 1);
        }
    }
}
