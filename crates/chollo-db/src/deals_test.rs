use chollo_core::Store;
use chrono::Duration;
use sqlx::PgPool;

use super::*;

async fn seed_store(pool: &PgPool, domain: &str) {
    crate::stores::upsert_store(
        pool,
        &Store {
            id: domain.to_string(),
            name: "Test Store".to_string(),
            icon: "🏪".to_string(),
            domain: domain.to_string(),
            color: "#3B82F6".to_string(),
        },
    )
    .await
    .expect("seed store");
}

fn sample_deal(title: &str) -> NewDeal {
    NewDeal {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "Gran oferta".to_string(),
        previous_price: Some(Decimal::from(1000)),
        current_price: Decimal::from(750),
        discount_percentage: Some(25),
        category: "electrónicos".to_string(),
        purchase_link: "https://example.com/p/1".to_string(),
        image_url: None,
        created_by: "u1".to_string(),
        created_by_name: "Usuario".to_string(),
        store_id: "example.com".to_string(),
        search_keywords: vec!["oferta".to_string(), "celular".to_string()],
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_and_get_round_trip(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    let new = sample_deal("Celular Samsung");
    let created = create_deal(&pool, &new).await.expect("create");
    assert_eq!(created.store_name, "Test Store");
    assert_eq!(created.upvotes, 0);
    assert_eq!(created.views, 0);

    let fetched = get_deal(&pool, new.id).await.expect("get").expect("row");
    assert_eq!(fetched.title, "Celular Samsung");
    assert_eq!(fetched.discount_percentage, Some(25));
    assert_eq!(fetched.search_keywords, new.search_keywords);

    let deal = fetched.into_deal();
    assert_eq!(deal.store.id, "example.com");
    assert_eq!(deal.current_price, Decimal::from(750));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_missing_deal_is_none(pool: PgPool) {
    assert!(get_deal(&pool, Uuid::new_v4()).await.expect("get").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_filters_by_category_and_owner(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    let mut a = sample_deal("Celular");
    a.category = "electrónicos".to_string();
    let mut b = sample_deal("Zapatos");
    b.category = "moda".to_string();
    b.created_by = "u2".to_string();
    create_deal(&pool, &a).await.expect("create a");
    create_deal(&pool, &b).await.expect("create b");

    let electronics = list_deals(
        &pool,
        DealListFilters {
            category: Some("electrónicos"),
            limit: 20,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("list");
    assert_eq!(electronics.len(), 1);
    assert_eq!(electronics[0].title, "Celular");

    let by_owner = list_deals(
        &pool,
        DealListFilters {
            created_by: Some("u2"),
            limit: 20,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("list");
    assert_eq!(by_owner.len(), 1);
    assert_eq!(by_owner[0].title, "Zapatos");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_matches_substrings_and_keywords(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    create_deal(&pool, &sample_deal("Notebook Lenovo")).await.expect("create");

    // substring over the title
    let by_title = list_deals(
        &pool,
        DealListFilters {
            search: Some("lenovo"),
            limit: 20,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("search");
    assert_eq!(by_title.len(), 1);

    // exact membership against the stored keyword array
    let by_keyword = list_deals(
        &pool,
        DealListFilters {
            search: Some("Celular"),
            limit: 20,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("search");
    assert_eq!(by_keyword.len(), 1);

    let miss = list_deals(
        &pool,
        DealListFilters {
            search: Some("heladera"),
            limit: 20,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("search");
    assert!(miss.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn recency_window_excludes_old_deals(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    let old = sample_deal("Viejo");
    create_deal(&pool, &old).await.expect("create");
    sqlx::query("UPDATE deals SET created_at = NOW() - INTERVAL '30 days' WHERE id = $1")
        .bind(old.id)
        .execute(&pool)
        .await
        .expect("backdate");
    create_deal(&pool, &sample_deal("Nuevo")).await.expect("create");

    let recent = list_deals(
        &pool,
        DealListFilters {
            created_since: Some(Utc::now() - Duration::days(21)),
            limit: 20,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("list");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "Nuevo");
}

#[sqlx::test(migrations = "../../migrations")]
async fn cursor_pages_without_overlap(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    for i in 0..5 {
        create_deal(&pool, &sample_deal(&format!("Deal {i}"))).await.expect("create");
    }

    let first_page = list_deals(
        &pool,
        DealListFilters {
            limit: 2,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("page 1");
    assert_eq!(first_page.len(), 2);

    let cursor = DealCursor::from_row(first_page.last().expect("row"));
    let second_page = list_deals(
        &pool,
        DealListFilters {
            limit: 2,
            cursor: Some(cursor),
            ..DealListFilters::default()
        },
    )
    .await
    .expect("page 2");
    assert_eq!(second_page.len(), 2);

    let first_ids: Vec<Uuid> = first_page.iter().map(|r| r.id).collect();
    assert!(second_page.iter().all(|r| !first_ids.contains(&r.id)));
    // still newest-first across the page boundary
    assert!(second_page[0].created_at <= first_page[1].created_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn views_sort_orders_by_view_count(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    let low = sample_deal("Low");
    let high = sample_deal("High");
    create_deal(&pool, &low).await.expect("create");
    create_deal(&pool, &high).await.expect("create");
    for _ in 0..3 {
        increment_views(&pool, high.id).await.expect("view");
    }
    increment_views(&pool, low.id).await.expect("view");

    let rows = list_deals(
        &pool,
        DealListFilters {
            sort: DealSort::Views,
            limit: 20,
            ..DealListFilters::default()
        },
    )
    .await
    .expect("list");
    assert_eq!(rows[0].title, "High");
    assert_eq!(rows[0].views, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_updates_and_clears_fields(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    let new = sample_deal("Original");
    create_deal(&pool, &new).await.expect("create");

    let patch = DealPatch {
        title: Some("Editado".to_string()),
        previous_price: Some(None),
        discount_percentage: Some(None),
        ..DealPatch::default()
    };
    let row = update_deal(&pool, new.id, &patch)
        .await
        .expect("update")
        .expect("row");
    assert_eq!(row.title, "Editado");
    assert_eq!(row.previous_price, None);
    assert_eq!(row.discount_percentage, None);
    // untouched fields survive
    assert_eq!(row.description, "Gran oferta");
    assert_eq!(row.current_price, Decimal::from(750));
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_of_missing_deal_is_none(pool: PgPool) {
    let patch = DealPatch {
        title: Some("Nope".to_string()),
        ..DealPatch::default()
    };
    assert!(update_deal(&pool, Uuid::new_v4(), &patch)
        .await
        .expect("update")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_removes_deal(pool: PgPool) {
    seed_store(&pool, "example.com").await;
    let new = sample_deal("Borrar");
    create_deal(&pool, &new).await.expect("create");

    assert!(delete_deal(&pool, new.id).await.expect("delete"));
    assert!(!delete_deal(&pool, new.id).await.expect("delete again"));
    assert!(get_deal(&pool, new.id).await.expect("get").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn view_increment_on_missing_deal_is_none(pool: PgPool) {
    assert!(increment_views(&pool, Uuid::new_v4())
        .await
        .expect("increment")
        .is_none());
}

#[test]
fn cursor_round_trips_through_encoding() {
    let cursor = DealCursor {
        created_at: DateTime::from_timestamp_micros(1_724_000_000_123_456).expect("ts"),
        id: Uuid::new_v4(),
    };
    assert_eq!(DealCursor::decode(&cursor.encode()), Some(cursor));
}

#[test]
fn malformed_cursor_is_rejected() {
    assert_eq!(DealCursor::decode(""), None);
    assert_eq!(DealCursor::decode("abc"), None);
    assert_eq!(DealCursor::decode("123"), None);
    assert_eq!(DealCursor::decode("notanumber_also-not-a-uuid"), None);
}
