//! Integration tests for MySqlStaticDataRepository.
//!
//! These run against a real MySQL database using testcontainers and need
//! Docker: `cargo test -p freestays-repository -- --ignored`.

mod common;

use chrono::Utc;
use freestays_core::{LanguageCode, PageRequest};
use freestays_domain::{
    Destination, Hotel, HotelFilter, ReferenceItem, ReferenceKind, Resort, Room, StaticDataKind,
};
use freestays_repository::{MySqlStaticDataRepository, StaticDataRepository};
use common::TestDatabase;

fn en() -> LanguageCode {
    LanguageCode::default()
}

fn destination(id: i64, name: &str) -> Destination {
    Destination {
        external_id: id,
        code: name[..3].to_uppercase(),
        name: name.to_string(),
        country: "Turkey".to_string(),
        country_code: "TR".to_string(),
        time_zone: Some("Europe/Istanbul".to_string()),
        language: en(),
        last_synced_at: Utc::now(),
    }
}

fn hotel(id: i64, name: &str, destination_id: i64, stars: f32) -> Hotel {
    Hotel {
        external_id: id,
        name: name.to_string(),
        address: Some("Meşrutiyet Cd. 52".to_string()),
        city: Some("Istanbul".to_string()),
        country: Some("Turkey".to_string()),
        country_code: Some("TR".to_string()),
        star_category: Some(stars),
        latitude: Some(41.0322),
        longitude: Some(28.9744),
        resort_id: Some(10),
        destination_id: Some(destination_id),
        feature_ids: vec![1, 5],
        theme_ids: vec![3],
        image_urls: vec!["https://img.example/1.jpg".to_string()],
        language: en(),
        last_synced_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_upsert_destinations_is_idempotent() {
    let db = TestDatabase::new().await;
    let repo = MySqlStaticDataRepository::new(db.pool());
    let rows = vec![destination(1, "Istanbul"), destination(2, "Antalya")];

    assert_eq!(repo.upsert_destinations(&rows).await.unwrap(), 2);
    assert_eq!(repo.upsert_destinations(&rows).await.unwrap(), 2);

    let all = repo.find_destinations(&en()).await.unwrap();
    let names: Vec<_> = all.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Antalya", "Istanbul"]);
    assert_eq!(repo.count(StaticDataKind::Destinations, &en()).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_upsert_replaces_existing_row() {
    let db = TestDatabase::new().await;
    let repo = MySqlStaticDataRepository::new(db.pool());

    repo.upsert_destinations(&[destination(1, "Istanbul")]).await.unwrap();
    let mut renamed = destination(1, "Istanbul");
    renamed.name = "İstanbul".to_string();
    renamed.time_zone = None;
    repo.upsert_destinations(&[renamed]).await.unwrap();

    let found = repo.find_destination(1, &en()).await.unwrap().unwrap();
    assert_eq!(found.name, "İstanbul");
    assert!(found.time_zone.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_repeated_key_in_one_batch_counts_once() {
    let db = TestDatabase::new().await;
    let repo = MySqlStaticDataRepository::new(db.pool());
    let mut renamed = destination(1, "Istanbul");
    renamed.name = "İstanbul".to_string();

    let written = repo
        .upsert_destinations(&[destination(1, "Istanbul"), destination(2, "Antalya"), renamed])
        .await
        .unwrap();

    assert_eq!(written, 2);
    let found = repo.find_destination(1, &en()).await.unwrap().unwrap();
    assert_eq!(found.name, "İstanbul");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_resorts_by_destination() {
    let db = TestDatabase::new().await;
    let repo = MySqlStaticDataRepository::new(db.pool());
    let resort = |id: i64, name: &str, destination_id: i64| Resort {
        external_id: id,
        name: name.to_string(),
        destination_id,
        country_name: "Turkey".to_string(),
        country_code: "TR".to_string(),
        language: en(),
        last_synced_at: Utc::now(),
    };

    repo.upsert_resorts(&[
        resort(10, "Sultanahmet", 1),
        resort(11, "Beyoglu", 1),
        resort(20, "Lara", 2),
    ])
    .await
    .unwrap();

    let in_istanbul = repo.find_resorts_by_destination(1, &en()).await.unwrap();
    let names: Vec<_> = in_istanbul.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Beyoglu", "Sultanahmet"]);

    let searched = repo.search_resorts("LAR", &en()).await.unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].external_id, 20);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_reference_items_are_kept_per_kind() {
    let db = TestDatabase::new().await;
    let repo = MySqlStaticDataRepository::new(db.pool());
    let item = |kind: ReferenceKind, id: &str, name: &str| ReferenceItem {
        kind,
        external_id: id.to_string(),
        name: name.to_string(),
        language: en(),
        last_synced_at: Utc::now(),
    };

    repo.upsert_reference_items(
        ReferenceKind::Meal,
        &[item(ReferenceKind::Meal, "1", "Breakfast"), item(ReferenceKind::Meal, "3", "Half board")],
    )
    .await
    .unwrap();
    repo.upsert_reference_items(ReferenceKind::Theme, &[item(ReferenceKind::Theme, "1", "Beach")])
        .await
        .unwrap();

    let meals = repo.find_reference_items(ReferenceKind::Meal, &en()).await.unwrap();
    assert_eq!(meals.len(), 2);
    let theme = repo
        .find_reference_item(ReferenceKind::Theme, "1", &en())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(theme.name, "Beach");
    assert_eq!(theme.kind, ReferenceKind::Theme);

    let boards = repo
        .search_reference_items(ReferenceKind::Meal, "board", &en())
        .await
        .unwrap();
    assert_eq!(boards.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_hotels_roundtrip_list_columns_and_filter() {
    let db = TestDatabase::new().await;
    let repo = MySqlStaticDataRepository::new(db.pool());

    repo.upsert_hotels(&[
        hotel(100, "Pera Palace", 1, 5.0),
        hotel(101, "Galata Inn", 1, 3.0),
        hotel(200, "Lara Resort", 2, 5.0),
    ])
    .await
    .unwrap();

    let pera = repo.find_hotel(100, &en()).await.unwrap().unwrap();
    assert_eq!(pera.feature_ids, vec![1, 5]);
    assert_eq!(pera.theme_ids, vec![3]);
    assert_eq!(pera.image_urls.len(), 1);

    let filter = HotelFilter::new(en()).with_destination(1).with_min_stars(4.0);
    let page = repo.find_hotels(&filter, PageRequest::first()).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].external_id, 100);

    let by_ids = repo.find_hotels_by_ids(&[200, 101, 999], &en()).await.unwrap();
    let names: Vec<_> = by_ids.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Galata Inn", "Lara Resort"]);

    let text = HotelFilter::new(en()).with_text("50%_off");
    assert!(repo.find_all_hotels(&text).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_rooms_by_hotel() {
    let db = TestDatabase::new().await;
    let repo = MySqlStaticDataRepository::new(db.pool());
    let room = |id: i64, hotel_id: i64, name: &str| Room {
        external_id: id,
        hotel_id,
        room_type_id: Some(2),
        name: name.to_string(),
        min_occupancy: 1,
        max_occupancy: 3,
        feature_ids: vec![],
        image_urls: vec![],
        language: en(),
        last_synced_at: Utc::now(),
    };

    repo.upsert_rooms(&[room(1, 100, "Suite"), room(2, 100, "Double"), room(3, 101, "Single")])
        .await
        .unwrap();

    let rooms = repo.find_rooms_by_hotel(100, &en()).await.unwrap();
    let names: Vec<_> = rooms.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Double", "Suite"]);
    assert!(repo.find_rooms_by_hotel(999, &en()).await.unwrap().is_empty());
}
