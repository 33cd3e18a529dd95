use std::io::Write;

use entity::{ingredient, tag};
use loader::{
    load,
    models::{Kind, Summary},
    read_source,
};
use sea_orm::{Database, DatabaseConnection, EntityTrait, QueryOrder};
use tempfile::NamedTempFile;

async fn memory_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    entity::setup_schema(&db).await.unwrap();
    db
}

fn fixture(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

const INGREDIENTS: &str = r#"[
    {"name": "  wheat   flour ", "measurement_unit": "g"},
    {"name": "eggs", "measurement_unit": "pcs"},
    {"name": "eggs", "measurement_unit": "g"},
    {"name": "wheat flour", "measurement_unit": "g"},
    {"name": "   ", "measurement_unit": "g"}
]"#;

#[tokio::test]
async fn loads_ingredients_from_file() {
    let db = memory_db().await;
    let file = fixture(INGREDIENTS);

    let body = read_source(file.path().to_str().unwrap()).await.unwrap();
    let summary = load(&db, Kind::Ingredients, &body).await.unwrap();

    assert_eq!(
        summary,
        Summary {
            inserted: 3,
            skipped: 2
        }
    );

    let stored: Vec<(String, String)> = ingredient::Entity::find()
        .order_by_asc(ingredient::Column::Id)
        .all(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|i| (i.name, i.measurement_unit))
        .collect();

    assert_eq!(
        stored,
        vec![
            ("wheat flour".to_string(), "g".to_string()),
            ("eggs".to_string(), "pcs".to_string()),
            ("eggs".to_string(), "g".to_string()),
        ]
    );
}

#[tokio::test]
async fn reloading_is_a_no_op() {
    let db = memory_db().await;

    load(&db, Kind::Ingredients, INGREDIENTS).await.unwrap();
    let second = load(&db, Kind::Ingredients, INGREDIENTS).await.unwrap();

    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 5);
}

#[tokio::test]
async fn loads_tags_skipping_known_names_and_slugs() {
    let db = memory_db().await;
    let body = r#"[
        {"name": "Breakfast", "slug": "breakfast"},
        {"name": "Lunch", "slug": "lunch"},
        {"name": "Morning", "slug": "breakfast"},
        {"name": "Lunch", "slug": "midday"}
    ]"#;

    let summary = load(&db, Kind::Tags, body).await.unwrap();

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(tag::Entity::find().all(&db).await.unwrap().len(), 2);
}

#[tokio::test]
async fn skips_records_longer_than_columns() {
    let db = memory_db().await;
    let body = serde_json::json!([
        { "name": "x".repeat(33), "slug": "long" },
        { "name": "Long slug", "slug": "s".repeat(33) },
        { "name": "y".repeat(32), "slug": "edge" },
    ])
    .to_string();

    let summary = load(&db, Kind::Tags, &body).await.unwrap();
    assert_eq!(
        summary,
        Summary {
            inserted: 1,
            skipped: 2
        }
    );

    let body = serde_json::json!([
        { "name": "z".repeat(129), "measurement_unit": "g" },
        { "name": "rice", "measurement_unit": "u".repeat(129) },
        { "name": "rice", "measurement_unit": "g" },
    ])
    .to_string();

    let summary = load(&db, Kind::Ingredients, &body).await.unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(ingredient::Entity::find().all(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rejects_malformed_source() {
    let db = memory_db().await;

    assert!(load(&db, Kind::Tags, r#"{"name": "x"}"#).await.is_err());
}

#[tokio::test]
async fn missing_file_is_an_error() {
    assert!(read_source("/nonexistent/ingredients.json").await.is_err());
}
