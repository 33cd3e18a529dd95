//! # Fixture Loader
//!
//! Seeds the reference tables the recipe forms pick from.
//!
//! ## Sources
//! - Local path: read from disk
//! - `http://` or `https://` URL: fetched with a plain GET, non-2xx is an error
//!
//! Both must hold a JSON array:
//! - ingredients: `[{"name": "flour", "measurement_unit": "g"}, ...]`
//! - tags: `[{"name": "Breakfast", "slug": "breakfast"}, ...]`
//!
//! ## Rules
//! 1. Names and units are normalized, surrounding whitespace trimmed and inner runs collapsed.
//!
//! 2. Records with a blank field after normalizing are skipped, as are fields longer than the
//!    column allows (32 characters for tags, 128 for ingredients).
//!
//! 3. Records already in the database are skipped, so reloading the same file is a no-op.
//!    Ingredients match on (name, unit), tags on name or slug.
//!
//! 4. Inserts happen one by one, duplicates inside a single file are caught by rule 3.
use anyhow::{Context, Result};
use reqwest::Client;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use serde::de::DeserializeOwned;

pub mod models;
pub mod utils;

use entity::{ingredient, tag};
use models::{IngredientRecord, Kind, Summary, TagRecord};
use utils::{LIMIT_INGREDIENT, LIMIT_TAG, fits, is_remote, normalize, progress_bar};

pub async fn run(kind: Kind, source: &str, database_url: &str) -> Result<()> {
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("connecting to {database_url}"))?;
    entity::setup_schema(&db).await?;

    let body = read_source(source).await?;
    let summary = load(&db, kind, &body).await?;

    println!("Inserted {}: {}", kind.label(), summary.inserted);
    println!("Skipped {}: {}", kind.label(), summary.skipped);

    Ok(())
}

pub async fn read_source(source: &str) -> Result<String> {
    if is_remote(source) {
        let res = Client::new()
            .get(source)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("fetching {source}"))?;

        return Ok(res.text().await?);
    }

    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("reading {source}"))
}

pub async fn load(db: &DatabaseConnection, kind: Kind, body: &str) -> Result<Summary> {
    match kind {
        Kind::Ingredients => load_ingredients(db, parse(body)?).await,
        Kind::Tags => load_tags(db, parse(body)?).await,
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    serde_json::from_str(body).context("source is not a JSON array of records")
}

async fn load_ingredients(
    db: &DatabaseConnection,
    records: Vec<IngredientRecord>,
) -> Result<Summary> {
    let pb = progress_bar(records.len())?;
    let mut summary = Summary::default();

    for record in records {
        let name = normalize(&record.name);
        let unit = normalize(&record.measurement_unit);
        pb.set_message(name.clone());

        if !fits(&name, LIMIT_INGREDIENT) || !fits(&unit, LIMIT_INGREDIENT) {
            summary.skipped += 1;
            pb.inc(1);
            continue;
        }

        let existing = ingredient::Entity::find()
            .filter(ingredient::Column::Name.eq(&name))
            .filter(ingredient::Column::MeasurementUnit.eq(&unit))
            .count(db)
            .await?;

        if existing > 0 {
            summary.skipped += 1;
        } else {
            ingredient::ActiveModel {
                name: Set(name),
                measurement_unit: Set(unit),
                ..Default::default()
            }
            .insert(db)
            .await?;
            summary.inserted += 1;
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(summary)
}

async fn load_tags(db: &DatabaseConnection, records: Vec<TagRecord>) -> Result<Summary> {
    let pb = progress_bar(records.len())?;
    let mut summary = Summary::default();

    for record in records {
        let name = normalize(&record.name);
        let slug = normalize(&record.slug);
        pb.set_message(name.clone());

        if !fits(&name, LIMIT_TAG) || !fits(&slug, LIMIT_TAG) {
            summary.skipped += 1;
            pb.inc(1);
            continue;
        }

        let existing = tag::Entity::find()
            .filter(
                Condition::any()
                    .add(tag::Column::Name.eq(&name))
                    .add(tag::Column::Slug.eq(&slug)),
            )
            .count(db)
            .await?;

        if existing > 0 {
            summary.skipped += 1;
        } else {
            tag::ActiveModel {
                name: Set(name),
                slug: Set(slug),
                ..Default::default()
            }
            .insert(db)
            .await?;
            summary.inserted += 1;
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(summary)
}
