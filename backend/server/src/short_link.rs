//! # Short links
//!
//! Every recipe gets a compact token on its first insert, served publicly as `/s/{token}`.
//!
//! ## Assignment
//!
//! 1. Draw a token of `short_link_length` characters from `[A-Za-z0-9]`.
//! 2. Query whether a recipe already owns it, draw again if so.
//! 3. Insert the recipe with the token inside a savepoint of the caller's transaction.
//! 4. If the unique constraint on `recipes.short_link` fires anyway, another request
//!    claimed the token between 2 and 3. Roll the savepoint back and start over.
//!
//! Both loops are bounded. Running out of attempts means the token space is close to
//! full and surfaces as [`AppError::ShortLinkExhausted`].
use entity::recipe;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{self, Set},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, SqlErr,
    TransactionTrait, sea_query::Expr,
};
use tracing::{debug, warn};

use crate::{error::AppError, utils::random_alphanumeric};

/// Exists-check rounds per insert attempt.
pub const TOKEN_ATTEMPTS: usize = 32;
/// Insert rounds lost to concurrent writers before giving up.
pub const INSERT_ATTEMPTS: usize = 8;

pub fn generate_token(length: usize) -> String {
    random_alphanumeric(length)
}

pub async fn is_taken<C: ConnectionTrait>(db: &C, token: &str) -> Result<bool, DbErr> {
    let owners = recipe::Entity::find()
        .filter(recipe::Column::ShortLink.eq(token))
        .count(db)
        .await?;

    Ok(owners > 0)
}

pub async fn unused_token<C, F>(db: &C, next_token: &mut F) -> Result<String, AppError>
where
    C: ConnectionTrait,
    F: FnMut() -> String,
{
    for _ in 0..TOKEN_ATTEMPTS {
        let token = next_token();

        if !is_taken(db, &token).await? {
            return Ok(token);
        }

        debug!("Short link {token} already taken, drawing again");
    }

    Err(AppError::ShortLinkExhausted)
}

/// Inserts `recipe` inside `txn`, assigning a short link if it has none.
///
/// `next_token` is the token source, normally `|| generate_token(length)`.
pub async fn insert_with_short_link<C, F>(
    txn: &C,
    recipe: recipe::ActiveModel,
    mut next_token: F,
) -> Result<recipe::Model, AppError>
where
    C: ConnectionTrait + TransactionTrait,
    F: FnMut() -> String,
{
    if matches!(
        recipe.short_link,
        ActiveValue::Set(Some(_)) | ActiveValue::Unchanged(Some(_))
    ) {
        return Ok(recipe.insert(txn).await?);
    }

    for attempt in 1..=INSERT_ATTEMPTS {
        let token = unused_token(txn, &mut next_token).await?;

        match try_insert(txn, recipe.clone(), &token).await {
            Ok(model) => return Ok(model),
            Err(err) if is_unique_violation(&err) => {
                warn!("Short link {token} claimed concurrently (attempt {attempt})");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::ShortLinkExhausted)
}

/// Single insert of `recipe` under `token` in its own savepoint.
///
/// On failure the savepoint is rolled back, so `txn` stays usable for the next attempt.
pub async fn try_insert<C>(
    txn: &C,
    mut recipe: recipe::ActiveModel,
    token: &str,
) -> Result<recipe::Model, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    recipe.short_link = Set(Some(token.to_owned()));

    let savepoint = txn.begin().await?;
    match recipe.insert(&savepoint).await {
        Ok(model) => {
            savepoint.commit().await?;
            Ok(model)
        }
        Err(err) => {
            savepoint.rollback().await?;
            Err(err)
        }
    }
}

/// Gives a stored recipe that predates short links its token.
///
/// The update only matches rows whose `short_link` is still NULL, so a token that
/// another request assigned first wins and is returned instead.
pub async fn ensure_short_link<C, F>(
    txn: &C,
    recipe: recipe::Model,
    mut next_token: F,
) -> Result<recipe::Model, AppError>
where
    C: ConnectionTrait + TransactionTrait,
    F: FnMut() -> String,
{
    if recipe.short_link.is_some() {
        return Ok(recipe);
    }

    for attempt in 1..=INSERT_ATTEMPTS {
        let token = unused_token(txn, &mut next_token).await?;

        let savepoint = txn.begin().await?;
        let updated = recipe::Entity::update_many()
            .col_expr(recipe::Column::ShortLink, Expr::value(token.clone()))
            .filter(recipe::Column::Id.eq(recipe.id))
            .filter(recipe::Column::ShortLink.is_null())
            .exec(&savepoint)
            .await;

        match updated {
            Ok(result) => {
                savepoint.commit().await?;

                if result.rows_affected == 0 {
                    return recipe::Entity::find_by_id(recipe.id)
                        .one(txn)
                        .await?
                        .ok_or(AppError::NotFound);
                }

                return Ok(recipe::Model {
                    short_link: Some(token),
                    ..recipe
                });
            }
            Err(err) if is_unique_violation(&err) => {
                savepoint.rollback().await?;
                warn!("Short link {token} claimed concurrently (attempt {attempt})");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::ShortLinkExhausted)
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use entity::{setup_schema, user};
    use sea_orm::{Database, DatabaseConnection};

    use super::*;

    async fn database() -> (DatabaseConnection, i32) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        setup_schema(&db).await.unwrap();

        let author = user::ActiveModel {
            email: Set("cook@example.com".to_owned()),
            username: Set("cook".to_owned()),
            first_name: Set("Ada".to_owned()),
            last_name: Set("Cook".to_owned()),
            password: Set(String::new()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        (db, author.id)
    }

    fn draft(author_id: i32) -> recipe::ActiveModel {
        recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set("Soup".to_owned()),
            text: Set("Boil".to_owned()),
            cooking_time: Set(30),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }

    fn tokens(list: &[&str]) -> impl FnMut() -> String {
        let mut list: Vec<String> = list.iter().rev().map(|t| t.to_string()).collect();
        move || list.pop().unwrap_or_else(|| "fallback".to_string())
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token(6);

        assert_eq!(token.len(), 6);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_assigns_token() {
        let (db, author) = database().await;

        let recipe = insert_with_short_link(&db, draft(author), tokens(&["abc123"]))
            .await
            .unwrap();

        assert_eq!(recipe.short_link.as_deref(), Some("abc123"));
        assert!(is_taken(&db, "abc123").await.unwrap());
    }

    #[tokio::test]
    async fn test_skips_taken_token() {
        let (db, author) = database().await;

        insert_with_short_link(&db, draft(author), tokens(&["AAAAAA"]))
            .await
            .unwrap();
        let second = insert_with_short_link(&db, draft(author), tokens(&["AAAAAA", "BBBBBB"]))
            .await
            .unwrap();

        assert_eq!(second.short_link.as_deref(), Some("BBBBBB"));
    }

    #[tokio::test]
    async fn test_exhaustion() {
        let (db, author) = database().await;

        insert_with_short_link(&db, draft(author), tokens(&["AAAAAA"]))
            .await
            .unwrap();
        let result = insert_with_short_link(&db, draft(author), || "AAAAAA".to_string()).await;

        assert!(matches!(result, Err(AppError::ShortLinkExhausted)));
    }

    #[tokio::test]
    async fn test_keeps_existing_token() {
        let (db, author) = database().await;

        let mut recipe = draft(author);
        recipe.short_link = Set(Some("keepme".to_owned()));

        let saved = insert_with_short_link(&db, recipe, || unreachable!())
            .await
            .unwrap();

        assert_eq!(saved.short_link.as_deref(), Some("keepme"));
    }

    #[tokio::test]
    async fn test_ensure_short_link() {
        let (db, author) = database().await;

        let legacy = draft(author).insert(&db).await.unwrap();
        assert_eq!(legacy.short_link, None);

        let linked = ensure_short_link(&db, legacy, tokens(&["legacy"]))
            .await
            .unwrap();
        assert_eq!(linked.short_link.as_deref(), Some("legacy"));

        let again = ensure_short_link(&db, linked, || unreachable!())
            .await
            .unwrap();
        assert_eq!(again.short_link.as_deref(), Some("legacy"));
    }

    #[tokio::test]
    async fn test_unique_violation_detected() {
        let (db, author) = database().await;

        let mut first = draft(author);
        first.short_link = Set(Some("dup".to_owned()));
        first.insert(&db).await.unwrap();

        let mut second = draft(author);
        second.short_link = Set(Some("dup".to_owned()));
        let err = second.insert(&db).await.unwrap_err();

        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_savepoint_survives_collision() {
        let (db, author) = database().await;

        let mut taken = draft(author);
        taken.short_link = Set(Some("taken".to_owned()));
        taken.insert(&db).await.unwrap();

        let txn = db.begin().await.unwrap();

        let err = try_insert(&txn, draft(author), "taken").await.unwrap_err();
        assert!(is_unique_violation(&err));

        assert!(is_taken(&txn, "taken").await.unwrap());
        let fresh = try_insert(&txn, draft(author), "fresh").await.unwrap();
        assert_eq!(fresh.short_link.as_deref(), Some("fresh"));

        txn.commit().await.unwrap();

        let stored = recipe::Entity::find().count(&db).await.unwrap();
        assert_eq!(stored, 2);
        assert!(is_taken(&db, "fresh").await.unwrap());
    }
}
