use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema, sea_query::Index};
use tracing::debug;

use crate::{
    auth_token, favorite, follow, ingredient, recipe, recipe_ingredient, recipe_tag,
    shopping_cart, tag, user,
};

pub const INGREDIENT_UNIQUE_INDEX: &str = "ingredients_name_unit_unique";

/// Creates every table that does not exist yet. Safe to run on each startup.
///
/// Order matters: referenced tables come before the tables holding their foreign keys.
pub async fn setup_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, auth_token::Entity).await?;
    create_table(db, &schema, follow::Entity).await?;
    create_table(db, &schema, tag::Entity).await?;
    create_table(db, &schema, ingredient::Entity).await?;
    create_table(db, &schema, recipe::Entity).await?;
    create_table(db, &schema, recipe_tag::Entity).await?;
    create_table(db, &schema, recipe_ingredient::Entity).await?;
    create_table(db, &schema, favorite::Entity).await?;
    create_table(db, &schema, shopping_cart::Entity).await?;

    let index = Index::create()
        .name(INGREDIENT_UNIQUE_INDEX)
        .table(ingredient::Entity)
        .col(ingredient::Column::Name)
        .col(ingredient::Column::MeasurementUnit)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(db.get_database_backend().build(&index)).await?;

    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();

    debug!("Ensuring table {}", entity.table_name());
    db.execute(db.get_database_backend().build(&statement))
        .await?;

    Ok(())
}
