//! # Shopping list
//!
//! Flat-text report of everything needed to cook the recipes in a user's cart.
//!
//! Lines from every recipe in the cart are grouped by (ingredient name, unit) and their
//! amounts summed. The same name under two units stays two groups. Groups are ordered by
//! name, then unit.
//!
//! ```text
//! Shopping list:
//! eggs: 3, pcs
//! flour: 150, g
//! ```
use std::collections::BTreeMap;

use entity::{ingredient, recipe_ingredient};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait,
};

use crate::store::RecipeList;

pub const HEADER: &str = "Shopping list:";
pub const FILENAME: &str = "shopping-list.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub total_amount: i64,
    pub unit: String,
}

/// One `(name, unit, amount)` row per ingredient line of each recipe in the cart.
pub async fn ingredient_lines<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<(String, String, i32)>, DbErr> {
    recipe_ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .column(recipe_ingredient::Column::Amount)
        .join(
            JoinType::InnerJoin,
            recipe_ingredient::Relation::Ingredient.def(),
        )
        .filter(
            recipe_ingredient::Column::RecipeId
                .in_subquery(RecipeList::ShoppingCart.recipe_ids(user_id)),
        )
        .into_tuple()
        .all(db)
        .await
}

pub fn aggregate<I>(lines: I) -> Vec<ShoppingItem>
where
    I: IntoIterator<Item = (String, String, i32)>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for (name, unit, amount) in lines {
        *totals.entry((name, unit)).or_default() += i64::from(amount);
    }

    totals
        .into_iter()
        .map(|((name, unit), total_amount)| ShoppingItem {
            name,
            total_amount,
            unit,
        })
        .collect()
}

pub fn render(items: &[ShoppingItem]) -> String {
    let mut report = vec![HEADER.to_string()];

    report.extend(
        items
            .iter()
            .map(|item| format!("{}: {}, {}", item.name, item.total_amount, item.unit)),
    );

    report.join("\n")
}

pub async fn shopping_list<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<String, DbErr> {
    let lines = ingredient_lines(db, user_id).await?;

    Ok(render(&aggregate(lines)))
}
