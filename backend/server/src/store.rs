//! Queries behind the handlers. Everything here takes a connection generic over
//! [`ConnectionTrait`] so it runs the same on the pool or inside a transaction.
use chrono::Utc;
use entity::{
    favorite, follow, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, user,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    RelationTrait, TransactionTrait,
    sea_query::{Expr, Func, LikeExpr, SelectStatement},
};
use tracing::info;

use crate::{
    auth::{hash_password, verify_password},
    error::AppError,
    payloads::{
        IngredientAmount, PasswordChange, RecipeCreate, RecipeFilter, RecipeIngredientView,
        RecipeShort, RecipeUpdate, RecipeView, Subscription, UserCreate, UserView,
    },
    short_link::{generate_token, insert_with_short_link, is_unique_violation},
    utils::{
        LIKE_ESCAPE, LIMIT_NAME, LIMIT_PASSWORD, LIMIT_RECIPE_NAME, like_prefix,
        validate_cooking_time, validate_email, validate_recipe_lines, validate_required,
        validate_text, validate_username,
    },
};

/// Per-user recipe memberships sharing the same (user, recipe) shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    pub fn label(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping cart",
        }
    }

    /// Subquery selecting the ids of every recipe in the user's list.
    pub fn recipe_ids(self, user_id: i32) -> SelectStatement {
        match self {
            RecipeList::Favorites => favorite::Entity::find()
                .select_only()
                .column(favorite::Column::RecipeId)
                .filter(favorite::Column::UserId.eq(user_id))
                .into_query(),
            RecipeList::ShoppingCart => shopping_cart::Entity::find()
                .select_only()
                .column(shopping_cart::Column::RecipeId)
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .into_query(),
        }
    }

    pub async fn contains<C: ConnectionTrait>(
        self,
        db: &C,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool, DbErr> {
        let rows = match self {
            RecipeList::Favorites => {
                favorite::Entity::find_by_id((user_id, recipe_id))
                    .count(db)
                    .await?
            }
            RecipeList::ShoppingCart => {
                shopping_cart::Entity::find_by_id((user_id, recipe_id))
                    .count(db)
                    .await?
            }
        };

        Ok(rows > 0)
    }

    pub async fn add<C: ConnectionTrait>(
        self,
        db: &C,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), AppError> {
        let already_there =
            || AppError::malformed(format!("Recipe is already in {}", self.label()));

        if self.contains(db, user_id, recipe_id).await? {
            return Err(already_there());
        }

        let inserted = match self {
            RecipeList::Favorites => {
                favorite::Entity::insert(favorite::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .exec_without_returning(db)
                .await
            }
            RecipeList::ShoppingCart => {
                shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .exec_without_returning(db)
                .await
            }
        };

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(already_there()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn remove<C: ConnectionTrait>(
        self,
        db: &C,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), AppError> {
        let deleted = match self {
            RecipeList::Favorites => {
                favorite::Entity::delete_by_id((user_id, recipe_id))
                    .exec(db)
                    .await?
            }
            RecipeList::ShoppingCart => {
                shopping_cart::Entity::delete_by_id((user_id, recipe_id))
                    .exec(db)
                    .await?
            }
        };

        if deleted.rows_affected == 0 {
            return Err(AppError::malformed(format!(
                "Recipe is not in {}",
                self.label()
            )));
        }

        Ok(())
    }
}

pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn find_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn find_recipe_by_short_link<C: ConnectionTrait>(
    db: &C,
    token: &str,
) -> Result<recipe::Model, AppError> {
    recipe::Entity::find()
        .filter(recipe::Column::ShortLink.eq(token))
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

/// Case-insensitive prefix search. Both sides are lowercased so SQLite and Postgres agree.
pub async fn search_ingredients<C: ConnectionTrait>(
    db: &C,
    prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut select = ingredient::Entity::find();

    if let Some(prefix) = prefix.filter(|prefix| !prefix.is_empty()) {
        let name = Func::lower(Expr::col((ingredient::Entity, ingredient::Column::Name)));
        select = select
            .filter(Expr::expr(name).like(LikeExpr::new(like_prefix(prefix)).escape(LIKE_ESCAPE)));
    }

    select
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .all(db)
        .await
}

pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    payload: UserCreate,
) -> Result<user::Model, AppError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_text("first_name", &payload.first_name, LIMIT_NAME)?;
    validate_text("last_name", &payload.last_name, LIMIT_NAME)?;
    validate_text("password", &payload.password, LIMIT_PASSWORD)?;

    let duplicate = || AppError::malformed("A user with that email or username already exists");

    let taken = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(payload.email.as_str()))
                .add(user::Column::Username.eq(payload.username.as_str())),
        )
        .count(db)
        .await?;
    if taken > 0 {
        return Err(duplicate());
    }

    let user = user::ActiveModel {
        email: Set(payload.email),
        username: Set(payload.username),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        password: Set(hash_password(&payload.password)?),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            duplicate()
        } else {
            err.into()
        }
    })?;

    info!("User {} registered", user.id);

    Ok(user)
}

pub async fn change_password<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    payload: PasswordChange,
) -> Result<(), AppError> {
    if !verify_password(&payload.current_password, &user.password) {
        return Err(AppError::malformed("current_password is incorrect"));
    }
    validate_text("new_password", &payload.new_password, LIMIT_PASSWORD)?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(hash_password(&payload.new_password)?);
    active.update(db).await?;

    Ok(())
}

pub async fn is_following<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    let rows = follow::Entity::find_by_id((user_id, author_id))
        .count(db)
        .await?;

    Ok(rows > 0)
}

pub async fn user_view<C: ConnectionTrait>(
    db: &C,
    viewer: Option<&user::Model>,
    user: user::Model,
) -> Result<UserView, DbErr> {
    let is_subscribed = match viewer {
        Some(viewer) => is_following(db, viewer.id, user.id).await?,
        None => false,
    };

    Ok(UserView::new(user, is_subscribed))
}

pub async fn list_users<C: ConnectionTrait>(
    db: &C,
    viewer: Option<&user::Model>,
) -> Result<Vec<UserView>, DbErr> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;

    let mut views = Vec::with_capacity(users.len());
    for user in users {
        views.push(user_view(db, viewer, user).await?);
    }

    Ok(views)
}

pub async fn follow<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    author: &user::Model,
) -> Result<(), AppError> {
    if user.id == author.id {
        return Err(AppError::malformed("You cannot subscribe to yourself"));
    }

    if is_following(db, user.id, author.id).await? {
        return Err(already_subscribed());
    }

    insert_follow(db, user.id, author.id).await
}

fn already_subscribed() -> AppError {
    AppError::malformed("Already subscribed to this author")
}

/// A concurrent subscribe that won the race surfaces as the same 400.
async fn insert_follow<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<(), AppError> {
    let inserted = follow::Entity::insert(follow::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
    })
    .exec_without_returning(db)
    .await;

    match inserted {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(already_subscribed()),
        Err(err) => Err(err.into()),
    }
}

pub async fn unfollow<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    author: &user::Model,
) -> Result<(), AppError> {
    let deleted = follow::Entity::delete_by_id((user.id, author.id))
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(AppError::malformed("Not subscribed to this author"));
    }

    Ok(())
}

/// Followed author with their newest recipes, `recipes_limit` caps the list.
pub async fn subscription<C: ConnectionTrait>(
    db: &C,
    author: user::Model,
    recipes_limit: Option<u64>,
) -> Result<Subscription, DbErr> {
    let mut recipes = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .order_by_desc(recipe::Column::Id);
    if let Some(limit) = recipes_limit {
        recipes = recipes.limit(limit);
    }
    let recipes = recipes.all(db).await?;

    let recipes_count = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .count(db)
        .await?;

    Ok(Subscription {
        author: UserView::new(author, true),
        recipes: recipes.into_iter().map(RecipeShort::from).collect(),
        recipes_count,
    })
}

pub async fn subscriptions<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    recipes_limit: Option<u64>,
) -> Result<Vec<Subscription>, DbErr> {
    let followed = follow::Entity::find()
        .select_only()
        .column(follow::Column::AuthorId)
        .filter(follow::Column::UserId.eq(user.id))
        .into_query();

    let authors = user::Entity::find()
        .filter(user::Column::Id.in_subquery(followed))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(authors.len());
    for author in authors {
        result.push(subscription(db, author, recipes_limit).await?);
    }

    Ok(result)
}

pub async fn recipe_view<C: ConnectionTrait>(
    db: &C,
    viewer: Option<&user::Model>,
    recipe: recipe::Model,
) -> Result<RecipeView, AppError> {
    let author = find_user(db, recipe.author_id).await?;

    let tag_ids = recipe_tag::Entity::find()
        .select_only()
        .column(recipe_tag::Column::TagId)
        .filter(recipe_tag::Column::RecipeId.eq(recipe.id))
        .into_query();
    let tags = tag::Entity::find()
        .filter(tag::Column::Id.in_subquery(tag_ids))
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await?;

    let ingredients = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
        .find_also_related(ingredient::Entity)
        .order_by_asc(recipe_ingredient::Column::IngredientId)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(line, ingredient)| {
            ingredient.map(|ingredient| RecipeIngredientView::new(ingredient, line.amount))
        })
        .collect();

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            RecipeList::Favorites
                .contains(db, viewer.id, recipe.id)
                .await?,
            RecipeList::ShoppingCart
                .contains(db, viewer.id, recipe.id)
                .await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author: user_view(db, viewer, author).await?,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Newest first. List flags only apply to authenticated viewers.
pub async fn filter_recipes<C: ConnectionTrait>(
    db: &C,
    viewer: Option<&user::Model>,
    filter: &RecipeFilter,
) -> Result<Vec<recipe::Model>, DbErr> {
    let mut query = recipe::Entity::find();

    if let Some(author) = filter.author {
        query = query.filter(recipe::Column::AuthorId.eq(author));
    }

    if !filter.tags.is_empty() {
        let tagged = recipe_tag::Entity::find()
            .select_only()
            .column(recipe_tag::Column::RecipeId)
            .join(JoinType::InnerJoin, recipe_tag::Relation::Tag.def())
            .filter(tag::Column::Slug.is_in(filter.tags.iter().map(String::as_str)))
            .into_query();
        query = query.filter(recipe::Column::Id.in_subquery(tagged));
    }

    if let Some(viewer) = viewer {
        for (list, flag) in [
            (RecipeList::Favorites, filter.is_favorited),
            (RecipeList::ShoppingCart, filter.is_in_shopping_cart),
        ] {
            query = match flag {
                Some(true) => {
                    query.filter(recipe::Column::Id.in_subquery(list.recipe_ids(viewer.id)))
                }
                Some(false) => {
                    query.filter(recipe::Column::Id.not_in_subquery(list.recipe_ids(viewer.id)))
                }
                None => query,
            };
        }
    }

    query.order_by_desc(recipe::Column::Id).all(db).await
}

fn validate_recipe(
    name: Option<&str>,
    text: Option<&str>,
    cooking_time: Option<i32>,
    ingredients: &[IngredientAmount],
    tags: &[i32],
) -> Result<(), AppError> {
    if let Some(name) = name {
        validate_text("name", name, LIMIT_RECIPE_NAME)?;
    }
    if let Some(text) = text {
        validate_required("text", text)?;
    }
    if let Some(cooking_time) = cooking_time {
        validate_cooking_time(cooking_time)?;
    }

    validate_recipe_lines(ingredients, tags)
}

async fn check_references<C: ConnectionTrait>(
    db: &C,
    ingredients: &[IngredientAmount],
    tags: &[i32],
) -> Result<(), AppError> {
    let found = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ingredients.iter().map(|line| line.id)))
        .count(db)
        .await?;
    if found != ingredients.len() as u64 {
        return Err(AppError::malformed("Unknown ingredient"));
    }

    let found = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tags.iter().copied()))
        .count(db)
        .await?;
    if found != tags.len() as u64 {
        return Err(AppError::malformed("Unknown tag"));
    }

    Ok(())
}

async fn write_lines<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredients: &[IngredientAmount],
    tags: &[i32],
) -> Result<(), DbErr> {
    recipe_ingredient::Entity::insert_many(ingredients.iter().map(|line| {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.id),
            amount: Set(line.amount),
        }
    }))
    .exec_without_returning(db)
    .await?;

    recipe_tag::Entity::insert_many(tags.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(db)
    .await?;

    Ok(())
}

/// Inserts the recipe, its short link and its lines in one transaction.
pub async fn create_recipe<C: TransactionTrait>(
    db: &C,
    author: &user::Model,
    payload: RecipeCreate,
    short_link_length: usize,
) -> Result<recipe::Model, AppError> {
    validate_recipe(
        Some(&payload.name),
        Some(&payload.text),
        Some(payload.cooking_time),
        &payload.ingredients,
        &payload.tags,
    )?;

    let txn = db.begin().await?;
    check_references(&txn, &payload.ingredients, &payload.tags).await?;

    let draft = recipe::ActiveModel {
        author_id: Set(author.id),
        name: Set(payload.name),
        text: Set(payload.text),
        cooking_time: Set(payload.cooking_time),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let recipe =
        insert_with_short_link(&txn, draft, || generate_token(short_link_length)).await?;

    write_lines(&txn, recipe.id, &payload.ingredients, &payload.tags).await?;
    txn.commit().await?;

    info!("Recipe {} created by user {}", recipe.id, author.id);

    Ok(recipe)
}

/// Applies the given fields and replaces every line. The short link is left as is.
pub async fn update_recipe<C: TransactionTrait>(
    db: &C,
    recipe: recipe::Model,
    payload: RecipeUpdate,
) -> Result<recipe::Model, AppError> {
    validate_recipe(
        payload.name.as_deref(),
        payload.text.as_deref(),
        payload.cooking_time,
        &payload.ingredients,
        &payload.tags,
    )?;

    let txn = db.begin().await?;
    check_references(&txn, &payload.ingredients, &payload.tags).await?;

    let recipe_id = recipe.id;
    let mut active: recipe::ActiveModel = recipe.clone().into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(text) = payload.text {
        active.text = Set(text);
    }
    if let Some(cooking_time) = payload.cooking_time {
        active.cooking_time = Set(cooking_time);
    }
    let recipe = if active.is_changed() {
        active.update(&txn).await?
    } else {
        recipe
    };

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    write_lines(&txn, recipe_id, &payload.ingredients, &payload.tags).await?;

    txn.commit().await?;

    Ok(recipe)
}

pub async fn delete_recipe<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<(), DbErr> {
    recipe::Entity::delete_by_id(recipe_id).exec(db).await?;

    info!("Recipe {recipe_id} deleted");

    Ok(())
}
