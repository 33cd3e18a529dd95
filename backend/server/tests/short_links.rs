mod common;

use std::collections::HashSet;

use axum::http::{Method, StatusCode, header};
use common::{PUBLIC_URL, recipe_body, send, spawn_app};
use entity::recipe;
use sea_orm::EntityTrait;

#[tokio::test]
async fn get_link_and_follow_redirect() {
    let app = spawn_app(6).await;
    let (_, token) = app.user("baker").await;
    let flour = app.ingredient("flour", "g").await;
    let tag = app.tag("Bread").await;
    let id = app.recipe(&token, "Loaf", &[(flour, 500)], &[tag]).await;

    let res = app.get(&format!("/api/recipes/{id}/get-link/"), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let link = res.json()["short-link"].as_str().unwrap().to_string();
    let short = link
        .strip_prefix(&format!("{PUBLIC_URL}/s/"))
        .unwrap()
        .to_string();
    assert_eq!(short.len(), 6);
    assert!(short.chars().all(|c| c.is_ascii_alphanumeric()));

    let res = app.get(&format!("/s/{short}"), None).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(
        res.headers[header::LOCATION],
        format!("{PUBLIC_URL}/recipes/{id}/").as_str()
    );
}

#[tokio::test]
async fn link_is_stable_across_calls_and_updates() {
    let app = spawn_app(6).await;
    let (_, token) = app.user("baker").await;
    let flour = app.ingredient("flour", "g").await;
    let tag = app.tag("Bread").await;
    let id = app.recipe(&token, "Loaf", &[(flour, 500)], &[tag]).await;

    let first = app.get(&format!("/api/recipes/{id}/get-link/"), None).await.json();

    let res = app
        .send(
            Method::PATCH,
            &format!("/api/recipes/{id}/"),
            Some(&token),
            Some(recipe_body("Big loaf", &[(flour, 800)], &[tag])),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let second = app.get(&format!("/api/recipes/{id}/get-link/"), None).await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let app = spawn_app(6).await;

    let res = app.get("/s/nope42", None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.json()["detail"].is_string());
}

#[tokio::test]
async fn link_for_missing_recipe_is_not_found() {
    let app = spawn_app(6).await;

    let res = app.get("/api/recipes/999/get-link/", None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_creations_never_share_a_link() {
    // Single-character tokens make collisions likely.
    let app = spawn_app(1).await;
    let (_, token) = app.user("baker").await;
    let flour = app.ingredient("flour", "g").await;
    let tag = app.tag("Bread").await;

    let mut handles = Vec::new();
    for n in 0..20 {
        let router = app.router.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            send(
                router,
                Method::POST,
                "/api/recipes/",
                Some(&token),
                Some(recipe_body(&format!("Loaf {n}"), &[(flour, 100)], &[tag])),
            )
            .await
        }));
    }

    for handle in handles {
        let res = handle.await.unwrap();
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
    }

    let recipes = recipe::Entity::find().all(app.db()).await.unwrap();
    assert_eq!(recipes.len(), 20);

    let links: HashSet<String> = recipes
        .into_iter()
        .map(|recipe| recipe.short_link.unwrap())
        .collect();
    assert_eq!(links.len(), 20);
}
