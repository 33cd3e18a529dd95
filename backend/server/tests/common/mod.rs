#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Utc;
use entity::{auth_token, ingredient, tag, user};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;
use server::{app, auth::hash_password, config::Config, state::AppState};
use tower::ServiceExt;

pub const PUBLIC_URL: &str = "http://food.test";
pub const PASSWORD: &str = "correct-horse";

static PASSWORD_HASH: LazyLock<String> = LazyLock::new(|| hash_password(PASSWORD).unwrap());

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options).await.unwrap();
    entity::setup_schema(&db).await.unwrap();
    db
}

pub async fn spawn_app(short_link_length: usize) -> TestApp {
    let config = Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        public_url: PUBLIC_URL.to_string(),
        short_link_length,
    };
    let state = AppState::with_connection(config, memory_db().await);

    TestApp {
        router: app(state.clone()),
        state,
    }
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    /// Creates a user with a token named after them.
    pub async fn user(&self, username: &str) -> (user::Model, String) {
        let user = user::ActiveModel {
            email: Set(format!("{username}@food.test")),
            username: Set(username.to_string()),
            first_name: Set(username.to_string()),
            last_name: Set("Tester".to_string()),
            password: Set(PASSWORD_HASH.clone()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap();

        let key = format!("{username}-token");
        auth_token::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(user.id),
            created_at: Set(Utc::now()),
        }
        .insert(self.db())
        .await
        .unwrap();

        (user, key)
    }

    pub async fn ingredient(&self, name: &str, unit: &str) -> i32 {
        ingredient::ActiveModel {
            name: Set(name.to_string()),
            measurement_unit: Set(unit.to_string()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap()
        .id
    }

    pub async fn tag(&self, name: &str) -> i32 {
        tag::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(name.to_lowercase()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap()
        .id
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        send(self.router.clone(), method, uri, token, body).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        self.send(Method::POST, uri, token, body).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Posts a recipe and returns its id.
    pub async fn recipe(&self, token: &str, name: &str, lines: &[(i32, i32)], tags: &[i32]) -> i32 {
        let res = self
            .post("/api/recipes/", Some(token), Some(recipe_body(name, lines, tags)))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());

        res.json()["id"].as_i64().unwrap() as i32
    }
}

pub fn recipe_body(name: &str, lines: &[(i32, i32)], tags: &[i32]) -> Value {
    let ingredients: Vec<Value> = lines
        .iter()
        .map(|(id, amount)| serde_json::json!({ "id": id, "amount": amount }))
        .collect();

    serde_json::json!({
        "ingredients": ingredients,
        "tags": tags,
        "name": name,
        "text": "Mix everything.",
        "cooking_time": 20,
    })
}

pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Token {token}"));
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Response {
        status,
        headers,
        body,
    }
}
