//! In-process stand-in for the demo REST API.
//!
//! Payloads are generated from the requested ids; nothing is stored. Totals
//! are fixed per resource and any id outside `1..=total` is a 404.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const USERS_TOTAL: u64 = 100;
pub const POSTS_TOTAL: u64 = 150;
pub const PRODUCTS_TOTAL: u64 = 200;
pub const TODOS_TOTAL: u64 = 100;
pub const COMMENTS_TOTAL: u64 = 300;
pub const CARTS_TOTAL: u64 = 50;

/// Page size when the request has no `limit`.
pub const DEFAULT_PAGE: u64 = 30;

/// Id assigned to every created user.
pub const CREATED_USER_ID: u64 = 101;

pub const DEMO_USERNAME: &str = "emilys";
pub const DEMO_PASSWORD: &str = "emilyspass";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub expires_in_mins: Option<u32>,
}

pub fn app() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/posts", get(list_posts).post(accept_created))
        .route("/posts/{id}", get(get_post))
        .route("/products", get(list_products).post(accept_created))
        .route("/products/{id}", get(get_product))
        .route("/todos", get(list_todos).post(accept_created))
        .route("/todos/{id}", get(get_todo))
        .route("/comments", get(list_comments))
        .route("/comments/{id}", get(get_comment))
        .route("/carts", get(list_carts))
        .route("/carts/{id}", get(get_cart))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Ids `skip+1 ..= min(skip+limit, total)`.
fn page_ids(params: &ListParams, total: u64) -> (Vec<u64>, u64, u64) {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE);
    let skip = params.skip.unwrap_or(0);
    let end = skip.saturating_add(limit).min(total);
    ((skip.saturating_add(1)..=end).collect(), skip, limit)
}

fn page(key: &str, params: &ListParams, total: u64, item: fn(u64) -> Value) -> Json<Value> {
    let (ids, skip, limit) = page_ids(params, total);
    let items: Vec<Value> = ids.into_iter().map(item).collect();
    Json(json!({ key: items, "total": total, "skip": skip, "limit": limit }))
}

fn by_id(resource: &str, id: u64, total: u64, item: fn(u64) -> Value) -> Response {
    if id == 0 || id > total {
        let message = format!("{resource} with id '{id}' not found");
        return (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response();
    }
    Json(item(id)).into_response()
}

async fn login(Json(input): Json<LoginRequest>) -> Response {
    if input.username != DEMO_USERNAME || input.password != DEMO_PASSWORD {
        tracing::debug!(username = %input.username, "rejected login");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }
    tracing::debug!(expires_in_mins = ?input.expires_in_mins, "login accepted");
    Json(json!({
        "id": 1,
        "username": DEMO_USERNAME,
        "email": "emily.johnson@x.dummyjson.com",
        "firstName": "Emily",
        "lastName": "Johnson",
        "gender": "female",
        "image": "https://dummyjson.com/icon/emilys/128",
        "accessToken": format!("mock-access-token-{}", Uuid::new_v4()),
        "refreshToken": format!("mock-refresh-token-{}", Uuid::new_v4()),
    }))
    .into_response()
}

fn user(id: u64) -> Value {
    json!({
        "id": id,
        "firstName": format!("User{id}"),
        "lastName": "Test",
        "maidenName": "Smith",
        "age": 20 + id % 50,
        "gender": if id % 2 == 0 { "male" } else { "female" },
        "email": format!("user{id}@example.com"),
        "phone": "+1234567890",
        "username": format!("user{id}"),
        "birthDate": "1998-05-15",
        "image": format!("https://dummyjson.com/icon/user{id}/128"),
        "address": {
            "address": format!("{id} Main St"),
            "city": "Springfield",
            "state": "IL",
            "postalCode": "62701"
        }
    })
}

async fn list_users(Query(params): Query<ListParams>) -> Json<Value> {
    page("users", &params, USERS_TOTAL, user)
}

async fn get_user(Path(id): Path<u64>) -> Response {
    by_id("User", id, USERS_TOTAL, user)
}

/// Echo the submitted user with a newly assigned id.
async fn create_user(Json(input): Json<Value>) -> Response {
    let Value::Object(mut fields) = input else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "user must be a JSON object" })),
        )
            .into_response();
    };
    fields.insert("id".to_string(), json!(CREATED_USER_ID));
    (StatusCode::CREATED, Json(Value::Object(fields))).into_response()
}

async fn accept_created(Json(_input): Json<Value>) -> StatusCode {
    StatusCode::CREATED
}

fn post_item(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Post {id} Title"),
        "body": format!("This is the body content for post {id}."),
        "tags": ["tag1", "tag2"],
        "reactions": { "likes": id * 10, "dislikes": id },
        "views": id * 100,
        "userId": id % 10 + 1
    })
}

async fn list_posts(Query(params): Query<ListParams>) -> Json<Value> {
    page("posts", &params, POSTS_TOTAL, post_item)
}

async fn get_post(Path(id): Path<u64>) -> Response {
    by_id("Post", id, POSTS_TOTAL, post_item)
}

fn product(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "description": format!("This is a detailed description for product {id}"),
        "category": "Electronics",
        "price": (id * 100 + 99) as f64,
        "discountPercentage": 12.5,
        "rating": 4.7,
        "stock": 50 + id % 25,
        "brand": format!("Brand{}", id % 5 + 1),
        "thumbnail": format!("https://dummyjson.com/image/product/{id}/thumbnail.jpg"),
        "images": [
            format!("https://dummyjson.com/image/product/{id}/1.jpg"),
            format!("https://dummyjson.com/image/product/{id}/2.jpg")
        ]
    })
}

async fn list_products(Query(params): Query<ListParams>) -> Json<Value> {
    page("products", &params, PRODUCTS_TOTAL, product)
}

async fn get_product(Path(id): Path<u64>) -> Response {
    by_id("Product", id, PRODUCTS_TOTAL, product)
}

fn todo(id: u64) -> Value {
    json!({
        "id": id,
        "todo": format!("Todo task {id}"),
        "completed": id % 3 == 0,
        "userId": id % 10 + 1
    })
}

async fn list_todos(Query(params): Query<ListParams>) -> Json<Value> {
    page("todos", &params, TODOS_TOTAL, todo)
}

async fn get_todo(Path(id): Path<u64>) -> Response {
    by_id("Todo", id, TODOS_TOTAL, todo)
}

fn comment(id: u64) -> Value {
    json!({
        "id": id,
        "body": format!("This is comment {id} with some feedback."),
        "postId": id % 20 + 1,
        "likes": id * 3,
        "user": {
            "id": id % 10 + 1,
            "username": format!("user{id}"),
            "fullName": format!("User {id} Name")
        }
    })
}

async fn list_comments(Query(params): Query<ListParams>) -> Json<Value> {
    page("comments", &params, COMMENTS_TOTAL, comment)
}

async fn get_comment(Path(id): Path<u64>) -> Response {
    by_id("Comment", id, COMMENTS_TOTAL, comment)
}

fn cart(id: u64) -> Value {
    let products: Vec<Value> = (1..=3u64)
        .map(|index| {
            let price = (index * 100) as f64;
            let total = price * index as f64;
            json!({
                "id": id * 10 + index,
                "title": format!("Product {}", id * 10 + index),
                "price": price,
                "quantity": index,
                "total": total,
                "discountPercentage": 10.0,
                "discountedTotal": total * 0.9
            })
        })
        .collect();
    // 100*1 + 200*2 + 300*3
    let total = 1400.0;
    json!({
        "id": id,
        "products": products,
        "total": total,
        "discountedTotal": total * 0.9,
        "userId": id % 10 + 1,
        "totalProducts": 3,
        "totalQuantity": 6
    })
}

async fn list_carts(Query(params): Query<ListParams>) -> Json<Value> {
    page("carts", &params, CARTS_TOTAL, cart)
}

async fn get_cart(Path(id): Path<u64>) -> Response {
    by_id("Cart", id, CARTS_TOTAL, cart)
}
