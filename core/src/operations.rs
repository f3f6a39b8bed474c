//! Request builders and response parsers for every REST operation.
//!
//! # Design
//! `Operations` holds only a base URL. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`, neither doing I/O. Every parser declares
//! an explicit status table; a status missing from the table is an
//! `UnexpectedResponse`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AuthResponse, Cart, Comment, ListQuery, ListResponse, LoginRequest, Post, Product, Todo, User,
};

/// Operation identifiers, as used by middleware and the public-operation set.
pub mod ids {
    pub const LOGIN_USER: &str = "loginUser";
    pub const GET_ALL_USERS: &str = "getAllUsers";
    pub const GET_USER_BY_ID: &str = "getUserById";
    pub const CREATE_USER: &str = "createUser";
    pub const GET_ALL_POSTS: &str = "getAllPosts";
    pub const GET_POST_BY_ID: &str = "getPostById";
    pub const CREATE_POST: &str = "createPost";
    pub const GET_ALL_PRODUCTS: &str = "getAllProducts";
    pub const GET_PRODUCT_BY_ID: &str = "getProductById";
    pub const CREATE_PRODUCT: &str = "createProduct";
    pub const GET_ALL_TODOS: &str = "getAllTodos";
    pub const GET_TODO_BY_ID: &str = "getTodoById";
    pub const CREATE_TODO: &str = "createTodo";
    pub const GET_ALL_COMMENTS: &str = "getAllComments";
    pub const GET_COMMENT_BY_ID: &str = "getCommentById";
    pub const GET_ALL_CARTS: &str = "getAllCarts";
    pub const GET_CART_BY_ID: &str = "getCartById";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    NotFound,
}

type StatusTable = &'static [(u16, Outcome)];

const OK: StatusTable = &[(200, Outcome::Success)];
const OK_OR_NOT_FOUND: StatusTable = &[(200, Outcome::Success), (404, Outcome::NotFound)];
const CREATED: StatusTable = &[(201, Outcome::Success)];

/// Stateless builder/parser bound to one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operations {
    base_url: String,
}

impl Operations {
    pub fn new(base_url: &Url) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- auth ---

    pub fn build_login(&self, credentials: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.post_json("/auth/login", credentials)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_json(ids::LOGIN_USER, response, OK)
    }

    // --- users ---

    pub fn build_get_users(&self, query: ListQuery) -> HttpRequest {
        self.list("/users", query.limit, Some(query.skip))
    }

    pub fn parse_get_users(&self, response: HttpResponse) -> Result<ListResponse<User>, ApiError> {
        parse_json(ids::GET_ALL_USERS, response, OK)
    }

    pub fn build_get_user(&self, id: u64) -> HttpRequest {
        self.by_id("/users", id)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(ids::GET_USER_BY_ID, response, OK_OR_NOT_FOUND)
    }

    pub fn build_create_user(&self, user: &User) -> Result<HttpRequest, ApiError> {
        self.post_json("/users", user)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(ids::CREATE_USER, response, CREATED)
    }

    // --- posts ---

    pub fn build_get_posts(&self, query: ListQuery) -> HttpRequest {
        self.list("/posts", query.limit, Some(query.skip))
    }

    pub fn parse_get_posts(&self, response: HttpResponse) -> Result<ListResponse<Post>, ApiError> {
        parse_json(ids::GET_ALL_POSTS, response, OK)
    }

    pub fn build_get_post(&self, id: u64) -> HttpRequest {
        self.by_id("/posts", id)
    }

    pub fn parse_get_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        parse_json(ids::GET_POST_BY_ID, response, OK_OR_NOT_FOUND)
    }

    pub fn build_create_post(&self, post: &Post) -> Result<HttpRequest, ApiError> {
        self.post_json("/posts", post)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(ids::CREATE_POST, response, CREATED).map(drop)
    }

    // --- products ---

    pub fn build_get_products(&self, query: ListQuery) -> HttpRequest {
        self.list("/products", query.limit, Some(query.skip))
    }

    pub fn parse_get_products(
        &self,
        response: HttpResponse,
    ) -> Result<ListResponse<Product>, ApiError> {
        parse_json(ids::GET_ALL_PRODUCTS, response, OK)
    }

    pub fn build_get_product(&self, id: u64) -> HttpRequest {
        self.by_id("/products", id)
    }

    pub fn parse_get_product(&self, response: HttpResponse) -> Result<Product, ApiError> {
        parse_json(ids::GET_PRODUCT_BY_ID, response, OK_OR_NOT_FOUND)
    }

    pub fn build_create_product(&self, product: &Product) -> Result<HttpRequest, ApiError> {
        self.post_json("/products", product)
    }

    pub fn parse_create_product(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(ids::CREATE_PRODUCT, response, CREATED).map(drop)
    }

    // --- todos ---

    pub fn build_get_todos(&self, limit: u32) -> HttpRequest {
        self.list("/todos", limit, None)
    }

    pub fn parse_get_todos(&self, response: HttpResponse) -> Result<ListResponse<Todo>, ApiError> {
        parse_json(ids::GET_ALL_TODOS, response, OK)
    }

    pub fn build_get_todo(&self, id: u64) -> HttpRequest {
        self.by_id("/todos", id)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(ids::GET_TODO_BY_ID, response, OK_OR_NOT_FOUND)
    }

    pub fn build_create_todo(&self, todo: &Todo) -> Result<HttpRequest, ApiError> {
        self.post_json("/todos", todo)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(ids::CREATE_TODO, response, CREATED).map(drop)
    }

    // --- comments ---

    pub fn build_get_comments(&self, limit: u32) -> HttpRequest {
        self.list("/comments", limit, None)
    }

    pub fn parse_get_comments(
        &self,
        response: HttpResponse,
    ) -> Result<ListResponse<Comment>, ApiError> {
        parse_json(ids::GET_ALL_COMMENTS, response, OK)
    }

    pub fn build_get_comment(&self, id: u64) -> HttpRequest {
        self.by_id("/comments", id)
    }

    pub fn parse_get_comment(&self, response: HttpResponse) -> Result<Comment, ApiError> {
        parse_json(ids::GET_COMMENT_BY_ID, response, OK_OR_NOT_FOUND)
    }

    // --- carts ---

    pub fn build_get_carts(&self, limit: u32) -> HttpRequest {
        self.list("/carts", limit, None)
    }

    pub fn parse_get_carts(&self, response: HttpResponse) -> Result<ListResponse<Cart>, ApiError> {
        parse_json(ids::GET_ALL_CARTS, response, OK)
    }

    pub fn build_get_cart(&self, id: u64) -> HttpRequest {
        self.by_id("/carts", id)
    }

    pub fn parse_get_cart(&self, response: HttpResponse) -> Result<Cart, ApiError> {
        parse_json(ids::GET_CART_BY_ID, response, OK_OR_NOT_FOUND)
    }

    fn list(&self, path: &str, limit: u32, skip: Option<u32>) -> HttpRequest {
        let mut url = format!("{}{path}?limit={limit}", self.base_url);
        if let Some(skip) = skip {
            url.push_str(&format!("&skip={skip}"));
        }
        HttpRequest::new(HttpMethod::Get, url)
    }

    fn by_id(&self, path: &str, id: u64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}{path}/{id}", self.base_url))
    }

    fn post_json<T: Serialize>(&self, path: &str, payload: &T) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Post, format!("{}{path}", self.base_url)).with_json_body(body))
    }
}

/// Apply `table` to the response status, returning the response on success.
fn expect_status(
    operation: &'static str,
    response: HttpResponse,
    table: StatusTable,
) -> Result<HttpResponse, ApiError> {
    let outcome = table
        .iter()
        .find(|(status, _)| *status == response.status)
        .map(|(_, outcome)| *outcome);
    match outcome {
        Some(Outcome::Success) => Ok(response),
        Some(Outcome::NotFound) => Err(ApiError::NotFound { operation }),
        None => Err(ApiError::UnexpectedResponse {
            operation,
            status: response.status,
            body: response.body,
        }),
    }
}

fn parse_json<T: DeserializeOwned>(
    operation: &'static str,
    response: HttpResponse,
    table: StatusTable,
) -> Result<T, ApiError> {
    let response = expect_status(operation, response, table)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode {
        operation,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops() -> Operations {
        Operations::new(&Url::parse("http://localhost:8080").unwrap())
    }

    #[test]
    fn build_get_users_carries_pagination() {
        let req = ops().build_get_users(ListQuery::new(5, 10));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/users?limit=5&skip=10");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn limit_only_lists_omit_skip() {
        assert_eq!(ops().build_get_todos(3).url, "http://localhost:8080/todos?limit=3");
        assert_eq!(ops().build_get_comments(3).url, "http://localhost:8080/comments?limit=3");
        assert_eq!(ops().build_get_carts(3).url, "http://localhost:8080/carts?limit=3");
    }

    #[test]
    fn build_login_posts_json() {
        let req = ops()
            .build_login(&LoginRequest {
                username: "emilys".to_string(),
                password: "emilyspass".to_string(),
                expires_in_mins: Some(30),
            })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/auth/login");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["username"], "emilys");
        assert_eq!(body["expiresInMins"], 30);
    }

    #[test]
    fn base_url_path_is_kept() {
        let ops = Operations::new(&Url::parse("http://localhost:8080/api/").unwrap());
        assert_eq!(ops.build_get_user(7).url, "http://localhost:8080/api/users/7");
    }

    #[test]
    fn parse_get_user_not_found() {
        let err = ops()
            .parse_get_user(HttpResponse::new(404, r#"{"message":"not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { operation: "getUserById" }));
    }

    #[test]
    fn parse_login_rejects_bad_request() {
        let err = ops()
            .parse_login(HttpResponse::new(400, r#"{"message":"Invalid credentials"}"#))
            .unwrap_err();
        match err {
            ApiError::UnexpectedResponse { operation, status, body } => {
                assert_eq!(operation, "loginUser");
                assert_eq!(status, 400);
                assert!(body.contains("Invalid credentials"));
            }
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
    }

    #[test]
    fn list_404_is_unexpected_not_not_found() {
        let err = ops().parse_get_users(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { status: 404, .. }));
    }

    #[test]
    fn create_user_requires_201() {
        let err = ops()
            .parse_create_user(HttpResponse::new(200, r#"{"id":1}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { status: 200, .. }));

        let user = ops()
            .parse_create_user(HttpResponse::new(201, r#"{"id":101,"firstName":"Ada"}"#))
            .unwrap();
        assert_eq!(user.id, Some(101));
    }

    #[test]
    fn create_post_ignores_body() {
        assert!(ops().parse_create_post(HttpResponse::new(201, "")).is_ok());
        assert!(ops().parse_create_post(HttpResponse::new(404, "")).is_err());
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        let err = ops().parse_get_cart(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode { operation: "getCartById", .. }));
    }
}
