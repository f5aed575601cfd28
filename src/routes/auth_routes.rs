//! Authentication endpoints
//!
//! - POST /auth/register - create a principal and return a token
//! - POST /auth/login    - exchange email + secret for a token
//! - GET  /auth/me       - the principal behind the bearer token
//! - POST /auth/logout   - acknowledgement only; tokens are not revoked

use chrono::{DateTime, Utc};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{IdentityToken, Principal};
use crate::routes::response::{
    error_response, get_auth_header, json_response, message_response, method_not_allowed,
    not_found_response, parse_json_body, BoxBody,
};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "password")]
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "password")]
    pub secret: String,
}

/// Token plus the principal it identifies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub principal: Principal,
}

impl AuthResponse {
    fn new(token: IdentityToken, principal: Principal) -> Self {
        Self {
            token: token.token,
            expires_at: token.expires_at,
            principal,
        }
    }
}

/// Route a request under `/auth`
pub async fn handle_auth_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/auth/register") => handle_register(req, state).await,
        (Method::POST, "/auth/login") => handle_login(req, state).await,
        (Method::POST, "/auth/logout") => handle_logout(),
        (Method::GET, "/auth/me") => handle_me(req, state).await,

        (_, "/auth/register") | (_, "/auth/login") | (_, "/auth/logout") | (_, "/auth/me") => {
            method_not_allowed()
        }

        _ => not_found_response(),
    }
}

async fn handle_register(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let principal = match state
        .issuer
        .register(&body.name, &body.email, &body.secret)
        .await
    {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    match state.issuer.mint(principal.id) {
        Ok(token) => json_response(StatusCode::CREATED, &AuthResponse::new(token, principal)),
        Err(e) => error_response(&e),
    }
}

async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let principal = match state.issuer.authenticate(&body.email, &body.secret).await {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    match state.issuer.mint(principal.id) {
        Ok(token) => {
            info!(principal_id = %principal.id, "Login succeeded");
            json_response(StatusCode::OK, &AuthResponse::new(token, principal))
        }
        Err(e) => error_response(&e),
    }
}

async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let ctx = match state.verifier.authenticate(get_auth_header(&req)) {
        Ok(ctx) => ctx,
        Err(e) => return error_response(&e),
    };

    match state.issuer.whoami(ctx.principal_id).await {
        Ok(principal) => json_response(StatusCode::OK, &principal),
        Err(e) => error_response(&e),
    }
}

fn handle_logout() -> Response<BoxBody> {
    message_response(StatusCode::OK, "Logged out")
}
