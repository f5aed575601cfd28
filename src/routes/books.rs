//! Book endpoints under `/resources`
//!
//! Every request passes the bearer guard before any handler runs. The
//! verified principal is the only owner these handlers ever pass down.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::routes::response::{
    error_response, get_auth_header, json_response, message_response, method_not_allowed,
    not_found_response, parse_json_body, BoxBody,
};
use crate::server::AppState;
use crate::services::{BookChanges, NewBook};
use crate::types::RecordId;

pub const RESOURCES_PREFIX: &str = "/resources";

enum Target<'a> {
    Collection,
    Item(&'a str),
}

fn match_path(path: &str) -> Option<Target<'_>> {
    let rest = path.strip_prefix(RESOURCES_PREFIX)?;
    match rest.trim_end_matches('/') {
        "" => Some(Target::Collection),
        item => {
            let id = item.strip_prefix('/')?;
            (!id.is_empty() && !id.contains('/')).then_some(Target::Item(id))
        }
    }
}

/// Route a request under `/resources`
pub async fn handle_books_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let Some(target) = match_path(&path) else {
        return not_found_response();
    };

    let allowed = match target {
        Target::Collection => matches!(method, Method::GET | Method::POST),
        Target::Item(_) => matches!(method, Method::GET | Method::PUT | Method::DELETE),
    };
    if !allowed {
        return method_not_allowed();
    }

    let ctx = match state.verifier.authenticate(get_auth_header(&req)) {
        Ok(ctx) => ctx,
        Err(e) => return error_response(&e),
    };

    match target {
        Target::Collection if method == Method::GET => list_books(ctx, &state).await,
        Target::Collection => create_book(req, ctx, &state).await,
        Target::Item(raw_id) => {
            let id: RecordId = match raw_id.parse() {
                Ok(id) => id,
                Err(e) => return error_response(&e),
            };
            match method {
                Method::GET => get_book(ctx, id, &state).await,
                Method::PUT => update_book(req, ctx, id, &state).await,
                _ => delete_book(ctx, id, &state).await,
            }
        }
    }
}

async fn list_books(ctx: AuthContext, state: &AppState) -> Response<BoxBody> {
    match state.books.list(ctx.principal_id).await {
        Ok(books) => json_response(StatusCode::OK, &books),
        Err(e) => error_response(&e),
    }
}

async fn create_book(
    req: Request<Incoming>,
    ctx: AuthContext,
    state: &AppState,
) -> Response<BoxBody> {
    let payload: NewBook = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    match state.books.create(ctx.principal_id, payload).await {
        Ok(book) => json_response(StatusCode::CREATED, &book),
        Err(e) => error_response(&e),
    }
}

async fn get_book(ctx: AuthContext, id: RecordId, state: &AppState) -> Response<BoxBody> {
    match state.books.get(ctx.principal_id, id).await {
        Ok(book) => json_response(StatusCode::OK, &book),
        Err(e) => error_response(&e),
    }
}

async fn update_book(
    req: Request<Incoming>,
    ctx: AuthContext,
    id: RecordId,
    state: &AppState,
) -> Response<BoxBody> {
    let changes: BookChanges = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    match state.books.update(ctx.principal_id, id, changes).await {
        Ok(book) => json_response(StatusCode::OK, &book),
        Err(e) => error_response(&e),
    }
}

async fn delete_book(ctx: AuthContext, id: RecordId, state: &AppState) -> Response<BoxBody> {
    match state.books.delete(ctx.principal_id, id).await {
        Ok(()) => message_response(StatusCode::OK, "Book deleted"),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_path() {
        assert!(matches!(match_path("/resources"), Some(Target::Collection)));
        assert!(matches!(match_path("/resources/"), Some(Target::Collection)));
        assert!(matches!(match_path("/resources/abc"), Some(Target::Item("abc"))));
        assert!(matches!(match_path("/resources/abc/"), Some(Target::Item("abc"))));

        assert!(match_path("/resources/abc/def").is_none());
        assert!(match_path("/resourcesabc").is_none());
        assert!(match_path("/other").is_none());
    }
}
