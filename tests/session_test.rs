//! Session holder driven against a live server

use std::sync::Arc;

use bookshelf::client::{
    AuthedClient, BookshelfClient, ClientError, FileKeyValueStore, GuardDecision, KeyValueStore,
    RouteGuard, SessionHolder, SessionState, LOGIN_PATH, TOKEN_KEY,
};
use bookshelf::config::Args;
use bookshelf::server;
use bookshelf::services::NewBook;
use bookshelf::AppState;

async fn start_server() -> BookshelfClient {
    let state = AppState::in_memory(Args::for_local_test()).unwrap();
    let addr = server::spawn(Arc::new(state)).await.unwrap();
    BookshelfClient::new(format!("http://{}", addr)).unwrap()
}

async fn sign_in(client: &AuthedClient) {
    client.register("Alice", "a@x.com", "secret1").await.unwrap();
}

fn authed(api: &BookshelfClient, storage: Arc<dyn KeyValueStore>) -> AuthedClient {
    AuthedClient::new(api.clone(), Arc::new(SessionHolder::rehydrate(storage)))
}

#[tokio::test]
async fn test_login_survives_restart() {
    let api = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let first = authed(&api, Arc::new(FileKeyValueStore::new(&path)));
    first.register("Alice", "a@x.com", "secret1").await.unwrap();
    first
        .create_book(&NewBook::new("Dune", "Herbert"))
        .await
        .unwrap();

    // A fresh process picks the token up without talking to the server
    let second = authed(&api, Arc::new(FileKeyValueStore::new(&path)));
    assert!(second.session().is_authenticated());

    let books = second.list_books().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Dune");
}

#[tokio::test]
async fn test_logout_clears_persisted_token() {
    let api = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileKeyValueStore::new(dir.path().join("session.json")));

    let client = authed(&api, storage.clone());
    sign_in(&client).await;
    assert!(storage.get(TOKEN_KEY).unwrap().is_some());

    let nav = client.logout();
    assert_eq!(nav.to, LOGIN_PATH);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert!(matches!(
        client.list_books().await,
        Err(ClientError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_rejected_token_clears_session() {
    let api = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileKeyValueStore::new(dir.path().join("session.json")));
    storage.set(TOKEN_KEY, "stale-or-forged-token").unwrap();

    let client = authed(&api, storage.clone());
    assert!(client.session().is_authenticated());

    let mut rx = client.session().subscribe();
    assert!(matches!(
        client.list_books().await,
        Err(ClientError::Unauthorized)
    ));

    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_not_found_keeps_session() {
    let api = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let client = authed(
        &api,
        Arc::new(FileKeyValueStore::new(dir.path().join("session.json"))),
    );
    sign_in(&client).await;

    assert!(matches!(
        client.get_book("000000000000000000000000").await,
        Err(ClientError::NotFound)
    ));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_failed_login_leaves_session_anonymous() {
    let api = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileKeyValueStore::new(dir.path().join("session.json")));
    let client = authed(&api, storage.clone());

    api.register("Alice", "a@x.com", "secret1").await.unwrap();
    assert!(matches!(
        client.login("a@x.com", "wrong").await,
        Err(ClientError::InvalidCredentials)
    ));
    assert!(!client.session().is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_guard_follows_session() {
    let api = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let client = authed(
        &api,
        Arc::new(FileKeyValueStore::new(dir.path().join("session.json"))),
    );
    let guard = RouteGuard::default();

    assert_eq!(
        guard.check(&client.session().state(), "/books"),
        GuardDecision::Redirect {
            to: LOGIN_PATH.into(),
            from: "/books".into(),
        }
    );

    sign_in(&client).await;
    assert_eq!(
        guard.check(&client.session().state(), "/books"),
        GuardDecision::Allow
    );

    client.logout();
    assert!(matches!(
        guard.check(&client.session().state(), "/books"),
        GuardDecision::Redirect { .. }
    ));
}
