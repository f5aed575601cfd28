//! HTTP client for the Bookshelf API

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::ClientError;
use super::session::{Navigation, SessionHolder};
use crate::auth::Principal;
use crate::routes::{AuthResponse, HealthResponse, LoginRequest, MessageResponse, RegisterRequest};
use crate::services::{Book, BookChanges, NewBook};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stateless client; every protected call takes the token explicitly
#[derive(Clone)]
pub struct BookshelfClient {
    base_url: String,
    http: reqwest::Client,
}

impl BookshelfClient {
    /// Create a client for the given base URL (e.g. "http://127.0.0.1:8080")
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(request.json(body)).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send(self.http.get(self.url("/health"))).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        secret: &str,
    ) -> Result<AuthResponse, ClientError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            secret: secret.to_string(),
        };
        self.send_json(self.http.post(self.url("/auth/register")), &body)
            .await
    }

    pub async fn login(&self, email: &str, secret: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            secret: secret.to_string(),
        };
        self.send_json(self.http.post(self.url("/auth/login")), &body)
            .await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: MessageResponse = self.send(self.http.post(self.url("/auth/logout"))).await?;
        Ok(())
    }

    pub async fn me(&self, token: &str) -> Result<Principal, ClientError> {
        self.send(self.http.get(self.url("/auth/me")).bearer_auth(token))
            .await
    }

    pub async fn list_books(&self, token: &str) -> Result<Vec<Book>, ClientError> {
        self.send(self.http.get(self.url("/resources")).bearer_auth(token))
            .await
    }

    pub async fn create_book(&self, token: &str, book: &NewBook) -> Result<Book, ClientError> {
        self.send_json(self.http.post(self.url("/resources")).bearer_auth(token), book)
            .await
    }

    pub async fn get_book(&self, token: &str, id: &str) -> Result<Book, ClientError> {
        let url = self.url(&format!("/resources/{}", id));
        self.send(self.http.get(url).bearer_auth(token)).await
    }

    pub async fn update_book(
        &self,
        token: &str,
        id: &str,
        changes: &BookChanges,
    ) -> Result<Book, ClientError> {
        let url = self.url(&format!("/resources/{}", id));
        self.send_json(self.http.put(url).bearer_auth(token), changes)
            .await
    }

    pub async fn delete_book(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/resources/{}", id));
        let _: MessageResponse = self.send(self.http.delete(url).bearer_auth(token)).await?;
        Ok(())
    }
}

/// Turn a non-success response into a typed error
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    debug!(status = status.as_u16(), "Request failed");
    Err(ClientError::from_status(status, &body))
}

/// Client bound to a session.
///
/// Attaches the session token to every protected call and drops the session
/// the moment the server rejects it.
pub struct AuthedClient {
    api: BookshelfClient,
    session: Arc<SessionHolder>,
}

impl AuthedClient {
    pub fn new(api: BookshelfClient, session: Arc<SessionHolder>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Arc<SessionHolder> {
        &self.session
    }

    pub fn api(&self) -> &BookshelfClient {
        &self.api
    }

    fn token(&self) -> Result<String, ClientError> {
        self.session.token().ok_or(ClientError::NotAuthenticated)
    }

    /// End the session if the server rejected `token` and it is still current
    fn check_session<T>(
        &self,
        token: &str,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if let Err(ClientError::Unauthorized) = &result {
            if self.session.expire(token) {
                warn!("Server rejected session token, logging out");
            }
        }
        result
    }

    /// Register and start a session for the new principal
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        secret: &str,
    ) -> Result<Principal, ClientError> {
        let auth = self.api.register(name, email, secret).await?;
        self.session.login(auth.token)?;
        Ok(auth.principal)
    }

    pub async fn login(&self, email: &str, secret: &str) -> Result<Principal, ClientError> {
        let auth = self.api.login(email, secret).await?;
        self.session.login(auth.token)?;
        Ok(auth.principal)
    }

    /// End the session locally. The token itself stays valid until it expires.
    pub fn logout(&self) -> Navigation {
        self.session.logout()
    }

    pub async fn me(&self) -> Result<Principal, ClientError> {
        let token = self.token()?;
        self.check_session(&token, self.api.me(&token).await)
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        let token = self.token()?;
        self.check_session(&token, self.api.list_books(&token).await)
    }

    pub async fn create_book(&self, book: &NewBook) -> Result<Book, ClientError> {
        let token = self.token()?;
        self.check_session(&token, self.api.create_book(&token, book).await)
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, ClientError> {
        let token = self.token()?;
        self.check_session(&token, self.api.get_book(&token, id).await)
    }

    pub async fn update_book(&self, id: &str, changes: &BookChanges) -> Result<Book, ClientError> {
        let token = self.token()?;
        self.check_session(&token, self.api.update_book(&token, id, changes).await)
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), ClientError> {
        let token = self.token()?;
        self.check_session(&token, self.api.delete_book(&token, id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryKeyValueStore;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = BookshelfClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/health"), "http://localhost:8080/health");
    }

    #[tokio::test]
    async fn test_protected_call_without_session() {
        let api = BookshelfClient::new("http://127.0.0.1:9").unwrap();
        let session = Arc::new(SessionHolder::rehydrate(Arc::new(MemoryKeyValueStore::new())));
        let client = AuthedClient::new(api, session);

        assert!(matches!(
            client.list_books().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let api = BookshelfClient::with_timeout("http://127.0.0.1:9", Duration::from_millis(500))
            .unwrap();
        let session = Arc::new(SessionHolder::rehydrate(Arc::new(MemoryKeyValueStore::new())));
        session.login("still-valid").unwrap();
        let client = AuthedClient::new(api, Arc::clone(&session));

        assert!(matches!(
            client.list_books().await,
            Err(ClientError::Unavailable(_))
        ));
        // Transport failures leave the session alone
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_rejection_of_replaced_token_keeps_new_session() {
        let api = BookshelfClient::new("http://127.0.0.1:9").unwrap();
        let session = Arc::new(SessionHolder::rehydrate(Arc::new(MemoryKeyValueStore::new())));
        session.login("old-token").unwrap();
        let client = AuthedClient::new(api, Arc::clone(&session));

        // A login lands while a request carrying the old token is in flight
        session.login("new-token").unwrap();
        let result: Result<(), _> =
            client.check_session("old-token", Err(ClientError::Unauthorized));

        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(session.token().as_deref(), Some("new-token"));

        let result: Result<(), _> =
            client.check_session("new-token", Err(ClientError::Unauthorized));
        assert!(result.is_err());
        assert!(!session.is_authenticated());
    }
}
