//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per accepted connection.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::{system_clock, JwtKeys, SharedClock, TokenIssuer, TokenVerifier};
use crate::config::{Args, StoreKind};
use crate::db::MongoClient;
use crate::routes::{self, BoxBody, RESOURCES_PREFIX};
use crate::services::BookGateway;
use crate::store::{
    CredentialStore, MemoryBookStore, MemoryPrincipalStore, MongoBookStore, MongoPrincipalStore,
    RecordStore,
};
use crate::types::BookshelfError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Verifies secrets and mints tokens
    pub issuer: TokenIssuer,
    /// Bearer guard for protected routes
    pub verifier: TokenVerifier,
    /// Owner-scoped access to books
    pub books: BookGateway,
    /// Name of the active storage backend, reported by /health
    pub store_backend: &'static str,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        credentials: Arc<dyn CredentialStore>,
        records: Arc<dyn RecordStore>,
        keys: JwtKeys,
        clock: SharedClock,
        store_backend: &'static str,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(credentials, keys.clone(), Arc::clone(&clock)),
            verifier: TokenVerifier::new(keys, clock),
            books: BookGateway::new(records),
            store_backend,
            started_at: Instant::now(),
            args,
        }
    }

    /// State backed by the in-memory stores
    pub fn in_memory(args: Args) -> Result<Self, BookshelfError> {
        let keys = args.jwt_keys()?;
        Ok(Self::new(
            args,
            Arc::new(MemoryPrincipalStore::new()),
            Arc::new(MemoryBookStore::new()),
            keys,
            system_clock(),
            "memory",
        ))
    }

    /// State backed by MongoDB
    pub async fn with_mongo(args: Args, mongo: &MongoClient) -> Result<Self, BookshelfError> {
        let keys = args.jwt_keys()?;
        let credentials = MongoPrincipalStore::new(mongo).await?;
        let records = MongoBookStore::new(mongo).await?;
        Ok(Self::new(
            args,
            Arc::new(credentials),
            Arc::new(records),
            keys,
            system_clock(),
            "mongo",
        ))
    }

    /// Build state for the configured backend.
    ///
    /// In dev mode an unreachable MongoDB falls back to the in-memory stores.
    pub async fn from_args(args: Args) -> Result<Self, BookshelfError> {
        if args.store == StoreKind::Memory {
            return Self::in_memory(args);
        }

        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(mongo) => Self::with_mongo(args, &mongo).await,
            Err(e) if args.dev_mode => {
                warn!(error = %e, "MongoDB unavailable (dev mode, using in-memory store)");
                Self::in_memory(args)
            }
            Err(e) => Err(e),
        }
    }
}

/// Bind the configured address and serve until the process exits
pub async fn run(state: Arc<AppState>) -> Result<(), BookshelfError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Bookshelf listening on {} as node {}",
        listener.local_addr()?,
        state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use in production");
    }

    serve(listener, state).await;
    Ok(())
}

/// Bind and serve in a background task, returning the bound address
pub async fn spawn(state: Arc<AppState>) -> Result<SocketAddr, BookshelfError> {
    let listener = TcpListener::bind(state.args.listen).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(serve(listener, state));
    Ok(addr)
}

/// Accept loop
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => routes::cors_preflight(),

        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(&state),
        (_, "/health") | (_, "/healthz") => routes::response::method_not_allowed(),

        (_, p) if p == "/auth" || p.starts_with("/auth/") => {
            routes::handle_auth_request(req, Arc::clone(&state)).await
        }

        (_, p) if p == RESOURCES_PREFIX || p.starts_with("/resources/") => {
            routes::handle_books_request(req, Arc::clone(&state)).await
        }

        _ => routes::not_found_response(),
    };

    info!(
        peer = %addr,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "request"
    );

    Ok(response)
}
