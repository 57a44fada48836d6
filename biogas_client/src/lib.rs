pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod interceptor;
pub mod refresh;
pub mod session;
pub mod token_store;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use errors::{ClientError, ClientResult, RefreshFailure};
pub use interceptor::{ApiRequest, RequestBody, Upload};
pub use refresh::{
    HttpTokenRefresher, RefreshCoordinator, RefreshOutcome, RefreshedTokens, TokenRefresher,
};
pub use session::{LoggingObserver, LoginTokens, Session, SessionContext, SessionObserver};
pub use token_store::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, StorageKey, TokenStore,
};
