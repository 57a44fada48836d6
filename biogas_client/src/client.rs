use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Method, Response, header};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    ClientError, ClientResult,
    config::ClientConfig,
    endpoints,
    errors::server_message,
    interceptor::{self, ApiRequest, Verdict},
    refresh::{HttpTokenRefresher, RefreshCoordinator},
    session::{LoggingObserver, SessionContext, SessionObserver},
};

/// HTTP client for the digester backend.
///
/// Every request goes through the interceptor chain: the stored access token
/// is attached, and a `401` on an authenticated request triggers one shared
/// token refresh followed by a single replay of the original request.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: SessionContext,
    refresh: Arc<RefreshCoordinator<HttpTokenRefresher>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionContext) -> ClientResult<Self> {
        let observer = Arc::new(LoggingObserver::new(config.login_entry_point.clone()));
        Self::with_observer(config, session, observer)
    }

    pub fn with_observer(
        config: &ClientConfig,
        session: SessionContext,
        observer: Arc<dyn SessionObserver>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let base = config.base()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let refresh_url = join_path(&base, endpoints::REFRESH)?;
        let refresher = HttpTokenRefresher::new(http.clone(), refresh_url);
        let refresh = Arc::new(RefreshCoordinator::new(
            refresher,
            session.clone(),
            observer,
        ));

        log::debug!("api client ready for {base}");
        Ok(Self {
            http,
            base,
            session,
            refresh,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator<HttpTokenRefresher> {
        &self.refresh
    }

    /// Resolves a request path: absolute URLs pass through, anything else is
    /// appended to the base URL.
    pub fn url_for(&self, path: &str) -> ClientResult<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        join_path(&self.base, path)
    }

    /// Sends `request` through the interceptor chain and returns the final
    /// response, whatever its status, unless the session could not be renewed.
    ///
    /// Absolute URLs on another origin than the backend are sent anonymously:
    /// they never see the bearer token and their `401` never triggers a refresh.
    pub async fn execute(&self, mut request: ApiRequest) -> ClientResult<Response> {
        if !request.anonymous && !self.is_backend(&self.url_for(&request.path)?) {
            log::debug!(
                "{} {} is outside {}; sending without credentials",
                request.method,
                request.path,
                self.base.origin().ascii_serialization()
            );
            request.anonymous = true;
        }
        let mut replay_token: Option<String> = None;

        loop {
            let token = match replay_token.take() {
                Some(token) => Some(token),
                None if request.anonymous => None,
                None => self.session.access_token()?,
            };

            let response = self.dispatch(&request, token.as_deref()).await?;
            match interceptor::inspect(&request, response.status()) {
                Verdict::Deliver => return Ok(response),
                Verdict::Exhausted => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    log::warn!(
                        "{} {} rejected again after refresh ({status})",
                        request.method,
                        request.path
                    );
                    return Err(ClientError::RetryExhausted {
                        status: status.as_u16(),
                        message: server_message(status, &body),
                    });
                }
                Verdict::RefreshAndReplay => {
                    log::debug!(
                        "{} {} got 401; refreshing before replay",
                        request.method,
                        request.path
                    );
                    request.mark_retried();
                    replay_token = Some(self.refresh.refresh().await?);
                }
            }
        }
    }

    /// Whether `url` shares scheme, host and port with the configured backend.
    pub fn is_backend(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
    }

    /// Sends and decodes a JSON success body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = ensure_success(self.execute(request).await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends and discards the success body.
    pub async fn send_empty(&self, request: ApiRequest) -> ClientResult<()> {
        ensure_success(self.execute(request).await?).await?;
        Ok(())
    }

    /// Sends and returns the raw success body (file downloads, exports).
    pub async fn send_bytes(&self, request: ApiRequest) -> ClientResult<Bytes> {
        let response = ensure_success(self.execute(request).await?).await?;
        Ok(response.bytes().await?)
    }

    /// Generic JSON call for endpoints without a dedicated wrapper.
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            request = request.json(body)?;
        }
        self.send_json(request).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Response> {
        let url = self.url_for(&request.path)?;
        log::trace!("{} {url}", request.method);

        let builder = self.http.request(request.method.clone(), url);
        let builder = interceptor::attach_bearer(builder, token);
        let builder = request.fill(builder)?;
        Ok(builder.send().await?)
    }
}

async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_response(status, body))
}

fn join_path(base: &Url, path: &str) -> ClientResult<Url> {
    Ok(base.join(path.trim_start_matches('/'))?)
}
