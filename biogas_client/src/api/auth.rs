use biogas_core::UserProfile;
use serde::Serialize;

use crate::{
    ApiClient, ClientResult,
    api::types::{LoginRequest, LoginResponse, RegisterRequest, UserMessage},
    endpoints,
    interceptor::ApiRequest,
    session::LoginTokens,
};

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh_token: &'a str,
}

impl ApiClient {
    /// Exchanges credentials for a session and persists it.
    ///
    /// Sent without a bearer token, so a `401` here means bad credentials and
    /// surfaces as [`crate::ClientError::Http`].
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> ClientResult<Option<UserProfile>> {
        let request = ApiRequest::post(endpoints::LOGIN)
            .anonymous()
            .json(&LoginRequest {
                username: username.to_owned(),
                password: password.to_owned(),
            })?;
        let response: LoginResponse = self.send_json(request).await?;

        self.session().begin(&LoginTokens {
            access: response.access,
            refresh: response.refresh,
            user: response.user.clone(),
        })?;
        log::info!("signed in as {username}");
        Ok(response.user)
    }

    pub async fn register(&self, user: &RegisterRequest) -> ClientResult<UserMessage> {
        let request = ApiRequest::post(endpoints::REGISTER).anonymous().json(user)?;
        self.send_json(request).await
    }

    /// Tells the backend to revoke the refresh token, then forgets the session
    /// locally whether or not the backend call worked.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Err(err) = self.revoke_refresh_token().await {
            log::warn!("server-side logout failed: {}", err.display_chain());
        }
        self.session().clear()?;
        log::info!("signed out");
        Ok(())
    }

    async fn revoke_refresh_token(&self) -> ClientResult<()> {
        let Some(refresh_token) = self.session().refresh_token()? else {
            return Ok(());
        };
        let request = ApiRequest::post(endpoints::LOGOUT).json(&LogoutRequest {
            refresh_token: &refresh_token,
        })?;
        self.send_empty(request).await
    }

    /// Forces a token refresh, sharing any refresh already in flight.
    pub async fn refresh_session(&self) -> ClientResult<()> {
        self.refresh_coordinator().refresh().await?;
        Ok(())
    }

    /// Fetches the signed-in user's profile and stores it.
    pub async fn current_user(&self) -> ClientResult<UserProfile> {
        let user: UserProfile = self.send_json(ApiRequest::get(endpoints::CURRENT_USER)).await?;
        self.session().set_user(&user)?;
        Ok(user)
    }
}
