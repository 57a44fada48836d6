use biogas_core::UserId;

use crate::{
    ApiClient, ClientResult,
    api::types::{ApprovedUsers, PendingUsers, UserMessage},
    endpoints,
    interceptor::ApiRequest,
};

impl ApiClient {
    pub async fn approved_users(&self) -> ClientResult<ApprovedUsers> {
        self.send_json(ApiRequest::get(endpoints::USERS)).await
    }

    pub async fn pending_users(&self) -> ClientResult<PendingUsers> {
        self.send_json(ApiRequest::get(endpoints::PENDING_USERS)).await
    }

    pub async fn approve_user(&self, id: UserId) -> ClientResult<UserMessage> {
        self.send_json(ApiRequest::post(endpoints::approve_user(id)))
            .await
    }
}
