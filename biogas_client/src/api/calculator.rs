use crate::{
    ApiClient, ClientResult,
    api::types::{CalculatorRequest, CalculatorResponse},
    endpoints,
    interceptor::ApiRequest,
};

impl ApiClient {
    /// Runs the backend's production estimate. See `biogas_core::estimate_series`
    /// for the same model evaluated locally.
    pub async fn estimate_remote(
        &self,
        request: &CalculatorRequest,
    ) -> ClientResult<CalculatorResponse> {
        self.send_json(ApiRequest::post(endpoints::CALCULATOR_ESTIMATE).json(request)?)
            .await
    }
}
