use bytes::Bytes;

use crate::{
    ApiClient, ClientResult,
    api::types::{Calibration, NewCalibration},
    endpoints,
    interceptor::ApiRequest,
};

impl ApiClient {
    pub async fn calibrations(&self) -> ClientResult<Vec<Calibration>> {
        self.send_json(ApiRequest::get(endpoints::CALIBRATIONS)).await
    }

    pub async fn create_calibration(
        &self,
        calibration: &NewCalibration,
    ) -> ClientResult<Calibration> {
        self.send_json(ApiRequest::post(endpoints::CALIBRATIONS).json(calibration)?)
            .await
    }

    /// Spreadsheet of every calibration record.
    pub async fn export_calibrations(&self) -> ClientResult<Bytes> {
        self.send_bytes(ApiRequest::get(endpoints::CALIBRATIONS_EXPORT))
            .await
    }
}
