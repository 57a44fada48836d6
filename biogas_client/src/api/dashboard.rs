use biogas_core::AlertId;
use bytes::Bytes;
use chrono::NaiveDate;
use serde_json::Value;

use crate::{
    ApiClient, ClientResult,
    api::types::{
        ActuatorCommand, Alert, ClosedFilling, CreateReportRequest, CreatedFilling, CreatedReport,
        CurrentProduction, DateRange, ExportFormat, NewFilling, PracticeSession, PracticeStatus,
        Report, ReportHistory, ReportKind,
    },
    endpoints,
    interceptor::ApiRequest,
};

impl ApiClient {
    pub async fn create_filling(&self, filling: &NewFilling) -> ClientResult<CreatedFilling> {
        self.send_json(ApiRequest::post(endpoints::FILLINGS).json(filling)?)
            .await
    }

    pub async fn close_current_filling(&self) -> ClientResult<ClosedFilling> {
        self.send_json(ApiRequest::post(endpoints::CLOSE_CURRENT_FILLING))
            .await
    }

    /// Expected against measured production of the active filling stage.
    /// The backend answers `404` when no stage is active.
    pub async fn current_production(&self) -> ClientResult<CurrentProduction> {
        self.send_json(ApiRequest::get(endpoints::CURRENT_PRODUCTION))
            .await
    }

    pub async fn create_report(
        &self,
        kind: ReportKind,
        observations: &str,
    ) -> ClientResult<CreatedReport> {
        let request = ApiRequest::post(endpoints::REPORT_CREATE).json(&CreateReportRequest {
            report_type: kind,
            observations,
        })?;
        self.send_json(request).await
    }

    pub async fn report_history(&self) -> ClientResult<Vec<Report>> {
        let history: ReportHistory = self
            .send_json(ApiRequest::get(endpoints::REPORT_HISTORY))
            .await?;
        Ok(history.history)
    }

    pub async fn report_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        format: ExportFormat,
    ) -> ClientResult<Bytes> {
        let request = ApiRequest::post(endpoints::REPORT_BY_RANGE)
            .query("format", format.as_str())
            .json(&DateRange {
                start_date: start,
                end_date: end,
            })?;
        self.send_bytes(request).await
    }

    /// Fetches a report file. `url` is either a path such as the ones in
    /// [`CreatedReport`] or an absolute URL.
    pub async fn download(&self, url: &str) -> ClientResult<Bytes> {
        self.send_bytes(ApiRequest::get(url)).await
    }

    pub async fn alerts(&self) -> ClientResult<Vec<Alert>> {
        self.send_json(ApiRequest::get(endpoints::ALERTS)).await
    }

    pub async fn resolve_alert(&self, id: AlertId) -> ClientResult<Value> {
        self.send_json(ApiRequest::post(endpoints::resolve_alert(id)))
            .await
    }

    pub async fn actuator_command(&self, command: &ActuatorCommand) -> ClientResult<Value> {
        self.send_json(ApiRequest::post(endpoints::ACTUATOR_COMMAND).json(command)?)
            .await
    }

    pub async fn practice_status(&self) -> ClientResult<PracticeStatus> {
        self.send_json(ApiRequest::get(endpoints::PRACTICE_STATUS))
            .await
    }

    pub async fn start_practice(&self) -> ClientResult<PracticeSession> {
        self.send_json(ApiRequest::post(endpoints::PRACTICE_START))
            .await
    }

    /// Ends the running practice and returns its readings as a spreadsheet.
    pub async fn stop_practice(&self, format: ExportFormat) -> ClientResult<Bytes> {
        let request = ApiRequest::post(endpoints::PRACTICE_STOP)
            .query("format", format.as_str())
            .json(&serde_json::json!({}))?;
        self.send_bytes(request).await
    }
}
