use std::{collections::BTreeMap, fmt, str::FromStr};

use biogas_core::{
    AlertId, MaterialType, ReportId, ResourceId, SensorId, Timestamp, UserId, UserProfile,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Answer of registration and approval, `{"usuario": .., "mensaje": ..}`.
#[derive(Clone, Debug, Deserialize)]
pub struct UserMessage {
    #[serde(rename = "usuario", default)]
    pub user: Option<UserProfile>,
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApprovedUsers {
    #[serde(rename = "usuarios")]
    pub users: Vec<UserProfile>,
    pub total: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PendingUsers {
    #[serde(rename = "usuarios")]
    pub users: Vec<UserProfile>,
    #[serde(rename = "total_pendientes")]
    pub total: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    pub topic: String,
    pub unit: String,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub room: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NewSensor {
    pub name: String,
    pub topic: String,
    pub unit: String,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    pub color: String,
    pub icon: String,
    pub room: String,
    pub is_active: bool,
}

/// Partial update; unset fields are left out of the body.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SensorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingRange {
    #[default]
    Day,
    Week,
    Month,
}

impl ReadingRange {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingRange::Day => "day",
            ReadingRange::Week => "week",
            ReadingRange::Month => "month",
        }
    }
}

impl FromStr for ReadingRange {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(ReadingRange::Day),
            "week" => Ok(ReadingRange::Week),
            "month" => Ok(ReadingRange::Month),
            other => Err(format!("unknown range '{other}' (expected day, week or month)")),
        }
    }
}

/// One point of a sensor's time series.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SensorSample {
    /// Unix seconds.
    pub time: i64,
    pub value: f64,
}

impl SensorSample {
    pub fn observed_at(&self) -> Option<Timestamp> {
        Timestamp::from_epoch_secs(self.time)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Reading {
    pub id: u64,
    pub sensor: SensorId,
    #[serde(default)]
    pub sensor_name: String,
    pub value: f64,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewFilling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<String>,
    pub material_type: MaterialType,
    pub material_amount_kg: f64,
    pub material_humidity_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_water_m3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreatedFilling {
    pub id: u64,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClosedFilling {
    pub detail: String,
    pub stage_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub days: Vec<f64>,
    pub daily_biogas_m3: Vec<f64>,
    pub cumulative_biogas_m3: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ExpectedSeries {
    #[serde(flatten)]
    pub series: Series,
    #[serde(rename = "A_biogas_m3", default)]
    pub potential_m3: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FillingStage {
    pub id: u64,
    pub number: u32,
    pub date: NaiveDate,
    pub material_type: String,
    pub material_amount_kg: f64,
    pub temperature_c: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CurrentProduction {
    pub stage: FillingStage,
    pub expected: ExpectedSeries,
    pub actual: Series,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Normal,
    Final,
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(ReportKind::Normal),
            "final" => Ok(ReportKind::Final),
            other => Err(format!("unknown report kind '{other}' (expected normal or final)")),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct CreateReportRequest<'a> {
    pub report_type: ReportKind,
    pub observations: &'a str,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreatedReport {
    pub id: ReportId,
    #[serde(default)]
    pub stage_active: Option<bool>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub excel_url: Option<String>,
    #[serde(default)]
    pub csv_url: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub created_at: Timestamp,
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub report_type: ReportKind,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(default)]
    pub inferences: Option<String>,
    #[serde(default)]
    pub production_estimated: Option<f64>,
    #[serde(default)]
    pub production_real: Option<f64>,
    #[serde(default)]
    pub file_pdf: Option<String>,
    #[serde(default)]
    pub file_excel: Option<String>,
    #[serde(default)]
    pub file_csv: Option<String>,
    #[serde(default)]
    pub stage: Option<u64>,
}

#[derive(Deserialize)]
pub(crate) struct ReportHistory {
    pub history: Vec<Report>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Excel,
    Csv,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown format '{other}' (expected excel or csv)")),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub level: String,
    pub message: String,
    pub created_at: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorAction {
    Open,
    Close,
    Set,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActuatorCommand {
    pub device: String,
    pub target: String,
    pub action: ActuatorAction,
    pub value: Option<f64>,
    pub payload: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Calibration {
    pub id: u64,
    pub sensor_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewCalibration {
    pub sensor_name: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PracticeSession {
    pub id: u64,
    pub started_at: Timestamp,
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
    #[serde(default)]
    pub started_by: Option<UserId>,
    #[serde(default)]
    pub ended_by: Option<UserId>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PracticeStatus {
    pub active: Option<PracticeSession>,
    pub last: Option<PracticeSession>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    #[serde(rename = "publico")]
    #[default]
    Public,
    #[serde(rename = "privado")]
    Private,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Public => "publico",
            AccessLevel::Private => "privado",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "publico" | "public" => Ok(AccessLevel::Public),
            "privado" | "private" => Ok(AccessLevel::Private),
            other => Err(format!("unknown access level '{other}' (expected public or private)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub file: String,
    #[serde(rename = "fecha_subida")]
    pub uploaded_at: Timestamp,
    #[serde(rename = "tipo_acceso")]
    pub access: AccessLevel,
    #[serde(rename = "institucion")]
    pub institution: u64,
    #[serde(rename = "institucion_nombre", default)]
    pub institution_name: String,
    #[serde(rename = "usuario_subio")]
    pub uploaded_by: UserId,
    #[serde(rename = "usuario_subio_username", default)]
    pub uploaded_by_username: String,
}

/// A file to upload as a new resource.
#[derive(Clone, Debug, PartialEq)]
pub struct NewResource {
    pub name: String,
    pub access: AccessLevel,
    pub file_name: String,
    pub mime: Option<String>,
    pub contents: bytes::Bytes,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DownloadLink {
    pub download_url: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo_acceso")]
    pub access: String,
    #[serde(rename = "tamaño", default)]
    pub size: u64,
    #[serde(rename = "tipo_archivo", default)]
    pub file_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalculatorRequest {
    pub material_type: MaterialType,
    pub vs_per_day: f64,
    pub reactor_volume: Option<f64>,
    pub temperature: f64,
    #[serde(rename = "HRT", skip_serializing_if = "Option::is_none")]
    pub hrt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_fraction: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CalculatorResponse {
    #[serde(flatten)]
    pub series: Series,
    #[serde(rename = "A_biogas_m3")]
    pub potential_m3: f64,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}
