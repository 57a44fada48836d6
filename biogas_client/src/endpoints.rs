//! Every path the client talks to, relative to the configured base URL.

use biogas_core::{AlertId, ResourceId, SensorId, UserId};

use crate::{ClientError, ClientResult};

pub const LOGIN: &str = "/api/iniciar-sesion/";
pub const REGISTER: &str = "/api/crear-usuario/";
pub const REFRESH: &str = "/api/refrescar-token/";
pub const LOGOUT: &str = "/api/cerrar-sesion/";
pub const CURRENT_USER: &str = "/api/usuario/actual/";

pub const USERS: &str = "/api/usuarios/";
pub const PENDING_USERS: &str = "/api/usuarios/pendientes/";

pub fn approve_user(id: UserId) -> String {
    format!("/api/usuarios/{id}/aprobar/")
}

pub const SENSORS: &str = "/api/dashboard/sensors/";
pub const READINGS: &str = "/api/dashboard/readings/";

pub fn sensor(id: SensorId) -> String {
    format!("{SENSORS}{id}/")
}

pub fn sensor_data(id: SensorId) -> String {
    format!("{SENSORS}{id}/data/")
}

pub const FILLINGS: &str = "/api/dashboard/fillings/";
pub const CLOSE_CURRENT_FILLING: &str = "/api/dashboard/fillings/close-current/";
pub const CURRENT_PRODUCTION: &str = "/api/dashboard/production/current/";

pub const REPORT_CREATE: &str = "/api/dashboard/report/create/";
pub const REPORT_HISTORY: &str = "/api/dashboard/report/history/";
pub const REPORT_BY_RANGE: &str = "/api/dashboard/report/by-range/";

pub const ALERTS: &str = "/api/dashboard/alerts/";

pub fn resolve_alert(id: AlertId) -> String {
    format!("{ALERTS}{id}/resolve/")
}

pub const ACTUATOR_COMMAND: &str = "/api/dashboard/actuators/command/";

pub const CALIBRATIONS: &str = "/api/dashboard/calibrations/";
pub const CALIBRATIONS_EXPORT: &str = "/api/dashboard/calibrations/export/";

pub const PRACTICE_STATUS: &str = "/api/dashboard/practice/status/";
pub const PRACTICE_START: &str = "/api/dashboard/practice/start/";
pub const PRACTICE_STOP: &str = "/api/dashboard/practice/stop/";

pub const CALCULATOR_ESTIMATE: &str = "/api/biocalculadora/estimate/";

/// Resource endpoints live under the institution's slug.
pub fn resources(institution: &str) -> ClientResult<String> {
    Ok(format!("/api/{}/recursos/", checked_institution(institution)?))
}

pub fn my_resources(institution: &str) -> ClientResult<String> {
    Ok(format!("{}mis-recursos/", resources(institution)?))
}

pub fn resource(institution: &str, id: ResourceId) -> ClientResult<String> {
    Ok(format!("{}{id}/", resources(institution)?))
}

pub fn resource_download(institution: &str, id: ResourceId) -> ClientResult<String> {
    Ok(format!("{}{id}/descargar/", resources(institution)?))
}

fn checked_institution(institution: &str) -> ClientResult<&str> {
    let slug = institution.trim();
    // Dot segments, percent-encoded or not, are collapsed by URL joining and
    // would escape the `/api/` prefix. Backslashes count as `/` in http URLs.
    if slug.is_empty()
        || matches!(slug, "." | "..")
        || slug.contains(['/', '\\', '?', '#', '%'])
    {
        return Err(ClientError::InvalidInstitution);
    }
    Ok(slug)
}
