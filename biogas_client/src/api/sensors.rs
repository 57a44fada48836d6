use biogas_core::SensorId;

use crate::{
    ApiClient, ClientResult,
    api::types::{NewSensor, Reading, ReadingRange, Sensor, SensorSample, SensorUpdate},
    endpoints,
    interceptor::ApiRequest,
};

impl ApiClient {
    pub async fn sensors(&self) -> ClientResult<Vec<Sensor>> {
        self.send_json(ApiRequest::get(endpoints::SENSORS)).await
    }

    pub async fn sensor(&self, id: SensorId) -> ClientResult<Sensor> {
        self.send_json(ApiRequest::get(endpoints::sensor(id))).await
    }

    pub async fn sensor_data(
        &self,
        id: SensorId,
        range: ReadingRange,
    ) -> ClientResult<Vec<SensorSample>> {
        let request = ApiRequest::get(endpoints::sensor_data(id)).query("range", range.as_str());
        self.send_json(request).await
    }

    pub async fn create_sensor(&self, sensor: &NewSensor) -> ClientResult<Sensor> {
        self.send_json(ApiRequest::post(endpoints::SENSORS).json(sensor)?)
            .await
    }

    pub async fn update_sensor(&self, id: SensorId, update: &SensorUpdate) -> ClientResult<Sensor> {
        self.send_json(ApiRequest::put(endpoints::sensor(id)).json(update)?)
            .await
    }

    pub async fn delete_sensor(&self, id: SensorId) -> ClientResult<()> {
        self.send_empty(ApiRequest::delete(endpoints::sensor(id)))
            .await
    }

    /// Readings newest first, optionally for a single sensor.
    pub async fn readings(&self, sensor: Option<SensorId>) -> ClientResult<Vec<Reading>> {
        let mut request = ApiRequest::get(endpoints::READINGS);
        if let Some(sensor) = sensor {
            request = request.query("sensor", sensor);
        }
        self.send_json(request).await
    }

    pub async fn latest_reading(&self, sensor: SensorId) -> ClientResult<Option<Reading>> {
        Ok(self.readings(Some(sensor)).await?.into_iter().next())
    }
}
