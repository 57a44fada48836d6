use biogas_core::ResourceId;

use crate::{
    ApiClient, ClientError, ClientResult,
    api::types::{DownloadLink, NewResource, Resource},
    endpoints,
    interceptor::{ApiRequest, Upload},
};

impl ApiClient {
    pub async fn resources(&self) -> ClientResult<Vec<Resource>> {
        let path = endpoints::resources(&self.current_institution()?)?;
        self.send_json(ApiRequest::get(path)).await
    }

    /// Resources uploaded by the signed-in user.
    pub async fn my_resources(&self) -> ClientResult<Vec<Resource>> {
        let path = endpoints::my_resources(&self.current_institution()?)?;
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn upload_resource(&self, resource: &NewResource) -> ClientResult<Resource> {
        let path = endpoints::resources(&self.current_institution()?)?;
        let upload = Upload {
            fields: vec![
                ("nombre".to_owned(), resource.name.clone()),
                ("tipo_acceso".to_owned(), resource.access.as_str().to_owned()),
            ],
            file_field: "file".to_owned(),
            file_name: resource.file_name.clone(),
            mime: resource.mime.clone(),
            bytes: resource.contents.clone(),
        };
        self.send_json(ApiRequest::post(path).upload(upload)).await
    }

    pub async fn resource_download_link(&self, id: ResourceId) -> ClientResult<DownloadLink> {
        let path = endpoints::resource_download(&self.current_institution()?, id)?;
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn delete_resource(&self, id: ResourceId) -> ClientResult<()> {
        let path = endpoints::resource(&self.current_institution()?, id)?;
        self.send_empty(ApiRequest::delete(path)).await
    }

    fn current_institution(&self) -> ClientResult<String> {
        self.session()
            .institution()?
            .ok_or(ClientError::InvalidInstitution)
    }
}
