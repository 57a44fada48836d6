//! Request and response hooks around every call made by [`crate::ApiClient`].
//!
//! The request hook attaches the stored bearer token. The response hook
//! decides whether a `401` means "refresh and replay once" or is final.

use bytes::Bytes;
use reqwest::{
    Method, RequestBuilder, StatusCode, header,
    multipart::{Form, Part},
};
use serde::Serialize;
use serde_json::Value;

use crate::ClientResult;

/// File half of a multipart upload. Rebuilt into a fresh form on every send so
/// a replayed upload carries the same bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Upload {
    pub fields: Vec<(String, String)>,
    pub file_field: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    fn to_form(&self) -> ClientResult<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }

        let mut part = Part::bytes(self.bytes.to_vec()).file_name(self.file_name.clone());
        if let Some(mime) = &self.mime {
            part = part.mime_str(mime)?;
        }
        Ok(form.part(self.file_field.clone(), part))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Upload(Upload),
}

/// Everything needed to send a request, and to send it again after a refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Relative to the configured base URL, or an absolute URL used as is.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Sent without a bearer token. A `401` on such a request is an ordinary
    /// error (bad credentials on login), never a trigger for a refresh.
    pub anonymous: bool,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            anonymous: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn upload(mut self, upload: Upload) -> Self {
        self.body = RequestBody::Upload(upload);
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Whether this request has already been replayed after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Applies query and body to a builder already pointed at the right URL.
    pub(crate) fn fill(&self, mut builder: RequestBuilder) -> ClientResult<RequestBuilder> {
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        Ok(match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Upload(upload) => builder.multipart(upload.to_form()?),
        })
    }
}

/// Request hook: `Authorization: Bearer <token>` when a token is present, no
/// header at all otherwise.
pub fn attach_bearer(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the response to the caller, success or not.
    Deliver,
    /// Expired token on a first attempt: refresh, then replay once.
    RefreshAndReplay,
    /// Rejected again after a replay.
    Exhausted,
}

/// Response hook.
pub fn inspect(request: &ApiRequest, status: StatusCode) -> Verdict {
    if status != StatusCode::UNAUTHORIZED || request.anonymous {
        return Verdict::Deliver;
    }
    if request.retried {
        Verdict::Exhausted
    } else {
        Verdict::RefreshAndReplay
    }
}
