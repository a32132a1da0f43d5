use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_empty(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: RequestBody::Empty,
        }
    }

    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)?;
        let mut req = Self::post_empty(url);
        req.body = RequestBody::Json(value);
        Ok(req)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Attaches the CSRF header when a token is known.
    pub fn with_csrf(self, token: Option<&str>) -> Self {
        match token {
            Some(t) => self.with_header(crate::csrf::CSRF_HEADER, t),
            None => self,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            RequestBody::Json(v) => Some(v),
            RequestBody::Empty => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body whatever the status, like `response.json()`.
    ///
    /// A body that does not decode on an error status reports the status.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match serde_json::from_str(&self.body) {
            Ok(v) => Ok(v),
            Err(_) if !self.is_ok() => Err(self.status_error()),
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }

    /// Rejects non-2xx statuses before decoding.
    pub fn ok_json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if !self.is_ok() {
            return Err(self.status_error());
        }
        serde_json::from_str(&self.body).map_err(ApiError::from)
    }

    fn status_error(&self) -> ApiError {
        ApiError::Status {
            code: self.status,
            body: self.body.clone(),
        }
    }
}

/// Transport seam: browser `fetch`, `reqwest`, or a test double.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: HttpClient> HttpClient for std::rc::Rc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}

impl<T: HttpClient> HttpClient for &T {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}
