//! HTTP client for the pet-finder backend.
use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{PetId, PhotoId, ReportId};
use crate::dto::{
    ApiResponse, AuthRequest, AuthResponse, CityCoordsResponse, CityNameResponse, Coordinates,
    FilterType, NearbyReport, NearbyReportsResponse, NotificationFilter, ResponseStatus,
};
use crate::models::auth::{AuthRedirect, InitData};
use crate::models::config::ClientConfig;

/// Convenience alias for API results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Transport-level failures talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response body")]
    Decode(#[source] serde_json::Error),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// One file part of a multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Transport-neutral multipart body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    pub texts: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartPayload {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn into_form(self) -> ApiResult<Form> {
        let mut form = Form::new();
        for (name, value) in self.texts {
            form = form.text(name, value);
        }
        for file in self.files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// A form submission ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitRequest {
    pub method: Method,
    pub path: String,
    pub payload: MultipartPayload,
}

/// Sends form submissions. Implemented by [`ApiClient`] and by test doubles.
pub trait Backend {
    fn send(&self, request: SubmitRequest) -> impl Future<Output = ApiResult<ApiResponse>> + Send;

    fn delete(&self, path: String) -> impl Future<Output = ApiResult<ApiResponse>> + Send;

    fn delete_pet_photo(
        &self,
        photo: PhotoId,
        pet: PetId,
    ) -> impl Future<Output = ApiResult<ApiResponse>> + Send {
        self.delete(pet_photo_path(photo, pet))
    }

    fn delete_report_photo(
        &self,
        photo: PhotoId,
        report: ReportId,
    ) -> impl Future<Output = ApiResult<ApiResponse>> + Send {
        self.delete(report_photo_path(photo, report))
    }
}

/// reqwest-based backend client. Keeps the session cookie set by the auth handshake.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Parse the status envelope. A JSON body with a status wins over the HTTP code,
    /// so server messages on 4xx replies reach the user. A 2xx body that is not
    /// JSON yields an envelope without status.
    async fn read_envelope(response: Response) -> ApiResult<ApiResponse> {
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<ApiResponse>(&body) {
            Ok(envelope) if envelope.status.is_some() || status.is_success() => Ok(envelope),
            Ok(_) => Err(ApiError::Status(status.as_u16())),
            Err(_) if !status.is_success() => Err(ApiError::Status(status.as_u16())),
            Err(err) => {
                log::warn!("{status} reply is not a status envelope: {err}");
                Ok(ApiResponse::default())
            }
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| {
            if status.is_success() {
                ApiError::Decode(err)
            } else {
                ApiError::Status(status.as_u16())
            }
        })
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<Response> {
        Ok(self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?)
    }

    /// Exchange the host-issued init token for a session cookie.
    pub async fn authenticate(&self, init_data: &InitData) -> ApiResult<AuthRedirect> {
        self.handshake("/auth", init_data, None).await
    }

    /// Handshake used when the app is opened from a report notification.
    pub async fn authenticate_for_report(
        &self,
        init_data: &InitData,
        report: ReportId,
    ) -> ApiResult<AuthRedirect> {
        self.handshake("/reports/auth", init_data, Some(report)).await
    }

    async fn handshake(
        &self,
        path: &str,
        init_data: &InitData,
        report: Option<ReportId>,
    ) -> ApiResult<AuthRedirect> {
        let body = AuthRequest {
            init_data: init_data.as_str(),
            report_id: report.map(|r| r.value()),
        };
        let response = self.send_json(Method::POST, path, &body).await?;
        let reply: AuthResponse = Self::read_json(response).await?;

        match reply.redirect_url {
            Some(url) => {
                log::info!("authenticated, redirect to {url}");
                Ok(AuthRedirect::new(url))
            }
            None => {
                let detail = reply
                    .detail
                    .unwrap_or_else(|| "No redirect URL provided".to_string());
                log::error!("authentication failed: {detail}");
                Err(ApiError::Auth(detail))
            }
        }
    }

    pub async fn delete_pet(&self, pet: PetId) -> ApiResult<ApiResponse> {
        self.delete(format!("/pets/delete/{pet}")).await
    }

    pub async fn delete_report(&self, report: ReportId) -> ApiResult<ApiResponse> {
        self.delete(format!("/reports/delete/{report}")).await
    }

    /// Reverse geocode coordinates to a city name.
    pub async fn city_name(&self, at: Coordinates) -> ApiResult<String> {
        let response = self
            .http
            .get(self.url("/geo/get-city-name"))
            .query(&[("lat", at.lat), ("lon", at.lon)])
            .send()
            .await?;
        let reply: CityNameResponse = Self::read_json(response).await?;
        match (reply.status, reply.city) {
            (Some(ResponseStatus::Success), Some(city)) => Ok(city),
            _ => Err(ApiError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| "Ошибка при определении города".to_string()),
            )),
        }
    }

    /// Forward geocode a city name.
    pub async fn city_coords(&self, city: &str) -> ApiResult<Coordinates> {
        let response = self
            .http
            .get(self.url("/geo/get-city-coords"))
            .query(&[("city", city)])
            .send()
            .await?;
        let reply: CityCoordsResponse = Self::read_json(response).await?;
        match (reply.status, reply.lat, reply.lon) {
            (Some(ResponseStatus::Success), Some(lat), Some(lon)) => Ok(Coordinates { lat, lon }),
            _ => Err(ApiError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| "Город не найден".to_string()),
            )),
        }
    }

    /// Persist the user's location during registration.
    pub async fn save_location(&self, at: Coordinates) -> ApiResult<ApiResponse> {
        let response = self.send_json(Method::POST, "/geo/get-location", &at).await?;
        Self::read_envelope(response).await
    }

    /// Update the location stored in the user's profile.
    pub async fn update_user_location(&self, at: Coordinates) -> ApiResult<ApiResponse> {
        let response = self.send_json(Method::PATCH, "/users/update/geo", &at).await?;
        Self::read_envelope(response).await
    }

    /// Change which reports the user is notified about.
    pub async fn update_filter(&self, filter: &NotificationFilter) -> ApiResult<ApiResponse> {
        let response = self
            .http
            .patch(self.url("/users/update/geo/filter_type"))
            .query(&filter.query())
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    /// Active reports around the user, nearest first as ordered by the backend.
    pub async fn nearby_reports(&self, filter: FilterType) -> ApiResult<Vec<NearbyReport>> {
        let response = self
            .http
            .get(self.url("/reports/nearby"))
            .query(&[("filter_type", filter.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let reply: NearbyReportsResponse = Self::read_json(response).await?;
        log::debug!("{} reports near the user", reply.reports.len());
        Ok(reply.reports)
    }
}

impl Backend for ApiClient {
    async fn send(&self, request: SubmitRequest) -> ApiResult<ApiResponse> {
        log::debug!(
            "{} {} with {} text and {} file parts",
            request.method,
            request.path,
            request.payload.texts.len(),
            request.payload.files.len()
        );
        let form = request.payload.into_form()?;
        let response = self
            .http
            .request(request.method, self.url(&request.path))
            .multipart(form)
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    async fn delete(&self, path: String) -> ApiResult<ApiResponse> {
        let response = self.http.delete(self.url(&path)).send().await?;
        Self::read_envelope(response).await
    }
}

pub fn pet_photo_path(photo: PhotoId, pet: PetId) -> String {
    format!("/pets/photo_delete/{photo}?pet_id={pet}")
}

pub fn report_photo_path(photo: PhotoId, report: ReportId) -> String {
    format!("/reports/photo_delete/{photo}?report_id={report}")
}
