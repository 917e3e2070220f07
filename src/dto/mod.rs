use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FileKey;

/// Serializable preview entry for rendering a removable thumbnail.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PreviewDto {
    pub name: String,
    pub size: u64,
    pub data_url: String,
}

impl PreviewDto {
    pub fn new(key: &FileKey, thumbnail_jpeg: &[u8]) -> Self {
        Self {
            name: key.name.as_str().to_string(),
            size: key.size,
            data_url: format!("data:image/jpeg;base64,{}", STANDARD.encode(thumbnail_jpeg)),
        }
    }

    pub fn matches(&self, key: &FileKey) -> bool {
        self.name == key.name.as_str() && self.size == key.size
    }
}

/// Status discriminator shared by every backend JSON response.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Envelope returned by the backend. Unknown `status` values land in `None`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ApiResponse {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<ResponseStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<ResponseStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

impl ApiResponse {
    pub fn success() -> Self {
        Self {
            status: Some(ResponseStatus::Success),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(ResponseStatus::Error),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }
}

/// Body of the init-token handshake.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest<'a> {
    pub init_data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<i64>,
}

/// Handshake reply: a redirect on success, a `detail` otherwise.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CityNameResponse {
    pub status: Option<ResponseStatus>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CityCoordsResponse {
    pub status: Option<ResponseStatus>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// How reports near the user are selected.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Region,
    #[default]
    Radius,
    Polygon,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Region => "region",
            FilterType::Radius => "radius",
            FilterType::Polygon => "polygon",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown filter type `{0}`, expected region, radius or polygon")]
pub struct UnknownFilterType(String);

impl FromStr for FilterType {
    type Err = UnknownFilterType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(FilterType::Region),
            "radius" => Ok(FilterType::Radius),
            "polygon" => Ok(FilterType::Polygon),
            _ => Err(UnknownFilterType(value.to_string())),
        }
    }
}

/// Notification settings: which reports the user is told about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationFilter {
    Region,
    /// Radius picked in kilometres on the settings page.
    Radius { km: u32 },
    Polygon,
}

impl NotificationFilter {
    /// Build from a filter type and the radius slider value. The radius only
    /// matters for [`FilterType::Radius`].
    pub fn new(filter_type: FilterType, radius_km: u32) -> Self {
        match filter_type {
            FilterType::Region => NotificationFilter::Region,
            FilterType::Radius => NotificationFilter::Radius { km: radius_km },
            FilterType::Polygon => NotificationFilter::Polygon,
        }
    }

    pub fn filter_type(&self) -> FilterType {
        match self {
            NotificationFilter::Region => FilterType::Region,
            NotificationFilter::Radius { .. } => FilterType::Radius,
            NotificationFilter::Polygon => FilterType::Polygon,
        }
    }

    /// Query parameters; the backend takes the radius in metres.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("filter_type", self.filter_type().to_string())];
        if let NotificationFilter::Radius { km } = self {
            query.push(("radius", (u64::from(*km) * 1000).to_string()));
        }
        query
    }
}

/// Lifecycle of a lost/found report.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Active,
    Found,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl ReportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Active => "Активно",
            ReportStatus::Found => "Питомец найден",
            ReportStatus::Cancelled => "Отменено",
            ReportStatus::Unknown => "Неизвестно",
        }
    }
}

/// Card of a report found near the user.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NearbyReport {
    pub report_id: i64,
    pub report_title: String,
    #[serde(default)]
    pub report_content: String,
    pub report_status: ReportStatus,
    #[serde(default)]
    pub report_first_photo_url: Option<String>,
    #[serde(default)]
    pub report_region: String,
    #[serde(default)]
    pub geo_distance: f64,
}

impl NearbyReport {
    pub fn distance_label(&self) -> String {
        if self.geo_distance > 1.0 {
            format!("{}км от вас", self.geo_distance)
        } else {
            "менее 1 км от вас".to_string()
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NearbyReportsResponse {
    #[serde(default)]
    pub reports: Vec<NearbyReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileName;

    #[test]
    fn api_response_tolerates_unknown_status() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"status":"pending","message":"wait"}"#).unwrap();
        assert_eq!(parsed.status, None);
        assert_eq!(parsed.message.as_deref(), Some("wait"));
    }

    #[test]
    fn api_response_keeps_extra_fields() {
        let parsed: ApiResponse = serde_json::from_str(
            r#"{"status":"success","redirect_url":"/pets/profile/3","city":"Казань"}"#,
        )
        .unwrap();
        assert_eq!(parsed.status, Some(ResponseStatus::Success));
        assert_eq!(parsed.redirect_url.as_deref(), Some("/pets/profile/3"));
        assert_eq!(parsed.extra["city"], "Казань");
    }

    #[test]
    fn auth_request_uses_camel_case() {
        let body = serde_json::to_value(AuthRequest {
            init_data: "query_id=1",
            report_id: Some(4),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"initData": "query_id=1", "reportId": 4}));
    }

    #[test]
    fn preview_encodes_data_url() {
        let key = FileKey::new(FileName::try_from_str("a.jpg").unwrap(), 3);
        let preview = PreviewDto::new(&key, &[1, 2, 3]);

        assert_eq!(preview.data_url, "data:image/jpeg;base64,AQID");
        assert!(preview.matches(&key));
    }

    #[test]
    fn radius_filter_is_sent_in_metres() {
        let filter = NotificationFilter::new(FilterType::Radius, 5);
        assert_eq!(
            filter.query(),
            vec![("filter_type", "radius".to_string()), ("radius", "5000".to_string())]
        );

        let region = NotificationFilter::new(FilterType::Region, 5);
        assert_eq!(region.query(), vec![("filter_type", "region".to_string())]);
    }

    #[test]
    fn filter_type_parses_cli_values() {
        assert_eq!("Polygon".parse::<FilterType>(), Ok(FilterType::Polygon));
        assert!("city".parse::<FilterType>().is_err());
    }

    #[test]
    fn nearby_reports_tolerate_missing_fields() {
        let parsed: NearbyReportsResponse = serde_json::from_str(
            r#"{"reports":[{"report_id":3,"report_title":"Потерялся пёс",
                "report_status":"archived","geo_distance":0.4}]}"#,
        )
        .unwrap();
        let report = &parsed.reports[0];

        assert_eq!(report.report_status, ReportStatus::Unknown);
        assert_eq!(report.report_status.label(), "Неизвестно");
        assert_eq!(report.distance_label(), "менее 1 км от вас");
        assert!(report.report_first_photo_url.is_none());

        let empty: NearbyReportsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.reports.is_empty());
    }
}
