//! Backend implementation for the municipal waste-management REST API.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use kerbside_core::{
    backend::Backend,
    model::{NewSpecialPickup, Profile, RouteId, ScheduleRecord, SpecialPickup, UserId},
    ports::{PickupPort, PortError, ProfilePort, SchedulePort},
};

/// API root used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://localhost:7243/api";

const IMAGE_DATA_PREFIX: &str = "data:image/jpeg;base64,";

/// Where the REST API lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// API root without a trailing slash, e.g. `https://host/api`.
    pub base_url: String,
}

impl RestConfig {
    /// Configuration for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// ASP.NET validation problem returned for refused requests.
#[derive(Debug, Default, Deserialize)]
struct ValidationProblem {
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblem {
    fn message(&self) -> Option<String> {
        let messages = self.errors.values().flatten().cloned().collect::<Vec<_>>();
        (!messages.is_empty()).then(|| messages.join(", "))
    }
}

/// Profile lookups against `/Profile/{userId}`.
pub struct RestProfilePort {
    client: Client,
    config: RestConfig,
}

impl RestProfilePort {
    /// Create a new profile port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: RestConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ProfilePort for RestProfilePort {
    async fn profile(&self, user_id: &UserId) -> Result<Profile, PortError> {
        let url = self.config.url(&format!("Profile/{user_id}"));
        debug!(%url, "fetching profile");
        fetch_json(self.client.get(url)).await
    }
}

/// Route schedules from `/Schedule/route/{routeId}`.
pub struct RestSchedulePort {
    client: Client,
    config: RestConfig,
}

impl RestSchedulePort {
    /// Create a new schedule port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: RestConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SchedulePort for RestSchedulePort {
    async fn schedule(&self, route_id: &RouteId) -> Result<ScheduleRecord, PortError> {
        let url = self.config.url(&format!("Schedule/route/{route_id}"));
        debug!(%url, "fetching schedule");
        fetch_json(self.client.get(url)).await
    }
}

/// Special pickups under `/SpecialPickup`.
pub struct RestPickupPort {
    client: Client,
    config: RestConfig,
}

impl RestPickupPort {
    /// Create a new pickup port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: RestConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl PickupPort for RestPickupPort {
    async fn list(&self) -> Result<Vec<SpecialPickup>, PortError> {
        let pickups =
            fetch_json::<Vec<SpecialPickup>>(self.client.get(self.config.url("SpecialPickup/all")))
                .await?;

        Ok(pickups
            .into_iter()
            .map(|mut pickup| {
                pickup.pickup_image = pickup.pickup_image.as_deref().and_then(ensure_data_url);
                pickup
            })
            .collect())
    }

    async fn submit(&self, request: &NewSpecialPickup) -> Result<(), PortError> {
        let response = self
            .client
            .post(self.config.url("SpecialPickup"))
            .json(request)
            .send()
            .await
            .map_err(PortError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Validation failures carry their messages in the body; anything else gets a generic one.
        let problem = response.json::<ValidationProblem>().await.unwrap_or_default();
        Err(PortError::Rejected(problem.message().unwrap_or_else(|| {
            format!("Submission unsuccessful ({status}). Please try again later.")
        })))
    }
}

/// Build the backend bundle for the REST API.
#[must_use]
pub fn backend(client: Client, config: RestConfig) -> Backend {
    let profile_port = Arc::new(RestProfilePort::new(client.clone(), config.clone()));
    let schedule_port = Arc::new(RestSchedulePort::new(client.clone(), config.clone()));
    let pickup_port = Arc::new(RestPickupPort::new(client, config));

    Backend::new(profile_port, schedule_port, pickup_port)
}

/// Stored images come back as bare base64; give them a `data:` prefix so they can be shown.
fn ensure_data_url(image: &str) -> Option<String> {
    if image.is_empty() {
        None
    } else if image.starts_with("data:image") {
        Some(image.to_owned())
    } else {
        Some(format!("{IMAGE_DATA_PREFIX}{image}"))
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::get, routing::post};
    use kerbside_core::model::{PickupStatus, WasteType};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    // Serve `router` on a free local port and point a config at it.
    async fn serve(router: Router) -> RestConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, router).await.expect("serve") });
        RestConfig::new(format!("http://{addr}/api"))
    }

    fn request() -> NewSpecialPickup {
        NewSpecialPickup {
            user_id: 1,
            pickup_type: WasteType::Metal,
            pickup_description: "Old bicycle frame".to_owned(),
            pickup_weight: "12".to_owned(),
            pickup_prefered_date: "2024-06-05".to_owned(),
            pickup_image: None,
            pickup_status: PickupStatus::Pending,
        }
    }

    #[test]
    fn config_trims_trailing_slash() {
        let config = RestConfig::new("https://waste.example/api/");
        assert_eq!(
            config.url("Schedule/route/3"),
            "https://waste.example/api/Schedule/route/3",
            "joined path"
        );
        assert_eq!(RestConfig::default().base_url, DEFAULT_BASE_URL, "default root");
    }

    #[test]
    fn validation_problem_flattens_messages() {
        let body = r#"{
            "title": "One or more validation errors occurred.",
            "errors": {
                "PickupWeight": ["The weight is too high."],
                "PickupDescription": ["Too long.", "Contains markup."]
            }
        }"#;
        let problem: ValidationProblem = serde_json::from_str(body).expect("problem body");
        assert_eq!(
            problem.message().as_deref(),
            Some("Too long., Contains markup., The weight is too high."),
            "ordered by field name"
        );
        assert_eq!(ValidationProblem::default().message(), None, "no errors");
    }

    #[test]
    fn images_get_data_prefix_once() {
        assert_eq!(
            ensure_data_url("abc=").as_deref(),
            Some("data:image/jpeg;base64,abc="),
            "bare payload"
        );
        assert_eq!(
            ensure_data_url("data:image/png;base64,abc=").as_deref(),
            Some("data:image/png;base64,abc="),
            "already prefixed"
        );
        assert_eq!(ensure_data_url(""), None, "empty");
    }

    #[tokio::test]
    async fn schedule_is_read_from_route_endpoint() {
        let router = Router::new().route(
            "/api/Schedule/route/{route_id}",
            get(|| async {
                Json(json!({
                    "scheduleId": 4,
                    "routeId": 7,
                    "metalWasteDates": "5,12,19",
                    "electricalWasteDates": "3,10",
                    "paperWasteDates": ""
                }))
            }),
        );
        let port = RestSchedulePort::new(Client::new(), serve(router).await);

        let schedule = port.schedule(&RouteId("7".to_owned())).await.expect("schedule");
        assert_eq!(
            schedule.metal_waste_dates.days().iter().copied().collect::<Vec<_>>(),
            vec![5, 12, 19],
            "metal days"
        );
        assert!(schedule.paper_waste_dates.days().is_empty(), "no paper days");
    }

    #[tokio::test]
    async fn missing_schedule_is_a_network_error() {
        let port = RestSchedulePort::new(Client::new(), serve(Router::new()).await);
        let result = port.schedule(&RouteId("99".to_owned())).await;
        assert!(matches!(result, Err(PortError::Network(_))), "404 on GET");
    }

    #[tokio::test]
    async fn listed_images_get_data_prefix() {
        let router = Router::new().route(
            "/api/SpecialPickup/all",
            get(|| async {
                Json(json!([
                    {
                        "pickupId": 1,
                        "userId": 1,
                        "pickupType": "metal",
                        "pickupPreferedDate": "2024-06-05T00:00:00",
                        "pickupImage": "abc=",
                        "pickupStatus": "Pending"
                    },
                    { "pickupId": 2, "pickupType": "paper", "pickupImage": "" }
                ]))
            }),
        );
        let port = RestPickupPort::new(Client::new(), serve(router).await);

        let pickups = port.list().await.expect("pickups");
        let images = pickups
            .iter()
            .map(|pickup| pickup.pickup_image.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(images, vec![Some("data:image/jpeg;base64,abc="), None], "prefixed images");
    }

    #[tokio::test]
    async fn accepted_submission_posts_json_body() {
        let router = Router::new().route(
            "/api/SpecialPickup",
            post(|Json(body): Json<Value>| async move {
                if body["pickupType"] == "metal" && body["pickupStatus"] == "Pending" {
                    StatusCode::CREATED
                } else {
                    StatusCode::BAD_REQUEST
                }
            }),
        );
        let port = RestPickupPort::new(Client::new(), serve(router).await);
        assert!(port.submit(&request()).await.is_ok(), "201 Created");
    }

    #[tokio::test]
    async fn refused_submission_carries_validation_messages() {
        let router = Router::new().route(
            "/api/SpecialPickup",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "title": "One or more validation errors occurred.",
                        "errors": {
                            "PickupWeight": ["The weight is too high."],
                            "PickupDescription": ["Too long."]
                        }
                    })),
                )
            }),
        );
        let port = RestPickupPort::new(Client::new(), serve(router).await);

        let result = port.submit(&request()).await;
        assert!(
            matches!(&result, Err(PortError::Rejected(message)) if message == "Too long., The weight is too high."),
            "flattened errors: {result:?}"
        );
    }

    #[tokio::test]
    async fn failed_submission_without_errors_gets_generic_message() {
        let router = Router::new().route(
            "/api/SpecialPickup",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let port = RestPickupPort::new(Client::new(), serve(router).await);

        let result = port.submit(&request()).await;
        assert!(
            matches!(&result, Err(PortError::Rejected(message)) if message.starts_with("Submission unsuccessful (500 Internal Server Error)")),
            "generic message: {result:?}"
        );
    }
}
