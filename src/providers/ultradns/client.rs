use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::providers::ultradns::error::UltraDnsError;
use crate::providers::ultradns::service::{RecordService, ZoneService};
use crate::providers::ultradns::types::*;

const TOKEN_PATH: [&str; 3] = ["v2", "authorization", "token"];
const API_VERSION: &str = "v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Refresh this long before the server-side expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[cfg_attr(test, derive(Debug))]
pub struct UltraDnsClientConfig {
    pub username: String,
    pub password: String,
    pub endpoint: String,
}

#[cfg_attr(test, derive(Debug))]
struct Token {
    access: String,
    refresh: Option<String>,
    expires_at: Option<Instant>,
}

impl Token {
    fn from_response(res: TokenResponse) -> Result<Self, UltraDnsError> {
        let access = res
            .access_token()
            .ok_or_else(|| UltraDnsError::Authentication("no access token in response".into()))?
            .to_string();
        Ok(Token {
            access,
            refresh: res.refresh_token().map(str::to_string),
            // An expiry beyond what Instant can hold is treated as none.
            expires_at: res
                .expires_in()
                .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs))),
        })
    }

    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() + EXPIRY_MARGIN < at,
            None => true,
        }
    }
}

/// UltraDNS REST client. Authenticates with the password grant on
/// construction and keeps the bearer token fresh afterwards.
#[cfg_attr(test, derive(Debug))]
pub struct UltraDnsClient {
    config: UltraDnsClientConfig,
    base: Url,
    client: Client,
    token: Mutex<Token>,
}

fn normalize_endpoint(endpoint: &str) -> Result<Url, UltraDnsError> {
    let invalid = || UltraDnsError::InvalidEndpoint(endpoint.to_string());
    let mut url = Url::parse(endpoint.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Appends `segments` to `base`, percent-encoding each one.
fn api_url(base: &Url, segments: &[&str]) -> Result<Url, UltraDnsError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UltraDnsError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl UltraDnsClient {
    pub async fn new(config: UltraDnsClientConfig) -> Result<Self, UltraDnsError> {
        if config.username.is_empty() || config.password.is_empty() {
            return Err(UltraDnsError::Authentication(
                "username and password are required".into(),
            ));
        }
        let base = normalize_endpoint(&config.endpoint)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let token = Self::request_token(
            &client,
            &base,
            &[
                ("grant_type", "password"),
                ("username", config.username.as_str()),
                ("password", config.password.as_str()),
            ],
        )
        .await?;

        Ok(Self {
            config,
            base,
            client,
            token: Mutex::new(token),
        })
    }

    async fn request_token(
        client: &Client,
        base: &Url,
        form: &[(&str, &str)],
    ) -> Result<Token, UltraDnsError> {
        let res = client
            .post(api_url(base, &TOKEN_PATH)?)
            .form(form)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body: Option<ApiErrorBody> = res.json().await.ok();
            let message = body
                .as_ref()
                .and_then(ApiErrorBody::first)
                .and_then(ApiErrorDetail::message)
                .map(str::to_string)
                .unwrap_or_else(|| format!("token request returned {status}"));
            return Err(UltraDnsError::Authentication(message));
        }

        Token::from_response(res.json().await?)
    }

    async fn bearer(&self) -> Result<String, UltraDnsError> {
        let mut token = self.token.lock().await;
        if token.is_fresh() {
            return Ok(token.access.clone());
        }

        let refreshed = match token.refresh.as_deref() {
            Some(refresh) => {
                trace!("Refreshing access token");
                match Self::request_token(
                    &self.client,
                    &self.base,
                    &[("grant_type", "refresh_token"), ("refresh_token", refresh)],
                )
                .await
                {
                    Ok(t) => Some(t),
                    Err(e) => {
                        debug!(error = %e, "Token refresh failed, logging in again");
                        None
                    }
                }
            }
            None => None,
        };

        *token = match refreshed {
            Some(t) => t,
            None => {
                Self::request_token(
                    &self.client,
                    &self.base,
                    &[
                        ("grant_type", "password"),
                        ("username", self.config.username.as_str()),
                        ("password", self.config.password.as_str()),
                    ],
                )
                .await?
            }
        };
        Ok(token.access.clone())
    }

    async fn handle_request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&RRSet>,
    ) -> Result<Response, UltraDnsError> {
        let segments: Vec<&str> = std::iter::once(API_VERSION)
            .chain(path.iter().copied())
            .collect();
        let url = api_url(&self.base, &segments)?;
        trace!(%method, url = %url, "UltraDNS request");

        let mut req = self
            .client
            .request(method, url)
            .bearer_auth(self.bearer().await?);
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: Option<ApiErrorBody> = response.json().await.ok();
        Err(UltraDnsError::from_body(status, body))
    }
}

#[async_trait]
impl ZoneService for UltraDnsClient {
    async fn read_zone(&self, zone_name: &str) -> Result<ZoneInfo, UltraDnsError> {
        let res = self
            .handle_request(Method::GET, &["zones", zone_name], None)
            .await?;
        Ok(res.json().await?)
    }
}

#[async_trait]
impl RecordService for UltraDnsClient {
    async fn read(&self, key: &RRSetKey) -> Result<RRSetList, UltraDnsError> {
        let res = self.handle_request(Method::GET, &key.path(), None).await?;
        Ok(res.json().await?)
    }

    async fn create(&self, key: &RRSetKey, rrset: &RRSet) -> Result<(), UltraDnsError> {
        self.handle_request(Method::POST, &key.path(), Some(rrset))
            .await?;
        Ok(())
    }

    async fn update(&self, key: &RRSetKey, rrset: &RRSet) -> Result<(), UltraDnsError> {
        self.handle_request(Method::PUT, &key.path(), Some(rrset))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &RRSetKey) -> Result<(), UltraDnsError> {
        self.handle_request(Method::DELETE, &key.path(), None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use httpmock::prelude::*;
    use serde_json::json;

    async fn mock_login<'a>(server: &'a MockServer, expires_in: &str) -> httpmock::Mock<'a> {
        let expires_in = expires_in.to_string();
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/authorization/token")
                    .body_contains("grant_type=password");
                then.status(200).json_body(json!({
                    "tokenType": "Bearer",
                    "accessToken": "access-1",
                    "refreshToken": "refresh-1",
                    "expiresIn": expires_in
                }));
            })
            .await
    }

    fn config(server: &MockServer) -> UltraDnsClientConfig {
        UltraDnsClientConfig {
            username: "user".into(),
            password: "secret".into(),
            endpoint: server.url(""),
        }
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("https://api.ultradns.com").unwrap().as_str(),
            "https://api.ultradns.com/"
        );
        assert_eq!(
            normalize_endpoint("https://api.ultradns.com/").unwrap().as_str(),
            "https://api.ultradns.com/"
        );
        assert_eq!(
            normalize_endpoint("https://proxy.example.com/ultradns").unwrap().as_str(),
            "https://proxy.example.com/ultradns/"
        );
        assert_matches!(
            normalize_endpoint("api.ultradns.com"),
            Err(UltraDnsError::InvalidEndpoint(_))
        );
        assert_matches!(
            normalize_endpoint("ftp://api.ultradns.com/"),
            Err(UltraDnsError::InvalidEndpoint(_))
        );
    }

    #[test]
    fn test_api_url_encodes_segments() {
        let base = normalize_endpoint("https://api.ultradns.com").unwrap();
        let key = RRSetKey::txt("_acme-challenge.a b.example.com.", "example.com.");
        let mut segments = vec![API_VERSION];
        segments.extend(key.path());

        assert_eq!(
            api_url(&base, &segments).unwrap().as_str(),
            "https://api.ultradns.com/v3/zones/example.com./rrsets/TXT/_acme-challenge.a%20b.example.com."
        );
        assert_eq!(
            api_url(&base, &["zones", "a/b?c#d."]).unwrap().as_str(),
            "https://api.ultradns.com/zones/a%2Fb%3Fc%23d."
        );
    }

    #[test]
    fn test_api_url_keeps_endpoint_path() {
        let base = normalize_endpoint("https://proxy.example.com/ultradns/").unwrap();
        assert_eq!(
            api_url(&base, &TOKEN_PATH).unwrap().as_str(),
            "https://proxy.example.com/ultradns/v2/authorization/token"
        );
    }

    #[test]
    fn test_unrepresentable_expiry_never_expires() {
        let res: TokenResponse =
            serde_json::from_value(json!({ "accessToken": "a", "expiresIn": u64::MAX })).unwrap();
        let token = Token::from_response(res).unwrap();
        assert!(token.expires_at.is_none());
        assert!(token.is_fresh());
    }

    #[tokio::test]
    async fn test_huge_expiry_from_login() {
        let server = MockServer::start_async().await;
        let login = mock_login(&server, "18446744073709551615").await;
        let zone = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/zones/example.com.")
                    .header("authorization", "Bearer access-1");
                then.status(200).json_body(json!({}));
            })
            .await;

        let client = UltraDnsClient::new(config(&server)).await.unwrap();
        client.read_zone("example.com.").await.unwrap();

        login.assert_hits_async(1).await;
        zone.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_and_read_zone() {
        let server = MockServer::start_async().await;
        let login = mock_login(&server, "3600").await;
        let zone = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/zones/example.com.")
                    .header("authorization", "Bearer access-1");
                then.status(200).json_body(json!({
                    "properties": { "name": "example.com.", "type": "PRIMARY" }
                }));
            })
            .await;

        let client = UltraDnsClient::new(config(&server)).await.unwrap();
        let info = client.read_zone("example.com.").await.unwrap();

        assert_eq!(info.alias_of(), None);
        login.assert_async().await;
        zone.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/authorization/token");
                then.status(400).json_body(json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid username or password"
                }));
            })
            .await;

        let result = UltraDnsClient::new(config(&server)).await;
        assert_matches!(
            result,
            Err(UltraDnsError::Authentication(msg)) if msg == "Invalid username or password"
        );
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected_before_any_request() {
        let result = UltraDnsClient::new(UltraDnsClientConfig {
            username: String::new(),
            password: "secret".into(),
            endpoint: "https://api.ultradns.com/".into(),
        })
        .await;
        assert_matches!(result, Err(UltraDnsError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_record_lifecycle_requests() {
        let server = MockServer::start_async().await;
        mock_login(&server, "3600").await;
        let path = "/v3/zones/example.com./rrsets/TXT/_acme-challenge.example.com.";
        let body = json!({
            "ownerName": "example.com.",
            "rrtype": "TXT",
            "ttl": 120,
            "rdata": ["abc123"]
        });

        let create = server
            .mock_async(|when, then| {
                when.method(POST).path(path).json_body(body.clone());
                then.status(201);
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PUT).path(path).json_body(body.clone());
                then.status(200);
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path(path);
                then.status(204);
            })
            .await;

        let client = UltraDnsClient::new(config(&server)).await.unwrap();
        let key = RRSetKey::txt("_acme-challenge.example.com.", "example.com.");
        let rrset = RRSet {
            owner_name: "example.com.".into(),
            rr_type: RECORD_TYPE_TXT.into(),
            ttl: 120,
            rdata: vec!["abc123".into()],
        };

        client.create(&key, &rrset).await.unwrap();
        client.update(&key, &rrset).await.unwrap();
        client.delete(&key).await.unwrap();

        create.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_not_found_maps_api_error() {
        let server = MockServer::start_async().await;
        mock_login(&server, "3600").await;
        let read = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/zones/example.com./rrsets/TXT/_acme-challenge.example.com.");
                then.status(404).json_body(json!([
                    { "errorCode": 70002, "errorMessage": "Data not found." }
                ]));
            })
            .await;

        let client = UltraDnsClient::new(config(&server)).await.unwrap();
        let err = client
            .read(&RRSetKey::txt("_acme-challenge.example.com.", "example.com."))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        read.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_parses_rrsets() {
        let server = MockServer::start_async().await;
        mock_login(&server, "3600").await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/zones/example.com./rrsets/TXT/_acme-challenge.example.com.");
                then.status(200).json_body(json!({
                    "zoneName": "example.com.",
                    "rrSets": [{
                        "ownerName": "_acme-challenge.example.com.",
                        "rrtype": "TXT (16)",
                        "ttl": 120,
                        "rdata": ["abc123"]
                    }]
                }));
            })
            .await;

        let client = UltraDnsClient::new(config(&server)).await.unwrap();
        let list = client
            .read(&RRSetKey::txt("_acme-challenge.example.com.", "example.com."))
            .await
            .unwrap();

        assert_eq!(list.zone_name.as_deref(), Some("example.com."));
        assert_eq!(list.rr_sets.len(), 1);
        assert_eq!(list.rr_sets[0].rdata, vec!["abc123".to_string()]);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let server = MockServer::start_async().await;
        // Already inside the expiry margin, so the first API call refreshes.
        let login = mock_login(&server, "1").await;
        let refresh = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/authorization/token")
                    .body_contains("grant_type=refresh_token")
                    .body_contains("refresh_token=refresh-1");
                then.status(200).json_body(json!({
                    "accessToken": "access-2",
                    "refreshToken": "refresh-2",
                    "expiresIn": "3600"
                }));
            })
            .await;
        let zone = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/zones/example.com.")
                    .header("authorization", "Bearer access-2");
                then.status(200).json_body(json!({}));
            })
            .await;

        let client = UltraDnsClient::new(config(&server)).await.unwrap();
        client.read_zone("example.com.").await.unwrap();
        client.read_zone("example.com.").await.unwrap();

        login.assert_hits_async(1).await;
        refresh.assert_hits_async(1).await;
        zone.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_login() {
        let server = MockServer::start_async().await;
        let login = mock_login(&server, "1").await;
        let refresh = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/authorization/token")
                    .body_contains("grant_type=refresh_token");
                then.status(401).json_body(json!({ "error": "invalid_grant" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/zones/example.com.");
                then.status(200).json_body(json!({}));
            })
            .await;

        let client = UltraDnsClient::new(config(&server)).await.unwrap();
        client.read_zone("example.com.").await.unwrap();

        login.assert_hits_async(2).await;
        refresh.assert_hits_async(1).await;
    }
}
