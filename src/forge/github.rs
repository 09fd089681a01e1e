//! Implements the Forge trait for GitHub
use async_trait::async_trait;
use log::*;
use reqwest::{
    Client, Method, Request, Response, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    ReleaseError, Result,
    forge::{
        config::{DEFAULT_PAGE_SIZE, GITHUB_API_VERSION, RemoteConfig},
        request::{
            CreateReleaseRequest, Release, UpdateReleaseRequest,
            UploadAssetRequest,
        },
        traits::Forge,
    },
};

const USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    errors: Option<serde_json::Value>,
}

/// GitHub forge implementation using reqwest for release and asset calls.
pub struct Github {
    config: RemoteConfig,
    repo_url: Url,
    client: Client,
}

impl Github {
    /// Create GitHub client with token authentication and API base URL
    /// configuration for GitHub Enterprise instances.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let token = config.token.expose_secret();

        let mut headers = HeaderMap::new();

        let mut token_value =
            HeaderValue::from_str(format!("Bearer {}", token).as_str())?;
        token_value.set_sensitive(true);

        headers.append(AUTHORIZATION, token_value);
        headers.append(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.append(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        let repo_url = Url::parse(&format!(
            "{}/repos/{}/{}",
            config.api_url.trim_end_matches('/'),
            config.owner,
            config.repo
        ))?;

        Ok(Self {
            config,
            repo_url,
            client,
        })
    }

    /// Repository API url with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.repo_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ReleaseError::invalid_config(format!(
                    "api url cannot be a base: {}",
                    self.config.api_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let method = request.method().to_string();
        let url = request.url().to_string();

        debug!("{method} {url}");

        let response = self.client.execute(request).await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();

        Err(classify_failure(
            method,
            url,
            status,
            &headers,
            &body,
            chrono::Utc::now().timestamp(),
        ))
    }
}

/// Turn a failed response into a throttle signal or an API error.
///
/// `now` is the current unix time, used to compute the wait until
/// `x-ratelimit-reset` when no `retry-after` header is present.
pub(crate) fn classify_failure(
    method: String,
    url: String,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: i64,
) -> ReleaseError {
    let message = api_message(body);
    let lowered = message.to_lowercase();
    let retry_after = header_value(headers, "retry-after")
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);

    let throttled = status == StatusCode::FORBIDDEN
        || status == StatusCode::TOO_MANY_REQUESTS;

    if throttled
        && (lowered.contains("secondary rate limit") || lowered.contains("abuse"))
    {
        return ReleaseError::AbuseDetected {
            method,
            url,
            retry_after,
        };
    }

    let quota_exhausted = header_value(headers, "x-ratelimit-remaining")
        .is_some_and(|v| v == "0");

    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && quota_exhausted)
    {
        let retry_after = retry_after.unwrap_or_else(|| {
            let reset = header_value(headers, "x-ratelimit-reset")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(now);
            Duration::from_secs((reset - now).max(0) as u64)
        });

        return ReleaseError::RateLimited {
            method,
            url,
            retry_after,
        };
    }

    ReleaseError::api(method, url, status.as_u16(), message)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Server message plus any validation errors, or the raw body when it is
/// not a GitHub error document.
fn api_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(message),
            errors,
        }) => match errors {
            Some(errors) => format!("{message}\n{errors}"),
            None => message,
        },
        _ => body.to_string(),
    }
}

#[async_trait]
impl Forge for Github {
    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let url = self.endpoint(&["releases", "tags", tag])?;
        let request = self.client.get(url).build()?;

        match self.send(request).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(err) if err.is_not_found() => {
                debug!("no release found for tag: {tag}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        let mut releases = vec![];
        let mut page = 1;

        loop {
            let mut url = self.endpoint(&["releases"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &DEFAULT_PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let request = self.client.get(url).build()?;
            let response = self.send(request).await?;
            let batch: Vec<Release> = response.json().await?;
            let count = batch.len();

            releases.extend(batch);

            if count < DEFAULT_PAGE_SIZE as usize {
                break;
            }

            page += 1;
        }

        Ok(releases)
    }

    async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<Release> {
        let url = self.endpoint(&["releases"])?;
        let request = self.client.post(url).json(&req).build()?;
        let response = self.send(request).await?;
        let release: Release = response.json().await?;

        info!("created release {} ({})", release.tag_name, release.id);

        Ok(release)
    }

    async fn update_release(
        &self,
        release_id: u64,
        req: UpdateReleaseRequest,
    ) -> Result<Release> {
        let url = self.endpoint(&["releases", &release_id.to_string()])?;
        let request = self.client.patch(url).json(&req).build()?;
        let response = self.send(request).await?;
        let release: Release = response.json().await?;

        info!("updated release {} ({})", release.tag_name, release.id);

        Ok(release)
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<()> {
        let url =
            self.endpoint(&["releases", "assets", &asset_id.to_string()])?;
        let request = self.client.delete(url).build()?;
        self.send(request).await?;
        Ok(())
    }

    async fn upload_asset(
        &self,
        req: UploadAssetRequest,
    ) -> Result<serde_json::Value> {
        let mut url = Url::parse(&req.upload_url)?;
        url.query_pairs_mut().append_pair("name", &req.name);

        let request = self
            .client
            .request(Method::POST, url)
            .header(CONTENT_TYPE, req.content_type)
            .header(CONTENT_LENGTH, req.data.len())
            .body(req.data)
            .build()?;

        let response = self.send(request).await?;
        let asset: serde_json::Value = response.json().await?;

        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn classify(
        status: u16,
        headers: &[(&'static str, &str)],
        body: &str,
    ) -> ReleaseError {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        classify_failure(
            "GET".into(),
            "https://api.github.com/repos/o/r/releases".into(),
            StatusCode::from_u16(status).unwrap(),
            &map,
            body,
            NOW,
        )
    }

    #[test]
    fn too_many_requests_is_rate_limited_with_retry_after() {
        let err = classify(429, &[("retry-after", "12")], "");
        match err {
            ReleaseError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Duration::from_secs(12))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn exhausted_quota_waits_until_reset() {
        let reset = (NOW + 40).to_string();
        let err = classify(
            403,
            &[
                ("x-ratelimit-remaining", "0"),
                ("x-ratelimit-reset", reset.as_str()),
            ],
            r#"{"message":"API rate limit exceeded"}"#,
        );
        match err {
            ReleaseError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Duration::from_secs(40))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reset_in_the_past_never_waits_negative() {
        let reset = (NOW - 10).to_string();
        let err = classify(
            403,
            &[
                ("x-ratelimit-remaining", "0"),
                ("x-ratelimit-reset", reset.as_str()),
            ],
            "",
        );
        assert!(matches!(
            err,
            ReleaseError::RateLimited { retry_after, .. } if retry_after == Duration::ZERO
        ));
    }

    #[test]
    fn secondary_rate_limit_is_abuse() {
        let err = classify(
            403,
            &[("retry-after", "60")],
            r#"{"message":"You have exceeded a secondary rate limit."}"#,
        );
        assert!(matches!(err, ReleaseError::AbuseDetected { .. }));
    }

    #[test]
    fn forbidden_without_throttle_markers_is_api_error() {
        let err = classify(
            403,
            &[("x-ratelimit-remaining", "4999")],
            r#"{"message":"Resource not accessible by integration"}"#,
        );
        assert!(matches!(
            err,
            ReleaseError::Api { status: 403, ref message, .. }
                if message == "Resource not accessible by integration"
        ));
    }

    #[test]
    fn validation_errors_are_kept_in_message() {
        let err = classify(
            422,
            &[],
            r#"{"message":"Validation Failed","errors":[{"code":"already_exists"}]}"#,
        );
        match err {
            ReleaseError::Api { message, .. } => {
                assert!(message.starts_with("Validation Failed\n"));
                assert!(message.contains("already_exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_used_verbatim() {
        assert_eq!(api_message("Bad Gateway"), "Bad Gateway");
    }

    mod http {
        use super::*;
        use bytes::Bytes;
        use secrecy::SecretString;
        use serde_json::{Value, json};
        use wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{body_json, header, method, path, query_param},
        };

        fn forge(server: &MockServer) -> Github {
            Github::new(RemoteConfig {
                api_url: server.uri(),
                owner: "octo".into(),
                repo: "app".into(),
                token: SecretString::from("secret".to_string()),
            })
            .unwrap()
        }

        fn release_json(id: u64, tag: &str) -> Value {
            json!({
                "id": id,
                "tag_name": tag,
                "name": tag,
                "body": null,
                "html_url": format!("https://github.com/octo/app/releases/tag/{tag}"),
                "upload_url": format!(
                    "https://uploads.github.com/repos/octo/app/releases/{id}/assets{{?name,label}}"
                ),
                "target_commitish": "main",
                "draft": false,
                "prerelease": false,
                "assets": [],
            })
        }

        #[tokio::test]
        async fn release_lookup_sends_auth_and_parses_release() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/app/releases/tags/v1.0.0"))
                .and(header("authorization", "Bearer secret"))
                .and(header("accept", "application/vnd.github+json"))
                .and(header("x-github-api-version", GITHUB_API_VERSION))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(release_json(5, "v1.0.0")),
                )
                .expect(1)
                .mount(&server)
                .await;

            let release = forge(&server)
                .get_release_by_tag("v1.0.0")
                .await
                .unwrap()
                .unwrap();

            assert_eq!(release.id, 5);
            assert_eq!(release.tag_name, "v1.0.0");
        }

        #[tokio::test]
        async fn missing_release_is_none() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/app/releases/tags/v9.9.9"))
                .respond_with(
                    ResponseTemplate::new(404)
                        .set_body_json(json!({ "message": "Not Found" })),
                )
                .expect(1)
                .mount(&server)
                .await;

            let release =
                forge(&server).get_release_by_tag("v9.9.9").await.unwrap();

            assert!(release.is_none());
        }

        #[tokio::test]
        async fn listing_stops_on_short_page() {
            let server = MockServer::start().await;
            let full_page = (1..=DEFAULT_PAGE_SIZE as u64)
                .map(|id| release_json(id, &format!("v0.{id}.0")))
                .collect::<Vec<Value>>();

            Mock::given(method("GET"))
                .and(path("/repos/octo/app/releases"))
                .and(query_param("per_page", "100"))
                .and(query_param("page", "1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/app/releases"))
                .and(query_param("page", "2"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!([release_json(500, "v1.0.0")])),
                )
                .expect(1)
                .mount(&server)
                .await;

            let releases = forge(&server).list_releases().await.unwrap();

            assert_eq!(releases.len(), DEFAULT_PAGE_SIZE as usize + 1);
            assert_eq!(releases.last().unwrap().tag_name, "v1.0.0");
        }

        #[tokio::test]
        async fn create_sends_only_set_fields() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/octo/app/releases"))
                .and(body_json(json!({
                    "tag_name": "v1.0.0",
                    "name": "v1.0.0",
                    "draft": false,
                    "prerelease": false,
                    "generate_release_notes": false,
                })))
                .respond_with(
                    ResponseTemplate::new(201)
                        .set_body_json(release_json(7, "v1.0.0")),
                )
                .expect(1)
                .mount(&server)
                .await;

            let release = forge(&server)
                .create_release(CreateReleaseRequest {
                    tag_name: Some("v1.0.0".into()),
                    name: Some("v1.0.0".into()),
                    ..Default::default()
                })
                .await
                .unwrap();

            assert_eq!(release.id, 7);
        }

        #[tokio::test]
        async fn delete_asset_targets_asset_endpoint() {
            let server = MockServer::start().await;
            Mock::given(method("DELETE"))
                .and(path("/repos/octo/app/releases/assets/42"))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server)
                .await;

            forge(&server).delete_asset(42).await.unwrap();
        }

        #[tokio::test]
        async fn upload_posts_bytes_with_escaped_name() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/octo/app/releases/7/assets"))
                .and(query_param("name", "app linux#1.tar.gz"))
                .and(header("content-type", "application/gzip"))
                .and(header("content-length", "3"))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                    "id": 9,
                    "name": "app linux#1.tar.gz",
                    "uploader": { "login": "bot" },
                })))
                .expect(1)
                .mount(&server)
                .await;

            let asset = forge(&server)
                .upload_asset(UploadAssetRequest {
                    upload_url: format!(
                        "{}/repos/octo/app/releases/7/assets",
                        server.uri()
                    ),
                    name: "app linux#1.tar.gz".into(),
                    content_type: "application/gzip".into(),
                    data: Bytes::from_static(b"tar"),
                })
                .await
                .unwrap();

            assert_eq!(asset["id"], 9);
            assert_eq!(asset["uploader"]["login"], "bot");
        }

        #[tokio::test]
        async fn too_many_requests_response_is_rate_limited() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/octo/app/releases"))
                .respond_with(
                    ResponseTemplate::new(429).insert_header("retry-after", "7"),
                )
                .expect(1)
                .mount(&server)
                .await;

            let err = forge(&server)
                .create_release(CreateReleaseRequest::default())
                .await
                .unwrap_err();

            match err {
                ReleaseError::RateLimited {
                    method,
                    url,
                    retry_after,
                } => {
                    assert_eq!(method, "POST");
                    assert!(url.ends_with("/repos/octo/app/releases"));
                    assert_eq!(retry_after, Duration::from_secs(7));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn secondary_limit_response_is_abuse() {
            let server = MockServer::start().await;
            Mock::given(method("PATCH"))
                .and(path("/repos/octo/app/releases/3"))
                .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                    "message": "You have exceeded a secondary rate limit."
                })))
                .expect(1)
                .mount(&server)
                .await;

            let err = forge(&server)
                .update_release(3, UpdateReleaseRequest::default())
                .await
                .unwrap_err();

            assert!(matches!(err, ReleaseError::AbuseDetected { .. }));
        }

        #[tokio::test]
        async fn validation_failure_keeps_server_message() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/octo/app/releases"))
                .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                    "message": "Validation Failed",
                    "errors": [{ "code": "already_exists", "field": "tag_name" }],
                })))
                .expect(1)
                .mount(&server)
                .await;

            let err = forge(&server)
                .create_release(CreateReleaseRequest::default())
                .await
                .unwrap_err();

            match err {
                ReleaseError::Api {
                    status, message, ..
                } => {
                    assert_eq!(status, 422);
                    assert!(message.starts_with("Validation Failed\n"));
                    assert!(message.contains("already_exists"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn endpoint_escapes_tag_segments() {
        let forge = Github::new(RemoteConfig {
            owner: "octo".into(),
            repo: "app".into(),
            ..Default::default()
        })
        .unwrap();

        let url = forge.endpoint(&["releases", "tags", "v1.0.0 beta"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/app/releases/tags/v1.0.0%20beta"
        );
    }
}
