//! # Bookmark repository — CRUD over the `bookmarks` collection
//!
//! [`BookmarkRepository`] talks to the data API as one caller: it carries that
//! caller's access token (or none, for anonymous requests) and relies on the
//! backend's row-level policy for ownership. It never re-checks who owns a
//! row.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`list`](BookmarkRepository::list) | `GET rest/v1/bookmarks?select=*&order=created_at.desc` |
//! | [`create`](BookmarkRepository::create) | `GET auth/v1/user`, then `POST rest/v1/bookmarks` |
//! | [`delete`](BookmarkRepository::delete) | `DELETE rest/v1/bookmarks?id=eq.<id>` |
//! | [`subscribe_to_changes`](BookmarkRepository::subscribe_to_changes) | realtime websocket, see [`crate::realtime`] |
//! | [`ping`](BookmarkRepository::ping) | `GET rest/v1/bookmarks?select=count` |
//!
//! `create` resolves the caller with the auth service first and stamps the
//! row with that id; a caller the service does not recognise gets
//! [`ApiError::IdentityUnresolved`] and nothing is inserted.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use store::{AuthUser, Bookmark, Session};
use url::Url;

use crate::client::{ensure_success, BackendClient};
use crate::error::{ApiError, Result};
use crate::realtime::{self, ChangeHandler, Subscription};

const TABLE: &str = "rest/v1/bookmarks";

#[derive(Serialize)]
struct NewBookmark<'a> {
    user_id: &'a str,
    title: &'a str,
    url: &'a str,
}

/// Check a bookmark before it is sent: a non-blank title and an absolute
/// http(s) URL. Returns the trimmed title and URL.
pub fn validate(title: &str, url: &str) -> Result<(String, String)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::InvalidBookmark("title is required".to_string()));
    }

    let url = url.trim();
    let parsed =
        Url::parse(url).map_err(|e| ApiError::InvalidBookmark(format!("url {url:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidBookmark(format!(
            "url must use http or https, got {}",
            parsed.scheme()
        )));
    }

    Ok((title.to_string(), url.to_string()))
}

#[derive(Clone)]
pub struct BookmarkRepository {
    backend: Arc<BackendClient>,
    access_token: Option<String>,
}

impl BookmarkRepository {
    pub fn new(backend: Arc<BackendClient>, access_token: Option<String>) -> Self {
        Self {
            backend,
            access_token,
        }
    }

    pub fn for_session(backend: Arc<BackendClient>, session: Option<&Session>) -> Self {
        Self::new(backend, session.map(|s| s.access_token.clone()))
    }

    pub fn backend(&self) -> &Arc<BackendClient> {
        &self.backend
    }

    fn token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Every bookmark visible to the caller, newest first.
    pub async fn list(&self) -> Result<Vec<Bookmark>> {
        let response = self
            .backend
            .request(Method::GET, TABLE, self.token())?
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        let response = ensure_success(response, "list bookmarks").await?;

        // An empty collection may come back as `null` from some proxies
        let rows: Option<Vec<Bookmark>> = response.json().await?;
        Ok(rows.unwrap_or_default())
    }

    /// The identity the auth service associates with this caller.
    pub async fn current_user(&self) -> Result<AuthUser> {
        let token = self.token().ok_or(ApiError::IdentityUnresolved)?;
        self.backend.fetch_user(token).await
    }

    pub async fn create(&self, title: &str, url: &str) -> Result<Bookmark> {
        let (title, url) = validate(title, url)?;
        let user = self.current_user().await?;

        let response = self
            .backend
            .request(Method::POST, TABLE, self.token())?
            .header("Prefer", "return=representation")
            .json(&[NewBookmark {
                user_id: &user.id,
                title: &title,
                url: &url,
            }])
            .send()
            .await?;
        let response = ensure_success(response, "create bookmark").await?;

        let mut rows: Vec<Bookmark> = response.json().await?;
        if rows.is_empty() {
            return Err(ApiError::request_failed(
                "create bookmark",
                "no row returned",
            ));
        }
        let created = rows.swap_remove(0);
        tracing::debug!(id = %created.id, "Created bookmark");
        Ok(created)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let filter = format!("eq.{id}");
        let response = self
            .backend
            .request(Method::DELETE, TABLE, self.token())?
            .query(&[("id", filter.as_str())])
            .send()
            .await?;
        ensure_success(response, "delete bookmark").await?;
        Ok(())
    }

    /// Open the live channel for the collection. Changes go to `handler`
    /// until the returned [`Subscription`] is unsubscribed or dropped.
    pub async fn subscribe_to_changes<H: ChangeHandler>(&self, handler: H) -> Result<Subscription> {
        realtime::subscribe(&self.backend, self.token(), handler).await
    }

    /// Connectivity check: counts the caller's visible rows.
    pub async fn ping(&self) -> Result<Value> {
        let response = self
            .backend
            .request(Method::GET, TABLE, self.token())?
            .query(&[("select", "count")])
            .send()
            .await?;
        let response = ensure_success(response, "query bookmarks").await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{backend, bookmark_json};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repository(server: &MockServer) -> BookmarkRepository {
        BookmarkRepository::new(backend(server), Some("access-user-1".to_string()))
    }

    async fn mount_user(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer access-user-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "user-1", "email": "ada@example.com"})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            validate("  Example ", " https://example.com ").unwrap(),
            ("Example".to_string(), "https://example.com".to_string())
        );
        assert!(matches!(validate("   ", "https://example.com"), Err(ApiError::InvalidBookmark(_))));
        assert!(matches!(validate("Example", "example.com"), Err(ApiError::InvalidBookmark(_))));
        assert!(matches!(validate("Example", "javascript:alert(1)"), Err(ApiError::InvalidBookmark(_))));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/bookmarks"))
            .and(query_param("select", "*"))
            .and(query_param("order", "created_at.desc"))
            .and(header("apikey", "anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                bookmark_json("b2", "Second"),
                bookmark_json("b1", "First"),
            ])))
            .mount(&server)
            .await;

        let rows = repository(&server).list().await.unwrap();
        let ids: Vec<_> = rows.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["b2", "b1"]);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/bookmarks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        assert!(repository(&server).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/bookmarks"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "relation \"public.bookmarks\" does not exist"
            })))
            .mount(&server)
            .await;

        match repository(&server).list().await {
            Err(ApiError::BackendRequestFailed { operation, reason }) => {
                assert_eq!(operation, "list bookmarks");
                assert!(reason.contains("does not exist"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_stamps_resolved_user() {
        let server = MockServer::start().await;
        mount_user(&server).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/bookmarks"))
            .and(header("prefer", "return=representation"))
            .and(body_json(serde_json::json!([
                {"user_id": "user-1", "title": "Example", "url": "https://example.com"}
            ])))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!([bookmark_json("b1", "Example")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let created = repository(&server)
            .create("Example", "https://example.com")
            .await
            .unwrap();
        assert_eq!(created.id, "b1");
        assert_eq!(created.user_id, "user-1");
    }

    #[tokio::test]
    async fn test_create_without_identity_inserts_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "msg": "invalid JWT"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/bookmarks"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let result = repository(&server).create("Example", "https://example.com").await;
        assert!(matches!(result, Err(ApiError::IdentityUnresolved)));

        let anonymous = BookmarkRepository::new(backend(&server), None);
        let result = anonymous.create("Example", "https://example.com").await;
        assert!(matches!(result, Err(ApiError::IdentityUnresolved)));
    }

    #[tokio::test]
    async fn test_delete_filters_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/bookmarks"))
            .and(query_param("id", "eq.b1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        repository(&server).delete("b1").await.unwrap();
    }

    #[tokio::test]
    async fn test_ping_returns_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/bookmarks"))
            .and(query_param("select", "count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"count": 3}])))
            .mount(&server)
            .await;

        let count = repository(&server).ping().await.unwrap();
        assert_eq!(count, serde_json::json!([{"count": 3}]));
    }
}
