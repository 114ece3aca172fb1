//! Article listing and article updates.
//!
//! Listing walks the cursor pagination until the server stops sending a
//! `rel="next"` link. A page that fails ends the walk early: whatever was
//! fetched before it is returned and the failure is only logged.
//!
//! Updates send the new `body_html` and nothing else. In dry-run mode no
//! request is made at all.

use super::ShopifyApi;
use super::pagination::next_page_info;
use crate::api::{ApiRequest, SendRequest};
use crate::models::{Article, ArticleUpdate, ArticlesPage};
use crate::utils::truncate_for_log;
use reqwest::StatusCode;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one article update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The API accepted the new body.
    Updated,
    /// Dry run: nothing was sent.
    DryRun,
    /// The API refused the update or could not be reached.
    Failed {
        /// `None` when no response was received.
        status: Option<StatusCode>,
        body: String,
    },
}

impl<S> ShopifyApi<S>
where
    S: SendRequest,
{
    /// Fetch every article of a blog, following the pagination cursor.
    ///
    /// # Arguments
    ///
    /// * `blog_id` - Blog returned by [`ShopifyApi::resolve_blog`]
    ///
    /// # Returns
    ///
    /// All articles in the order the API lists them. Never fails: a failed
    /// or unreadable page stops pagination and the articles gathered so far
    /// are returned.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_all_articles(&self, blog_id: u64) -> Vec<Article> {
        let url = format!("{}/blogs/{}/articles.json", self.api_base, blog_id);
        let mut articles = Vec::new();
        let mut page_info: Option<String> = None;
        let mut page = 0usize;

        loop {
            page += 1;
            let mut request = ApiRequest::get(&url).query("limit", self.page_size);
            if let Some(cursor) = &page_info {
                request = request.query("page_info", cursor);
            }

            let response = match self.client.send(&request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(page, error = %e, "Article page request failed; keeping articles fetched so far");
                    break;
                }
            };
            if !response.is_success() {
                error!(
                    page,
                    status = %response.status,
                    body = %truncate_for_log(&response.body, 500),
                    "Failed to fetch articles; keeping articles fetched so far"
                );
                break;
            }
            let batch: ArticlesPage = match response.json() {
                Ok(batch) => batch,
                Err(e) => {
                    error!(page, error = %e, "Unreadable article page; keeping articles fetched so far");
                    break;
                }
            };

            debug!(page, count = batch.articles.len(), "Fetched article page");
            articles.extend(batch.articles);

            match response.header("link").and_then(next_page_info) {
                Some(cursor) if page_info.as_deref() == Some(cursor.as_str()) => {
                    warn!(page, %cursor, "Server repeated the previous cursor; stopping pagination");
                    break;
                }
                Some(cursor) => page_info = Some(cursor),
                None => break,
            }
        }

        info!(count = articles.len(), pages = page, "Fetched articles");
        articles
    }

    /// Replace an article's body, or only log the intent in dry-run mode.
    ///
    /// # Arguments
    ///
    /// * `blog_id` - Blog the article belongs to
    /// * `article_id` - Article to update
    /// * `body_html` - Full new body; no other field is sent
    ///
    /// # Returns
    ///
    /// [`UpdateOutcome::Updated`] on a 2xx, [`UpdateOutcome::DryRun`] without
    /// any request in dry-run mode, [`UpdateOutcome::Failed`] otherwise.
    ///
    /// # Example
    ///
    /// ```ignore
    /// match api.update_article(blog.id, article.id, &rewrite.markup).await {
    ///     UpdateOutcome::Failed { status, .. } => warn!(?status, "not saved"),
    ///     _ => {}
    /// }
    /// ```
    #[instrument(level = "info", skip(self, body_html))]
    pub async fn update_article(
        &self,
        blog_id: u64,
        article_id: u64,
        body_html: &str,
    ) -> UpdateOutcome {
        if self.dry_run {
            info!("Dry run: article will NOT be updated");
            return UpdateOutcome::DryRun;
        }

        let url = format!(
            "{}/blogs/{}/articles/{}.json",
            self.api_base, blog_id, article_id
        );
        let payload = match serde_json::to_value(ArticleUpdate::body_html(article_id, body_html)) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Could not encode article update");
                return UpdateOutcome::Failed {
                    status: None,
                    body: e.to_string(),
                };
            }
        };

        match self.client.send(&ApiRequest::put(url, payload)).await {
            Ok(response) if response.is_success() => {
                info!("Article updated");
                UpdateOutcome::Updated
            }
            Ok(response) => {
                error!(
                    status = %response.status,
                    body = %truncate_for_log(&response.body, 500),
                    "Failed to update article"
                );
                UpdateOutcome::Failed {
                    status: Some(response.status),
                    body: response.body,
                }
            }
            Err(e) => {
                error!(error = %e, "Article update request failed");
                UpdateOutcome::Failed {
                    status: None,
                    body: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpSender;
    use crate::config::Config;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer, dry_run: bool) -> ShopifyApi<HttpSender> {
        let mut config = Config::for_tests(&server.uri(), &std::env::temp_dir());
        config.dry_run = dry_run;
        ShopifyApi::new(HttpSender::new("test-token").unwrap(), &config)
    }

    fn article(id: u64) -> serde_json::Value {
        json!({"id": id, "title": format!("Post {id}"), "handle": format!("post-{id}"), "body_html": "<p>x</p>"})
    }

    #[tokio::test]
    async fn test_single_page_without_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blogs/7/articles.json"))
            .and(query_param("limit", "250"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"articles": [article(1), article(2)]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let articles = api(&server, false).fetch_all_articles(7).await;

        let ids: Vec<u64> = articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(articles[0].handle, "post-1");
    }

    #[tokio::test]
    async fn test_follows_next_cursor() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/blogs/7/articles.json?limit=250&page_info=cursor2>; rel=\"next\"",
            server.uri()
        );
        let prev = format!(
            "<{}/blogs/7/articles.json?limit=250&page_info=cursor1>; rel=\"previous\"",
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/blogs/7/articles.json"))
            .and(query_param("page_info", "cursor2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"articles": [article(3)]}))
                    .insert_header("Link", prev.as_str()),
            )
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/blogs/7/articles.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"articles": [article(1), article(2)]}))
                    .insert_header("Link", next.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let articles = api(&server, false).fetch_all_articles(7).await;

        let ids: Vec<u64> = articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_partial_results() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/blogs/7/articles.json?limit=250&page_info=cursor2>; rel=\"next\"",
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/blogs/7/articles.json"))
            .and(query_param("page_info", "cursor2"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/blogs/7/articles.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"articles": [article(1)]}))
                    .insert_header("Link", next.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let articles = api(&server, false).fetch_all_articles(7).await;

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, 1);
    }

    #[tokio::test]
    async fn test_failed_first_page_returns_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blogs/7/articles.json"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(api(&server, false).fetch_all_articles(7).await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_cursor_stops() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/blogs/7/articles.json?limit=250&page_info=same>; rel=\"next\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/blogs/7/articles.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"articles": [article(1)]}))
                    .insert_header("Link", next.as_str()),
            )
            .expect(2)
            .mount(&server)
            .await;

        let articles = api(&server, false).fetch_all_articles(7).await;
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_update_sends_only_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/blogs/7/articles/9.json"))
            .and(body_json(json!({"article": {"id": 9, "body_html": "<p>new</p>"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"article": article(9)})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = api(&server, false).update_article(7, 9, "<p>new</p>").await;
        assert_eq!(outcome, UpdateOutcome::Updated);
    }

    #[tokio::test]
    async fn test_update_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/blogs/7/articles/9.json"))
            .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"errors":"bad"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = api(&server, false).update_article(7, 9, "<p>new</p>").await;
        assert_eq!(
            outcome,
            UpdateOutcome::Failed {
                status: Some(StatusCode::UNPROCESSABLE_ENTITY),
                body: r#"{"errors":"bad"}"#.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = api(&server, true).update_article(7, 9, "<p>new</p>").await;
        assert_eq!(outcome, UpdateOutcome::DryRun);
    }
}
