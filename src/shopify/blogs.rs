//! Blog discovery.

use super::ShopifyApi;
use crate::api::{ApiRequest, SendRequest};
use crate::error::FixError;
use crate::models::{Blog, BlogsPage};
use crate::utils::truncate_for_log;
use tracing::{error, info, instrument, warn};

impl<S> ShopifyApi<S>
where
    S: SendRequest,
{
    /// Find the blog to scan: the first one the store lists.
    ///
    /// # Errors
    ///
    /// [`FixError::BlogUnresolved`] when the listing fails, cannot be decoded
    /// or is empty; [`FixError::Http`] when the request cannot be sent.
    #[instrument(level = "info", skip_all)]
    pub async fn resolve_blog(&self) -> Result<Blog, FixError> {
        let url = format!("{}/blogs.json", self.api_base);
        let response = self.client.send(&ApiRequest::get(url)).await?;

        if !response.is_success() {
            error!(
                status = %response.status,
                body = %truncate_for_log(&response.body, 500),
                "Failed to list blogs"
            );
            return Err(FixError::BlogUnresolved(format!(
                "blog listing returned {}",
                response.status
            )));
        }

        let page: BlogsPage = response
            .json()
            .map_err(|e| FixError::BlogUnresolved(format!("unreadable blog listing: {e}")))?;
        let total = page.blogs.len();
        let blog = page
            .blogs
            .into_iter()
            .next()
            .ok_or_else(|| FixError::BlogUnresolved("the store has no blogs".to_string()))?;

        if total > 1 {
            warn!(total, "Store has several blogs; only the first one is processed");
        }
        info!(blog_id = blog.id, handle = %blog.handle, "Resolved blog");
        Ok(blog)
    }
}
