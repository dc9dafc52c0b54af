//! The post source the collector walks.

use async_trait::async_trait;

use crate::api::client::PlatformApi;
use crate::api::types::{PostDetail, RawPost};
use crate::error::Result;

/// Anything that can list pages of posts and return post details.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch the listing page starting at `offset`.
    async fn fetch_page(&self, service: &str, user_id: &str, offset: u64) -> Result<Vec<RawPost>>;

    /// Fetch the full detail of one post.
    async fn fetch_post(&self, service: &str, user_id: &str, post_id: &str) -> Result<PostDetail>;

    /// Public link of a post.
    fn post_link(&self, service: &str, user_id: &str, post_id: &str) -> String;
}

#[async_trait]
impl PostSource for PlatformApi {
    async fn fetch_page(&self, service: &str, user_id: &str, offset: u64) -> Result<Vec<RawPost>> {
        self.get_posts(service, user_id, offset).await
    }

    async fn fetch_post(&self, service: &str, user_id: &str, post_id: &str) -> Result<PostDetail> {
        self.get_post(service, user_id, post_id).await
    }

    fn post_link(&self, service: &str, user_id: &str, post_id: &str) -> String {
        PlatformApi::post_link(self, service, user_id, post_id)
    }
}
