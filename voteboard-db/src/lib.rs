//! Storage boundary for posts.
//!
//! The service keeps no state of its own: every read and write goes through a
//! [`PostStore`]. [`client::DbClient`] talks to the hosted PostgreSQL `posts`
//! table, [`memory::MemoryStore`] keeps posts in process for local runs.

pub mod client;
pub mod memory;
mod record;

use async_trait::async_trait;
use client::Result;
use voteboard_common::model::{
    Id,
    post::{Post, PostContent, PostMarker},
    vote::Vote,
};

#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, newest first.
    async fn fetch_posts(&self) -> Result<Vec<Post>>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Inserts a post with no votes and a store-assigned id and timestamp.
    async fn create_post(&self, content: &PostContent) -> Result<Post>;

    /// Overwrites the vote count and voters of a post in a single update.
    ///
    /// Returns `None` if no post with that id exists.
    async fn update_votes(
        &self,
        post_id: Id<PostMarker>,
        votes: i64,
        voters: &[Vote],
    ) -> Result<Option<Post>>;

    async fn close(&self) {}
}
