use crate::{PostStore, client::Result};
use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use voteboard_common::model::{
    Id,
    post::{Post, PostContent, PostMarker},
    vote::Vote,
};

/// Posts kept in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Post>,
    last_id: i64,
    last_timestamp: Option<OffsetDateTime>,
}

impl Table {
    fn next_timestamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let timestamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let mut posts = self.table.lock().await.rows.clone();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find(|post| post.id == post_id).cloned())
    }

    async fn create_post(&self, content: &PostContent) -> Result<Post> {
        let mut table = self.table.lock().await;

        table.last_id += 1;
        let post = Post {
            id: table.last_id.into(),
            content: content.clone(),
            votes: 0,
            timestamp: table.next_timestamp(),
            voters: Vec::new(),
        };
        table.rows.push(post.clone());

        Ok(post)
    }

    async fn update_votes(
        &self,
        post_id: Id<PostMarker>,
        votes: i64,
        voters: &[Vote],
    ) -> Result<Option<Post>> {
        let mut table = self.table.lock().await;

        let Some(post) = table.rows.iter_mut().find(|post| post.id == post_id) else {
            return Ok(None);
        };
        post.votes = votes;
        post.voters = voters.to_vec();

        Ok(Some(post.clone()))
    }
}
