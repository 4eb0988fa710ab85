use crate::{PostStore, record::PostRecord};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions, query_as, types::Json};
use thiserror::Error;
use tracing::{debug, info};
use voteboard_common::model::{
    Id, ModelValidationError,
    post::{Post, PostContent, PostMarker},
    vote::Vote,
};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Client for the `posts` table of the hosted PostgreSQL database.
///
/// Expected columns: `id` (integer key), `content` (text), `votes` (integer),
/// `timestamp` (timestamp with time zone) and `voters` (json array of
/// `{"userId", "voteType"}` objects).
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        debug!(max_connections, "Connecting to database");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Database pool connected");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PostStore for DbClient {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(
            r#"
            SELECT
                posts.id::int8 AS id,
                posts.content,
                posts.votes::int8 AS votes,
                posts."timestamp"::timestamptz AS "timestamp",
                posts.voters::jsonb AS voters
            FROM
                posts
            ORDER BY
                posts."timestamp" DESC,
                posts.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            r#"
            SELECT
                posts.id::int8 AS id,
                posts.content,
                posts.votes::int8 AS votes,
                posts."timestamp"::timestamptz AS "timestamp",
                posts.voters::jsonb AS voters
            FROM
                posts
            WHERE
                posts.id = $1
            "#,
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn create_post(&self, content: &PostContent) -> Result<Post> {
        let record = query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts (content, votes, "timestamp", voters)
            VALUES ($1, 0, now(), '[]'::jsonb)
            RETURNING
                posts.id::int8 AS id,
                posts.content,
                posts.votes::int8 AS votes,
                posts."timestamp"::timestamptz AS "timestamp",
                posts.voters::jsonb AS voters
            "#,
        )
        .bind(content.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(Post::try_from(record)?)
    }

    async fn update_votes(
        &self,
        post_id: Id<PostMarker>,
        votes: i64,
        voters: &[Vote],
    ) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            r#"
            UPDATE posts
            SET
                votes = $2,
                voters = $3
            WHERE
                posts.id = $1
            RETURNING
                posts.id::int8 AS id,
                posts.content,
                posts.votes::int8 AS votes,
                posts."timestamp"::timestamptz AS "timestamp",
                posts.voters::jsonb AS voters
            "#,
        )
        .bind(post_id.get())
        .bind(votes)
        .bind(Json(voters))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
