use crate::server::{
    Result, ServerError, ServerRouter,
    json::{Created, Json},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use voteboard_common::model::{
    Id,
    post::{NewPost, Post, PostMarker},
    vote::CastVote,
};
use voteboard_db::PostStore;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_post(vote_post)
}

#[derive(TypedPath)]
#[typed_path("/api/posts")]
struct PostsPath;

async fn list_posts(
    _: PostsPath,
    State(store): State<Arc<dyn PostStore>>,
) -> Result<Json<Vec<Post>>> {
    let posts = store.fetch_posts().await.map_err(ServerError::ListPosts)?;
    debug!(count = posts.len(), "Listing posts");

    Ok(Json(posts))
}

async fn create_post(
    _: PostsPath,
    State(store): State<Arc<dyn PostStore>>,
    Json(NewPost { content }): Json<NewPost>,
) -> Result<Created<Post>> {
    let post = store
        .create_post(&content)
        .await
        .map_err(ServerError::CreatePost)?;
    info!(post_id = %post.id, "Created post");

    Ok(Created(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{post_id}/vote", rejection(ServerError))]
struct VotePath {
    post_id: Id<PostMarker>,
}

/// Fetches the post, applies the vote in memory and writes voters and count back
/// in one update. Nothing guards the post between the fetch and the write, so a
/// concurrent vote can be overwritten.
async fn vote_post(
    VotePath { post_id }: VotePath,
    State(store): State<Arc<dyn PostStore>>,
    Json(CastVote { user_id, vote_type }): Json<CastVote>,
) -> Result<Json<Post>> {
    let mut post = store
        .fetch_post(post_id)
        .await
        .map_err(|err| {
            warn!(%post_id, error = %err, "Fetching post to vote on failed");
            ServerError::PostByIdNotFound(post_id)
        })?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;

    let change = post.apply_vote(&user_id, vote_type);

    let post = store
        .update_votes(post_id, post.votes, &post.voters)
        .await
        .map_err(ServerError::UpdatePost)?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;
    info!(%post_id, user_id = user_id.get(), ?change, votes = post.votes, "Recorded vote");

    Ok(Json(post))
}
