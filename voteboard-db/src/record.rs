use sqlx::{FromRow, types::Json};
use time::OffsetDateTime;
use voteboard_common::model::{
    ModelValidationError,
    post::{Post, PostContent},
    vote::Vote,
};

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct PostRecord {
    pub id: i64,
    pub content: String,
    pub votes: Option<i64>,
    pub timestamp: OffsetDateTime,
    pub voters: Option<Json<Vec<Vote>>>,
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            content: PostContent::new(value.content)?,
            votes: value.votes.unwrap_or(0),
            timestamp: value.timestamp,
            voters: value.voters.map(|Json(voters)| voters).unwrap_or_default(),
        })
    }
}
