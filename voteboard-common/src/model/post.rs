use crate::model::{
    Id,
    vote::{Vote, VoteChange, VoteType, VoterId},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::Error,
};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub content: PostContent,
    pub votes: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub voters: Vec<Vote>,
}

/// Body of a post creation request.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NewPost {
    pub content: PostContent,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct PostContent(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Content is required")]
pub struct EmptyPostContentError;

impl PostContent {
    pub fn new(content: String) -> Result<Self, EmptyPostContentError> {
        if content.is_empty() {
            Err(EmptyPostContentError)
        } else {
            Ok(PostContent(content))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostContent::new(inner).map_err(Error::custom)
    }
}

impl Post {
    /// Applies one user's vote to the post in memory.
    ///
    /// Only the first voter entry matching `voter` is considered. Resubmitting the
    /// direction a user already voted retracts their vote; the opposite direction
    /// flips it in place. `votes` moves by the matching delta so that it keeps
    /// equalling the sum over `voters`.
    pub fn apply_vote(&mut self, voter: &VoterId, vote_type: VoteType) -> VoteChange {
        let existing = self
            .voters
            .iter()
            .position(|vote| vote.user_id == *voter);

        match existing {
            None => {
                self.voters.push(Vote {
                    user_id: voter.clone(),
                    vote_type,
                });
                self.votes += vote_type.value();
                VoteChange::Cast
            }
            Some(index) if self.voters[index].vote_type == vote_type => {
                self.voters.remove(index);
                self.votes -= vote_type.value();
                VoteChange::Retracted
            }
            Some(index) => {
                self.voters[index].vote_type = vote_type;
                self.votes += 2 * vote_type.value();
                VoteChange::Flipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        post::{NewPost, Post, PostContent},
        vote::{Vote, VoteChange, VoteType, VoterId},
    };
    use time::macros::datetime;

    fn voter(id: &str) -> VoterId {
        VoterId::new(id.to_owned()).unwrap()
    }

    fn empty_post() -> Post {
        Post {
            id: Id::new(1),
            content: PostContent::new("hello".to_owned()).unwrap(),
            votes: 0,
            timestamp: datetime!(2025-06-01 12:00 UTC),
            voters: Vec::new(),
        }
    }

    #[test]
    fn first_vote_is_cast() {
        let mut post = empty_post();

        assert_eq!(post.apply_vote(&voter("u1"), VoteType::Up), VoteChange::Cast);
        assert_eq!(post.votes, 1);
        assert_eq!(
            post.voters,
            vec![Vote {
                user_id: voter("u1"),
                vote_type: VoteType::Up
            }]
        );
    }

    #[test]
    fn same_direction_retracts() {
        let mut post = empty_post();
        post.apply_vote(&voter("u1"), VoteType::Down);
        post.apply_vote(&voter("u2"), VoteType::Up);

        assert_eq!(
            post.apply_vote(&voter("u1"), VoteType::Down),
            VoteChange::Retracted
        );
        assert_eq!(post.votes, 1);
        assert_eq!(post.voters.len(), 1);
        assert_eq!(post.voters[0].user_id, voter("u2"));
    }

    #[test]
    fn opposite_direction_flips_in_place() {
        let mut post = empty_post();
        post.apply_vote(&voter("u1"), VoteType::Up);
        post.apply_vote(&voter("u2"), VoteType::Up);

        assert_eq!(
            post.apply_vote(&voter("u1"), VoteType::Down),
            VoteChange::Flipped
        );
        assert_eq!(post.votes, 0);
        assert_eq!(post.voters.len(), 2);
        assert_eq!(post.voters[0].user_id, voter("u1"));
        assert_eq!(post.voters[0].vote_type, VoteType::Down);
    }

    #[test]
    fn flip_then_retract() {
        let mut post = empty_post();
        post.apply_vote(&voter("u1"), VoteType::Up);
        assert_eq!(post.votes, 1);

        post.apply_vote(&voter("u1"), VoteType::Down);
        assert_eq!(post.votes, -1);
        assert_eq!(post.voters[0].vote_type, VoteType::Down);

        post.apply_vote(&voter("u1"), VoteType::Down);
        assert_eq!(post.votes, 0);
        assert!(post.voters.is_empty());
    }

    #[test]
    fn duplicate_voter_entries_only_touch_the_first() {
        let mut post = empty_post();
        post.voters = vec![
            Vote {
                user_id: voter("u1"),
                vote_type: VoteType::Up,
            },
            Vote {
                user_id: voter("u1"),
                vote_type: VoteType::Down,
            },
        ];

        assert_eq!(
            post.apply_vote(&voter("u1"), VoteType::Down),
            VoteChange::Flipped
        );
        assert_eq!(post.voters[0].vote_type, VoteType::Down);
        assert_eq!(post.voters[1].vote_type, VoteType::Down);
        assert_eq!(post.votes, -2);
    }

    #[test]
    fn votes_track_sum_of_voters() {
        let mut post = empty_post();
        let sequence = [
            ("a", VoteType::Up),
            ("b", VoteType::Down),
            ("a", VoteType::Down),
            ("c", VoteType::Up),
            ("b", VoteType::Down),
            ("a", VoteType::Up),
            ("c", VoteType::Up),
        ];

        for (user, vote_type) in sequence {
            post.apply_vote(&voter(user), vote_type);
            let sum: i64 = post.voters.iter().map(|vote| vote.vote_type.value()).sum();
            assert_eq!(post.votes, sum);
        }
    }

    #[test]
    fn empty_content_is_rejected() {
        assert!(PostContent::new(String::new()).is_err());
        assert!(PostContent::new(" ".to_owned()).is_ok());

        let err = serde_json::from_str::<NewPost>(r#"{"content": ""}"#).unwrap_err();
        assert!(err.to_string().starts_with("Content is required"));
        assert!(serde_json::from_str::<NewPost>("{}").is_err());
        assert!(serde_json::from_str::<NewPost>(r#"{"content": null}"#).is_err());

        let new_post: NewPost = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(new_post.content.get(), "hi");
    }

    #[test]
    fn post_json_shape() {
        let mut post = empty_post();
        post.apply_vote(&voter("u1"), VoteType::Down);

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "content": "hello",
                "votes": -1,
                "timestamp": "2025-06-01T12:00:00Z",
                "voters": [{"userId": "u1", "voteType": -1}],
            })
        );

        let parsed: Post = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, post);
    }
}
