use serde::{
    Deserialize, Deserializer, Serialize,
    de::Error,
};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: VoterId,
    pub vote_type: VoteType,
}

/// Body of a vote request.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVote {
    pub user_id: VoterId,
    pub vote_type: VoteType,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteType {
    Up,
    Down,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Vote type must be 1 or -1, got {0}")]
pub struct InvalidVoteTypeError(i64);

impl VoteType {
    #[must_use]
    pub fn value(self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

impl TryFrom<i64> for VoteType {
    type Error = InvalidVoteTypeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteType::Up),
            -1 => Ok(VoteType::Down),
            other => Err(InvalidVoteTypeError(other)),
        }
    }
}

impl From<VoteType> for i64 {
    fn from(value: VoteType) -> Self {
        value.value()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct VoterId(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The user id must not be empty")]
pub struct InvalidVoterIdError;

impl VoterId {
    pub fn new(id: String) -> Result<Self, InvalidVoterIdError> {
        if id.is_empty() {
            Err(InvalidVoterIdError)
        } else {
            Ok(VoterId(id))
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

impl<'de> Deserialize<'de> for VoterId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        VoterId::new(inner).map_err(Error::custom)
    }
}

/// How a vote request changed a post.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum VoteChange {
    Cast,
    Retracted,
    Flipped,
}
