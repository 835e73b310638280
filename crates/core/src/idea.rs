//! Idea board entities as they travel over the wire.
//!
//! The backend speaks camelCase JSON and keys ideas and choices by `_id`.
//! Votes and comments are owned by their idea and only ever change through
//! a server round-trip.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of an idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    New,
    Shortlist,
    Selected,
    Rejected,
}

impl IdeaStatus {
    pub const ALL: [IdeaStatus; 4] = [
        IdeaStatus::New,
        IdeaStatus::Shortlist,
        IdeaStatus::Selected,
        IdeaStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IdeaStatus::New => "new",
            IdeaStatus::Shortlist => "shortlist",
            IdeaStatus::Selected => "selected",
            IdeaStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaStatus {
    type Err = CoreError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        IdeaStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == code)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid status '{code}'. Must be one of: new, shortlist, selected, rejected"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A single vote cast on an idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: EntityId,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// A comment left on an idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub text: String,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// One audited change to an idea's editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaHistory {
    pub id: EntityId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<IdeaStatus>,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// An idea on the board, exactly as the server last reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: IdeaStatus,
    pub vote_count: u32,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<IdeaHistory>>,
    pub created_by: String,
    pub created_at: Timestamp,
    pub modified_by: String,
    pub modified_at: Timestamp,
}

impl Idea {
    /// Whether `voter` has a vote on this idea.
    pub fn has_vote_from(&self, voter: &str) -> bool {
        self.votes.iter().any(|vote| vote.created_by == voter)
    }

    /// `voteCount == len(votes)` and no voter appears twice.
    pub fn has_consistent_votes(&self) -> bool {
        let mut voters = HashSet::with_capacity(self.votes.len());
        self.vote_count as usize == self.votes.len()
            && self.votes.iter().all(|vote| voters.insert(vote.created_by.as_str()))
    }

    /// Order comments newest first for display.
    pub fn sort_comments_by_recency(&mut self) {
        self.comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

/// Taxonomy entry used to populate status and field pickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    pub field: String,
    pub code: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    pub is_selectable: bool,
}

/// Selectable taxonomy entries for a given picker `field`.
pub fn selectable_for<'a>(choices: &'a [Choice], field: &str) -> Vec<&'a Choice> {
    choices
        .iter()
        .filter(|choice| choice.field == field && choice.is_selectable)
        .collect()
}

/// Ids of the ideas `identity` has voted for.
///
/// Always recomputed from the current snapshot; never cached alongside it.
pub fn voted_idea_ids(ideas: &[Idea], identity: Option<&str>) -> HashSet<EntityId> {
    let Some(voter) = identity else {
        return HashSet::new();
    };
    ideas
        .iter()
        .filter(|idea| idea.has_vote_from(voter))
        .map(|idea| idea.id.clone())
        .collect()
}
