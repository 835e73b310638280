//! Process-wide cache of server state, observed by display components.
//!
//! Writes are whole-collection replacements made after a successful fetch;
//! nothing patches a shared idea in place. The "voted for" projection is a
//! pure function of the snapshot and the current identity.

use std::collections::HashSet;
use std::sync::Arc;

use ideabox_core::idea::{self, Choice, Idea};
use ideabox_core::types::EntityId;
use tokio::sync::watch;

use crate::session::SessionStore;

/// Everything the board displays, as last fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub ideas: Vec<Idea>,
    pub choices: Vec<Choice>,
}

/// Reactive store of ideas and reference choices.
pub struct IdeaStore {
    snapshot: watch::Sender<BoardSnapshot>,
    session: Arc<SessionStore>,
}

impl IdeaStore {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            snapshot: watch::Sender::new(BoardSnapshot::default()),
            session,
        }
    }

    /// Replace the idea collection with the result of a governing fetch.
    pub fn replace_ideas(&self, ideas: Vec<Idea>) {
        for inconsistent in ideas.iter().filter(|idea| !idea.has_consistent_votes()) {
            tracing::warn!(
                idea_id = %inconsistent.id,
                vote_count = inconsistent.vote_count,
                votes = inconsistent.votes.len(),
                "Server returned inconsistent vote data",
            );
        }
        tracing::debug!(count = ideas.len(), "Idea collection replaced");
        self.snapshot.send_modify(|snapshot| snapshot.ideas = ideas);
    }

    /// Replace the reference taxonomy.
    pub fn replace_choices(&self, choices: Vec<Choice>) {
        self.snapshot.send_modify(|snapshot| snapshot.choices = choices);
    }

    pub fn ideas(&self) -> Vec<Idea> {
        self.snapshot.borrow().ideas.clone()
    }

    pub fn choices(&self) -> Vec<Choice> {
        self.snapshot.borrow().choices.clone()
    }

    pub fn has_choices(&self) -> bool {
        !self.snapshot.borrow().choices.is_empty()
    }

    /// The idea with `id` from the current snapshot.
    pub fn find(&self, id: &str) -> Option<Idea> {
        self.snapshot
            .borrow()
            .ideas
            .iter()
            .find(|idea| idea.id == id)
            .cloned()
    }

    /// Ids of the ideas the current identity has voted for.
    pub fn voted_for(&self) -> HashSet<EntityId> {
        let identity = self.session.identity();
        idea::voted_idea_ids(&self.snapshot.borrow().ideas, identity.as_deref())
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.snapshot.subscribe()
    }
}
