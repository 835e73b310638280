//! User intents on the board, sequenced against the backend.
//!
//! Every mutating action follows the same shape:
//!
//! 1. validate local input (invalid input changes nothing and sends nothing);
//! 2. raise `loading` and issue the call;
//! 3. on success, move the popup to its next state and run the governing
//!    fetch (the board list, or the open idea's detail for comment views);
//! 4. on failure, drop `loading` and show the error popup, remembering the
//!    popup to return to once the error is dismissed.
//!
//! Nothing is updated optimistically. Vote counts in particular are only
//! ever taken from a fetch that follows the vote.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ideabox_core::error::CoreError;
use ideabox_core::idea::{Idea, IdeaStatus};
use ideabox_core::input::{CommentDraft, IdeaDraft};
use ideabox_core::types::EntityId;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{IdeaBoxApi, IdeaQuery};
use crate::error::{ApiError, BoardError};
use crate::store::IdeaStore;

/// The single modal shown over the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PopupState {
    #[default]
    Closed = 0,
    ComposingNew = 1,
    Editing = 2,
    ConfirmingDelete = 3,
    ViewingDetails = 4,
    ConfirmingCommentDelete = 5,
    BulkStatusPicker = 6,
    Error = 99,
}

impl PopupState {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Which collection the board lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    AllIdeas,
    FavouriteIdeas,
}

/// Interaction state of one board view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub popup: PopupState,
    pub loading: bool,
    pub tab: Tab,
    pub search: String,
    /// Idea being edited, deleted, or viewed; fetched fresh for details.
    pub active_idea: Option<Idea>,
    /// Comment awaiting delete confirmation.
    pub pending_comment: Option<EntityId>,
    /// Ideas ticked for a bulk status change.
    pub selection: BTreeSet<EntityId>,
    pub error_message: Option<String>,
    /// Popup restored when the error popup is dismissed.
    pub resume_popup: PopupState,
}

/// Coordinates user actions, network calls, and the [`IdeaStore`].
pub struct IdeaBoard {
    api: Arc<IdeaBoxApi>,
    store: Arc<IdeaStore>,
    view: watch::Sender<ViewState>,
    choices_loaded: AtomicBool,
    cancel: CancellationToken,
}

impl IdeaBoard {
    pub fn new(api: Arc<IdeaBoxApi>, store: Arc<IdeaStore>) -> Self {
        Self {
            api,
            store,
            view: watch::Sender::new(ViewState::default()),
            choices_loaded: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &Arc<IdeaStore> {
        &self.store
    }

    pub fn view_state(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn popup(&self) -> PopupState {
        self.view.borrow().popup
    }

    pub fn is_loading(&self) -> bool {
        self.view.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    // ---- loading & navigation within the board ----

    /// Initial load: ideas for the active tab plus the choice taxonomy.
    pub async fn load(&self) -> Result<(), BoardError> {
        self.perform("load board", async {
            self.refresh().await?;
            self.fetch_choices(false).await
        })
        .await
    }

    /// Switch tabs and re-issue the governing fetch. The popup is kept.
    pub async fn select_tab(&self, tab: Tab) -> Result<(), BoardError> {
        self.view.send_modify(|view| view.tab = tab);
        self.perform("load ideas", self.refresh()).await
    }

    /// Change the search term and re-issue the governing fetch.
    pub async fn search(&self, term: &str) -> Result<(), BoardError> {
        let term = term.trim().to_string();
        self.view.send_modify(|view| view.search = term);
        self.perform("search ideas", self.refresh()).await
    }

    /// Fetch the taxonomy unless this view already did.
    pub async fn load_choices(&self) -> Result<(), BoardError> {
        self.perform("load choices", self.fetch_choices(false)).await
    }

    pub async fn reload_choices(&self) -> Result<(), BoardError> {
        self.perform("load choices", self.fetch_choices(true)).await
    }

    // ---- create / edit / delete ----

    pub fn open_new(&self) {
        self.view.send_modify(|view| view.active_idea = None);
        self.transition(PopupState::ComposingNew);
    }

    pub async fn create_idea(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<(), BoardError> {
        let draft = IdeaDraft::new(title, description).validated()?;
        self.perform("create idea", async {
            let created = self.guarded(self.api.create_idea(&draft)).await?;
            tracing::info!(idea_id = %created.id, "Idea created");
            self.close();
            self.refresh().await
        })
        .await
    }

    pub fn open_edit(&self, id: &str) -> Result<(), BoardError> {
        self.open_with(id, PopupState::Editing)
    }

    pub async fn update_idea(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<(), BoardError> {
        let id = self.active_idea_id()?;
        let draft = IdeaDraft::new(title, description).validated()?;
        self.perform("update idea", async {
            self.guarded(self.api.update_idea(&id, &draft)).await?;
            self.close();
            self.refresh().await
        })
        .await
    }

    pub fn open_delete(&self, id: &str) -> Result<(), BoardError> {
        self.open_with(id, PopupState::ConfirmingDelete)
    }

    pub async fn confirm_delete(&self) -> Result<(), BoardError> {
        let id = self.active_idea_id()?;
        self.perform("delete idea", async {
            self.guarded(self.api.remove_idea(&id)).await?;
            self.close();
            self.refresh().await
        })
        .await
    }

    // ---- details & comments ----

    /// Fetch a fresh copy of the idea and show its details.
    pub async fn open_details(&self, id: &str) -> Result<(), BoardError> {
        self.perform("load idea", async {
            let idea = self.guarded(self.api.get_idea(id)).await?;
            self.show_details(idea);
            self.transition(PopupState::ViewingDetails);
            Ok(())
        })
        .await
    }

    pub async fn add_comment(&self, text: &str) -> Result<(), BoardError> {
        let id = self.active_idea_id()?;
        let draft = CommentDraft::parse(text)?;
        self.perform("add comment", async {
            self.guarded(self.api.add_comment(&id, &draft)).await?;
            self.transition(PopupState::ViewingDetails);
            self.refresh_details(&id).await
        })
        .await
    }

    pub fn request_comment_delete(&self, comment_id: &str) -> Result<(), BoardError> {
        self.active_idea_id()?;
        let comment_id = comment_id.to_string();
        self.view
            .send_modify(|view| view.pending_comment = Some(comment_id));
        self.transition(PopupState::ConfirmingCommentDelete);
        Ok(())
    }

    pub async fn confirm_comment_delete(&self) -> Result<(), BoardError> {
        let id = self.active_idea_id()?;
        let Some(comment_id) = self.view.borrow().pending_comment.clone() else {
            return Err(CoreError::Validation("No comment chosen for deletion".into()).into());
        };
        self.perform("delete comment", async {
            self.guarded(self.api.remove_comment(&id, &comment_id)).await?;
            self.view.send_modify(|view| view.pending_comment = None);
            self.transition(PopupState::ViewingDetails);
            self.refresh_details(&id).await
        })
        .await
    }

    // ---- votes ----

    pub async fn vote(&self, id: &str) -> Result<(), BoardError> {
        self.perform("vote", async {
            self.guarded(self.api.add_vote(id)).await?;
            self.after_vote(id).await
        })
        .await
    }

    pub async fn unvote(&self, id: &str) -> Result<(), BoardError> {
        self.perform("unvote", async {
            self.guarded(self.api.remove_vote(id)).await?;
            self.after_vote(id).await
        })
        .await
    }

    // ---- bulk status ----

    /// Tick or untick an idea; returns whether it is now selected.
    pub fn toggle_selection(&self, id: &str) -> bool {
        let mut selected = false;
        self.view.send_modify(|view| {
            selected = view.selection.insert(id.to_string());
            if !selected {
                view.selection.remove(id);
            }
        });
        selected
    }

    pub fn selection(&self) -> BTreeSet<EntityId> {
        self.view.borrow().selection.clone()
    }

    pub fn open_bulk_status(&self) -> Result<(), BoardError> {
        if self.view.borrow().selection.is_empty() {
            return Err(BoardError::EmptySelection);
        }
        self.transition(PopupState::BulkStatusPicker);
        Ok(())
    }

    /// Apply `status` to every selected idea.
    ///
    /// An empty status is refused before `loading` is touched: no call is
    /// made and the popup stays open.
    pub async fn apply_bulk_status(&self, status: &str) -> Result<(), BoardError> {
        let status = status.trim();
        if status.is_empty() {
            tracing::warn!("Bulk status change without a status, skipped");
            return Err(CoreError::Validation("A status must be chosen".into()).into());
        }
        let status: IdeaStatus = status.parse()?;
        let ids: Vec<EntityId> = self.selection().into_iter().collect();
        if ids.is_empty() {
            return Err(BoardError::EmptySelection);
        }

        self.perform("change status", async {
            let ack = self
                .guarded(self.api.update_status(ids.clone(), status))
                .await?;
            tracing::info!(count = ids.len(), %status, message = %ack.message, "Status changed");
            self.view.send_modify(|view| view.selection.clear());
            self.close();
            self.refresh().await
        })
        .await
    }

    // ---- popup control ----

    /// Close whatever popup is open and forget transient choices.
    pub fn cancel_popup(&self) {
        self.view.send_modify(|view| {
            view.selection.clear();
            view.pending_comment = None;
        });
        self.close();
    }

    /// Leave the error popup for the popup that was open when it failed.
    pub fn dismiss_error(&self) {
        self.view.send_modify(|view| {
            if view.popup == PopupState::Error {
                view.popup = view.resume_popup;
                view.resume_popup = PopupState::Closed;
                view.error_message = None;
            }
        });
    }

    /// Tear the view down; in-flight results are discarded from now on.
    pub fn teardown(&self) {
        self.cancel.cancel();
        tracing::debug!("Board view torn down");
    }

    // ---- internals ----

    /// Governing fetch for the active tab and search term.
    async fn refresh(&self) -> Result<(), BoardError> {
        let query = {
            let view = self.view.borrow();
            IdeaQuery {
                search: view.search.clone(),
                favourite: view.tab == Tab::FavouriteIdeas,
            }
        };
        let ideas = self.guarded(self.api.list_ideas(&query)).await?;
        self.store.replace_ideas(ideas);
        Ok(())
    }

    /// Governing fetch for the detail views.
    async fn refresh_details(&self, id: &str) -> Result<(), BoardError> {
        let idea = self.guarded(self.api.get_idea(id)).await?;
        self.show_details(idea);
        Ok(())
    }

    async fn after_vote(&self, id: &str) -> Result<(), BoardError> {
        self.refresh().await?;
        let details_open = {
            let view = self.view.borrow();
            view.popup == PopupState::ViewingDetails
                && view.active_idea.as_ref().is_some_and(|idea| idea.id == id)
        };
        if details_open {
            self.refresh_details(id).await?;
        }
        Ok(())
    }

    async fn fetch_choices(&self, force: bool) -> Result<(), BoardError> {
        if !force && self.choices_loaded.load(Ordering::Acquire) {
            return Ok(());
        }
        let choices = self.guarded(self.api.list_choices()).await?;
        self.store.replace_choices(choices);
        self.choices_loaded.store(true, Ordering::Release);
        Ok(())
    }

    fn show_details(&self, mut idea: Idea) {
        idea.sort_comments_by_recency();
        self.view.send_modify(|view| view.active_idea = Some(idea));
    }

    fn open_with(&self, id: &str, popup: PopupState) -> Result<(), BoardError> {
        let idea = self.store.find(id).ok_or(BoardError::NoActiveIdea)?;
        self.view.send_modify(|view| view.active_idea = Some(idea));
        self.transition(popup);
        Ok(())
    }

    fn active_idea_id(&self) -> Result<EntityId, BoardError> {
        self.view
            .borrow()
            .active_idea
            .as_ref()
            .map(|idea| idea.id.clone())
            .ok_or(BoardError::NoActiveIdea)
    }

    fn close(&self) {
        self.view.send_modify(|view| view.active_idea = None);
        self.transition(PopupState::Closed);
    }

    fn transition(&self, popup: PopupState) {
        self.view.send_modify(|view| {
            if view.popup != popup {
                tracing::debug!(from = view.popup.code(), to = popup.code(), "Popup transition");
            }
            view.popup = popup;
        });
    }

    /// Run one action with the loading flag raised, routing failures into
    /// the error popup. Cancelled work applies nothing further.
    async fn perform(
        &self,
        action: &'static str,
        work: impl Future<Output = Result<(), BoardError>>,
    ) -> Result<(), BoardError> {
        if self.cancel.is_cancelled() {
            return Err(BoardError::Cancelled);
        }

        self.view.send_modify(|view| view.loading = true);
        match work.await {
            Ok(()) => {
                self.view.send_modify(|view| view.loading = false);
                Ok(())
            }
            Err(BoardError::Cancelled) => {
                tracing::debug!(action, "Discarded result of torn-down view");
                Err(BoardError::Cancelled)
            }
            Err(e) => {
                self.fail(action, &e);
                Err(e)
            }
        }
    }

    fn fail(&self, action: &'static str, error: &BoardError) {
        let message = match error {
            BoardError::Api(api) => api.user_message(),
            other => other.to_string(),
        };
        tracing::error!(action, error = %error, "Action failed");

        self.view.send_modify(|view| {
            view.loading = false;
            if view.popup != PopupState::Error {
                view.resume_popup = view.popup;
            }
            view.popup = PopupState::Error;
            view.error_message = Some(message);
        });
    }

    /// Await `call` unless the view is torn down first.
    async fn guarded<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, BoardError> {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Err(BoardError::Cancelled),
            result = call => result,
        };
        if self.cancel.is_cancelled() {
            return Err(BoardError::Cancelled);
        }
        result.map_err(BoardError::from)
    }
}
