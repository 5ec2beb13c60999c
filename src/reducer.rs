//! Message Reducer
//!
//! Folds forwarded stream events into an ordered message list. Every fold
//! step either inserts a new message, appends a delta fragment to an
//! existing one, or replaces an existing one wholesale, and then re-sorts the
//! list by `sort`. The sort is stable, so messages with equal keys keep the
//! order in which they were first inserted.

use std::sync::Arc;

use crate::classify::{EventShape, shape};
use crate::message::{ContentPart, Message};
use crate::wire::StreamEvent;

/// Immutable view of the message list at one point in time.
pub type Snapshot = Arc<[Message]>;

/// What a fold step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// First sighting of the id.
    Inserted,
    /// Delta text appended to the existing message.
    Appended,
    /// Existing message replaced wholesale.
    Replaced,
}

/// Description of a single change to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub id: String,
    pub kind: MutationKind,
}

/// Ordered message list with at most one entry per id.
#[derive(Debug, Clone, Default)]
pub struct MessageReducer {
    messages: Vec<Message>,
}

impl MessageReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing messages (e.g. a rendered history); they are
    /// sorted on the way in. Later duplicates of an id replace earlier ones.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut reducer = Self::new();
        for message in messages {
            reducer.upsert(message);
        }
        reducer.resort();
        reducer
    }

    /// Fold one event into the list.
    ///
    /// Returns `None` for control records, which never touch the list.
    pub fn apply(&mut self, event: &StreamEvent) -> Option<Mutation> {
        if event.is_sentinel() {
            return None;
        }

        let kind = match self.position(&event.id) {
            None => {
                self.messages.push(Message::from_event(event));
                MutationKind::Inserted
            }
            Some(idx) => {
                let existing = &mut self.messages[idx];
                if shape(event) == EventShape::Delta && existing.text().is_some() {
                    if let Some(ContentPart::Text { text }) = existing.content.first_mut() {
                        text.push_str(&event.content);
                    }
                    existing.is_in_process = event.is_in_process;
                    existing.is_delta = event.is_delta;
                    existing.sort = event.sort;
                    MutationKind::Appended
                } else {
                    *existing = Message::from_event(event);
                    MutationKind::Replaced
                }
            }
        };

        self.resort();
        Some(Mutation {
            id: event.id.clone(),
            kind,
        })
    }

    /// Insert or replace a locally created message (optimistic user echo,
    /// synthetic error) through the same ordering path as streamed ones.
    pub fn insert_local(&mut self, message: Message) -> Mutation {
        let id = message.id.clone();
        let kind = self.upsert(message);
        self.resort();
        Mutation { id, kind }
    }

    /// Append an assistant message carrying `text` at the end of the list.
    pub fn push_error(&mut self, text: impl Into<String>) -> Mutation {
        self.insert_local(Message::error_notice(text))
    }

    /// Sort key that places a new local message after everything present.
    pub fn next_local_sort(&self) -> f64 {
        self.messages
            .iter()
            .map(|m| m.sort)
            .fold(0.0_f64, f64::max)
            + 1.0
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::from(self.messages.as_slice())
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    fn upsert(&mut self, message: Message) -> MutationKind {
        match self.position(&message.id) {
            Some(idx) => {
                self.messages[idx] = message;
                MutationKind::Replaced
            }
            None => {
                self.messages.push(message);
                MutationKind::Inserted
            }
        }
    }

    fn resort(&mut self) {
        self.messages.sort_by(|a, b| a.sort.total_cmp(&b.sort));
    }
}

static_assertions::assert_impl_all!(MessageReducer: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{CUTOFF_ID, Role, STATE_SNAPSHOT_ID, ToolCallPayload};

    fn ids(reducer: &MessageReducer) -> Vec<&str> {
        reducer.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn inserts_new_messages() {
        let mut reducer = MessageReducer::new();
        let mutation = reducer.apply(&StreamEvent::assistant("m1", "hi", 1.0)).unwrap();
        assert_eq!(mutation.kind, MutationKind::Inserted);
        assert_eq!(mutation.id, "m1");
        assert_eq!(reducer.len(), 1);
    }

    #[test]
    fn accumulates_delta_text() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "Hello", 1.0).with_delta(false));
        let mutation = reducer
            .apply(
                &StreamEvent::assistant("m1", " world", 2.0)
                    .with_delta(true)
                    .with_in_process(true),
            )
            .unwrap();

        assert_eq!(mutation.kind, MutationKind::Appended);
        let msg = reducer.get("m1").unwrap();
        assert_eq!(msg.text(), Some("Hello world"));
        assert_eq!(msg.sort, 2.0);
        assert_eq!(msg.is_delta, Some(true));
        assert_eq!(msg.is_in_process, Some(true));
    }

    #[test]
    fn delta_keeps_auxiliary_fields_of_existing_message() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "a", 1.0).with_thinking("plan"));
        reducer.apply(&StreamEvent::assistant("m1", "b", 1.0).with_delta(true));
        let msg = reducer.get("m1").unwrap();
        assert_eq!(msg.text(), Some("ab"));
        assert_eq!(msg.thinking.as_deref(), Some("plan"));
    }

    #[test]
    fn first_delta_for_unknown_id_is_inserted_as_is() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "Hel", 1.0).with_delta(true));
        reducer.apply(&StreamEvent::assistant("m1", "lo", 1.0).with_delta(true));
        assert_eq!(reducer.get("m1").unwrap().text(), Some("Hello"));
    }

    #[test]
    fn non_delta_event_resets_text() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "draft", 1.0).with_delta(true));
        reducer.apply(&StreamEvent::assistant("m1", " more", 1.0).with_delta(true));
        let mutation = reducer
            .apply(&StreamEvent::assistant("m1", "final", 2.0).with_delta(false))
            .unwrap();
        assert_eq!(mutation.kind, MutationKind::Replaced);
        assert_eq!(reducer.get("m1").unwrap().text(), Some("final"));

        reducer.apply(&StreamEvent::assistant("m1", "!", 3.0).with_delta(true));
        assert_eq!(reducer.get("m1").unwrap().text(), Some("final!"));
    }

    #[test]
    fn tool_call_result_replaces_instead_of_appending() {
        let mut reducer = MessageReducer::new();
        reducer.apply(
            &StreamEvent::assistant("m1", "", 1.0).with_tool_call(ToolCallPayload::new("q", "{}")),
        );
        let mutation = reducer
            .apply(
                &StreamEvent::assistant("m1", "", 2.0)
                    .with_delta(true)
                    .with_tool_call(ToolCallPayload::new("q", "{}").with_result("42")),
            )
            .unwrap();

        assert_eq!(mutation.kind, MutationKind::Replaced);
        let msg = reducer.get("m1").unwrap();
        let calls = msg.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].result.as_deref(), Some("42"));
        assert_eq!(msg.sort, 2.0);
    }

    #[test]
    fn delta_onto_non_text_content_replaces() {
        let mut reducer = MessageReducer::new();
        let mut image = Message::new("m1", Role::Assistant, "", 1.0);
        image.content = vec![ContentPart::Image {
            image: "data:image/png;base64,AAAA".into(),
        }];
        reducer.insert_local(image);

        let mutation = reducer
            .apply(&StreamEvent::assistant("m1", "caption", 1.0).with_delta(true))
            .unwrap();
        assert_eq!(mutation.kind, MutationKind::Replaced);
        assert_eq!(reducer.get("m1").unwrap().text(), Some("caption"));
    }

    #[test]
    fn resorts_by_sort_key() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("b", "B", 5.0));
        reducer.apply(&StreamEvent::assistant("a", "A", 1.0));
        assert_eq!(ids(&reducer), vec!["a", "b"]);

        // Moving an existing message reorders it as well.
        reducer.apply(&StreamEvent::assistant("a", "A2", 9.0));
        assert_eq!(ids(&reducer), vec!["b", "a"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("x", "", 1.0));
        reducer.apply(&StreamEvent::assistant("y", "", 1.0));
        reducer.apply(&StreamEvent::assistant("z", "", 1.0));
        reducer.apply(&StreamEvent::assistant("x", "again", 1.0));
        assert_eq!(ids(&reducer), vec!["x", "y", "z"]);
    }

    #[test]
    fn sentinels_never_enter_the_list() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "hi", 1.0));
        let before = reducer.snapshot();
        for _ in 0..3 {
            assert!(reducer.apply(&StreamEvent::assistant(STATE_SNAPSHOT_ID, "", 0.0)).is_none());
            assert!(reducer.apply(&StreamEvent::assistant(CUTOFF_ID, "", 0.0)).is_none());
        }
        assert_eq!(&*reducer.snapshot(), &*before);
    }

    #[test]
    fn local_messages_share_ordering() {
        let mut reducer = MessageReducer::new();
        assert_eq!(reducer.next_local_sort(), 1.0);

        reducer.apply(&StreamEvent::assistant("m1", "hi", 4.0));
        let sort = reducer.next_local_sort();
        assert_eq!(sort, 5.0);
        let mutation = reducer.insert_local(Message::new("u1", Role::User, "again", sort));
        assert_eq!(mutation.kind, MutationKind::Inserted);
        assert_eq!(ids(&reducer), vec!["m1", "u1"]);

        let mutation = reducer.insert_local(Message::new("u1", Role::User, "edited", sort));
        assert_eq!(mutation.kind, MutationKind::Replaced);
        assert_eq!(reducer.len(), 2);
    }

    #[test]
    fn negative_sorts_still_yield_positive_local_sort() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "", -10.0));
        assert_eq!(reducer.next_local_sort(), 1.0);
    }

    #[test]
    fn push_error_lands_last() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "partial", 3.0));
        reducer.push_error("Stream error: connection reset");
        let last = reducer.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text(), Some("Stream error: connection reset"));
    }

    #[test]
    fn from_messages_sorts_and_dedups() {
        let reducer = MessageReducer::from_messages(vec![
            Message::new("b", Role::Assistant, "B", 2.0),
            Message::new("a", Role::User, "A", 1.0),
            Message::new("b", Role::Assistant, "B2", 2.0),
        ]);
        assert_eq!(ids(&reducer), vec!["a", "b"]);
        assert_eq!(reducer.get("b").unwrap().text(), Some("B2"));
    }

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let mut reducer = MessageReducer::new();
        reducer.apply(&StreamEvent::assistant("m1", "a", 1.0));
        let snap = reducer.snapshot();
        reducer.apply(&StreamEvent::assistant("m1", "b", 1.0).with_delta(true));
        assert_eq!(snap[0].text(), Some("a"));
        assert_eq!(reducer.get("m1").unwrap().text(), Some("ab"));
    }
}
