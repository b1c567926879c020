//! In-memory conversation and the lifecycle of one streamed exchange.
//!
//! A [`Conversation`] owns the ordered turns plus the state of the exchange in
//! flight. Exactly one exchange can run at a time:
//!
//! ```text
//! Idle -> AwaitingFirstFragment -> StreamingFragments -> {Completed | Failed} -> Idle
//! ```
//!
//! Submissions outside `Idle`, and blank submissions, are ignored.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::chat_stream::{HistoryEntry, HistoryRole, ReplySource, TransportError};
use crate::core::persona::{persona_config, PersonaId};

/// Text of the system turn appended when an exchange fails.
pub const EXCHANGE_ERROR_TEXT: &str = "Sorry, an error occurred while processing your request.";

pub type TurnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Role on the wire. Anything not authored by the user goes out as `model`.
    pub fn to_history_role(self) -> HistoryRole {
        match self {
            Role::User => HistoryRole::User,
            Role::Assistant | Role::System => HistoryRole::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Set on assistant turns only.
    pub persona_used: Option<PersonaId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExchangePhase {
    #[default]
    Idle,
    AwaitingFirstFragment,
    StreamingFragments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Completed,
    Failed,
}

/// Everything needed to request the reply for a freshly started exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    pub assistant_turn: TurnId,
    pub prompt: String,
    pub persona: PersonaId,
    /// Turns that existed before this exchange began.
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    phase: ExchangePhase,
    in_flight: Option<TurnId>,
    fragments_received: usize,
    last_error: Option<String>,
    last_outcome: Option<ExchangeOutcome>,
    next_id: TurnId,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.phase != ExchangePhase::Idle
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_outcome(&self) -> Option<ExchangeOutcome> {
        self.last_outcome
    }

    pub fn in_flight_turn(&self) -> Option<&Turn> {
        let id = self.in_flight?;
        self.turns.iter().rev().find(|turn| turn.id == id)
    }

    /// Prior turns in wire form. Empty turns (left behind by failures before
    /// the first fragment) are skipped; the service rejects empty text parts.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.turns
            .iter()
            .filter(|turn| !turn.content.is_empty())
            .map(|turn| HistoryEntry::new(turn.role.to_history_role(), turn.content.clone()))
            .collect()
    }

    /// Start an exchange: append the user turn and an empty assistant
    /// placeholder. Returns `None`, leaving the conversation untouched, when
    /// the input is blank or an exchange is already running.
    pub fn begin_exchange(&mut self, input: &str, persona: PersonaId) -> Option<PendingExchange> {
        let prompt = input.trim();
        if prompt.is_empty() {
            debug!("ignoring blank submission");
            return None;
        }
        if self.is_loading() {
            debug!(phase = ?self.phase, "ignoring submission while an exchange is in flight");
            return None;
        }

        let history = self.history();
        self.push_turn(Role::User, prompt.to_string(), None);
        let assistant_turn = self.push_turn(Role::Assistant, String::new(), Some(persona));

        self.phase = ExchangePhase::AwaitingFirstFragment;
        self.in_flight = Some(assistant_turn);
        self.fragments_received = 0;
        self.last_error = None;

        info!(
            persona = %persona,
            model = persona_config(persona).model_name,
            history_len = history.len(),
            "exchange started"
        );

        Some(PendingExchange {
            assistant_turn,
            prompt: prompt.to_string(),
            persona,
            history,
        })
    }

    /// Append a fragment to the in-flight assistant turn. Returns `false`
    /// when no exchange is running.
    pub fn append_fragment(&mut self, fragment: &str) -> bool {
        let Some(id) = self.in_flight else {
            return false;
        };
        let Some(turn) = self.turns.iter_mut().rev().find(|turn| turn.id == id) else {
            return false;
        };

        turn.content.push_str(fragment);
        self.fragments_received += 1;
        if self.phase == ExchangePhase::AwaitingFirstFragment {
            debug!(turn = id, "first fragment received");
            self.phase = ExchangePhase::StreamingFragments;
        }
        true
    }

    /// Finish the in-flight exchange normally.
    pub fn complete_exchange(&mut self) {
        if !self.is_loading() {
            return;
        }
        let bytes = self.in_flight_turn().map_or(0, |turn| turn.content.len());
        info!(
            fragments = self.fragments_received,
            bytes, "exchange completed"
        );
        self.finish(ExchangeOutcome::Completed);
    }

    /// Finish the in-flight exchange with a failure. Whatever was streamed so
    /// far stays in the assistant turn; a fixed system notice follows it.
    pub fn fail_exchange(&mut self, err: &TransportError) {
        if !self.is_loading() {
            return;
        }
        error!(
            fragments = self.fragments_received,
            "exchange failed: {err}"
        );
        self.push_turn(Role::System, EXCHANGE_ERROR_TEXT.to_string(), None);
        self.last_error = Some(err.to_string());
        self.finish(ExchangeOutcome::Failed);
    }

    fn finish(&mut self, outcome: ExchangeOutcome) {
        self.phase = ExchangePhase::Idle;
        self.in_flight = None;
        self.last_outcome = Some(outcome);
    }

    fn push_turn(&mut self, role: Role, content: String, persona_used: Option<PersonaId>) -> TurnId {
        let id = self.next_id;
        self.next_id += 1;
        self.turns.push(Turn {
            id,
            role,
            content,
            created_at: Utc::now(),
            persona_used,
        });
        id
    }
}

/// Run one full exchange against `source`, calling `on_update` after every
/// change to the conversation. Returns `None` when the submission was ignored.
pub async fn run_exchange<F>(
    conversation: &mut Conversation,
    source: &dyn ReplySource,
    input: &str,
    persona: PersonaId,
    mut on_update: F,
) -> Option<ExchangeOutcome>
where
    F: FnMut(&Conversation),
{
    let pending = conversation.begin_exchange(input, persona)?;
    on_update(conversation);

    let mut fragments = source.stream_reply(&pending.prompt, pending.persona, &pending.history);
    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => {
                conversation.append_fragment(&fragment);
                on_update(conversation);
            }
            Err(err) => {
                conversation.fail_exchange(&err);
                on_update(conversation);
                return Some(ExchangeOutcome::Failed);
            }
        }
    }

    conversation.complete_exchange();
    on_update(conversation);
    Some(ExchangeOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_stream::FragmentStream;
    use futures_util::stream;
    use std::sync::Mutex;

    /// Replays a fixed fragment list, optionally failing after `fail_after` items.
    struct ScriptedSource {
        fragments: Vec<&'static str>,
        fail_after: Option<usize>,
        calls: Mutex<Vec<(String, PersonaId, Vec<HistoryEntry>)>>,
    }

    impl ScriptedSource {
        fn new(fragments: Vec<&'static str>) -> Self {
            Self {
                fragments,
                fail_after: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_after(fragments: Vec<&'static str>, k: usize) -> Self {
            Self {
                fail_after: Some(k),
                ..Self::new(fragments)
            }
        }

        fn calls(&self) -> Vec<(String, PersonaId, Vec<HistoryEntry>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ReplySource for ScriptedSource {
        fn stream_reply(
            &self,
            prompt: &str,
            persona: PersonaId,
            history: &[HistoryEntry],
        ) -> FragmentStream {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), persona, history.to_vec()));

            let limit = self.fail_after.unwrap_or(self.fragments.len());
            let mut items: Vec<Result<String, TransportError>> = self
                .fragments
                .iter()
                .take(limit)
                .map(|f| Ok(f.to_string()))
                .collect();
            if self.fail_after.is_some() {
                items.push(Err(TransportError::Api {
                    message: "quota exceeded".into(),
                }));
            }
            Box::pin(stream::iter(items))
        }
    }

    fn contents(conversation: &Conversation) -> Vec<(Role, &str)> {
        conversation
            .turns()
            .iter()
            .map(|turn| (turn.role, turn.content.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn hello_on_empty_conversation_appends_user_then_assistant() {
        let source = ScriptedSource::new(vec!["Hi", " there", "!"]);
        let mut conversation = Conversation::new();

        let outcome =
            run_exchange(&mut conversation, &source, "Hello", PersonaId::Grok, |_| {}).await;

        assert_eq!(outcome, Some(ExchangeOutcome::Completed));
        assert_eq!(
            contents(&conversation),
            vec![(Role::User, "Hello"), (Role::Assistant, "Hi there!")]
        );
        let turns = conversation.turns();
        assert_eq!(turns[0].persona_used, None);
        assert_eq!(turns[1].persona_used, Some(PersonaId::Grok));
        assert_ne!(turns[0].id, turns[1].id);
        assert!(!conversation.is_loading());
        assert_eq!(conversation.last_error(), None);
    }

    #[tokio::test]
    async fn blank_input_changes_nothing() {
        let source = ScriptedSource::new(vec!["unused"]);
        let mut conversation = Conversation::new();

        for input in ["", "   ", "\n\t"] {
            let outcome =
                run_exchange(&mut conversation, &source, input, PersonaId::Gemini3, |_| {}).await;
            assert_eq!(outcome, None);
        }

        assert!(conversation.is_empty());
        assert!(!conversation.is_loading());
        assert!(source.calls().is_empty());
    }

    #[test]
    fn submission_while_loading_is_ignored() {
        let mut conversation = Conversation::new();
        let pending = conversation
            .begin_exchange("first", PersonaId::ChatGpt)
            .expect("exchange starts");
        assert_eq!(conversation.phase(), ExchangePhase::AwaitingFirstFragment);
        conversation.append_fragment("partial");
        let before = conversation.turns().to_vec();

        assert!(conversation.begin_exchange("second", PersonaId::ChatGpt).is_none());
        assert!(conversation.begin_exchange("third", PersonaId::Grok).is_none());

        assert_eq!(conversation.turns(), before.as_slice());
        assert!(conversation.is_loading());
        assert_eq!(pending.prompt, "first");
    }

    #[tokio::test]
    async fn fragments_concatenate_in_delivery_order() {
        let fragments = vec!["a", "b", "b", "", "c\n", "ä", "🙂"];
        let source = ScriptedSource::new(fragments.clone());
        let mut conversation = Conversation::new();
        let mut snapshots = Vec::new();

        run_exchange(&mut conversation, &source, "go", PersonaId::DeepSeek, |c| {
            snapshots.push(c.turns().last().map(|t| t.content.clone()));
        })
        .await;

        assert_eq!(conversation.turns()[1].content, fragments.concat());
        // One update for the placeholder, one per fragment, one for completion.
        assert_eq!(snapshots.len(), fragments.len() + 2);
        assert_eq!(snapshots[0].as_deref(), Some(""));
        assert_eq!(snapshots[1].as_deref(), Some("a"));
        assert_eq!(snapshots[2].as_deref(), Some("ab"));
    }

    #[tokio::test]
    async fn failure_after_k_fragments_keeps_partial_text_and_adds_one_notice() {
        for k in 0..3 {
            let source = ScriptedSource::failing_after(vec!["one ", "two ", "three"], k);
            let mut conversation = Conversation::new();

            let outcome =
                run_exchange(&mut conversation, &source, "count", PersonaId::Grok, |_| {}).await;

            assert_eq!(outcome, Some(ExchangeOutcome::Failed));
            let expected: String = ["one ", "two ", "three"][..k].concat();
            assert_eq!(
                contents(&conversation),
                vec![
                    (Role::User, "count"),
                    (Role::Assistant, expected.as_str()),
                    (Role::System, EXCHANGE_ERROR_TEXT),
                ]
            );
            assert!(!conversation.is_loading());
            assert_eq!(conversation.last_outcome(), Some(ExchangeOutcome::Failed));
            assert_eq!(conversation.last_error(), Some("API Error: quota exceeded"));
        }
    }

    #[tokio::test]
    async fn history_sends_prior_turns_including_error_notices() {
        let mut conversation = Conversation::new();
        let failing = ScriptedSource::failing_after(vec![], 0);
        run_exchange(&mut conversation, &failing, "first", PersonaId::Gemini3, |_| {}).await;

        let ok = ScriptedSource::new(vec!["answer"]);
        run_exchange(&mut conversation, &ok, "second", PersonaId::Gemini3, |_| {}).await;
        run_exchange(&mut conversation, &ok, "third", PersonaId::Gemini3, |_| {}).await;

        let calls = ok.calls();
        assert_eq!(
            calls[0].2,
            vec![
                HistoryEntry::new(HistoryRole::User, "first"),
                HistoryEntry::new(HistoryRole::Model, EXCHANGE_ERROR_TEXT),
            ]
        );
        assert_eq!(
            calls[1].2,
            vec![
                HistoryEntry::new(HistoryRole::User, "first"),
                HistoryEntry::new(HistoryRole::Model, EXCHANGE_ERROR_TEXT),
                HistoryEntry::new(HistoryRole::User, "second"),
                HistoryEntry::new(HistoryRole::Model, "answer"),
            ]
        );
        assert_eq!(calls[1].0, "third");
    }

    #[tokio::test]
    async fn persona_switch_only_affects_the_next_exchange() {
        let source = ScriptedSource::new(vec!["reply"]);
        let mut conversation = Conversation::new();

        run_exchange(&mut conversation, &source, "one", PersonaId::ChatGpt, |_| {}).await;
        let before = conversation.turns().to_vec();
        run_exchange(&mut conversation, &source, "two", PersonaId::DeepSeek, |_| {}).await;

        assert_eq!(&conversation.turns()[..2], before.as_slice());
        assert_eq!(conversation.turns()[3].persona_used, Some(PersonaId::DeepSeek));
        let personas: Vec<PersonaId> = source.calls().iter().map(|c| c.1).collect();
        assert_eq!(personas, vec![PersonaId::ChatGpt, PersonaId::DeepSeek]);
    }

    #[tokio::test]
    async fn partial_reply_and_notice_both_go_out_as_model_turns() {
        let mut conversation = Conversation::new();
        let failing = ScriptedSource::failing_after(vec!["half an ", "answer"], 1);
        run_exchange(&mut conversation, &failing, "first", PersonaId::Grok, |_| {}).await;

        let pending = conversation
            .begin_exchange("again", PersonaId::Grok)
            .expect("exchange starts");
        assert_eq!(
            pending.history,
            vec![
                HistoryEntry::new(HistoryRole::User, "first"),
                HistoryEntry::new(HistoryRole::Model, "half an "),
                HistoryEntry::new(HistoryRole::Model, EXCHANGE_ERROR_TEXT),
            ]
        );
    }

    #[test]
    fn input_is_trimmed_before_storing_and_sending() {
        let mut conversation = Conversation::new();
        let pending = conversation
            .begin_exchange("  spaced out \n", PersonaId::Gemini3)
            .expect("exchange starts");
        assert_eq!(pending.prompt, "spaced out");
        assert_eq!(conversation.turns()[0].content, "spaced out");
        assert_eq!(pending.assistant_turn, conversation.turns()[1].id);
    }

    #[test]
    fn phase_moves_through_streaming_back_to_idle() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.phase(), ExchangePhase::Idle);
        conversation.begin_exchange("q", PersonaId::Grok);
        assert_eq!(conversation.phase(), ExchangePhase::AwaitingFirstFragment);
        assert!(conversation.append_fragment("x"));
        assert_eq!(conversation.phase(), ExchangePhase::StreamingFragments);
        conversation.complete_exchange();
        assert_eq!(conversation.phase(), ExchangePhase::Idle);
        assert_eq!(conversation.last_outcome(), Some(ExchangeOutcome::Completed));
        assert!(!conversation.append_fragment("late"));
        assert_eq!(conversation.turns()[1].content, "x");
    }

    #[test]
    fn terminal_calls_outside_an_exchange_are_no_ops() {
        let mut conversation = Conversation::new();
        conversation.complete_exchange();
        conversation.fail_exchange(&TransportError::MissingCredential);
        assert!(conversation.is_empty());
        assert_eq!(conversation.last_outcome(), None);
    }
}
