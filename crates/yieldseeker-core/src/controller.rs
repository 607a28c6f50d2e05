//! Page-level state for the chat view.
//!
//! The controller owns the message list, the input line and the loading flag.
//! It never touches the network on its own schedule: callers either await the
//! inline helpers ([`ChatController::load_history`], [`ChatController::submit`])
//! or take a ticket from a `begin_*` method, run it wherever they like, and hand
//! the result back to the matching `finish_*` method.

use std::sync::Arc;

use crate::client::ChatBackend;
use crate::error::ChatError;
use crate::guard::AuthSignals;
use crate::models::{welcome_messages, AuthToken, ChatHistory, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    LoadingHistory,
    Ready,
    Sending,
    ErrorDisplayed,
}

/// Identifies one network call within one mount of the chat view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId {
    generation: u64,
    sequence: u64,
}

#[derive(Debug, Clone)]
pub struct HistoryTicket {
    id: RequestId,
    pub user_id: String,
    pub credential: AuthToken,
}

impl HistoryTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub async fn run(&self, backend: &dyn ChatBackend) -> Result<ChatHistory, ChatError> {
        backend.get_chat_history(&self.user_id, Some(&self.credential)).await
    }
}

#[derive(Debug, Clone)]
pub struct SendTicket {
    id: RequestId,
    pub content: String,
    pub user_id: String,
    pub credential: Option<AuthToken>,
}

impl SendTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub async fn run(&self, backend: &dyn ChatBackend) -> Result<Message, ChatError> {
        backend
            .send_message(&self.content, &self.user_id, self.credential.as_ref())
            .await
    }
}

pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    show_welcome: bool,

    messages: Vec<Message>,
    input: String,
    loading: bool,
    phase: ChatPhase,

    account: Option<String>,
    credential: Option<AuthToken>,

    generation: u64,
    sequence: u64,
    in_flight: Option<RequestId>,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>, show_welcome: bool) -> Self {
        Self {
            backend,
            show_welcome,
            messages: Vec::new(),
            input: String::new(),
            loading: false,
            phase: ChatPhase::Idle,
            account: None,
            credential: None,
            generation: 0,
            sequence: 0,
            in_flight: None,
        }
    }

    pub fn backend(&self) -> Arc<dyn ChatBackend> {
        Arc::clone(&self.backend)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Whether a submit right now would be accepted.
    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty()
            && self.account.is_some()
            && !matches!(self.phase, ChatPhase::Sending | ChatPhase::LoadingHistory)
    }

    /// Enter the chat view with the given wallet state.
    pub fn mount(&mut self, signals: &AuthSignals) {
        self.reset();
        self.account = signals.account.clone();
        self.credential = signals.credential.clone();
        if self.show_welcome {
            self.messages = welcome_messages();
        }
        tracing::info!(account = ?self.account, "chat view mounted");
    }

    /// Leave the chat view. Anything still in flight is ignored when it lands.
    pub fn unmount(&mut self) {
        self.reset();
        tracing::debug!("chat view unmounted");
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.messages.clear();
        self.input.clear();
        self.loading = false;
        self.phase = ChatPhase::Idle;
        self.account = None;
        self.credential = None;
        self.in_flight = None;
    }

    fn next_id(&mut self) -> RequestId {
        self.sequence += 1;
        let id = RequestId {
            generation: self.generation,
            sequence: self.sequence,
        };
        self.in_flight = Some(id);
        id
    }

    /// Take the in-flight slot if `id` owns it.
    fn settle(&mut self, id: RequestId) -> bool {
        if self.in_flight != Some(id) {
            tracing::debug!(?id, "dropping stale response");
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Start the history fetch. Only once per mount, and only when logged in.
    pub fn begin_history_load(&mut self) -> Option<HistoryTicket> {
        if self.phase != ChatPhase::Idle {
            return None;
        }
        let user_id = self.account.clone()?;
        let credential = self.credential.clone()?;

        self.phase = ChatPhase::LoadingHistory;
        Some(HistoryTicket {
            id: self.next_id(),
            user_id,
            credential,
        })
    }

    /// Returns `false` when the result was stale and discarded.
    pub fn finish_history_load(
        &mut self,
        id: RequestId,
        result: Result<ChatHistory, ChatError>,
    ) -> bool {
        if !self.settle(id) {
            return false;
        }

        match result {
            Ok(history) => {
                tracing::info!(count = history.messages.len(), "chat history loaded");
                self.messages = history.messages;
            }
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status(), "failed to load chat history");
            }
        }
        self.phase = ChatPhase::Ready;
        true
    }

    /// Validate the input and append the user's message optimistically.
    pub fn begin_submit(&mut self) -> Option<SendTicket> {
        if !self.can_submit() {
            return None;
        }
        let user_id = self.account.clone()?;

        let content = self.input.trim().to_string();
        self.input.clear();
        self.messages.push(Message::user(content.clone()));
        self.loading = true;
        self.phase = ChatPhase::Sending;

        Some(SendTicket {
            id: self.next_id(),
            content,
            user_id,
            credential: self.credential.clone(),
        })
    }

    /// Returns `false` when the result was stale and discarded.
    pub fn finish_send(&mut self, id: RequestId, result: Result<Message, ChatError>) -> bool {
        if !self.settle(id) {
            return false;
        }

        match result {
            Ok(reply) => {
                self.messages.push(reply);
                self.phase = ChatPhase::Ready;
            }
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status(), "failed to get agent response");
                self.messages.push(Message::fallback());
                self.phase = ChatPhase::ErrorDisplayed;
            }
        }
        self.loading = false;
        true
    }

    /// Fetch history inline. No-op without a login.
    pub async fn load_history(&mut self) {
        let Some(ticket) = self.begin_history_load() else {
            return;
        };
        let result = ticket.run(self.backend.as_ref()).await;
        self.finish_history_load(ticket.id(), result);
    }

    /// Submit the current input inline. Returns whether anything was sent.
    pub async fn submit(&mut self) -> bool {
        let Some(ticket) = self.begin_submit() else {
            return false;
        };
        let result = ticket.run(self.backend.as_ref()).await;
        self.finish_send(ticket.id(), result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FALLBACK_REPLY;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Outcome {
        Reply(&'static str),
        Fail(u16),
    }

    #[derive(Default)]
    struct FakeBackend {
        replies: Mutex<VecDeque<Outcome>>,
        history: Mutex<Option<Outcome>>,
        sent: Mutex<Vec<(String, String, bool)>>,
        history_calls: Mutex<usize>,
    }

    impl FakeBackend {
        fn replying(outcomes: Vec<Outcome>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(outcomes.into()),
                ..Self::default()
            })
        }

        fn with_history(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                history: Mutex::new(Some(outcome)),
                ..Self::default()
            })
        }

        fn sent(&self) -> Vec<(String, String, bool)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn send_message(
            &self,
            content: &str,
            user_id: &str,
            credential: Option<&AuthToken>,
        ) -> Result<Message, ChatError> {
            self.sent
                .lock()
                .unwrap()
                .push((content.to_string(), user_id.to_string(), credential.is_some()));
            match self.replies.lock().unwrap().pop_front() {
                Some(Outcome::Reply(text)) => Ok(Message::agent(text)),
                Some(Outcome::Fail(status)) => Err(ChatError::Status {
                    status,
                    body: String::new(),
                }),
                None => Err(ChatError::Status {
                    status: 503,
                    body: String::new(),
                }),
            }
        }

        async fn get_chat_history(
            &self,
            user_id: &str,
            _credential: Option<&AuthToken>,
        ) -> Result<ChatHistory, ChatError> {
            *self.history_calls.lock().unwrap() += 1;
            match self.history.lock().unwrap().take() {
                Some(Outcome::Reply(text)) => Ok(ChatHistory {
                    messages: vec![Message::user("earlier"), Message::agent(text)],
                    user_id: Some(user_id.to_string()),
                }),
                Some(Outcome::Fail(status)) => Err(ChatError::Status {
                    status,
                    body: String::new(),
                }),
                None => Ok(ChatHistory::default()),
            }
        }
    }

    fn logged_in() -> AuthSignals {
        AuthSignals {
            chain_id: Some(8453),
            account: Some("0xABC".to_string()),
            credential: Some(AuthToken::new("Sign in", "0xsig")),
        }
    }

    fn mounted(backend: Arc<FakeBackend>, signals: &AuthSignals) -> ChatController {
        let mut controller = ChatController::new(backend, false);
        controller.mount(signals);
        controller
    }

    fn contents(controller: &ChatController) -> Vec<(String, bool)> {
        controller
            .messages()
            .iter()
            .map(|m| (m.content.clone(), m.is_user))
            .collect()
    }

    #[tokio::test]
    async fn test_successful_send_appends_question_and_reply() {
        let backend = FakeBackend::replying(vec![Outcome::Reply("Try Aave.")]);
        let mut controller = mounted(backend.clone(), &logged_in());

        controller.set_input("What's the best stablecoin yield?");
        assert!(controller.submit().await);

        assert_eq!(
            contents(&controller),
            vec![
                ("What's the best stablecoin yield?".to_string(), true),
                ("Try Aave.".to_string(), false),
            ]
        );
        assert!(!controller.is_loading());
        assert_eq!(controller.phase(), ChatPhase::Ready);
        assert_eq!(controller.input(), "");
        assert_eq!(
            backend.sent(),
            vec![("What's the best stablecoin yield?".to_string(), "0xABC".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_sends_interleave_in_call_order() {
        let backend = FakeBackend::replying(vec![
            Outcome::Reply("a1"),
            Outcome::Reply("a2"),
            Outcome::Reply("a3"),
        ]);
        let mut controller = mounted(backend, &logged_in());

        for q in ["q1", "q2", "q3"] {
            controller.set_input(q);
            assert!(controller.submit().await);
        }

        let got: Vec<String> = controller.messages().iter().map(|m| m.content.clone()).collect();
        assert_eq!(got, vec!["q1", "a1", "q2", "a2", "q3", "a3"]);
        let users: Vec<bool> = controller.messages().iter().map(|m| m.is_user).collect();
        assert_eq!(users, vec![true, false, true, false, true, false]);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = FakeBackend::replying(vec![Outcome::Reply("unused")]);
        let mut controller = mounted(backend.clone(), &logged_in());

        for input in ["", "   ", "\n\t "] {
            controller.set_input(input);
            assert!(!controller.submit().await);
        }

        assert!(controller.messages().is_empty());
        assert!(backend.sent().is_empty());
        assert_eq!(controller.phase(), ChatPhase::Idle);
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let backend = FakeBackend::replying(vec![Outcome::Reply("ok")]);
        let mut controller = mounted(backend.clone(), &logged_in());

        controller.set_input("  hello  ");
        controller.submit().await;
        assert_eq!(controller.messages()[0].content, "hello");
        assert_eq!(backend.sent()[0].0, "hello");
    }

    #[tokio::test]
    async fn test_submit_requires_account() {
        let backend = FakeBackend::replying(vec![Outcome::Reply("unused")]);
        let mut controller = mounted(backend.clone(), &AuthSignals::default());

        controller.set_input("hello");
        assert!(!controller.submit().await);
        assert!(controller.messages().is_empty());
        assert!(backend.sent().is_empty());
        // Input is kept so the user does not lose it.
        assert_eq!(controller.input(), "hello");
    }

    #[tokio::test]
    async fn test_failed_send_appends_fallback() {
        let backend = FakeBackend::replying(vec![Outcome::Fail(500)]);
        let mut controller = mounted(backend, &logged_in());

        controller.set_input("What's the best stablecoin yield?");
        assert!(controller.submit().await);

        assert_eq!(
            contents(&controller),
            vec![
                ("What's the best stablecoin yield?".to_string(), true),
                (FALLBACK_REPLY.to_string(), false),
            ]
        );
        assert!(!controller.is_loading());
        assert_eq!(controller.phase(), ChatPhase::ErrorDisplayed);

        // Recovery: the next send works normally.
        controller.set_input("again");
        assert!(controller.submit().await);
        assert_eq!(controller.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_send_without_credential_omits_it() {
        let backend = FakeBackend::replying(vec![Outcome::Reply("gm")]);
        let signals = AuthSignals {
            credential: None,
            ..logged_in()
        };
        let mut controller = mounted(backend.clone(), &signals);

        controller.set_input("gm");
        assert!(controller.submit().await);
        assert!(!backend.sent()[0].2);
    }

    #[tokio::test]
    async fn test_history_replaces_welcome_messages() {
        let backend = FakeBackend::with_history(Outcome::Reply("from server"));
        let mut controller = ChatController::new(backend, true);
        controller.mount(&logged_in());
        assert_eq!(controller.messages().len(), 2);

        controller.load_history().await;

        assert_eq!(
            contents(&controller),
            vec![("earlier".to_string(), true), ("from server".to_string(), false)]
        );
        assert_eq!(controller.phase(), ChatPhase::Ready);
    }

    #[tokio::test]
    async fn test_history_failure_leaves_list_empty() {
        let backend = FakeBackend::with_history(Outcome::Fail(401));
        let mut controller = mounted(backend, &logged_in());

        controller.load_history().await;

        assert!(controller.messages().is_empty());
        assert_eq!(controller.phase(), ChatPhase::Ready);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_history_needs_credential_and_runs_once() {
        let backend = FakeBackend::with_history(Outcome::Reply("x"));
        let signals = AuthSignals {
            credential: None,
            ..logged_in()
        };
        let mut controller = mounted(backend.clone(), &signals);
        controller.load_history().await;
        assert_eq!(*backend.history_calls.lock().unwrap(), 0);
        assert_eq!(controller.phase(), ChatPhase::Idle);

        controller.mount(&logged_in());
        controller.load_history().await;
        controller.load_history().await;
        assert_eq!(*backend.history_calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_double_submit_is_rejected_while_sending() {
        let backend = FakeBackend::replying(vec![]);
        let mut controller = mounted(backend, &logged_in());

        controller.set_input("first");
        let ticket = controller.begin_submit().unwrap();
        assert!(controller.is_loading());
        assert_eq!(controller.phase(), ChatPhase::Sending);

        controller.set_input("second");
        assert!(controller.begin_submit().is_none());
        assert_eq!(controller.messages().len(), 1);

        assert!(controller.finish_send(ticket.id(), Ok(Message::agent("reply"))));
        assert!(controller.begin_submit().is_some());
    }

    #[test]
    fn test_submit_waits_for_history() {
        let backend = FakeBackend::replying(vec![]);
        let mut controller = mounted(backend, &logged_in());

        let history = controller.begin_history_load().unwrap();
        controller.set_input("hello");
        assert!(!controller.can_submit());
        assert!(controller.begin_submit().is_none());

        controller.finish_history_load(history.id(), Ok(ChatHistory::default()));
        assert!(controller.can_submit());
    }

    #[test]
    fn test_stale_response_after_remount_is_dropped() {
        let backend = FakeBackend::replying(vec![]);
        let mut controller = mounted(backend, &logged_in());

        controller.set_input("question");
        let stale = controller.begin_submit().unwrap();

        controller.unmount();
        controller.mount(&logged_in());
        assert!(controller.messages().is_empty());

        assert!(!controller.finish_send(stale.id(), Ok(Message::agent("late reply"))));
        assert!(controller.messages().is_empty());
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_stale_history_after_unmount_is_dropped() {
        let backend = FakeBackend::replying(vec![]);
        let mut controller = mounted(backend, &logged_in());
        let ticket = controller.begin_history_load().unwrap();

        controller.unmount();
        let history = ChatHistory {
            messages: vec![Message::agent("late")],
            user_id: None,
        };
        assert!(!controller.finish_history_load(ticket.id(), Ok(history)));
        assert!(controller.messages().is_empty());
        assert_eq!(controller.phase(), ChatPhase::Idle);
    }
}
