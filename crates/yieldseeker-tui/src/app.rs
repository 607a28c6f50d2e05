use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use yieldseeker_core::models::login_message;
use yieldseeker_core::{
    validate_address, AuthSignals, AuthStore, AuthToken, ChatController, ChatError, ChatHistory,
    Guard, Message, RequestId, SessionStore, View,
};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Address,
    ChainId,
    Signature,
}

impl EntryField {
    pub fn next(self) -> Self {
        match self {
            EntryField::Address => EntryField::ChainId,
            EntryField::ChainId => EntryField::Signature,
            EntryField::Signature => EntryField::Address,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            EntryField::Address => EntryField::Signature,
            EntryField::ChainId => EntryField::Address,
            EntryField::Signature => EntryField::ChainId,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub view: View,
    pub input_mode: InputMode,

    // Wallet state and access control
    pub guard: Guard,
    pub auth: Arc<AuthStore>,
    pub session_store: Option<SessionStore>,

    // Entry view form
    pub entry_field: EntryField,
    pub address_input: String,
    pub chain_input: String,
    pub signature_input: String,
    pub login_message: Option<String>,
    pub status: Option<String>,

    // Chat view
    pub chat: ChatController,
    pub chat_cursor: usize, // cursor position in the chat input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub animation_frame: u8, // 0-2 for ellipsis animation

    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        guard: Guard,
        auth: Arc<AuthStore>,
        session_store: Option<SessionStore>,
        chat: ChatController,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let current = auth.current();
        // A restored session may carry an account without a credential
        let login_message = current
            .account
            .as_deref()
            .map(|account| login_message(account, Utc::now()));

        Self {
            should_quit: false,
            view: View::Entry,
            input_mode: InputMode::Editing,

            guard,
            auth,
            session_store,

            entry_field: EntryField::Address,
            address_input: current.account.clone().unwrap_or_default(),
            chain_input: current
                .chain_id
                .unwrap_or(guard.required_chain_id)
                .to_string(),
            signature_input: String::new(),
            login_message,
            status: None,

            chat,
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            events,
        }
    }

    /// Run the guard against the current wallet state.
    pub fn apply_guard(&mut self) {
        let signals = self.auth.current();
        if let Some(target) = self.guard.redirect(self.view, &signals) {
            self.navigate(target);
        }
    }

    pub fn on_auth_changed(&mut self, signals: AuthSignals) {
        self.persist_session(&signals);
        if let Some(target) = self.guard.redirect(self.view, &signals) {
            self.navigate(target);
        }
        if self.view == View::Entry {
            self.status = Some(self.entry_status(&signals));
        }
    }

    fn persist_session(&self, signals: &AuthSignals) {
        let Some(store) = &self.session_store else {
            return;
        };
        let result = if signals.account.is_some() {
            store.save(signals)
        } else {
            store.clear()
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist wallet session");
        }
    }

    fn entry_status(&self, signals: &AuthSignals) -> String {
        match (&signals.account, signals.chain_id, &signals.credential) {
            (None, _, _) => "Connect a wallet to continue".to_string(),
            (Some(_), Some(id), _) if id != self.guard.required_chain_id => {
                format!("Wrong network: switch to chain {}", self.guard.required_chain_id)
            }
            (Some(_), _, None) => "Sign the login message and paste the signature".to_string(),
            _ => "Ready".to_string(),
        }
    }

    pub fn navigate(&mut self, view: View) {
        if self.view == view {
            return;
        }
        tracing::info!(from = ?self.view, to = ?view, "navigating");

        if self.view == View::Chat {
            self.chat.unmount();
        }
        self.view = view;
        self.input_mode = InputMode::Editing;

        match view {
            View::Chat => {
                self.chat.mount(&self.auth.current());
                self.chat_cursor = 0;
                self.chat_scroll = 0;
                self.start_history_load();
                self.scroll_chat_to_bottom();
            }
            View::Entry => {
                let signals = self.auth.current();
                self.signature_input.clear();
                self.entry_field = if signals.account.is_some() {
                    EntryField::Signature
                } else {
                    EntryField::Address
                };
                self.status = Some(self.entry_status(&signals));
            }
        }
    }

    fn start_history_load(&mut self) {
        let Some(ticket) = self.chat.begin_history_load() else {
            return;
        };
        let backend = self.chat.backend();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = ticket.run(backend.as_ref()).await;
            let _ = tx.send(AppEvent::HistoryLoaded(ticket.id(), result));
        });
    }

    pub fn submit_message(&mut self) {
        let Some(ticket) = self.chat.begin_submit() else {
            return;
        };
        self.chat_cursor = 0;

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        let backend = self.chat.backend();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = ticket.run(backend.as_ref()).await;
            let _ = tx.send(AppEvent::ReplyReceived(ticket.id(), result));
        });
    }

    pub fn on_history_loaded(&mut self, id: RequestId, result: Result<ChatHistory, ChatError>) {
        if self.chat.finish_history_load(id, result) {
            self.scroll_chat_to_bottom();
        }
    }

    pub fn on_reply_received(&mut self, id: RequestId, result: Result<Message, ChatError>) {
        if self.chat.finish_send(id, result) {
            self.scroll_chat_to_bottom();
        }
    }

    // Entry view actions

    pub fn entry_input_mut(&mut self) -> &mut String {
        match self.entry_field {
            EntryField::Address => &mut self.address_input,
            EntryField::ChainId => &mut self.chain_input,
            EntryField::Signature => &mut self.signature_input,
        }
    }

    pub fn connect_wallet(&mut self) {
        let account = match validate_address(&self.address_input) {
            Ok(account) => account,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        let chain_id = match self.chain_input.trim().parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                self.status = Some(format!("Invalid chain id: {}", self.chain_input.trim()));
                return;
            }
        };

        self.auth.connect_wallet(&account, chain_id);
        self.login_message = Some(login_message(&account, Utc::now()));
        self.entry_field = EntryField::Signature;
    }

    pub fn login(&mut self) {
        let signature = self.signature_input.trim().to_string();
        if signature.is_empty() {
            self.status = Some("Paste the signature first".to_string());
            return;
        }
        let Some(message) = self.login_message.clone() else {
            self.status = Some("Connect a wallet first".to_string());
            return;
        };

        self.auth.login(AuthToken::new(message, signature));
        self.signature_input.clear();
    }

    pub fn logout(&mut self) {
        self.auth.logout();
    }

    pub fn disconnect(&mut self) {
        self.auth.disconnect();
        self.login_message = None;
        self.address_input.clear();
    }

    // Chat view helpers

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll chat so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.chat.messages() {
            total_lines = total_lines.saturating_add(1); // "You:" or "Agent:"
            for line in msg.content.lines() {
                // Character count, not bytes, for UTF-8 content
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add((char_count / wrap_width + 1) as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }
        if self.chat.is_loading() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}
