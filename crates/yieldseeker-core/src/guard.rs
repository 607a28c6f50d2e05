//! Access guard between the entry view and the chat view.
//!
//! Wallet state lives in an [`AuthStore`]; anything that needs to react to it
//! subscribes and re-runs the [`Guard`] on every change.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::AuthToken;

/// Base mainnet.
pub const DEFAULT_CHAIN_ID: u64 = 8453;

/// The three externally owned signals the guard looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSignals {
    pub chain_id: Option<u64>,
    pub account: Option<String>,
    pub credential: Option<AuthToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Entry,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guard {
    pub required_chain_id: u64,
}

impl Default for Guard {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

impl Guard {
    pub fn new(required_chain_id: u64) -> Self {
        Self { required_chain_id }
    }

    pub fn is_satisfied(&self, signals: &AuthSignals) -> bool {
        signals.chain_id == Some(self.required_chain_id)
            && signals.account.is_some()
            && signals.credential.is_some()
    }

    /// Where `view` should send the user, if anywhere.
    pub fn redirect(&self, view: View, signals: &AuthSignals) -> Option<View> {
        match (view, self.is_satisfied(signals)) {
            (View::Chat, false) => Some(View::Entry),
            (View::Entry, true) => Some(View::Chat),
            _ => None,
        }
    }
}

/// Reactive holder of [`AuthSignals`].
///
/// Subscribers only wake when the value actually changes.
pub struct AuthStore {
    tx: watch::Sender<AuthSignals>,
}

impl AuthStore {
    pub fn new(initial: AuthSignals) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> AuthSignals {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSignals> {
        self.tx.subscribe()
    }

    pub fn watch(&self, guard: Guard) -> GuardWatcher {
        GuardWatcher {
            rx: self.subscribe(),
            guard,
        }
    }

    fn update(&self, f: impl FnOnce(&mut AuthSignals)) -> bool {
        self.tx.send_if_modified(|signals| {
            let before = signals.clone();
            f(signals);
            *signals != before
        })
    }

    /// Connect a wallet. A different account invalidates the login.
    pub fn connect_wallet(&self, account: &str, chain_id: u64) -> bool {
        self.update(|s| {
            if s.account.as_deref() != Some(account) {
                s.credential = None;
            }
            s.account = Some(account.to_string());
            s.chain_id = Some(chain_id);
        })
    }

    pub fn switch_chain(&self, chain_id: u64) -> bool {
        self.update(|s| s.chain_id = Some(chain_id))
    }

    /// Store the signed login. Ignored when no wallet is connected.
    pub fn login(&self, token: AuthToken) -> bool {
        self.update(|s| {
            if s.account.is_some() {
                s.credential = Some(token);
            }
        })
    }

    pub fn logout(&self) -> bool {
        self.update(|s| s.credential = None)
    }

    pub fn disconnect(&self) -> bool {
        self.update(|s| *s = AuthSignals::default())
    }
}

/// Observer that turns signal changes into redirects.
pub struct GuardWatcher {
    rx: watch::Receiver<AuthSignals>,
    guard: Guard,
}

impl GuardWatcher {
    /// Wait for the next change. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<AuthSignals> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn redirect(&self, view: View) -> Option<View> {
        self.guard.redirect(view, &self.rx.borrow())
    }
}
