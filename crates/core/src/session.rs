//! Quote editing session.
//!
//! `QuoteState` is a plain value; the session owns the current one, applies edits to a
//! copy, validates the copy, and only then swaps it in and notifies subscribers. A
//! rejected edit leaves the state and revision untouched and notifies no one.

use std::fmt;

use tracing::debug;

use crate::cpq::catalog::Catalog;
use crate::cpq::pricing::{ComputedQuote, PricingEngine};
use crate::domain::quote::QuoteState;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&QuoteState, u64) + Send>;

pub struct QuoteSession {
    state: QuoteState,
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for QuoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteSession")
            .field("state", &self.state)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl QuoteSession {
    pub fn new(state: QuoteState) -> Result<Self, DomainError> {
        state.validate()?;
        Ok(Self { state, revision: 0, listeners: Vec::new(), next_subscription: 0 })
    }

    pub fn state(&self) -> &QuoteState {
        &self.state
    }

    /// Incremented once per applied change, starting at zero.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers `listener` to receive the new state and revision after each change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&QuoteState, u64) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Applies `edit` to a copy of the state. Edits that change nothing do not notify.
    pub fn update<F>(&mut self, edit: F) -> Result<&QuoteState, DomainError>
    where
        F: FnOnce(&mut QuoteState),
    {
        let mut next = self.state.clone();
        edit(&mut next);
        self.commit(next)
    }

    pub fn replace(&mut self, state: QuoteState) -> Result<&QuoteState, DomainError> {
        self.commit(state)
    }

    pub fn compute(&self, engine: &dyn PricingEngine, catalog: &Catalog) -> ComputedQuote {
        engine.compute(catalog, &self.state)
    }

    fn commit(&mut self, next: QuoteState) -> Result<&QuoteState, DomainError> {
        next.validate()?;
        if next == self.state {
            return Ok(&self.state);
        }

        self.state = next;
        self.revision += 1;
        debug!(
            event_name = "quote.session.updated",
            revision = self.revision,
            listeners = self.listeners.len(),
            "quote state updated"
        );
        for (_, listener) in &self.listeners {
            listener(&self.state, self.revision);
        }
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rust_decimal::Decimal;

    use super::QuoteSession;
    use crate::cpq::catalog::Catalog;
    use crate::cpq::pricing::RuleTablePricingEngine;
    use crate::domain::quote::{NvrTier, QuoteState};
    use crate::domain::service::ServiceEntry;
    use crate::errors::DomainError;

    fn recorder(session: &mut QuoteSession) -> Arc<Mutex<Vec<u64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.subscribe(move |_, revision| {
            if let Ok(mut revisions) = sink.lock() {
                revisions.push(revision);
            }
        });
        seen
    }

    fn revisions(seen: &Arc<Mutex<Vec<u64>>>) -> Vec<u64> {
        seen.lock().map(|revisions| revisions.clone()).unwrap_or_default()
    }

    #[test]
    fn subscribers_see_each_applied_change() {
        let mut session = QuoteSession::new(QuoteState::default()).expect("session");
        let seen = recorder(&mut session);

        session.update(|state| state.devices.servers = 2).expect("servers");
        session.update(|state| state.nvr_tier = NvrTier::Port32).expect("nvr");

        assert_eq!(session.revision(), 2);
        assert_eq!(revisions(&seen), vec![1, 2]);
        assert_eq!(session.state().nvr_tier, NvrTier::Port32);
    }

    #[test]
    fn rejected_edit_keeps_state_and_skips_notification() {
        let mut session = QuoteSession::new(QuoteState::default()).expect("session");
        let seen = recorder(&mut session);

        let error = session
            .update(|state| state.metadata.tax_rate = Decimal::new(2, 0))
            .expect_err("tax rate above one");

        assert_eq!(error, DomainError::TaxRateOutOfRange(Decimal::new(2, 0)));
        assert_eq!(session.state().metadata.tax_rate, Decimal::ZERO);
        assert_eq!(session.revision(), 0);
        assert!(revisions(&seen).is_empty());
    }

    #[test]
    fn no_op_edit_does_not_notify() {
        let mut session = QuoteSession::new(QuoteState::default()).expect("session");
        let seen = recorder(&mut session);

        session.update(|state| state.devices.cameras = 0).expect("no-op");

        assert_eq!(session.revision(), 0);
        assert!(revisions(&seen).is_empty());
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let mut session = QuoteSession::new(QuoteState::default()).expect("session");
        let seen = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&seen);
        let id = session.subscribe(move |_, _| {
            if let Ok(mut count) = sink.lock() {
                *count += 1;
            }
        });

        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session.update(|state| state.terms = "Net 30".to_owned()).expect("terms");

        assert_eq!(seen.lock().map(|count| *count).unwrap_or(u32::MAX), 0);
    }

    #[test]
    fn compute_prices_current_state() {
        let catalog =
            Catalog::new(vec![ServiceEntry::new("base_ws", "Workstation", Decimal::new(100, 0))]);
        let mut session = QuoteSession::new(QuoteState::default()).expect("session");
        session.update(|state| state.devices.workstations = 7).expect("workstations");

        let quote = session.compute(&RuleTablePricingEngine, &catalog);

        assert_eq!(quote.grand_total, Decimal::new(700, 0));
    }

    #[test]
    fn invalid_initial_state_is_rejected() {
        let mut state = QuoteState::default();
        state.metadata.tax_rate = Decimal::new(-1, 2);

        assert!(QuoteSession::new(state).is_err());
    }
}
