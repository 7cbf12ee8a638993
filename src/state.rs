use crate::{
    error::{
        Error,
        Result,
    },
    lifecycle::{
        LifecycleEvent,
        TransactionTracker,
    },
    notifications::Notifications,
    subscriber::{
        ListenerId,
        LiveWave,
    },
    waves::{
        Account,
        RawWave,
        Wave,
        WaveList,
    },
};
use std::time::Instant;
use tracing::{
    debug,
    info,
    warn,
};

pub const NO_WALLET_TEXT: &str = "Get a wallet to connect!";
pub const CONNECT_FIRST_TEXT: &str = "Connect your wallet!";

/// Everything the view renders. Owned by the controller; the renderer only
/// borrows it.
#[derive(Debug, Default)]
pub struct AppState {
    account: Option<Account>,
    message: String,
    waves: WaveList,
    total_waves: u64,
    tracker: TransactionTracker,
    notifications: Notifications,
    listener: Option<ListenerId>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn set_account(&mut self, account: Account) {
        self.account = Some(account);
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut String {
        &mut self.message
    }

    pub fn waves(&self) -> &WaveList {
        &self.waves
    }

    pub fn total_waves(&self) -> u64 {
        self.total_waves
    }

    pub fn set_total_waves(&mut self, total: u64) {
        self.total_waves = total;
    }

    pub fn mining_wave(&self) -> bool {
        self.tracker.is_mining()
    }

    pub fn tracker(&self) -> &TransactionTracker {
        &self.tracker
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn flash_error(&mut self, text: impl Into<String>, now: Instant) {
        self.notifications.flash_error(text, now);
    }

    /// Expires notices. Returns true when the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.notifications.expire(now)
    }

    /// Merges a historical read (oldest first) into the list.
    pub fn load_history(&mut self, records: Vec<RawWave>) -> Result<()> {
        let history = WaveList::from_history(records)?;
        info!(count = history.len(), "loaded all waves");
        self.waves.merge_history(history);
        Ok(())
    }

    pub fn attach_listener(&mut self, id: ListenerId) {
        self.listener = Some(id);
    }

    pub fn detach_listener(&mut self) {
        self.listener = None;
    }

    /// Prepends a live wave delivered to the attached listener. Deliveries for
    /// any other listener id are stale and ignored. Returns true when the list
    /// changed.
    pub fn apply_live_wave(&mut self, live: LiveWave) -> bool {
        if self.listener != Some(live.listener) {
            debug!(listener = ?live.listener, "ignoring wave from a detached listener");
            return false;
        }
        match Wave::try_from(live.wave) {
            Ok(wave) => {
                self.waves.prepend(wave);
                true
            }
            Err(err) => {
                warn!(error = %err, "dropping NewWave event");
                false
            }
        }
    }

    /// Moves the tracker to pending and returns the message to send.
    pub fn begin_submission(&mut self, now: Instant) -> Result<String> {
        self.tracker.begin(&mut self.notifications, now)?;
        Ok(self.message.clone())
    }

    pub fn apply_lifecycle(&mut self, event: LifecycleEvent, now: Instant) {
        match event {
            LifecycleEvent::Submitted { hash } => self.tracker.submitted(hash),
            LifecycleEvent::Confirmed { hash, total_waves } => {
                self.tracker.confirm(hash, &mut self.notifications, now);
                self.message.clear();
                if let Some(total) = total_waves {
                    self.total_waves = total;
                }
            }
            LifecycleEvent::Failed(err) => {
                self.tracker.fail(&err, &mut self.notifications, now)
            }
        }
    }

    /// Converts a failed user action into a transient notice.
    pub fn report(&mut self, err: &Error, now: Instant) {
        let text = match err {
            Error::NoProvider => NO_WALLET_TEXT,
            Error::SubmissionInFlight => "A wave is already being mined",
            _ => crate::lifecycle::FAILURE_TEXT,
        };
        warn!(error = %err, "action failed");
        self.flash_error(text, now);
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;

    fn live(listener: ListenerId, n: u64) -> LiveWave {
        LiveWave {
            listener,
            wave: RawWave::new(format!("0x{n:x}"), 1_600_000_000 + n, format!("wave {n}")),
        }
    }

    fn attached_state() -> (AppState, ListenerId) {
        let mut state = AppState::new();
        let id = ListenerId(0);
        state.attach_listener(id);
        (state, id)
    }

    proptest! {
        #[test]
        fn apply_live_wave__n_events__grow_list_with_newest_at_head(
            initial in 0usize..8,
            arrivals in proptest::collection::vec(0u64..1_000_000, 0..32),
        ) {
            // given
            let (mut state, id) = attached_state();
            let history: Vec<RawWave> = (0..initial as u64)
                .map(|n| RawWave::new("0xold", n, format!("old {n}")))
                .collect();
            state.load_history(history).unwrap();

            // when
            for n in &arrivals {
                state.apply_live_wave(live(id, *n));
            }

            // then
            prop_assert_eq!(state.waves().len(), initial + arrivals.len());
            let head: Vec<String> = state
                .waves()
                .iter()
                .take(arrivals.len())
                .map(|w| w.message().to_owned())
                .collect();
            let expected: Vec<String> =
                arrivals.iter().rev().map(|n| format!("wave {n}")).collect();
            prop_assert_eq!(head, expected);
        }
    }

    #[test]
    fn apply_live_wave__stale_listener__is_ignored() {
        // given
        let (mut state, old) = attached_state();
        state.detach_listener();
        let new = ListenerId(1);
        state.attach_listener(new);

        // when
        let changed = state.apply_live_wave(live(old, 1));

        // then
        assert!(!changed);
        assert!(state.waves().is_empty());
    }

    #[test]
    fn apply_live_wave__detached__is_ignored() {
        let (mut state, id) = attached_state();
        state.detach_listener();
        assert!(!state.apply_live_wave(live(id, 1)));
    }

    #[test]
    fn apply_lifecycle__failure__leaves_list_unchanged_and_not_mining() {
        // given
        let now = Instant::now();
        let (mut state, id) = attached_state();
        state.apply_live_wave(live(id, 1));
        state.message_mut().push_str("gm");
        state.set_total_waves(1);
        state.begin_submission(now).unwrap();
        let before = state.waves().clone();

        // when
        state.apply_lifecycle(
            LifecycleEvent::Failed(Error::transaction_failure("reverted")),
            now,
        );

        // then
        assert_eq!(state.waves(), &before);
        assert!(!state.mining_wave());
        assert_eq!(state.message(), "gm");
        assert_eq!(state.total_waves(), 1);
        assert!(state.notifications().banner().is_some());
    }

    #[test]
    fn apply_lifecycle__confirmed__clears_message_and_refreshes_count_without_appending() {
        // given
        let now = Instant::now();
        let (mut state, _) = attached_state();
        state.message_mut().push_str("gm");
        state.begin_submission(now).unwrap();
        state.apply_lifecycle(LifecycleEvent::Submitted { hash: "0x1".into() }, now);
        assert!(state.mining_wave());

        // when
        state.apply_lifecycle(
            LifecycleEvent::Confirmed {
                hash: "0x1".into(),
                total_waves: Some(42),
            },
            now,
        );

        // then
        assert!(!state.mining_wave());
        assert_eq!(state.message(), "");
        assert_eq!(state.total_waves(), 42);
        assert!(state.waves().is_empty());
    }

    #[test]
    fn apply_lifecycle__confirmed_without_count__keeps_previous_count() {
        let now = Instant::now();
        let mut state = AppState::new();
        state.set_total_waves(7);
        state.begin_submission(now).unwrap();
        state.apply_lifecycle(
            LifecycleEvent::Confirmed {
                hash: "0x1".into(),
                total_waves: None,
            },
            now,
        );
        assert_eq!(state.total_waves(), 7);
    }

    #[test]
    fn begin_submission__keeps_message_until_confirmed() {
        let now = Instant::now();
        let mut state = AppState::new();
        state.message_mut().push_str("hello there");
        let sent = state.begin_submission(now).unwrap();
        assert_eq!(sent, "hello there");
        assert_eq!(state.message(), "hello there");
    }

    #[test]
    fn load_history__after_live_waves__does_not_duplicate() {
        // given
        let (mut state, id) = attached_state();
        let first = live(id, 5);
        state.apply_live_wave(first.clone());

        // when
        state
            .load_history(vec![RawWave::new("0xold", 1, "old"), first.wave])
            .unwrap();

        // then
        let messages: Vec<_> = state.waves().iter().map(|w| w.message().to_owned()).collect();
        assert_eq!(messages, vec!["wave 5", "old"]);
    }

    #[test]
    fn report__no_provider__shows_install_hint() {
        let now = Instant::now();
        let mut state = AppState::new();
        state.report(&Error::NoProvider, now);
        assert_eq!(
            state.notifications().banner().map(|b| b.text.as_str()),
            Some(NO_WALLET_TEXT)
        );
    }
}
