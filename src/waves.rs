use crate::error::{
    Error,
    Result,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    collections::VecDeque,
    fmt,
};

/// Identifier of a connected wallet account, as reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Account(String);

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wave exactly as the contract reports it, from either `getAllWaves` or a
/// `NewWave` event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawWave {
    pub waver: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub message: String,
}

impl RawWave {
    pub fn new(waver: impl Into<String>, timestamp: u64, message: impl Into<String>) -> Self {
        Self {
            waver: waver.into(),
            timestamp,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Wave {
    address: Account,
    timestamp: DateTime<Utc>,
    message: String,
}

impl Wave {
    pub fn address(&self) -> &Account {
        &self.address
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl TryFrom<RawWave> for Wave {
    type Error = Error;

    fn try_from(raw: RawWave) -> Result<Self> {
        Ok(Self {
            timestamp: timestamp_from_unix_seconds(raw.timestamp)?,
            address: Account::new(raw.waver),
            message: raw.message,
        })
    }
}

/// The only place contract time is interpreted.
///
/// The contract stores `block.timestamp`, whole seconds since the Unix epoch.
/// We scale to milliseconds (`seconds * 1000`) and build a UTC instant from
/// that, for both the bulk read and the live event path.
pub fn timestamp_from_unix_seconds(seconds: u64) -> Result<DateTime<Utc>> {
    let millis = i64::try_from(seconds)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .ok_or_else(|| Error::InvalidWave(format!("timestamp {seconds} out of range")))?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::InvalidWave(format!("timestamp {seconds} out of range")))
}

/// Waves ordered most recent first.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WaveList {
    waves: VecDeque<Wave>,
}

impl WaveList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from records in contract storage order (oldest first).
    pub fn from_history(records: Vec<RawWave>) -> Result<Self> {
        let mut waves = VecDeque::with_capacity(records.len());
        for record in records {
            waves.push_front(Wave::try_from(record)?);
        }
        Ok(Self { waves })
    }

    pub fn prepend(&mut self, wave: Wave) {
        self.waves.push_front(wave);
    }

    /// Replaces the list with `history`, keeping entries already present
    /// (delivered live while the history was in flight) that the history does
    /// not contain. Those stay at the head in their current order.
    ///
    /// Identical waves are matched one to one: each history entry absorbs at
    /// most one present entry, so repeats the history lags behind on survive.
    pub fn merge_history(&mut self, history: WaveList) {
        let live_only: Vec<Wave> = {
            let mut unmatched: Vec<&Wave> = history.waves.iter().collect();
            self.waves
                .drain(..)
                .filter(|wave| match unmatched.iter().position(|h| *h == wave) {
                    Some(i) => {
                        unmatched.swap_remove(i);
                        false
                    }
                    None => true,
                })
                .collect()
        };
        let mut merged = history.waves;
        for wave in live_only.into_iter().rev() {
            merged.push_front(wave);
        }
        self.waves = merged;
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn head(&self) -> Option<&Wave> {
        self.waves.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wave> {
        self.waves.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn raw(n: u64) -> RawWave {
        RawWave::new(format!("0x{n:040x}"), 1_650_000_000 + n, format!("hi #{n}"))
    }

    #[test]
    fn timestamp_from_unix_seconds__scales_seconds_to_milliseconds() {
        // when
        let ts = timestamp_from_unix_seconds(1_650_000_123).unwrap();

        // then
        assert_eq!(ts.timestamp_millis(), 1_650_000_123_000);
        assert_eq!(ts.timestamp(), 1_650_000_123);
    }

    #[test]
    fn timestamp_from_unix_seconds__rejects_values_that_overflow() {
        let res = timestamp_from_unix_seconds(u64::MAX);
        assert!(matches!(res, Err(Error::InvalidWave(_))));
    }

    #[test]
    fn from_history__reverses_storage_order() {
        // given
        let records = vec![raw(1), raw(2), raw(3)];

        // when
        let list = WaveList::from_history(records).unwrap();

        // then
        let messages: Vec<_> = list.iter().map(|w| w.message().to_owned()).collect();
        assert_eq!(messages, vec!["hi #3", "hi #2", "hi #1"]);
    }

    #[test]
    fn from_history__same_record_normalizes_like_live_path() {
        // given
        let record = raw(7);

        // when
        let from_history = WaveList::from_history(vec![record.clone()]).unwrap();
        let live = Wave::try_from(record).unwrap();

        // then
        assert_eq!(from_history.head(), Some(&live));
    }

    #[test]
    fn merge_history__keeps_live_only_entries_at_head_without_duplicates() {
        // given
        let mut list = WaveList::new();
        list.prepend(Wave::try_from(raw(3)).unwrap());
        list.prepend(Wave::try_from(raw(9)).unwrap());
        let history = WaveList::from_history(vec![raw(1), raw(2), raw(3)]).unwrap();

        // when
        list.merge_history(history);

        // then
        let messages: Vec<_> = list.iter().map(|w| w.message().to_owned()).collect();
        assert_eq!(messages, vec!["hi #9", "hi #3", "hi #2", "hi #1"]);
    }

    #[test]
    fn merge_history__stale_history__keeps_every_identical_live_wave() {
        // given
        let mut list = WaveList::new();
        list.prepend(Wave::try_from(raw(4)).unwrap());
        list.prepend(Wave::try_from(raw(4)).unwrap());

        // when
        list.merge_history(WaveList::new());

        // then
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn merge_history__history_with_one_copy__absorbs_only_one_live_copy() {
        // given
        let mut list = WaveList::new();
        list.prepend(Wave::try_from(raw(4)).unwrap());
        list.prepend(Wave::try_from(raw(4)).unwrap());
        let history = WaveList::from_history(vec![raw(1), raw(4)]).unwrap();

        // when
        list.merge_history(history);

        // then
        let messages: Vec<_> = list.iter().map(|w| w.message().to_owned()).collect();
        assert_eq!(messages, vec!["hi #4", "hi #4", "hi #1"]);
    }

    #[test]
    fn merge_history__into_empty_list__equals_history() {
        // given
        let mut list = WaveList::new();
        let history = WaveList::from_history(vec![raw(1), raw(2)]).unwrap();

        // when
        list.merge_history(history.clone());

        // then
        assert_eq!(list, history);
    }
}
