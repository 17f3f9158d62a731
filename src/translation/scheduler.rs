/*!
 * Rate-aware scheduling of a provider's credential pool.
 *
 * Every credential in the pool carries a `KeyStatus`. Before each request the
 * best scoring available credential is claimed; a rate-limit answer puts it
 * into a short cooldown and the request moves on to another credential.
 * When no credential can be claimed the caller waits for the earliest
 * cooldown to expire. Once the attempt budget is spent the whole pool is
 * parked for a long cooldown and the request degrades to its source text.
 *
 * Selection and the state change that follows it happen under one lock, so
 * two concurrent callers can never claim the same credential.
 */

use std::collections::{HashMap, HashSet};
use std::future::Future;

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use crate::credentials::CredentialRecord;
use crate::errors::ProviderError;

/// Retry budget and cooldown durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Rounds of waiting for a cooldown before the pool is declared exhausted
    pub max_attempts: usize,
    /// Cooldown after a rate-limit answer
    pub rate_limit_cooldown_ms: u64,
    /// Cooldown applied to every credential when the pool is exhausted
    pub exhausted_cooldown_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            rate_limit_cooldown_ms: 3_000,
            exhausted_cooldown_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyState {
    Available,
    InUse,
    Cooldown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyStatus {
    pub state: KeyState,
    pub last_used_at: u64,
    pub cooldown_until: u64,
    pub rate_limit_hits: u32,
    pub usage_count: u32,
}

impl Default for KeyStatus {
    fn default() -> Self {
        Self {
            state: KeyState::Available,
            last_used_at: 0,
            cooldown_until: 0,
            rate_limit_hits: 0,
            usage_count: 0,
        }
    }
}

impl KeyStatus {
    const BASE_SCORE: f64 = 100.0;
    const RATE_LIMIT_WEIGHT: f64 = 10.0;
    const USAGE_WEIGHT: f64 = 2.0;
    const IDLE_WEIGHT: f64 = 0.001;

    /// Preference score; higher is better, never negative
    pub fn score(&self, now: u64) -> f64 {
        let idle = now.saturating_sub(self.last_used_at) as f64;
        let score = Self::BASE_SCORE - f64::from(self.rate_limit_hits) * Self::RATE_LIMIT_WEIGHT
            - f64::from(self.usage_count) * Self::USAGE_WEIGHT
            + idle * Self::IDLE_WEIGHT;
        score.max(0.0)
    }

    /// Eligible for selection at `now`, reviving an expired cooldown
    fn refresh(&mut self, now: u64) -> bool {
        if self.state == KeyState::Cooldown && now >= self.cooldown_until {
            self.state = KeyState::Available;
        }
        self.state == KeyState::Available && now >= self.cooldown_until
    }
}

/// A primary credential and the backups assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct KeyGroup<T> {
    pub primary: T,
    pub backups: Vec<T>,
}

/// Spread backups over primaries as evenly as possible.
///
/// Each primary gets `backups / primaries` of them; the first
/// `backups % primaries` primaries get one more. Order is preserved.
pub fn distribute_backups<T: Clone>(primaries: &[T], backups: &[T]) -> Vec<KeyGroup<T>> {
    if primaries.is_empty() {
        return Vec::new();
    }
    let base = backups.len() / primaries.len();
    let extra = backups.len() % primaries.len();

    let mut remaining = backups.iter().cloned();
    primaries
        .iter()
        .enumerate()
        .map(|(i, primary)| {
            let count = base + usize::from(i < extra);
            KeyGroup {
                primary: primary.clone(),
                backups: remaining.by_ref().take(count).collect(),
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct PoolState {
    members: Vec<CredentialRecord>,
    statuses: HashMap<String, KeyStatus>,
}

/// The credential pool of the active provider
#[derive(Debug, Default)]
pub struct KeyPool {
    state: Mutex<PoolState>,
    config: SchedulerConfig,
}

/// Outcome of a scheduled request
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<T> {
    Completed(T),
    /// Every credential stayed rate limited for the whole attempt budget
    Exhausted,
}

impl KeyPool {
    pub fn new(records: Vec<CredentialRecord>, config: SchedulerConfig) -> Self {
        let pool = Self {
            state: Mutex::new(PoolState::default()),
            config,
        };
        pool.sync(&records);
        pool
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().members.is_empty()
    }

    /// Make the pool match `records`, in their order.
    ///
    /// Statuses of credentials still present are kept, new credentials start
    /// available and statuses of removed credentials are dropped.
    pub fn sync(&self, records: &[CredentialRecord]) {
        let mut state = self.state.lock();
        let mut seen = HashSet::new();
        let members: Vec<_> = records
            .iter()
            .filter(|r| !r.is_blank() && seen.insert(r.ciphertext.clone()))
            .cloned()
            .collect();

        state.statuses.retain(|id, _| seen.contains(id));
        for record in &members {
            state.statuses.entry(record.ciphertext.clone()).or_default();
        }
        debug!("Key pool synced: {} credentials", members.len());
        state.members = members;
    }

    /// Pick the best available credential not in `excluded` and mark it in use
    pub fn claim(&self, now: u64, excluded: &HashSet<String>) -> Option<CredentialRecord> {
        let mut guard = self.state.lock();
        let PoolState { members, statuses } = &mut *guard;

        let mut best: Option<(usize, f64)> = None;
        for (position, record) in members.iter().enumerate() {
            if excluded.contains(&record.ciphertext) {
                continue;
            }
            let Some(status) = statuses.get_mut(&record.ciphertext) else {
                continue;
            };
            if !status.refresh(now) {
                continue;
            }
            let score = status.score(now);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((position, score));
            }
        }

        let (position, score) = best?;
        let record = members[position].clone();
        if let Some(status) = statuses.get_mut(&record.ciphertext) {
            status.state = KeyState::InUse;
            status.usage_count += 1;
            status.last_used_at = now;
        }
        debug!("Claimed credential #{} (score {:.1})", position, score);
        Some(record)
    }

    fn update(&self, record: &CredentialRecord, change: impl FnOnce(&mut KeyStatus)) {
        let mut state = self.state.lock();
        match state.statuses.get_mut(&record.ciphertext) {
            Some(status) => change(status),
            None => debug!("Ignoring status change for a credential outside the pool"),
        }
    }

    pub fn report_success(&self, record: &CredentialRecord) {
        self.update(record, |status| {
            status.state = KeyState::Available;
            status.cooldown_until = 0;
        });
    }

    /// Put a credential into cooldown after a rate-limit answer
    pub fn report_rate_limited(&self, record: &CredentialRecord, now: u64) {
        let cooldown = self.config.rate_limit_cooldown_ms;
        self.update(record, |status| {
            status.state = KeyState::Cooldown;
            status.last_used_at = now;
            status.cooldown_until = now + cooldown;
            status.rate_limit_hits += 1;
        });
    }

    /// Return a credential to the pool after a failure that was not a rate limit
    pub fn release(&self, record: &CredentialRecord) {
        self.update(record, |status| {
            if status.state == KeyState::InUse {
                status.state = KeyState::Available;
            }
        });
    }

    /// Earliest future cooldown expiry among pool members
    pub fn earliest_cooldown(&self, now: u64) -> Option<u64> {
        let state = self.state.lock();
        state
            .statuses
            .values()
            .map(|s| s.cooldown_until)
            .filter(|&until| until > now)
            .min()
    }

    /// Park every credential for the long cooldown
    pub fn exhaust(&self, now: u64) {
        let until = now + self.config.exhausted_cooldown_ms;
        let mut state = self.state.lock();
        for status in state.statuses.values_mut() {
            status.state = KeyState::Cooldown;
            status.cooldown_until = until;
        }
        warn!("All credentials exhausted; pool cooling down until {}", until);
    }

    pub fn status(&self, record: &CredentialRecord) -> Option<KeyStatus> {
        self.state.lock().statuses.get(&record.ciphertext).cloned()
    }

    /// Snapshot of statuses in pool order
    pub fn statuses(&self) -> Vec<KeyStatus> {
        let state = self.state.lock();
        state
            .members
            .iter()
            .filter_map(|r| state.statuses.get(&r.ciphertext).cloned())
            .collect()
    }

    /// Group the pool into primaries with evenly distributed backups
    pub fn groups(&self, primary_count: usize) -> Vec<KeyGroup<CredentialRecord>> {
        let state = self.state.lock();
        let split = primary_count.min(state.members.len());
        let (primaries, backups) = state.members.split_at(split);
        distribute_backups(primaries, backups)
    }

    /// Run `request` with scheduled credentials until it succeeds.
    ///
    /// Rate-limited credentials are skipped for the rest of the round. Other
    /// provider errors release the credential and are returned immediately.
    pub async fn dispatch<T, F, Fut>(&self, clock: &dyn Clock, mut request: F) -> Result<Dispatch<T>, ProviderError>
    where
        F: FnMut(CredentialRecord) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempts = 0;
        let mut excluded = HashSet::new();

        while attempts < self.config.max_attempts {
            let now = clock.now_ms();
            let Some(record) = self.claim(now, &excluded) else {
                attempts += 1;
                excluded.clear();
                match self.earliest_cooldown(now) {
                    Some(until) => {
                        debug!("No credential available; waiting {} ms", until - now);
                        clock.sleep(until - now).await;
                    }
                    None if self.is_empty() => break,
                    None => clock.sleep(self.config.rate_limit_cooldown_ms).await,
                }
                continue;
            };

            match request(record.clone()).await {
                Ok(value) => {
                    self.report_success(&record);
                    return Ok(Dispatch::Completed(value));
                }
                Err(e) if e.is_rate_limit() => {
                    debug!("Credential rate limited; trying another");
                    self.report_rate_limited(&record, clock.now_ms());
                    excluded.insert(record.ciphertext);
                }
                Err(e) => {
                    self.release(&record);
                    return Err(e);
                }
            }
        }

        self.exhaust(clock.now_ms());
        Ok(Dispatch::Exhausted)
    }
}
