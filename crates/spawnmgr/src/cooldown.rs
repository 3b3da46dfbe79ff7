//! Per-player cooldown tracking.
//!
//! A record maps a player's uuid to the absolute time (in milliseconds) at
//! which the cooldown ends. Records are dropped in two ways: lazily when
//! [`CooldownTracker::is_active`] sees an expired record, and by a one-shot
//! deferred eviction the caller schedules with the delay returned from
//! [`CooldownTracker::start`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use spawnmgr_plugin_api::PlayerRef;
use tracing::debug;

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Source of the current time in milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time since the UNIX epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        millis(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
        )
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Tracks when each player may use a throttled action again.
pub struct CooldownTracker {
    duration: Duration,
    clock: Arc<dyn Clock>,
    expires_at: HashMap<String, u64>,
}

impl CooldownTracker {
    pub fn new(duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            duration,
            clock,
            expires_at: HashMap::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether `player` is still cooling down. Operators never are.
    ///
    /// An expired record is evicted here.
    pub fn is_active(&mut self, player: &dyn PlayerRef) -> bool {
        if player.is_op() {
            return false;
        }
        let now = self.clock.now_millis();
        match self.expires_at.get(player.uuid()) {
            Some(&expires_at) if now < expires_at => true,
            Some(_) => {
                self.expires_at.remove(player.uuid());
                false
            }
            None => false,
        }
    }

    /// Time left before the cooldown of `player_id` ends, floored at zero.
    pub fn remaining(&self, player_id: &str) -> Duration {
        let now = self.clock.now_millis();
        self.expires_at
            .get(player_id)
            .map(|&expires_at| Duration::from_millis(expires_at.saturating_sub(now)))
            .unwrap_or(Duration::ZERO)
    }

    /// (Re)start the cooldown for `player_id`.
    ///
    /// Returns the delay after which [`evict`](Self::evict) should run, or
    /// `None` when the cooldown is disabled (zero duration).
    pub fn start(&mut self, player_id: &str) -> Option<Duration> {
        if self.duration.is_zero() {
            return None;
        }
        let expires_at = self
            .clock
            .now_millis()
            .saturating_add(millis(self.duration));
        self.expires_at.insert(player_id.to_string(), expires_at);
        Some(self.duration)
    }

    /// Deferred cleanup for `player_id`. Only an expired record is removed,
    /// so a cooldown restarted in the meantime survives.
    pub fn evict(&mut self, player_id: &str) -> bool {
        let now = self.clock.now_millis();
        match self.expires_at.get(player_id) {
            Some(&expires_at) if now >= expires_at => {
                self.expires_at.remove(player_id);
                debug!("Evicted cooldown for {player_id}");
                true
            }
            _ => false,
        }
    }

    /// Remove every expired record. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let now = self.clock.now_millis();
        let before = self.expires_at.len();
        self.expires_at.retain(|_, expires_at| now < *expires_at);
        before - self.expires_at.len()
    }

    /// Number of records currently held, expired or not.
    pub fn len(&self) -> usize {
        self.expires_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expires_at.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::player;

    fn tracker(secs: u64) -> (CooldownTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let tracker = CooldownTracker::new(Duration::from_secs(secs), clock.clone());
        (tracker, clock)
    }

    #[test]
    fn start_then_active() {
        let (mut cd, _clock) = tracker(10);
        let p = player("p1");
        assert!(!cd.is_active(&p));
        assert_eq!(cd.start(p.uuid()), Some(Duration::from_secs(10)));
        assert!(cd.is_active(&p));
    }

    #[test]
    fn ten_second_scenario() {
        let (mut cd, clock) = tracker(10);
        let p = player("p1");
        cd.start(p.uuid());

        clock.advance(Duration::from_secs(5));
        assert!(cd.is_active(&p));
        assert_eq!(cd.remaining(p.uuid()), Duration::from_millis(5000));

        clock.advance(Duration::from_secs(6));
        assert!(!cd.is_active(&p));
        assert_eq!(cd.remaining(p.uuid()), Duration::ZERO);
    }

    #[test]
    fn expired_record_is_evicted_on_check() {
        let (mut cd, clock) = tracker(3);
        let p = player("p1");
        cd.start(p.uuid());
        clock.advance(Duration::from_secs(3));
        assert_eq!(cd.len(), 1);
        assert!(!cd.is_active(&p));
        assert!(cd.is_empty());
    }

    #[test]
    fn remaining_does_not_evict() {
        let (mut cd, clock) = tracker(1);
        cd.start("p1");
        clock.advance(Duration::from_secs(2));
        assert_eq!(cd.remaining("p1"), Duration::ZERO);
        assert_eq!(cd.len(), 1);
        assert_eq!(cd.remaining("unknown"), Duration::ZERO);
    }

    #[test]
    fn operators_bypass() {
        let (mut cd, _clock) = tracker(10);
        let mut op = player("admin");
        op.op = true;
        cd.start(op.uuid());
        assert!(!cd.is_active(&op));
        // The record itself is still there.
        assert!(cd.remaining(op.uuid()) > Duration::ZERO);
    }

    #[test]
    fn zero_duration_disables_cooldown() {
        let (mut cd, _clock) = tracker(0);
        let p = player("p1");
        assert_eq!(cd.start(p.uuid()), None);
        assert!(!cd.is_active(&p));
        assert!(cd.is_empty());
    }

    #[test]
    fn evict_only_removes_expired() {
        let (mut cd, clock) = tracker(10);
        cd.start("p1");
        assert!(!cd.evict("p1"));
        clock.advance(Duration::from_secs(10));
        assert!(cd.evict("p1"));
        assert!(!cd.evict("p1"));
        assert!(!cd.evict("never-seen"));
    }

    #[test]
    fn restart_extends_expiry() {
        let (mut cd, clock) = tracker(10);
        cd.start("p1");
        clock.advance(Duration::from_secs(8));
        cd.start("p1");
        clock.advance(Duration::from_secs(2));
        // The first cooldown's eviction fires now but the record is fresh.
        assert!(!cd.evict("p1"));
        assert_eq!(cd.remaining("p1"), Duration::from_secs(8));
    }

    #[test]
    fn sweep_drops_expired_only() {
        let (mut cd, clock) = tracker(5);
        cd.start("early");
        clock.advance(Duration::from_secs(3));
        cd.start("late");
        clock.advance(Duration::from_secs(2));
        assert_eq!(cd.sweep(), 1);
        assert_eq!(cd.len(), 1);
        assert!(cd.remaining("late") > Duration::ZERO);
    }

    #[test]
    fn huge_duration_saturates() {
        let secs = 18_446_744_073_709_552;
        let (mut cd, clock) = tracker(secs);
        assert_eq!(cd.duration(), Duration::from_secs(secs));
        let p = player("p1");
        cd.start(p.uuid());
        clock.advance(Duration::from_secs(3600));
        assert!(cd.is_active(&p));
        assert!(cd.remaining(p.uuid()) > Duration::from_secs(3600));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(a > 0);
        assert!(b >= a);
    }
}
