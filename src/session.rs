//! Game session recording.
//!
//! Results submitted within 24 hours of a user's latest session are folded
//! into it; otherwise a new session starts.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NumgenError, Result};

/// Counters reported at the end of a game.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameTotals {
    /// Problems shown.
    pub total_problems: u32,
    /// Problems answered correctly.
    pub problems_correct: u32,
    /// Problems answered wrong.
    pub problems_wrong: u32,
}

/// Accumulated results of one user over a day of play.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    /// Session id.
    pub id: u64,
    /// Owner.
    pub user_id: u64,
    /// When the session started.
    pub session_date: DateTime<Utc>,
    /// Problems shown.
    pub total_problems: u32,
    /// Problems answered correctly.
    pub problems_correct: u32,
    /// Problems answered wrong.
    pub problems_wrong: u32,
}

/// A trait for game session stores.
pub trait SessionRecorder: Send + Sync {
    /// Append `totals` to the user's session from the trailing 24 hours, or
    /// start a new one dated `now`.
    fn record(&self, user_id: u64, totals: GameTotals, now: DateTime<Utc>) -> Result<GameSession>;

    /// All sessions of a user, newest first.
    fn sessions_for(&self, user_id: u64) -> Result<Vec<GameSession>>;
}

/// Merge window for [`SessionRecorder::record`].
pub fn merge_window() -> Duration {
    Duration::hours(24)
}

#[derive(Default)]
struct Sessions {
    next_id: u64,
    rows: Vec<GameSession>,
}

/// Session store kept in process memory.
#[derive(Default)]
pub struct InMemorySessions {
    inner: Mutex<Sessions>,
}

impl InMemorySessions {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRecorder for InMemorySessions {
    fn record(&self, user_id: u64, totals: GameTotals, now: DateTime<Utc>) -> Result<GameSession> {
        let mut sessions = self
            .inner
            .lock()
            .map_err(|e| NumgenError::SessionError(e.to_string()))?;
        let since = now - merge_window();
        let recent = sessions
            .rows
            .iter_mut()
            .filter(|s| s.user_id == user_id && s.session_date >= since)
            .max_by_key(|s| s.session_date);

        if let Some(session) = recent {
            session.total_problems = session.total_problems.saturating_add(totals.total_problems);
            session.problems_correct = session
                .problems_correct
                .saturating_add(totals.problems_correct);
            session.problems_wrong = session.problems_wrong.saturating_add(totals.problems_wrong);
            return Ok(session.clone());
        }

        sessions.next_id += 1;
        let session = GameSession {
            id: sessions.next_id,
            user_id,
            session_date: now,
            total_problems: totals.total_problems,
            problems_correct: totals.problems_correct,
            problems_wrong: totals.problems_wrong,
        };
        sessions.rows.push(session.clone());
        Ok(session)
    }

    fn sessions_for(&self, user_id: u64) -> Result<Vec<GameSession>> {
        let sessions = self
            .inner
            .lock()
            .map_err(|e| NumgenError::SessionError(e.to_string()))?;
        let mut rows: Vec<GameSession> = sessions
            .rows
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.session_date.cmp(&a.session_date));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn totals(total: u32, correct: u32, wrong: u32) -> GameTotals {
        GameTotals {
            total_problems: total,
            problems_correct: correct,
            problems_wrong: wrong,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour as i64)
    }

    #[test]
    fn first_game_creates_session() {
        let store = InMemorySessions::new();
        let session = store.record(1, totals(10, 7, 3), at(0)).unwrap();
        assert_eq!(session.id, 1);
        assert_eq!(session.session_date, at(0));
        assert_eq!(session.total_problems, 10);
    }

    #[test]
    fn games_within_a_day_accumulate() {
        let store = InMemorySessions::new();
        store.record(1, totals(10, 7, 3), at(0)).unwrap();
        let merged = store.record(1, totals(5, 5, 0), at(23)).unwrap();
        assert_eq!(merged.id, 1);
        assert_eq!(merged.session_date, at(0));
        assert_eq!((merged.total_problems, merged.problems_correct, merged.problems_wrong), (15, 12, 3));
        assert_eq!(store.sessions_for(1).unwrap().len(), 1);
    }

    #[test]
    fn boundary_of_window_still_merges() {
        let store = InMemorySessions::new();
        store.record(1, totals(1, 1, 0), at(0)).unwrap();
        let merged = store.record(1, totals(1, 0, 1), at(24)).unwrap();
        assert_eq!(merged.id, 1);
    }

    #[test]
    fn stale_session_starts_a_new_one() {
        let store = InMemorySessions::new();
        store.record(1, totals(10, 7, 3), at(0)).unwrap();
        let fresh = store.record(1, totals(4, 2, 2), at(25)).unwrap();
        assert_eq!(fresh.id, 2);
        assert_eq!(fresh.total_problems, 4);

        let listed = store.sessions_for(1).unwrap();
        assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn users_are_kept_apart() {
        let store = InMemorySessions::new();
        store.record(1, totals(10, 7, 3), at(0)).unwrap();
        let other = store.record(2, totals(1, 1, 0), at(1)).unwrap();
        assert_eq!(other.id, 2);
        assert_eq!(other.total_problems, 1);
        assert!(store.sessions_for(3).unwrap().is_empty());
    }
}
