//! Watch-state derivation over raw catalog + watch-mark facts.
//!
//! Everything in this module is pure: no clock reads, no I/O. The reference
//! date (`as_of`) is always an explicit parameter so the server and any
//! predictive client-side copy evaluate identically for the same inputs.

pub mod categorize;
pub mod mirror;

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use categorize::{BUCKETS, Bucket, categorize};

/// The only supported profile-level override value.
pub const STOPPED_OVERRIDE: &str = "stopped";

/// Canonical per-(profile, show) watch state. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchState {
    WatchNext,
    Watching,
    Queued,
    UpToDate,
    Completed,
    Stopped,
}

impl WatchState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WatchNext => "watch-next",
            Self::Watching => "watching",
            Self::Queued => "queued",
            Self::UpToDate => "up-to-date",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One episode as the derivation sees it: catalog facts plus the profile's
/// watched flag. Airdates stay as `YYYY-MM-DD` strings; ordering on the raw
/// string is part of the contract (missing date sorts first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeFacts {
    pub id: i32,
    pub season: i32,
    pub number: i32,
    pub airdate: Option<String>,
    pub watched: bool,
}

/// Aggregate counters surfaced alongside the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStats {
    pub total: usize,
    pub watched: usize,
    pub released: usize,
    pub released_unwatched: usize,
    pub has_future: bool,
}

/// Output of [`derive`].
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub state: WatchState,
    pub next_episode: Option<EpisodeFacts>,
    pub stats: WatchStats,
}

/// An episode counts as released iff its airdate parses and is on or before
/// `as_of`, compared as calendar dates. A missing or unparseable date is
/// never released.
#[must_use]
pub fn released(airdate: Option<&str>, as_of: NaiveDate) -> bool {
    airdate
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .is_some_and(|d| d <= as_of)
}

/// Compute the canonical watch state, the next episode to watch, and the
/// aggregate counters for one show. Total: every input combination maps to a
/// state.
#[must_use]
pub fn derive(
    status: &str,
    status_override: Option<&str>,
    episodes: &[EpisodeFacts],
    as_of: NaiveDate,
) -> Derivation {
    let released_eps: Vec<&EpisodeFacts> = episodes
        .iter()
        .filter(|e| released(e.airdate.as_deref(), as_of))
        .collect();
    let released_unwatched: Vec<&EpisodeFacts> = released_eps
        .iter()
        .copied()
        .filter(|e| !e.watched)
        .collect();

    // (released, released-and-watched) per season, released seasons only.
    let mut seasons: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for e in &released_eps {
        let counts = seasons.entry(e.season).or_default();
        counts.0 += 1;
        if e.watched {
            counts.1 += 1;
        }
    }
    let has_partially_watched_season = seasons
        .values()
        .any(|&(total, watched)| watched > 0 && watched < total);

    let watched_count = episodes.iter().filter(|e| e.watched).count();
    let started = watched_count > 0;
    let has_released = !released_eps.is_empty();
    let has_future = episodes
        .iter()
        .any(|e| e.airdate.is_some() && !released(e.airdate.as_deref(), as_of));
    let is_ended = status.eq_ignore_ascii_case("ended");
    let all_released_watched = has_released && released_unwatched.is_empty();
    let all_episodes_watched = !episodes.is_empty() && episodes.iter().all(|e| e.watched);

    // Rule order is load-bearing: a season in progress outranks merely having
    // something next, and the stopped override outranks everything.
    let state = if status_override == Some(STOPPED_OVERRIDE) {
        WatchState::Stopped
    } else if has_partially_watched_season {
        WatchState::Watching
    } else if started && !released_unwatched.is_empty() {
        WatchState::WatchNext
    } else if !started && has_released {
        WatchState::Queued
    } else if started && all_released_watched && !is_ended {
        WatchState::UpToDate
    } else if is_ended && all_episodes_watched {
        WatchState::Completed
    } else if !has_released {
        WatchState::Queued
    } else {
        WatchState::UpToDate
    };

    let next_episode = earliest_by_airdate(&released_unwatched).or_else(|| {
        let future: Vec<&EpisodeFacts> = episodes
            .iter()
            .filter(|e| !e.watched && !released(e.airdate.as_deref(), as_of))
            .collect();
        earliest_by_airdate(&future)
    });

    Derivation {
        state,
        next_episode,
        stats: WatchStats {
            total: episodes.len(),
            watched: watched_count,
            released: released_eps.len(),
            released_unwatched: released_unwatched.len(),
            has_future,
        },
    }
}

/// First candidate under lexical airdate order, missing dates first. Stable:
/// ties keep input order.
fn earliest_by_airdate(candidates: &[&EpisodeFacts]) -> Option<EpisodeFacts> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| a.airdate.cmp(&b.airdate));
    sorted.first().map(|e| (*e).clone())
}
