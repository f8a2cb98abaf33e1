//! Predictive client-side cache of per-show watch facts.
//!
//! After a mutation request is issued, the mirror applies the same toggle to
//! a local snapshot and re-derives state through [`derive`], so the card
//! moves to its predicted bucket before the authoritative response lands.
//! Responses are reconciled by issuance order: only the newest outstanding
//! mutation for a show may replace (on success) or restore (on failure) the
//! snapshot; responses for superseded mutations are dropped.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::categorize::{Bucket, categorize};
use super::{Derivation, EpisodeFacts, derive};

/// Raw facts for one show as last confirmed by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowSnapshot {
    pub show_id: i32,
    pub name: String,
    pub status: String,
    pub status_override: Option<String>,
    pub episodes: Vec<EpisodeFacts>,
}

/// Identifies one issued mutation. Sequence numbers are monotonic per
/// mirror, so later tokens always compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationToken {
    pub show_id: i32,
    seq: u64,
}

/// A show card as the listing sees it.
#[derive(Debug, Clone)]
pub struct MirrorCard {
    pub show_id: i32,
    pub name: String,
    pub derivation: Derivation,
}

#[derive(Debug)]
struct Entry {
    current: ShowSnapshot,
    /// Snapshots taken immediately before each in-flight mutation, oldest
    /// first, keyed by sequence number.
    inflight: Vec<(u64, ShowSnapshot)>,
    last_seq: u64,
}

#[derive(Debug, Default)]
pub struct OptimisticMirror {
    shows: HashMap<i32, Entry>,
    next_seq: u64,
}

impl OptimisticMirror {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a show with authoritative facts. Clears any
    /// in-flight bookkeeping for it.
    pub fn load(&mut self, snapshot: ShowSnapshot) {
        self.shows.insert(
            snapshot.show_id,
            Entry {
                current: snapshot,
                inflight: Vec::new(),
                last_seq: 0,
            },
        );
    }

    #[must_use]
    pub fn snapshot(&self, show_id: i32) -> Option<&ShowSnapshot> {
        self.shows.get(&show_id).map(|e| &e.current)
    }

    /// Derived view of one show. Same function the server runs.
    #[must_use]
    pub fn view(&self, show_id: i32, as_of: NaiveDate) -> Option<Derivation> {
        self.shows.get(&show_id).map(|e| {
            derive(
                &e.current.status,
                e.current.status_override.as_deref(),
                &e.current.episodes,
                as_of,
            )
        })
    }

    /// Bucketed listing over every mirrored show. Same bucketing rule the
    /// server runs.
    #[must_use]
    pub fn buckets(&self, as_of: NaiveDate) -> Vec<Bucket<MirrorCard>> {
        let cards: Vec<MirrorCard> = self
            .shows
            .values()
            .map(|e| MirrorCard {
                show_id: e.current.show_id,
                name: e.current.name.clone(),
                derivation: derive(
                    &e.current.status,
                    e.current.status_override.as_deref(),
                    &e.current.episodes,
                    as_of,
                ),
            })
            .collect();
        categorize(cards, |c| c.derivation.state, |c| c.name.as_str())
    }

    /// Predictively toggle one episode. Returns `None` when the show or
    /// episode is not mirrored (nothing to predict over).
    pub fn toggle_episode(
        &mut self,
        show_id: i32,
        episode_id: i32,
        watched: bool,
    ) -> Option<MutationToken> {
        let entry = self.shows.get_mut(&show_id)?;
        if !entry.current.episodes.iter().any(|e| e.id == episode_id) {
            return None;
        }
        let seq = self.next_seq + 1;
        self.next_seq = seq;
        entry.inflight.push((seq, entry.current.clone()));
        entry.last_seq = seq;
        for episode in &mut entry.current.episodes {
            if episode.id == episode_id {
                episode.watched = watched;
            }
        }
        Some(MutationToken { show_id, seq })
    }

    /// Predictively toggle a whole season.
    pub fn toggle_season(
        &mut self,
        show_id: i32,
        season: i32,
        watched: bool,
    ) -> Option<MutationToken> {
        let entry = self.shows.get_mut(&show_id)?;
        let seq = self.next_seq + 1;
        self.next_seq = seq;
        entry.inflight.push((seq, entry.current.clone()));
        entry.last_seq = seq;
        for episode in &mut entry.current.episodes {
            if episode.season == season {
                episode.watched = watched;
            }
        }
        Some(MutationToken { show_id, seq })
    }

    /// Predictively set or clear the profile-level override.
    pub fn set_status_override(
        &mut self,
        show_id: i32,
        value: Option<&str>,
    ) -> Option<MutationToken> {
        let entry = self.shows.get_mut(&show_id)?;
        let seq = self.next_seq + 1;
        self.next_seq = seq;
        entry.inflight.push((seq, entry.current.clone()));
        entry.last_seq = seq;
        entry.current.status_override = value.map(String::from);
        Some(MutationToken { show_id, seq })
    }

    /// Successful response: adopt the authoritative snapshot, unless a newer
    /// mutation was issued in the meantime (then the response is stale and
    /// ignored entirely).
    pub fn confirm(&mut self, token: MutationToken, authoritative: ShowSnapshot) {
        let Some(entry) = self.shows.get_mut(&token.show_id) else {
            return;
        };
        if token.seq == entry.last_seq {
            entry.current = authoritative;
            entry.inflight.clear();
        } else {
            entry.inflight.retain(|(seq, _)| *seq != token.seq);
        }
    }

    /// Failed response: restore the pre-mutation snapshot, unless a newer
    /// mutation was issued in the meantime (then the newer optimistic state
    /// wins and the stale failure is dropped).
    pub fn reject(&mut self, token: MutationToken) {
        let Some(entry) = self.shows.get_mut(&token.show_id) else {
            return;
        };
        if token.seq == entry.last_seq {
            if let Some(position) = entry.inflight.iter().position(|(seq, _)| *seq == token.seq) {
                let (_, prior) = entry.inflight.remove(position);
                entry.current = prior;
            }
        } else {
            entry.inflight.retain(|(seq, _)| *seq != token.seq);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::WatchState;
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ep(id: i32, season: i32, number: i32, airdate: &str, watched: bool) -> EpisodeFacts {
        EpisodeFacts {
            id,
            season,
            number,
            airdate: Some(airdate.to_string()),
            watched,
        }
    }

    fn snapshot(show_id: i32, name: &str, episodes: Vec<EpisodeFacts>) -> ShowSnapshot {
        ShowSnapshot {
            show_id,
            name: name.to_string(),
            status: "Running".to_string(),
            status_override: None,
            episodes,
        }
    }

    const AS_OF: &str = "2024-06-01";

    #[test]
    fn optimistic_toggle_moves_show_between_buckets() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(
            10,
            "Dark",
            vec![
                ep(1, 1, 1, "2024-01-01", false),
                ep(2, 1, 2, "2024-01-08", false),
            ],
        ));
        let as_of = date(AS_OF);

        assert_eq!(mirror.view(10, as_of).unwrap().state, WatchState::Queued);

        mirror.toggle_episode(10, 1, true).unwrap();
        assert_eq!(mirror.view(10, as_of).unwrap().state, WatchState::Watching);

        let buckets = mirror.buckets(as_of);
        assert_eq!(buckets[1].shows.len(), 1);
        assert_eq!(buckets[1].shows[0].show_id, 10);
    }

    #[test]
    fn confirm_adopts_authoritative_snapshot() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(10, "Dark", vec![ep(1, 1, 1, "2024-01-01", false)]));

        let token = mirror.toggle_episode(10, 1, true).unwrap();
        let authoritative = snapshot(10, "Dark", vec![ep(1, 1, 1, "2024-01-01", true)]);
        mirror.confirm(token, authoritative.clone());

        assert_eq!(mirror.snapshot(10), Some(&authoritative));
    }

    #[test]
    fn reject_restores_pre_mutation_snapshot() {
        let mut mirror = OptimisticMirror::new();
        let before = snapshot(10, "Dark", vec![ep(1, 1, 1, "2024-01-01", false)]);
        mirror.load(before.clone());

        let token = mirror.toggle_episode(10, 1, true).unwrap();
        assert!(mirror.snapshot(10).unwrap().episodes[0].watched);

        mirror.reject(token);
        assert_eq!(mirror.snapshot(10), Some(&before));
    }

    #[test]
    fn second_toggle_builds_on_latest_mirrored_snapshot() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(
            10,
            "Dark",
            vec![
                ep(1, 1, 1, "2024-01-01", false),
                ep(2, 1, 2, "2024-01-08", false),
            ],
        ));

        mirror.toggle_episode(10, 1, true).unwrap();
        mirror.toggle_episode(10, 2, true).unwrap();

        let episodes = &mirror.snapshot(10).unwrap().episodes;
        assert!(episodes[0].watched && episodes[1].watched);
    }

    #[test]
    fn stale_success_does_not_overwrite_newer_optimistic_state() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(
            10,
            "Dark",
            vec![
                ep(1, 1, 1, "2024-01-01", false),
                ep(2, 1, 2, "2024-01-08", false),
            ],
        ));

        let first = mirror.toggle_episode(10, 1, true).unwrap();
        mirror.toggle_episode(10, 2, true).unwrap();

        // Authoritative result for the first mutation only.
        let stale = snapshot(
            10,
            "Dark",
            vec![
                ep(1, 1, 1, "2024-01-01", true),
                ep(2, 1, 2, "2024-01-08", false),
            ],
        );
        mirror.confirm(first, stale);

        // The newer optimistic toggle on episode 2 survives.
        assert!(mirror.snapshot(10).unwrap().episodes[1].watched);
    }

    #[test]
    fn stale_failure_is_dropped_entirely() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(
            10,
            "Dark",
            vec![
                ep(1, 1, 1, "2024-01-01", false),
                ep(2, 1, 2, "2024-01-08", false),
            ],
        ));

        let first = mirror.toggle_episode(10, 1, true).unwrap();
        mirror.toggle_episode(10, 2, true).unwrap();

        mirror.reject(first);

        let episodes = &mirror.snapshot(10).unwrap().episodes;
        assert!(episodes[0].watched && episodes[1].watched);
    }

    #[test]
    fn rollback_leaves_other_shows_untouched() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(10, "Dark", vec![ep(1, 1, 1, "2024-01-01", false)]));
        mirror.load(snapshot(20, "Severance", vec![ep(9, 1, 1, "2024-02-01", false)]));

        let failing = mirror.toggle_episode(10, 1, true).unwrap();
        mirror.toggle_episode(20, 9, true).unwrap();

        mirror.reject(failing);

        assert!(!mirror.snapshot(10).unwrap().episodes[0].watched);
        assert!(mirror.snapshot(20).unwrap().episodes[0].watched);
    }

    #[test]
    fn season_toggle_and_override_are_predicted_too() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(
            10,
            "Dark",
            vec![
                ep(1, 1, 1, "2024-01-01", false),
                ep(2, 1, 2, "2024-01-08", false),
                ep(3, 2, 1, "2024-03-01", false),
            ],
        ));
        let as_of = date(AS_OF);

        mirror.toggle_season(10, 1, true).unwrap();
        assert_eq!(mirror.view(10, as_of).unwrap().state, WatchState::WatchNext);

        mirror.set_status_override(10, Some("stopped")).unwrap();
        assert_eq!(mirror.view(10, as_of).unwrap().state, WatchState::Stopped);
    }

    #[test]
    fn unknown_show_or_episode_yields_no_token() {
        let mut mirror = OptimisticMirror::new();
        mirror.load(snapshot(10, "Dark", vec![ep(1, 1, 1, "2024-01-01", false)]));

        assert!(mirror.toggle_episode(99, 1, true).is_none());
        assert!(mirror.toggle_episode(10, 99, true).is_none());
    }
}
