//! Fixed-order bucketing of shows by derived watch state.

use super::WatchState;

/// Listing order. Callers never merge or reorder these; empty buckets are
/// still emitted.
pub const BUCKETS: [WatchState; 6] = [
    WatchState::WatchNext,
    WatchState::Watching,
    WatchState::Queued,
    WatchState::UpToDate,
    WatchState::Completed,
    WatchState::Stopped,
];

impl WatchState {
    /// Display label for the bucket headed by this state.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WatchNext => "Watch Next",
            Self::Watching => "Watching",
            Self::Queued => "Not Started",
            Self::UpToDate => "Up to Date",
            Self::Completed => "Finished",
            Self::Stopped => "Stopped",
        }
    }

    const fn bucket_index(self) -> usize {
        match self {
            Self::WatchNext => 0,
            Self::Watching => 1,
            Self::Queued => 2,
            Self::UpToDate => 3,
            Self::Completed => 4,
            Self::Stopped => 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bucket<T> {
    pub state: WatchState,
    pub label: &'static str,
    pub shows: Vec<T>,
}

/// Distribute items into the six buckets, name-sorted (case-insensitive)
/// within each bucket.
pub fn categorize<T>(
    mut items: Vec<T>,
    state_of: impl Fn(&T) -> WatchState,
    name_of: impl Fn(&T) -> &str,
) -> Vec<Bucket<T>> {
    items.sort_by(|a, b| {
        name_of(a)
            .to_lowercase()
            .cmp(&name_of(b).to_lowercase())
    });

    let mut buckets: Vec<Bucket<T>> = BUCKETS
        .iter()
        .map(|&state| Bucket {
            state,
            label: state.label(),
            shows: Vec::new(),
        })
        .collect();

    for item in items {
        let index = state_of(&item).bucket_index();
        buckets[index].shows.push(item);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Card {
        name: &'static str,
        state: WatchState,
    }

    fn card(name: &'static str, state: WatchState) -> Card {
        Card { name, state }
    }

    #[test]
    fn buckets_keep_fixed_order_and_include_empties() {
        let buckets = categorize(
            vec![card("Severance", WatchState::Queued)],
            |c| c.state,
            |c| c.name,
        );
        assert_eq!(buckets.len(), 6);
        let order: Vec<WatchState> = buckets.iter().map(|b| b.state).collect();
        assert_eq!(order.as_slice(), BUCKETS.as_slice());
        assert_eq!(buckets[2].shows.len(), 1);
        assert!(buckets[0].shows.is_empty());
        assert!(buckets[5].shows.is_empty());
    }

    #[test]
    fn shows_sort_by_name_within_bucket() {
        let buckets = categorize(
            vec![
                card("the Wire", WatchState::Completed),
                card("Andor", WatchState::Completed),
                card("Barry", WatchState::Completed),
            ],
            |c| c.state,
            |c| c.name,
        );
        let names: Vec<&str> = buckets[4].shows.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Andor", "Barry", "the Wire"]);
    }

    #[test]
    fn labels_match_display_names() {
        assert_eq!(WatchState::Completed.label(), "Finished");
        assert_eq!(WatchState::Queued.label(), "Not Started");
        assert_eq!(WatchState::WatchNext.label(), "Watch Next");
    }
}
