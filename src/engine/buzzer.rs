//! Buzz race arbitration for the current clue.
//!
//! Every player gets exactly one outcome per clue. The first valid buzz wins
//! the right to answer; later valid buzzes are still recorded so the player
//! stays eligible for a second-chance window after a wrong answer.

use std::collections::HashSet;

use indexmap::IndexMap;

/// Outcome of one player's buzz race for the current clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// Milliseconds from window open to the buzz.
    Duration(u64),
    /// Player is ineligible: buzzed before the clue was revealed.
    CannotBuzz,
    /// The buzz window elapsed without a valid buzz from this player.
    TimedOut,
}

impl BuzzOutcome {
    /// Recorded race duration, if the player buzzed validly.
    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            BuzzOutcome::Duration(ms) => Some(*ms),
            _ => None,
        }
    }
}

/// What the arbiter decided about a single buzz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzVerdict {
    /// First valid buzz: the player wins the right to answer.
    Won {
        /// Milliseconds from window open to the buzz.
        duration_ms: u64,
    },
    /// Valid buzz after a winner was already decided; recorded only.
    Recorded {
        /// Milliseconds from window open to the buzz.
        duration_ms: u64,
    },
    /// Buzzed before the window opened; the player is out for this clue.
    Disqualified,
    /// Buzz arrived after the window budget elapsed.
    TooLate,
    /// The player already has an outcome for this clue; attempt dropped.
    Ignored,
}

/// Arbitrate one buzz attempt against the current window segment.
///
/// `open_ms` stamps when this segment opened (the reveal, or a second-chance
/// re-open) and `consumed_ms` is the budget already spent by earlier segments
/// of the same clue, so recorded durations stay comparable across re-opens.
/// A player's outcome, once set, is never overwritten for the same clue, so
/// re-attempts by disqualified players fall out as [`BuzzVerdict::Ignored`].
pub fn register_buzz(
    records: &mut IndexMap<String, BuzzOutcome>,
    winner: Option<&str>,
    user_id: &str,
    wall_ts_ms: u64,
    open_ms: u64,
    consumed_ms: u64,
    budget_ms: u64,
) -> BuzzVerdict {
    if records.contains_key(user_id) {
        return BuzzVerdict::Ignored;
    }

    // Pre-reveal buzzes disqualify; a buzz racing a re-open stamp is just a
    // zero-elapsed buzz in the new segment.
    if wall_ts_ms < open_ms && consumed_ms == 0 {
        records.insert(user_id.to_string(), BuzzOutcome::CannotBuzz);
        return BuzzVerdict::Disqualified;
    }

    let duration_ms = consumed_ms + wall_ts_ms.saturating_sub(open_ms);
    if duration_ms > budget_ms {
        records.insert(user_id.to_string(), BuzzOutcome::TimedOut);
        return BuzzVerdict::TooLate;
    }

    records.insert(user_id.to_string(), BuzzOutcome::Duration(duration_ms));
    match winner {
        Some(_) => BuzzVerdict::Recorded { duration_ms },
        None => BuzzVerdict::Won { duration_ms },
    }
}

/// Close the window: every listed player without an outcome is timed out.
pub fn close_window<'a>(
    records: &mut IndexMap<String, BuzzOutcome>,
    players: impl Iterator<Item = &'a str>,
) {
    for user_id in players {
        records
            .entry(user_id.to_string())
            .or_insert(BuzzOutcome::TimedOut);
    }
}

/// Pick the winner of a second-chance window from already-recorded buzzes.
///
/// Returns the fastest recorded buzz among players who have not yet answered
/// wrong for this clue. Equal durations resolve to the earliest-observed
/// record, which is the map's insertion order.
pub fn next_recorded_winner(
    records: &IndexMap<String, BuzzOutcome>,
    wrong_answerers: &HashSet<String>,
) -> Option<(String, u64)> {
    records
        .iter()
        .filter(|(user_id, _)| !wrong_answerers.contains(*user_id))
        .filter_map(|(user_id, outcome)| {
            outcome.duration_ms().map(|ms| (user_id.clone(), ms))
        })
        .min_by_key(|(_, ms)| *ms)
}

/// Whether any listed player could still produce a fresh buzz for this clue.
pub fn has_fresh_contenders<'a>(
    records: &IndexMap<String, BuzzOutcome>,
    players: impl Iterator<Item = &'a str>,
) -> bool {
    players.into_iter().any(|id| !records.contains_key(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> IndexMap<String, BuzzOutcome> {
        IndexMap::new()
    }

    #[test]
    fn first_valid_buzz_wins() {
        let mut recs = records();
        let verdict = register_buzz(&mut recs, None, "x", 10_300, 10_000, 0, 5_000);
        assert_eq!(verdict, BuzzVerdict::Won { duration_ms: 300 });
        assert_eq!(recs.get("x"), Some(&BuzzOutcome::Duration(300)));
    }

    #[test]
    fn later_buzzes_are_recorded_but_never_steal_the_win() {
        let mut recs = records();
        register_buzz(&mut recs, None, "x", 10_300, 10_000, 0, 5_000);
        let verdict = register_buzz(&mut recs, Some("x"), "y", 10_450, 10_000, 0, 5_000);
        assert_eq!(verdict, BuzzVerdict::Recorded { duration_ms: 450 });
        // A faster buzz observed later still does not win.
        let verdict = register_buzz(&mut recs, Some("x"), "z", 10_100, 10_000, 0, 5_000);
        assert_eq!(verdict, BuzzVerdict::Recorded { duration_ms: 100 });
    }

    #[test]
    fn pre_reveal_buzz_disqualifies_regardless_of_order() {
        let mut recs = records();
        let verdict = register_buzz(&mut recs, None, "x", 9_990, 10_000, 0, 5_000);
        assert_eq!(verdict, BuzzVerdict::Disqualified);
        assert_eq!(recs.get("x"), Some(&BuzzOutcome::CannotBuzz));

        // A later legitimate attempt from the same player is dropped.
        let verdict = register_buzz(&mut recs, None, "x", 10_200, 10_000, 0, 5_000);
        assert_eq!(verdict, BuzzVerdict::Ignored);
        assert_eq!(recs.get("x"), Some(&BuzzOutcome::CannotBuzz));
    }

    #[test]
    fn late_arrival_times_out() {
        let mut recs = records();
        let verdict = register_buzz(&mut recs, None, "x", 15_001, 10_000, 0, 5_000);
        assert_eq!(verdict, BuzzVerdict::TooLate);
        assert_eq!(recs.get("x"), Some(&BuzzOutcome::TimedOut));
    }

    #[test]
    fn buzz_exactly_at_budget_is_valid() {
        let mut recs = records();
        let verdict = register_buzz(&mut recs, None, "x", 15_000, 10_000, 0, 5_000);
        assert_eq!(verdict, BuzzVerdict::Won { duration_ms: 5_000 });
    }

    #[test]
    fn reopened_segment_buzzes_count_the_consumed_budget() {
        let mut recs = records();
        // 300 ms were consumed before the window re-opened at 24_000.
        let verdict = register_buzz(&mut recs, None, "y", 24_200, 24_000, 300, 5_000);
        assert_eq!(verdict, BuzzVerdict::Won { duration_ms: 500 });
        assert_eq!(recs.get("y"), Some(&BuzzOutcome::Duration(500)));
    }

    #[test]
    fn reopened_segment_still_enforces_the_total_budget() {
        let mut recs = records();
        let verdict = register_buzz(&mut recs, None, "y", 24_300, 24_000, 4_800, 5_000);
        assert_eq!(verdict, BuzzVerdict::TooLate);
        assert_eq!(recs.get("y"), Some(&BuzzOutcome::TimedOut));
    }

    #[test]
    fn buzz_racing_a_reopen_is_not_disqualified() {
        let mut recs = records();
        // Stamped just before the re-open; elapsed clamps to zero.
        let verdict = register_buzz(&mut recs, None, "y", 23_990, 24_000, 300, 5_000);
        assert_eq!(verdict, BuzzVerdict::Won { duration_ms: 300 });
    }

    #[test]
    fn close_window_times_out_everyone_without_an_outcome() {
        let mut recs = records();
        register_buzz(&mut recs, None, "x", 9_000, 10_000, 0, 5_000);
        close_window(&mut recs, ["x", "y", "z"].into_iter());
        assert_eq!(recs.get("x"), Some(&BuzzOutcome::CannotBuzz));
        assert_eq!(recs.get("y"), Some(&BuzzOutcome::TimedOut));
        assert_eq!(recs.get("z"), Some(&BuzzOutcome::TimedOut));
    }

    #[test]
    fn second_chance_picks_fastest_remaining_recorded_buzz() {
        let mut recs = records();
        register_buzz(&mut recs, None, "x", 10_300, 10_000, 0, 5_000);
        register_buzz(&mut recs, Some("x"), "y", 10_450, 10_000, 0, 5_000);
        register_buzz(&mut recs, Some("x"), "z", 10_400, 10_000, 0, 5_000);

        let mut wrong = HashSet::new();
        wrong.insert("x".to_string());
        assert_eq!(
            next_recorded_winner(&recs, &wrong),
            Some(("z".to_string(), 400))
        );
    }

    #[test]
    fn second_chance_ties_resolve_to_first_observed() {
        let mut recs = records();
        register_buzz(&mut recs, None, "x", 10_300, 10_000, 0, 5_000);
        register_buzz(&mut recs, Some("x"), "y", 10_450, 10_000, 0, 5_000);
        register_buzz(&mut recs, Some("x"), "z", 10_450, 10_000, 0, 5_000);

        let mut wrong = HashSet::new();
        wrong.insert("x".to_string());
        assert_eq!(
            next_recorded_winner(&recs, &wrong),
            Some(("y".to_string(), 450))
        );
    }

    #[test]
    fn fresh_contenders_excludes_players_with_outcomes() {
        let mut recs = records();
        register_buzz(&mut recs, None, "x", 10_300, 10_000, 0, 5_000);
        assert!(has_fresh_contenders(&recs, ["x", "y"].into_iter()));
        assert!(!has_fresh_contenders(&recs, ["x"].into_iter()));
    }
}
