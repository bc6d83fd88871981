/// Outcome of advancing a free-after-N counter by one occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOutcome {
    pub is_free: bool,
    pub new_count: i32,
    pub remaining: i32,
}

/// Engine for the "N paid services, then one free" cycle
///
/// The threshold is the number of PAID services per cycle: with a threshold
/// of 4, occurrences 1-4 are paid and the 5th is free. The comparison is
/// strictly greater-than, never greater-or-equal: after N paid visits the
/// counter equals N, and the very next occurrence crosses the threshold,
/// becomes free, and resets the counter to 0.
pub struct ThresholdCounter;

impl ThresholdCounter {
    /// Advance the counter for one service occurrence
    ///
    /// # Arguments
    /// * `count` - Current counter value, in [0, threshold]
    /// * `threshold` - Paid occurrences per cycle (positive)
    ///
    /// # Returns
    /// The outcome for this occurrence: whether it is free, the counter
    /// value to persist, and how many occurrences remain in the cycle
    /// (remaining = threshold + 1 on the free visit, since a full new cycle
    /// starts after it).
    pub fn advance(count: i32, threshold: i32) -> CounterOutcome {
        let next_count = count + 1;

        if next_count > threshold {
            CounterOutcome {
                is_free: true,
                new_count: 0,
                remaining: threshold + 1,
            }
        } else {
            CounterOutcome {
                is_free: false,
                new_count: next_count,
                remaining: threshold + 1 - next_count,
            }
        }
    }

    /// Staff-facing status line for a processed service
    pub fn progress_message(service_name: &str, outcome: &CounterOutcome, threshold: i32) -> String {
        let cycle = threshold + 1;
        if outcome.is_free {
            format!(
                "{} is free! Client completed {} services.",
                service_name, cycle
            )
        } else {
            format!(
                "Service {}/{}. {} more until the next free one.",
                outcome.new_count, cycle, outcome.remaining
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// threshold = 4: visits 1-4 are paid, visit 5 is free
    #[test]
    fn test_threshold_four_full_cycle() {
        let threshold = 4;
        let mut count = 0;

        let expected = [
            (false, 1, 4),
            (false, 2, 3),
            (false, 3, 2),
            (false, 4, 1),
            (true, 0, 5),
        ];

        for (is_free, new_count, remaining) in expected {
            let outcome = ThresholdCounter::advance(count, threshold);
            assert_eq!(outcome.is_free, is_free);
            assert_eq!(outcome.new_count, new_count);
            assert_eq!(outcome.remaining, remaining);
            count = outcome.new_count;
        }
    }

    /// The sixth call starts a fresh paid cycle
    #[test]
    fn test_cycle_restarts_after_free_visit() {
        let threshold = 4;
        let mut count = 0;

        for _ in 0..5 {
            count = ThresholdCounter::advance(count, threshold).new_count;
        }

        let sixth = ThresholdCounter::advance(count, threshold);
        assert!(!sixth.is_free);
        assert_eq!(sixth.new_count, 1);
        assert_eq!(sixth.remaining, 4);
    }

    /// threshold = 1 alternates paid and free
    #[test]
    fn test_threshold_one_alternates() {
        let first = ThresholdCounter::advance(0, 1);
        assert!(!first.is_free);
        assert_eq!(first.new_count, 1);
        assert_eq!(first.remaining, 1);

        let second = ThresholdCounter::advance(first.new_count, 1);
        assert!(second.is_free);
        assert_eq!(second.new_count, 0);
        assert_eq!(second.remaining, 2);
    }

    /// A visit at exactly the threshold count is the free one, not the one after
    #[test]
    fn test_comparison_is_strictly_greater_than() {
        // count 3 of threshold 4: still paid
        let outcome = ThresholdCounter::advance(3, 4);
        assert!(!outcome.is_free);
        assert_eq!(outcome.new_count, 4);

        // count 4 of threshold 4: the next occurrence crosses and is free
        let outcome = ThresholdCounter::advance(4, 4);
        assert!(outcome.is_free);
        assert_eq!(outcome.new_count, 0);
    }

    #[test]
    fn test_paid_progress_message() {
        let outcome = ThresholdCounter::advance(1, 4);
        let message = ThresholdCounter::progress_message("Large Bath", &outcome, 4);
        assert_eq!(message, "Service 2/5. 3 more until the next free one.");
    }

    #[test]
    fn test_free_progress_message() {
        let outcome = ThresholdCounter::advance(4, 4);
        let message = ThresholdCounter::progress_message("Large Bath", &outcome, 4);
        assert_eq!(message, "Large Bath is free! Client completed 5 services.");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// The persisted count never leaves [0, threshold], and remaining never
    /// leaves [1, threshold + 1], no matter how many occurrences are applied
    #[test]
    fn prop_count_stays_within_cycle() {
        proptest!(|(threshold in 1i32..=50, occurrences in 1usize..=200)| {
            let mut count = 0;
            for _ in 0..occurrences {
                let outcome = ThresholdCounter::advance(count, threshold);
                prop_assert!(outcome.new_count >= 0 && outcome.new_count <= threshold);
                prop_assert!(outcome.remaining >= 1 && outcome.remaining <= threshold + 1);
                count = outcome.new_count;
            }
        });
    }

    /// An occurrence is free exactly when the counter has reached the threshold
    #[test]
    fn prop_free_exactly_at_threshold() {
        proptest!(|(threshold in 1i32..=50, count in 0i32..=50)| {
            let count = count.min(threshold);
            let outcome = ThresholdCounter::advance(count, threshold);
            prop_assert_eq!(outcome.is_free, count == threshold);
        });
    }

    /// Every cycle of threshold + 1 occurrences contains exactly one free
    /// visit and ends with the counter back at 0
    #[test]
    fn prop_cycle_length_is_threshold_plus_one() {
        proptest!(|(threshold in 1i32..=20, cycles in 1usize..=5)| {
            let mut count = 0;
            let mut free_visits = 0;

            for _ in 0..(threshold as usize + 1) * cycles {
                let outcome = ThresholdCounter::advance(count, threshold);
                if outcome.is_free {
                    free_visits += 1;
                }
                count = outcome.new_count;
            }

            prop_assert_eq!(free_visits, cycles);
            prop_assert_eq!(count, 0);
        });
    }

    /// The free visit always resets to 0 and reports a full cycle remaining
    #[test]
    fn prop_free_visit_resets() {
        proptest!(|(threshold in 1i32..=50)| {
            let outcome = ThresholdCounter::advance(threshold, threshold);
            prop_assert!(outcome.is_free);
            prop_assert_eq!(outcome.new_count, 0);
            prop_assert_eq!(outcome.remaining, threshold + 1);
        });
    }

    /// remaining always counts down to the free visit: applying `remaining`
    /// more occurrences from a paid outcome lands exactly on the free one
    #[test]
    fn prop_remaining_counts_down_to_free(){
        proptest!(|(threshold in 1i32..=20, start in 0i32..=19)| {
            let start = start.min(threshold - 1);
            let mut outcome = ThresholdCounter::advance(start, threshold);
            prop_assume!(!outcome.is_free);

            let steps = outcome.remaining;
            for i in 0..steps {
                outcome = ThresholdCounter::advance(outcome.new_count, threshold);
                if i == steps - 1 {
                    prop_assert!(outcome.is_free);
                } else {
                    prop_assert!(!outcome.is_free);
                }
            }
        });
    }
}
