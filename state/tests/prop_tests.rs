use proptest::prelude::*;

use ember_state::BalanceHistory;
use ember_types::{Amount, Height};

fn history_from(entries: &[(u64, u64)]) -> BalanceHistory {
    let mut history = BalanceHistory::new();
    for &(height, amount) in entries {
        history.add(Height::new(height), Amount::new(amount));
    }
    history
}

proptest! {
    /// Pruning twice at the same height yields the same history as once.
    #[test]
    fn prune_is_idempotent(
        entries in prop::collection::vec((1u64..1_000, 0u64..1_000_000), 0..16),
        prune_height in 0u64..1_200,
    ) {
        let mut once = history_from(&entries);
        once.prune(Height::new(prune_height));

        let mut twice = once.clone();
        twice.prune(Height::new(prune_height));

        prop_assert_eq!(once, twice);
    }

    /// Pruning never changes lookups at or above the prune height.
    #[test]
    fn prune_preserves_lookups_at_or_above(
        entries in prop::collection::vec((1u64..1_000, 0u64..1_000_000), 0..16),
        prune_height in 0u64..1_200,
        probe_offset in 0u64..500,
    ) {
        let original = history_from(&entries);
        let mut pruned = original.clone();
        pruned.prune(Height::new(prune_height));

        let probe = Height::new(prune_height + probe_offset);
        prop_assert_eq!(original.balance_at(probe), pruned.balance_at(probe));
        prop_assert_eq!(original.balance(), pruned.balance());
    }

    /// `balance_at` returns the value recorded at the largest height not
    /// above the probe.
    #[test]
    fn balance_at_matches_linear_scan(
        entries in prop::collection::vec((1u64..1_000, 0u64..1_000_000), 0..16),
        probe in 0u64..1_200,
    ) {
        let history = history_from(&entries);

        let expected = entries
            .iter()
            .filter(|(height, _)| *height <= probe)
            .max_by_key(|(height, _)| *height)
            // later duplicates of the same height overwrite earlier ones
            .map(|(height, _)| {
                entries
                    .iter()
                    .rev()
                    .find(|(h, _)| h == height)
                    .map(|(_, amount)| Amount::new(*amount))
                    .unwrap_or(Amount::ZERO)
            })
            .unwrap_or(Amount::ZERO);

        prop_assert_eq!(expected, history.balance_at(Height::new(probe)));
    }

    /// `any_at_least` agrees with an exhaustive scan of recorded values.
    #[test]
    fn any_at_least_matches_scan(
        entries in prop::collection::vec((1u64..1_000, 0u64..1_000_000), 0..16),
        threshold in 0u64..1_000_000,
    ) {
        let history = history_from(&entries);

        // deduplicate by height first: only the last write per height counts
        let mut deduped = std::collections::BTreeMap::new();
        for (height, amount) in &entries {
            deduped.insert(*height, *amount);
        }
        let expected = deduped.values().any(|amount| *amount >= threshold);

        prop_assert_eq!(expected, history.any_at_least(Amount::new(threshold)));
    }
}
