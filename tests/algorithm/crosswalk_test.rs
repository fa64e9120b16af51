use std::collections::BTreeSet;

use sfr_panel::algorithm::crosswalk::{Cardinality, Crosswalk, classify_pairs};
use sfr_panel::{HistoricalKey, ModernKey};

fn pair(modern: &str, historical: &str) -> (Option<ModernKey>, Option<HistoricalKey>) {
    (ModernKey::parse(modern), HistoricalKey::parse(historical))
}

#[test]
fn test_only_genuine_one_to_one_pairs_survive() {
    // A has two historical keys, 3 has two modern keys, C and 4 are exclusive.
    let pairs = vec![
        pair("060000A", "06000000A"),
        pair("060000A", "06000000B"),
        pair("060000B", "060000003"),
        pair("060000D", "060000003"),
        pair("060000C", "060000004"),
    ];
    let (crosswalk, summary) = Crosswalk::build(pairs).unwrap();

    assert_eq!(crosswalk.len(), 1);
    let c = ModernKey::parse("060000C").unwrap();
    assert_eq!(crosswalk.to_historical(&c).unwrap().as_str(), "060000004");
    assert_eq!(summary.by_cardinality[&Cardinality::OneToMany], 2);
    assert_eq!(summary.by_cardinality[&Cardinality::ManyToOne], 2);
}

#[test]
fn test_canonical_crosswalk_is_injective_both_ways() {
    let mut pairs = Vec::new();
    for i in 1..=60u32 {
        // Every fifth modern key also reports a second historical key.
        pairs.push(pair(&format!("06{i:05}"), &format!("06{i:07}")));
        if i % 5 == 0 {
            pairs.push(pair(&format!("06{i:05}"), &format!("07{i:07}")));
        }
        // Every seventh historical key is also reported by a second modern key.
        if i % 7 == 0 {
            pairs.push(pair(&format!("08{i:05}"), &format!("06{i:07}")));
        }
    }
    let (crosswalk, _) = Crosswalk::build(pairs).unwrap();

    let moderns: BTreeSet<_> = crosswalk.iter().map(|(m, _)| m.clone()).collect();
    let historicals: BTreeSet<_> = crosswalk.iter().map(|(_, h)| h.clone()).collect();
    assert_eq!(moderns.len(), crosswalk.len());
    assert_eq!(historicals.len(), crosswalk.len());
    for (modern, historical) in crosswalk.iter() {
        assert_eq!(crosswalk.to_modern(historical), Some(modern));
    }
    // 12 multiples of 5 and 8 multiples of 7 drop out; 35 is both
    assert_eq!(crosswalk.len(), 60 - 12 - 8 + 1);
    crosswalk.assert_injective().unwrap();
}

#[test]
fn test_classification_counts_distinct_partners_only() {
    let (entries, summary) = classify_pairs(vec![
        pair("0600001", "060000001"),
        pair("0600001", "060000001"),
        pair("", "060000001"),
        pair("0600001", "999999999"),
    ]);
    assert_eq!(summary.raw_pairs, 4);
    assert_eq!(summary.excluded_pairs, 2);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].cardinality, Cardinality::OneToOne);
}
