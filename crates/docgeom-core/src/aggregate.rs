//! Link record aggregation
//!
//! Groups link records by `(table_id, key_value)`, counting duplicates and
//! keeping the first record seen for each group as its representative.

use crate::types::LinkRecord;
use std::collections::HashMap;
use std::fmt;

/// Composite grouping key, rendered as `"{table_id}-{key_value}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub table_id: i64,
    pub key_value: String,
}

impl GroupKey {
    pub fn of(record: &LinkRecord) -> Self {
        Self {
            table_id: record.table_id,
            key_value: record.key_value.clone(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.table_id, self.key_value)
    }
}

/// All link records sharing one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedGroup {
    pub key: GroupKey,
    pub document_count: usize,
    /// Index of the first-seen record in the aggregated slice
    pub representative: usize,
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    groups: Vec<AggregatedGroup>,
    index: HashMap<GroupKey, usize>,
    skipped_undefined: usize,
}

impl Aggregation {
    /// Groups in first-seen order
    pub fn groups(&self) -> &[AggregatedGroup] {
        &self.groups
    }

    pub fn get(&self, key: &GroupKey) -> Option<&AggregatedGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    /// Number of records dropped for carrying the `"undefined"` key
    pub fn skipped_undefined(&self) -> usize {
        self.skipped_undefined
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Single pass over `records` in order.
///
/// Records keyed `"undefined"` are skipped entirely. Later duplicates only bump
/// the count; the representative never changes once chosen.
pub fn aggregate(records: &[LinkRecord]) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for (i, record) in records.iter().enumerate() {
        if record.is_undefined_key() {
            aggregation.skipped_undefined += 1;
            continue;
        }

        let key = GroupKey::of(record);
        match aggregation.index.get(&key) {
            Some(&slot) => aggregation.groups[slot].document_count += 1,
            None => {
                aggregation.index.insert(key.clone(), aggregation.groups.len());
                aggregation.groups.push(AggregatedGroup {
                    key,
                    document_count: 1,
                    representative: i,
                });
            }
        }
    }

    aggregation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNDEFINED_KEY;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn link(id: &str, table_id: i64, key: &str, lat: f64, lon: f64) -> LinkRecord {
        LinkRecord {
            id: id.to_string(),
            table_id,
            key_value: key.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_first_seen_record_is_representative() {
        let records = vec![
            link("a", 1, "A123", 0.0, 0.0),
            link("b", 1, "A123", -26.2, 28.0),
        ];
        let aggregation = aggregate(&records);

        assert_eq!(aggregation.len(), 1);
        let group = &aggregation.groups()[0];
        assert_eq!(group.document_count, 2);
        assert_eq!(group.representative, 0);
        assert_eq!(records[group.representative].id, "a");
    }

    #[test]
    fn test_order_decides_representative() {
        let records = vec![
            link("b", 1, "A123", -26.2, 28.0),
            link("a", 1, "A123", 0.0, 0.0),
        ];
        let aggregation = aggregate(&records);
        assert_eq!(records[aggregation.groups()[0].representative].id, "b");
    }

    #[test]
    fn test_undefined_key_is_skipped() {
        let records = vec![
            link("a", 1, UNDEFINED_KEY, 0.0, 0.0),
            link("b", 2, UNDEFINED_KEY, 0.0, 0.0),
            link("c", 2, "X", 0.0, 0.0),
        ];
        let aggregation = aggregate(&records);

        assert_eq!(aggregation.len(), 1);
        assert_eq!(aggregation.skipped_undefined(), 2);
        assert!(aggregation
            .groups()
            .iter()
            .all(|g| g.key.key_value != UNDEFINED_KEY));
    }

    #[test]
    fn test_same_key_in_different_tables_are_distinct() {
        let records = vec![link("a", 1, "7", 0.0, 0.0), link("b", 2, "7", 0.0, 0.0)];
        let aggregation = aggregate(&records);
        assert_eq!(aggregation.len(), 2);
        assert_eq!(
            aggregation
                .get(&GroupKey {
                    table_id: 2,
                    key_value: "7".to_string()
                })
                .map(|g| g.representative),
            Some(1)
        );
    }

    #[test]
    fn test_group_key_display() {
        let key = GroupKey {
            table_id: 12,
            key_value: "A-1".to_string(),
        };
        assert_eq!(key.to_string(), "12-A-1");
    }

    #[test]
    fn test_empty_input() {
        let aggregation = aggregate(&[]);
        assert!(aggregation.is_empty());
        assert_eq!(aggregation.skipped_undefined(), 0);
    }

    fn arb_records() -> impl Strategy<Value = Vec<LinkRecord>> {
        let key = prop_oneof![
            Just(UNDEFINED_KEY.to_string()),
            "[A-C][0-3]",
        ];
        prop::collection::vec((0i64..4, key), 0..60).prop_map(|pairs| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (table_id, key))| link(&i.to_string(), table_id, &key, 0.0, 0.0))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_one_group_per_distinct_pair(records in arb_records()) {
            let aggregation = aggregate(&records);
            let distinct: HashSet<(i64, &str)> = records
                .iter()
                .filter(|r| r.key_value != UNDEFINED_KEY)
                .map(|r| (r.table_id, r.key_value.as_str()))
                .collect();
            prop_assert_eq!(aggregation.len(), distinct.len());
        }

        #[test]
        fn prop_counts_and_first_seen(records in arb_records()) {
            let aggregation = aggregate(&records);
            let mut total = 0;
            for group in aggregation.groups() {
                let matching: Vec<usize> = records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.table_id == group.key.table_id && r.key_value == group.key.key_value)
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(group.document_count, matching.len());
                prop_assert_eq!(group.representative, matching[0]);
                prop_assert_ne!(group.key.key_value.as_str(), UNDEFINED_KEY);
                total += group.document_count;
            }
            prop_assert_eq!(total + aggregation.skipped_undefined(), records.len());
        }
    }
}
