use std::collections::HashSet;

use crate::types::BidRecord;

/// Appends to `today` every `yesterday` record whose bid number was not seen today.
///
/// Records without a bid number never match and are always appended.
pub fn merge(today: &[BidRecord], yesterday: &[BidRecord]) -> Vec<BidRecord> {
    let seen: HashSet<&str> = today
        .iter()
        .filter_map(|r| r.bid_number.as_deref())
        .collect();

    today
        .iter()
        .chain(yesterday.iter().filter(|r| {
            r.bid_number
                .as_deref()
                .is_none_or(|number| !seen.contains(number))
        }))
        .cloned()
        .collect()
}
