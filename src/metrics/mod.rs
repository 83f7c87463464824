pub mod evaluation_reporter;
pub mod f1score;
pub mod ndcg;
pub mod precision;
pub mod recall;
pub mod report;

use crate::io::ItemId;
use hashbrown::HashSet;

/// A ranking-quality metric averaged over the users added to it.
pub trait RankingMetric {
    fn add(&mut self, recommended: &[ItemId], relevant: &HashSet<ItemId>);
    fn result(&self) -> f64;
    fn get_name(&self) -> String;
}

/// Counts the recommended items that are relevant. Every occurrence counts,
/// so duplicates in `recommended` are hits more than once.
pub fn hits(recommended: &[ItemId], relevant: &HashSet<ItemId>) -> usize {
    recommended
        .iter()
        .filter(|item_id| relevant.contains(*item_id))
        .count()
}

/// The first `length` recommendations.
pub fn top(recommended: &[ItemId], length: usize) -> &[ItemId] {
    &recommended[..recommended.len().min(length)]
}

/// Mean of `sum_of_scores` over `qty` users, zero when nobody was added.
pub(crate) fn mean(sum_of_scores: f64, qty: usize) -> f64 {
    if qty > 0 {
        sum_of_scores / qty as f64
    } else {
        0.0
    }
}
