use crate::io::ItemId;
use crate::metrics::{mean, top, RankingMetric};
use hashbrown::HashSet;

pub struct Ndcg {
    sum_of_scores: f64,
    qty: usize,
    length: usize,
}

// Gain of a relevant item at 0-based `index`; the top position is discounted by log2(2) = 1.
fn discounted_gain(index: usize) -> f64 {
    1_f64 / ((index as f64) + 2_f64).log2()
}

impl Ndcg {
    fn dcg(&self, top_recos: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        top_recos
            .iter()
            .enumerate()
            .filter(|(_index, item_id)| relevant.contains(*item_id))
            .map(|(index, _item_id)| discounted_gain(index))
            .sum()
    }

    // With binary relevance any ordering of the relevant set is ideal.
    fn ideal_dcg(&self, relevant: &HashSet<ItemId>) -> f64 {
        (0..relevant.len().min(self.length))
            .map(discounted_gain)
            .sum()
    }
}

impl Ndcg {
    /// Calculate Ndcg for recommendations against the set of relevant items.
    pub fn new(length: usize) -> Ndcg {
        Ndcg {
            sum_of_scores: 0_f64,
            qty: 0,
            length,
        }
    }

    pub fn score(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        let dcg_max = self.ideal_dcg(relevant);
        if dcg_max == 0_f64 {
            return 0_f64;
        }
        self.dcg(top(recommended, self.length), relevant) / dcg_max
    }
}

impl RankingMetric for Ndcg {
    fn add(&mut self, recommended: &[ItemId], relevant: &HashSet<ItemId>) {
        self.sum_of_scores += self.score(recommended, relevant);
        self.qty += 1;
    }

    fn result(&self) -> f64 {
        mean(self.sum_of_scores, self.qty)
    }

    fn get_name(&self) -> String {
        format!("Ndcg@{}", self.length)
    }
}
