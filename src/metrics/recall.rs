use crate::io::ItemId;
use crate::metrics::{hits, mean, top, RankingMetric};
use hashbrown::HashSet;

pub struct Recall {
    sum_of_scores: f64,
    qty: usize,
    length: usize,
}

impl Recall {
    /// Returns a Recall evaluation metric.
    /// Recall quantifies the share of all relevant items that made it into the
    /// top recommendations. Users without relevant items score zero.
    ///
    /// # Arguments
    ///
    /// * `length` - the length aka 'k' that will be used for evaluation.
    ///
    pub fn new(length: usize) -> Recall {
        Recall {
            sum_of_scores: 0_f64,
            qty: 0,
            length,
        }
    }

    pub fn score(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        let top_recos = top(recommended, self.length);
        hits(top_recos, relevant) as f64 / relevant.len().max(1) as f64
    }
}

impl RankingMetric for Recall {
    fn add(&mut self, recommended: &[ItemId], relevant: &HashSet<ItemId>) {
        self.sum_of_scores += self.score(recommended, relevant);
        self.qty += 1;
    }

    fn result(&self) -> f64 {
        mean(self.sum_of_scores, self.qty)
    }

    fn get_name(&self) -> String {
        format!("Recall@{}", self.length)
    }
}
