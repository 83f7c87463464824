use crate::io::ItemId;
use crate::metrics::{hits, mean, top, RankingMetric};
use hashbrown::HashSet;

pub struct Precision {
    sum_of_scores: f64,
    qty: usize,
    length: usize,
}

impl Precision {
    /// Returns a Precision evaluation metric.
    /// Precision quantifies the share of the top recommendations that are
    /// relevant. The denominator is the number of recommendations actually
    /// considered, which is less than 'k' for short lists.
    ///
    /// # Arguments
    ///
    /// * `length` - the length aka 'k' that will be used for evaluation.
    ///
    pub fn new(length: usize) -> Precision {
        Precision {
            sum_of_scores: 0_f64,
            qty: 0,
            length,
        }
    }

    pub fn score(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        let top_recos = top(recommended, self.length);
        hits(top_recos, relevant) as f64 / top_recos.len().max(1) as f64
    }
}

impl RankingMetric for Precision {
    fn add(&mut self, recommended: &[ItemId], relevant: &HashSet<ItemId>) {
        self.sum_of_scores += self.score(recommended, relevant);
        self.qty += 1;
    }

    fn result(&self) -> f64 {
        mean(self.sum_of_scores, self.qty)
    }

    fn get_name(&self) -> String {
        format!("Precision@{}", self.length)
    }
}
