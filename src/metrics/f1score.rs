use crate::io::ItemId;
use crate::metrics::precision::Precision;
use crate::metrics::recall::Recall;
use crate::metrics::{mean, RankingMetric};
use hashbrown::HashSet;

/// Harmonic mean of precision and recall, zero when both are zero.
pub fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0_f64 {
        0_f64
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// F1 computed per user and then averaged, not the F1 of averaged precision and recall.
pub struct F1score {
    precision: Precision,
    recall: Recall,
    sum_of_scores: f64,
    qty: usize,
    length: usize,
}

impl F1score {
    pub fn new(length: usize) -> F1score {
        F1score {
            precision: Precision::new(length),
            recall: Recall::new(length),
            sum_of_scores: 0_f64,
            qty: 0,
            length,
        }
    }

    pub fn score(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        f1(
            self.precision.score(recommended, relevant),
            self.recall.score(recommended, relevant),
        )
    }
}

impl RankingMetric for F1score {
    fn add(&mut self, recommended: &[ItemId], relevant: &HashSet<ItemId>) {
        self.sum_of_scores += self.score(recommended, relevant);
        self.qty += 1;
    }

    fn result(&self) -> f64 {
        mean(self.sum_of_scores, self.qty)
    }

    fn get_name(&self) -> String {
        format!("F1score@{}", self.length)
    }
}
