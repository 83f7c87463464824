use crate::io::ItemId;
use crate::metrics::f1score::F1score;
use crate::metrics::ndcg::Ndcg;
use crate::metrics::precision::Precision;
use crate::metrics::recall::Recall;
use crate::metrics::report::ExactMetrics;
use crate::metrics::RankingMetric;
use hashbrown::HashSet;

pub struct EvaluationReporter {
    precision: Precision,
    recall: Recall,
    ndcg: Ndcg,
    f1: F1score,
    users_evaluated: usize,
}

impl EvaluationReporter {
    pub fn new(length: usize) -> EvaluationReporter {
        EvaluationReporter {
            precision: Precision::new(length),
            recall: Recall::new(length),
            ndcg: Ndcg::new(length),
            f1: F1score::new(length),
            users_evaluated: 0,
        }
    }

    pub fn add(&mut self, recommended: &[ItemId], relevant: &HashSet<ItemId>) {
        self.precision.add(recommended, relevant);
        self.recall.add(recommended, relevant);
        self.ndcg.add(recommended, relevant);
        self.f1.add(recommended, relevant);
        self.users_evaluated += 1;
    }

    pub fn result(&self) -> ExactMetrics {
        ExactMetrics {
            precision_at_k: self.precision.result(),
            recall_at_k: self.recall.result(),
            ndcg_at_k: self.ndcg.result(),
            f1_at_k: self.f1.result(),
            users_evaluated: self.users_evaluated,
        }
    }

    pub fn get_name(&self) -> String {
        format!(
            "{},{},{},{},Users",
            self.precision.get_name(),
            self.recall.get_name(),
            self.ndcg.get_name(),
            self.f1.get_name()
        )
    }
}
