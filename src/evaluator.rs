use hashbrown::HashSet;
use itertools::Itertools;
use rayon::prelude::*;
use serde_derive::Serialize;

use crate::error::{EvalError, Result};
use crate::io::{GroundTruth, ItemId, Recommendations, UserId};
use crate::metrics::evaluation_reporter::EvaluationReporter;
use crate::metrics::f1score::f1;
use crate::metrics::ndcg::Ndcg;
use crate::metrics::precision::Precision;
use crate::metrics::recall::Recall;
use crate::metrics::report::{ExactMetrics, MetricsReport, DEFAULT_DECIMALS};
use crate::metrics::{hits, top};

/// Metrics of a single evaluated user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserScores {
    pub user_id: UserId,
    pub hits: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub ndcg_at_k: f64,
    pub f1_at_k: f64,
}

/// Computes Precision@k, Recall@k, Ndcg@k and F1@k averaged over every user that
/// has recommendations or relevant items, each mean rounded to four decimals.
///
/// Users missing from one of the maps count as having an empty list or set on
/// that side. Users with neither are left out entirely.
pub fn evaluate(
    recommendations: &Recommendations,
    groundtruth: &GroundTruth,
    k: usize,
) -> Result<MetricsReport> {
    let exact = evaluate_exact(recommendations, groundtruth, k)?;
    Ok(MetricsReport::from_exact(&exact, DEFAULT_DECIMALS))
}

/// Same as [`evaluate`] without rounding the means.
pub fn evaluate_exact(
    recommendations: &Recommendations,
    groundtruth: &GroundTruth,
    k: usize,
) -> Result<ExactMetrics> {
    check_cutoff(k)?;
    let no_relevant_items = HashSet::new();
    let mut reporter = EvaluationReporter::new(k);

    for (_user_id, recommended, relevant) in
        evaluated_users(recommendations, groundtruth, &no_relevant_items, k)
    {
        reporter.add(recommended, relevant);
    }

    Ok(reporter.result())
}

/// Scores every evaluated user, ordered by user id.
pub fn score_users(
    recommendations: &Recommendations,
    groundtruth: &GroundTruth,
    k: usize,
) -> Result<Vec<UserScores>> {
    check_cutoff(k)?;
    let no_relevant_items = HashSet::new();
    let precision = Precision::new(k);
    let recall = Recall::new(k);
    let ndcg = Ndcg::new(k);

    let scores = evaluated_users(recommendations, groundtruth, &no_relevant_items, k)
        .into_par_iter()
        .map(|(user_id, recommended, relevant)| {
            let precision_at_k = precision.score(recommended, relevant);
            let recall_at_k = recall.score(recommended, relevant);
            UserScores {
                user_id: user_id.clone(),
                hits: hits(recommended, relevant),
                precision_at_k,
                recall_at_k,
                ndcg_at_k: ndcg.score(recommended, relevant),
                f1_at_k: f1(precision_at_k, recall_at_k),
            }
        })
        .collect();

    Ok(scores)
}

fn check_cutoff(k: usize) -> Result<()> {
    if k == 0 {
        return Err(EvalError::InvalidCutoff(k));
    }
    Ok(())
}

type EvaluatedUser<'a> = (&'a UserId, &'a [ItemId], &'a HashSet<ItemId>);

// Every user of either map, ordered by id so sums are reproducible, with the
// recommendations cut at k. Users without recommendations and without relevant
// items are left out.
fn evaluated_users<'a>(
    recommendations: &'a Recommendations,
    groundtruth: &'a GroundTruth,
    no_relevant_items: &'a HashSet<ItemId>,
    k: usize,
) -> Vec<EvaluatedUser<'a>> {
    recommendations
        .keys()
        .chain(groundtruth.keys())
        .unique()
        .sorted()
        .map(|user_id| {
            let recommended = recommended_for(recommendations, user_id, k);
            let relevant = groundtruth.get(user_id).unwrap_or(no_relevant_items);
            (user_id, recommended, relevant)
        })
        .filter(|(_user_id, recommended, relevant)| !recommended.is_empty() || !relevant.is_empty())
        .collect_vec()
}

fn recommended_for<'a>(recommendations: &'a Recommendations, user_id: &UserId, k: usize) -> &'a [ItemId] {
    recommendations
        .get(user_id)
        .map(|items| top(items, k))
        .unwrap_or(&[])
}

#[cfg(test)]
mod evaluator_test {
    use super::*;
    use crate::metrics::test_support::*;
    use float_cmp::approx_eq;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn recommendations(entries: &[(&str, &[&str])]) -> Recommendations {
        entries
            .iter()
            .map(|(user_id, item_ids)| (user_id.to_string(), items(item_ids)))
            .collect()
    }

    fn groundtruth(entries: &[(&str, &[&str])]) -> GroundTruth {
        entries
            .iter()
            .map(|(user_id, item_ids)| (user_id.to_string(), item_set(item_ids)))
            .collect()
    }

    fn random_inputs(rng: &mut Pcg64, qty_users: usize) -> (Recommendations, GroundTruth) {
        let mut recos = Recommendations::new();
        let mut truth = GroundTruth::new();
        for user in 0..qty_users {
            let user_id = format!("u{}", user);
            // distinct items per list, so every score stays within [0, 1]
            let list_length = rng.gen_range(0..15);
            let mut item_ids = (0..40).map(|item| format!("t{}", item)).collect_vec();
            for index in 0..list_length {
                let other = rng.gen_range(index..item_ids.len());
                item_ids.swap(index, other);
            }
            item_ids.truncate(list_length);
            if rng.gen_bool(0.8) {
                recos.insert(user_id.clone(), item_ids);
            }
            let relevant: HashSet<ItemId> = (0..rng.gen_range(0..8))
                .map(|_| format!("t{}", rng.gen_range(0..40)))
                .collect();
            if rng.gen_bool(0.8) {
                truth.insert(user_id, relevant);
            }
        }
        (recos, truth)
    }

    #[test]
    fn should_report_zeros_for_empty_inputs() {
        let report = evaluate(&Recommendations::new(), &GroundTruth::new(), 5).unwrap();
        assert_eq!(
            MetricsReport {
                precision_at_k: 0.0,
                recall_at_k: 0.0,
                ndcg_at_k: 0.0,
                f1_at_k: 0.0,
                users_evaluated: 0,
            },
            report
        );
    }

    #[test]
    fn should_reject_zero_cutoff() {
        let recos = recommendations(&[("u1", &["t1"])]);
        let err = evaluate(&recos, &GroundTruth::new(), 0).unwrap_err();
        assert!(matches!(err, EvalError::InvalidCutoff(0)));
        assert!(score_users(&recos, &GroundTruth::new(), 0).is_err());
    }

    #[test]
    fn should_evaluate_single_user() {
        let recos = recommendations(&[("u1", &["t1", "t2", "t3"])]);
        let truth = groundtruth(&[("u1", &["t1", "t3"])]);
        let report = evaluate(&recos, &truth, 3).unwrap();
        assert_eq!(0.6667, report.precision_at_k);
        assert_eq!(1.0, report.recall_at_k);
        // 1.5 / (1 + 1/log2(3))
        assert_eq!(0.9197, report.ndcg_at_k);
        assert_eq!(0.8, report.f1_at_k);
        assert_eq!(1, report.users_evaluated);
    }

    #[test]
    fn should_round_tied_means_to_even() {
        let mut recos = recommendations(&[("u00", &["t1"])]);
        let truth = groundtruth(&[("u00", &["t1"])]);
        for user in 1..32 {
            recos.insert(format!("u{:02}", user), items(&["x"]));
        }
        let report = evaluate(&recos, &truth, 5).unwrap();
        assert_eq!(32, report.users_evaluated);
        // every mean is exactly 1/32 = 0.03125
        assert_eq!(0.0312, report.precision_at_k);
        assert_eq!(0.0312, report.recall_at_k);
        assert_eq!(0.0312, report.ndcg_at_k);
        assert_eq!(0.0312, report.f1_at_k);
    }

    #[test]
    fn should_count_user_only_in_groundtruth() {
        let truth = groundtruth(&[("u1", &["t9"])]);
        let scores = score_users(&Recommendations::new(), &truth, 5).unwrap();
        assert_eq!(1, scores.len());
        assert_eq!(0, scores[0].hits);
        assert_eq!(0.0, scores[0].precision_at_k);
        assert_eq!(0.0, scores[0].recall_at_k);
        assert_eq!(0.0, scores[0].ndcg_at_k);
        assert_eq!(0.0, scores[0].f1_at_k);
        assert_eq!(1, evaluate(&Recommendations::new(), &truth, 5).unwrap().users_evaluated);
    }

    #[test]
    fn should_count_user_only_in_recommendations() {
        let recos = recommendations(&[("u1", &["t1"])]);
        let report = evaluate(&recos, &GroundTruth::new(), 5).unwrap();
        assert_eq!(0.0, report.precision_at_k);
        assert_eq!(0.0, report.recall_at_k);
        assert_eq!(0.0, report.ndcg_at_k);
        assert_eq!(0.0, report.f1_at_k);
        assert_eq!(1, report.users_evaluated);
    }

    #[test]
    fn should_skip_users_without_anything() {
        let recos = recommendations(&[("u1", &[]), ("u2", &["t1"])]);
        let truth = groundtruth(&[("u1", &[]), ("u3", &[]), ("u2", &["t1"])]);
        let report = evaluate(&recos, &truth, 5).unwrap();
        assert_eq!(1, report.users_evaluated);
        assert_eq!(1.0, report.precision_at_k);
        assert_eq!(1.0, report.ndcg_at_k);
    }

    #[test]
    fn should_score_perfect_recommendations_as_one() {
        let recos = recommendations(&[("u1", &["t3", "t1", "t2"]), ("u2", &["t7"])]);
        let truth = groundtruth(&[("u1", &["t1", "t2", "t3"]), ("u2", &["t7"])]);
        let report = evaluate(&recos, &truth, 5).unwrap();
        assert_eq!(1.0, report.precision_at_k);
        assert_eq!(1.0, report.recall_at_k);
        assert_eq!(1.0, report.ndcg_at_k);
        assert_eq!(1.0, report.f1_at_k);
        assert_eq!(2, report.users_evaluated);
    }

    #[test]
    fn should_truncate_recommendations_at_cutoff() {
        let recos = recommendations(&[("u1", &["t1", "t2", "t3", "t4"])]);
        let truth = groundtruth(&[("u1", &["t3", "t4"])]);
        let scores = score_users(&recos, &truth, 2).unwrap();
        assert_eq!(0, scores[0].hits);
        assert_eq!(0.0, scores[0].precision_at_k);
    }

    #[test]
    fn should_count_duplicate_recommendations() {
        let recos = recommendations(&[("u1", &["t1", "t1", "t2"])]);
        let truth = groundtruth(&[("u1", &["t1", "t5"])]);
        let scores = score_users(&recos, &truth, 3).unwrap();
        assert_eq!(2, scores[0].hits);
        assert!(approx_eq!(f64, 2.0 / 3.0, scores[0].precision_at_k, epsilon = 1e-12));
        assert!(approx_eq!(f64, 1.0, scores[0].recall_at_k, epsilon = 1e-12));
        // (1 + 1/log2(3)) / (1 + 1/log2(3))
        assert!(approx_eq!(f64, 1.0, scores[0].ndcg_at_k, epsilon = 1e-12));
    }

    #[test]
    fn should_order_user_scores_by_user_id() {
        let recos = recommendations(&[("u3", &["t1"]), ("u1", &["t1"])]);
        let truth = groundtruth(&[("u2", &["t1"])]);
        let scores = score_users(&recos, &truth, 5).unwrap();
        let user_ids = scores.iter().map(|scores| scores.user_id.as_str()).collect_vec();
        assert_eq!(vec!["u1", "u2", "u3"], user_ids);
    }

    #[test]
    fn should_agree_with_mean_of_user_scores() {
        let mut rng = Pcg64::seed_from_u64(7);
        let (recos, truth) = random_inputs(&mut rng, 200);
        let exact = evaluate_exact(&recos, &truth, 5).unwrap();
        let scores = score_users(&recos, &truth, 5).unwrap();
        assert_eq!(scores.len(), exact.users_evaluated);
        let qty = scores.len() as f64;
        let mean_precision = scores.iter().map(|scores| scores.precision_at_k).sum::<f64>() / qty;
        let mean_ndcg = scores.iter().map(|scores| scores.ndcg_at_k).sum::<f64>() / qty;
        let mean_f1 = scores.iter().map(|scores| scores.f1_at_k).sum::<f64>() / qty;
        assert!(approx_eq!(f64, mean_precision, exact.precision_at_k, epsilon = 1e-12));
        assert!(approx_eq!(f64, mean_ndcg, exact.ndcg_at_k, epsilon = 1e-12));
        assert!(approx_eq!(f64, mean_f1, exact.f1_at_k, epsilon = 1e-12));
    }

    #[test]
    fn should_keep_scores_within_bounds() {
        let mut rng = Pcg64::seed_from_u64(42);
        for k in [1, 3, 10, 50] {
            let (recos, truth) = random_inputs(&mut rng, 100);
            for scores in score_users(&recos, &truth, k).unwrap() {
                for value in [scores.precision_at_k, scores.recall_at_k, scores.ndcg_at_k, scores.f1_at_k] {
                    assert!((0.0..=1.0 + 1e-12).contains(&value), "{} out of bounds for {:?}", value, scores);
                }
            }
            let report = evaluate(&recos, &truth, k).unwrap();
            for value in [report.precision_at_k, report.recall_at_k, report.ndcg_at_k, report.f1_at_k] {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn should_count_users_with_anything() {
        let mut rng = Pcg64::seed_from_u64(3);
        let (recos, truth) = random_inputs(&mut rng, 150);
        let expected = recos
            .keys()
            .chain(truth.keys())
            .unique()
            .filter(|user_id| {
                recos.get(*user_id).map_or(false, |items| !items.is_empty())
                    || truth.get(*user_id).map_or(false, |items| !items.is_empty())
            })
            .count();
        assert_eq!(expected, evaluate(&recos, &truth, 5).unwrap().users_evaluated);
    }

    #[test]
    fn should_be_idempotent() {
        let mut rng = Pcg64::seed_from_u64(11);
        let (recos, truth) = random_inputs(&mut rng, 300);
        let first = evaluate_exact(&recos, &truth, 10).unwrap();
        let second = evaluate_exact(&recos, &truth, 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn should_not_improve_by_appending_irrelevant_item() {
        let mut rng = Pcg64::seed_from_u64(5);
        let (recos, truth) = random_inputs(&mut rng, 100);
        let k = 20;
        let before = score_users(&recos, &truth, k).unwrap();

        let mut extended = recos.clone();
        for items in extended.values_mut().filter(|items| !items.is_empty()) {
            items.push("never-relevant".to_string());
        }
        let after = score_users(&extended, &truth, k).unwrap();

        for (before, after) in before.iter().zip(after.iter()) {
            assert_eq!(before.user_id, after.user_id);
            assert!(after.precision_at_k <= before.precision_at_k + 1e-12);
            assert!(after.ndcg_at_k <= before.ndcg_at_k + 1e-12);
        }
    }
}
