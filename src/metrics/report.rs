use serde_derive::Serialize;

pub const DEFAULT_DECIMALS: u32 = 4;
/// Beyond this, 10^decimals no longer scales an f64 mean exactly.
pub const MAX_DECIMALS: u32 = 15;

/// Unrounded means over the evaluated users.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactMetrics {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub ndcg_at_k: f64,
    pub f1_at_k: f64,
    pub users_evaluated: usize,
}

/// Aggregate metrics as presented to callers, each mean rounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsReport {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub ndcg_at_k: f64,
    pub f1_at_k: f64,
    pub users_evaluated: usize,
}

impl MetricsReport {
    pub fn from_exact(exact: &ExactMetrics, decimals: u32) -> MetricsReport {
        MetricsReport {
            precision_at_k: round_to(exact.precision_at_k, decimals),
            recall_at_k: round_to(exact.recall_at_k, decimals),
            ndcg_at_k: round_to(exact.ndcg_at_k, decimals),
            f1_at_k: round_to(exact.f1_at_k, decimals),
            users_evaluated: exact.users_evaluated,
        }
    }

    /// One CSV row in the column order of `EvaluationReporter::get_name`.
    pub fn to_csv_row(&self, decimals: u32) -> String {
        let decimals = decimals as usize;
        format!(
            "{:.*},{:.*},{:.*},{:.*},{}",
            decimals,
            self.precision_at_k,
            decimals,
            self.recall_at_k,
            decimals,
            self.ndcg_at_k,
            decimals,
            self.f1_at_k,
            self.users_evaluated
        )
    }
}

/// Rounds half to even on the exact value, so `0.03125` becomes `0.0312`.
///
/// `value * factor` may itself round onto a `.5`; the exact residual of that
/// product decides which side the true value lies on. Values are returned
/// unchanged for more than `MAX_DECIMALS` decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if decimals > MAX_DECIMALS || !value.is_finite() {
        return value;
    }
    let factor = 10_f64.powi(decimals as i32);
    let scaled = value * factor;
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        let residual = value.mul_add(factor, -scaled);
        if residual > 0.0 || (residual == 0.0 && floor % 2.0 != 0.0) {
            floor + 1.0
        } else {
            floor
        }
    } else {
        scaled.round()
    };
    rounded / factor
}
