use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use log::debug;
use serde_derive::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use crate::error::{EvalError, Result};
use crate::evaluator::UserScores;

pub type UserId = String;
pub type ItemId = String;

/// Ranked recommendations per user, best first.
pub type Recommendations = HashMap<UserId, Vec<ItemId>>;
/// Relevant items per user.
pub type GroundTruth = HashMap<UserId, HashSet<ItemId>>;

const USER_ID_COLUMN: &str = "user_id";
const ITEM_ID_COLUMN: &str = "tour_id";

#[derive(Debug, Deserialize)]
struct RecommendationRecord {
    user_id: Option<Value>,
    items: Option<Vec<Candidate>>,
    recommendations: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    tour_id: Option<Value>,
    score: Option<Value>,
}

pub fn read_recommendations(path: &str, sort_by_score: bool) -> Result<Recommendations> {
    let file = open(path)?;
    recommendations_from_reader(BufReader::new(file), path, sort_by_score)
}

/// Parses a JSON array of `{"user_id": .., "items": [{"tour_id": .., "score": ..}]}` records.
///
/// Candidates without a usable `tour_id` are dropped. When `items` is absent or
/// empty the `recommendations` key is used instead. A later record for the same
/// user replaces an earlier one.
pub fn recommendations_from_reader<R: Read>(
    reader: R,
    origin: &str,
    sort_by_score: bool,
) -> Result<Recommendations> {
    let records: Vec<RecommendationRecord> =
        serde_json::from_reader(reader).map_err(|source| EvalError::Json {
            path: origin.to_string(),
            source,
        })?;

    let mut recommendations = Recommendations::with_capacity(records.len());
    let mut qty_dropped = 0_usize;
    for (index, record) in records.into_iter().enumerate() {
        let user_id = record
            .user_id
            .as_ref()
            .and_then(identifier)
            .ok_or_else(|| EvalError::malformed(origin, format!("record {} has no user_id", index)))?;

        let candidates = match record.items {
            Some(items) if !items.is_empty() => items,
            _ => record.recommendations.unwrap_or_default(),
        };
        let qty_candidates = candidates.len();

        let mut scored_items = candidates
            .into_iter()
            .filter_map(|candidate| {
                let item_id = candidate.tour_id.as_ref().and_then(item_identifier)?;
                let score = candidate.score.as_ref().and_then(Value::as_f64);
                Some((item_id, score))
            })
            .collect_vec();
        qty_dropped += qty_candidates - scored_items.len();

        if sort_by_score {
            scored_items.sort_by(|(_, left), (_, right)| by_score_descending(left, right));
        }

        let items = scored_items.into_iter().map(|(item_id, _)| item_id).collect();
        recommendations.insert(user_id, items);
    }

    if qty_dropped > 0 {
        debug!("Dropped {} candidates without tour_id in {}", qty_dropped, origin);
    }
    Ok(recommendations)
}

pub fn read_groundtruth(path: &str) -> Result<GroundTruth> {
    let file = open(path)?;
    groundtruth_from_reader(BufReader::new(file), path)
}

/// Groups `user_id,tour_id` rows of a CSV file into one relevant set per user.
pub fn groundtruth_from_reader<R: Read>(reader: R, origin: &str) -> Result<GroundTruth> {
    let csv_error = |source| EvalError::Csv {
        path: origin.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| EvalError::malformed(origin, format!("missing column '{}'", name)))
    };
    let user_column = column(USER_ID_COLUMN)?;
    let item_column = column(ITEM_ID_COLUMN)?;

    let mut pairs: Vec<(UserId, ItemId)> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|position| position.line()).unwrap_or_default();
        let field = |index: usize, name: &str| match record.get(index) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(EvalError::malformed(origin, format!("line {} has no {}", line, name))),
        };
        pairs.push((field(user_column, USER_ID_COLUMN)?, field(item_column, ITEM_ID_COLUMN)?));
    }

    let groundtruth = pairs
        .into_iter()
        .into_group_map()
        .into_iter()
        .map(|(user_id, item_ids)| (user_id, item_ids.into_iter().collect::<HashSet<_>>()))
        .collect();
    Ok(groundtruth)
}

pub fn write_user_scores(path: &str, scores: &[UserScores]) -> Result<()> {
    let file = File::create(path).map_err(|source| EvalError::Io {
        path: path.to_string(),
        source,
    })?;
    write_user_scores_to(file, path, scores)
}

pub fn write_user_scores_to<W: Write>(writer: W, origin: &str, scores: &[UserScores]) -> Result<()> {
    let csv_error = |source| EvalError::Csv {
        path: origin.to_string(),
        source,
    };
    let mut writer = csv::Writer::from_writer(writer);
    for user_scores in scores {
        writer.serialize(user_scores).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| EvalError::Io {
        path: origin.to_string(),
        source,
    })
}

fn open<P: AsRef<Path>>(path: P) -> Result<File> {
    File::open(&path).map_err(|source: io::Error| EvalError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })
}

// Strings and numbers are accepted as identifiers, the empty string is not.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

// Item ids additionally treat a numeric zero as absent.
fn item_identifier(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        _ => identifier(value),
    }
}

// Unscored candidates go after all scored ones; ties keep their input order.
fn by_score_descending(left: &Option<f64>, right: &Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => right.partial_cmp(left).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
