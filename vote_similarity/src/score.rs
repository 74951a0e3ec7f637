use log::{info, warn};
use snafu::ensure;

use crate::config::*;

/// The similarity given to a row when one of its vectors is all zeros.
pub const DEGENERATE_SIMILARITY: f64 = 0.0;

/// Computes the cosine similarity between two outcome vectors.
///
/// Perpendicular vectors have a similarity of 0 and parallel vectors a
/// similarity of 1. Returns `None` when one of the vectors is zero, since the
/// angle is not defined.
pub fn cosine_similarity(a: &OutcomeVector, b: &OutcomeVector) -> Option<f64> {
    let denominator = (a.norm_squared() * b.norm_squared()).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some((a.dot(b) / denominator).clamp(0.0, 1.0))
    }
}

// Components must be finite and non-negative.
fn check_components(pair: &AlignedPair) -> Result<(), SimilarityError> {
    let invalid = pair
        .left
        .values()
        .iter()
        .chain(pair.right.values().iter())
        .find(|x| !(x.is_finite() && **x >= 0.0));
    if let Some(value) = invalid {
        return InvalidComponentSnafu {
            poll: pair.poll.to_string(),
            value: *value,
        }
        .fail();
    }
    Ok(())
}

/// Scores every row of an aligned table with the cosine similarity.
///
/// `suffixes` must be the ones the table was aligned with.
pub fn compute_similarity(
    aligned: AlignedTable,
    suffixes: &Suffixes,
) -> Result<SimilarityTable, SimilarityError> {
    compute_similarity_with(aligned, suffixes, cosine_similarity)
}

/// Scores every row of an aligned table with the given metric.
///
/// The metric returns `None` when it is not defined for a pair of vectors. Such
/// rows are kept with [`DEGENERATE_SIMILARITY`].
pub fn compute_similarity_with<F>(
    aligned: AlignedTable,
    suffixes: &Suffixes,
    metric: F,
) -> Result<SimilarityTable, SimilarityError>
where
    F: Fn(&OutcomeVector, &OutcomeVector) -> Option<f64>,
{
    ensure!(
        aligned.suffixes == *suffixes,
        SuffixMismatchSnafu {
            expected: aligned.suffixes.clone(),
            found: suffixes.clone(),
        }
    );
    info!(
        "compute_similarity: scoring {:?} rows (left: {:?}, right: {:?})",
        aligned.rows.len(),
        suffixes.left,
        suffixes.right
    );

    let mut rows: Vec<ScoredPair> = Vec::with_capacity(aligned.rows.len());
    let mut num_degenerate = 0;
    for pair in aligned.rows {
        check_components(&pair)?;
        let similarity = match metric(&pair.left, &pair.right) {
            Some(s) => s,
            None => {
                warn!(
                    "compute_similarity: degenerate outcome vector for {} vs {} on poll {}, using {}",
                    pair.left_name, pair.right_name, pair.poll, DEGENERATE_SIMILARITY
                );
                num_degenerate += 1;
                DEGENERATE_SIMILARITY
            }
        };
        rows.push(ScoredPair { pair, similarity });
    }
    if num_degenerate > 0 {
        warn!(
            "compute_similarity: {:?} degenerate rows out of {:?}",
            num_degenerate,
            rows.len()
        );
    }
    Ok(SimilarityTable {
        suffixes: aligned.suffixes,
        rows,
    })
}

impl SimilarityTable {
    /// A sha256 digest of the exact content of the table.
    ///
    /// Two runs over the same ballots give the same fingerprint. The floating
    /// point values are hashed bit for bit.
    pub fn fingerprint(&self) -> String {
        let mut data = format!("{}|{}\n", self.suffixes.left, self.suffixes.right);
        for row in self.rows.iter() {
            let p = &row.pair;
            data.push_str(&format!(
                "{}|{}|{}|{}|",
                p.poll.date, p.poll.title, p.left_name, p.right_name
            ));
            let values = p
                .left
                .values()
                .iter()
                .chain(p.right.values().iter())
                .chain(std::iter::once(&row.similarity));
            for x in values {
                data.push_str(&format!("{:016x};", x.to_bits()));
            }
            data.push('\n');
        }
        sha256::digest(data.as_str())
    }
}
