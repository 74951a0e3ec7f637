use chrono::Datelike;
use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::config::*;

/// Assigns each politician to the party of their most recent ballot.
pub fn mandates_from_ballots(ballots: &BallotTable) -> MandateMap {
    let mut ordered: Vec<&Ballot> = ballots.ballots.iter().collect();
    ordered.sort_by(|a, b| a.poll.cmp(&b.poll));
    let mut mandates = MandateMap::new();
    for b in ordered {
        mandates.insert(b.politician_id.clone(), b.party.clone());
    }
    mandates
}

/// Finds, for each poll, the party whose members voted yes the most often.
///
/// The party of a ballot is looked up in `mandates`; ballots of politicians
/// without a mandate are left out. When several parties have the same share
/// of yes votes, the first one in alphabetical order wins.
pub fn strongest_proponents(ballots: &BallotTable, mandates: &MandateMap) -> Vec<Proponent> {
    // (yes votes, all votes)
    let mut tallies: BTreeMap<(&PollKey, &str), (u64, u64)> = BTreeMap::new();
    let mut num_dropped: usize = 0;
    for b in ballots.ballots.iter() {
        match mandates.get(&b.politician_id) {
            Some(party) => {
                let t = tallies.entry((&b.poll, party.as_str())).or_insert((0, 0));
                if b.outcome == Outcome::Yes {
                    t.0 += 1;
                }
                t.1 += 1;
            }
            None => {
                num_dropped += 1;
            }
        }
    }
    if num_dropped > 0 {
        warn!(
            "strongest_proponents: {:?} ballots without a mandate were left out",
            num_dropped
        );
    }

    // The tallies are visited in party order within a poll: only a strictly
    // larger share replaces the current proponent.
    let mut best: BTreeMap<&PollKey, Proponent> = BTreeMap::new();
    for ((poll, party), (yesses, total)) in tallies {
        let yes_fraction = yesses as f64 / total as f64;
        let replace = match best.get(poll) {
            Some(current) => yes_fraction > current.yes_fraction,
            None => true,
        };
        if replace {
            best.insert(
                poll,
                Proponent {
                    poll: poll.clone(),
                    party: party.to_string(),
                    yes_fraction,
                    ballots: total,
                },
            );
        }
    }
    info!("strongest_proponents: {:?} polls", best.len());
    best.into_values().collect()
}

// Linear interpolation between the closest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn describe(counterpart: &str, mut values: Vec<f64>) -> SimilaritySummary {
    values.sort_by(|a, b| a.total_cmp(b));
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = values.iter().map(|x| (x - mean) * (x - mean)).sum();
        Some((ss / (count - 1) as f64).sqrt())
    } else {
        None
    };
    SimilaritySummary {
        counterpart: counterpart.to_string(),
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    }
}

/// Descriptive statistics of the similarity against each counterpart (right side).
///
/// Sorted by increasing mean similarity.
pub fn summarize_similarity(table: &SimilarityTable) -> Vec<SimilaritySummary> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in table.rows.iter() {
        groups
            .entry(row.pair.right_name.as_str())
            .or_default()
            .push(row.similarity);
    }
    let mut res: Vec<SimilaritySummary> = groups
        .into_iter()
        .map(|(counterpart, values)| describe(counterpart, values))
        .collect();
    res.sort_by(|a, b| {
        a.mean
            .total_cmp(&b.mean)
            .then_with(|| a.counterpart.cmp(&b.counterpart))
    });
    debug!("summarize_similarity: {:?}", res);
    res
}

/// The mean similarity against each counterpart, per calendar year.
pub fn similarity_over_time(table: &SimilarityTable) -> Vec<YearlySimilarity> {
    let mut groups: BTreeMap<(i32, &str), (f64, usize)> = BTreeMap::new();
    for row in table.rows.iter() {
        let g = groups
            .entry((row.pair.poll.date.year(), row.pair.right_name.as_str()))
            .or_insert((0.0, 0));
        g.0 += row.similarity;
        g.1 += 1;
    }
    groups
        .into_iter()
        .map(|((year, counterpart), (sum, count))| YearlySimilarity {
            year,
            counterpart: counterpart.to_string(),
            mean: sum / count as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::*;

    fn scored(rows: &[(&str, &str, f64)]) -> SimilarityTable {
        SimilarityTable {
            suffixes: Suffixes::party_vs_party(),
            rows: rows
                .iter()
                .map(|(d, party, s)| ScoredPair {
                    pair: AlignedPair {
                        poll: poll(d, "P"),
                        left_name: "A".to_string(),
                        right_name: party.to_string(),
                        left: OutcomeVector::ZERO,
                        right: OutcomeVector::ZERO,
                    },
                    similarity: *s,
                })
                .collect(),
        }
    }

    #[test]
    fn proponents_pick_highest_yes_fraction() {
        let ballots = small_table();
        let mandates = mandates_from_ballots(&ballots);
        let res = strongest_proponents(&ballots, &mandates);
        assert_eq!(res.len(), 2);
        // P1: A 2/3, B 0, C 1
        assert_eq!(res[0].poll.title, "P1");
        assert_eq!(res[0].party, "C");
        assert_eq!(res[0].yes_fraction, 1.0);
        assert_eq!(res[0].ballots, 1);
        // P2: nobody voted yes, A wins the tie
        assert_eq!(res[1].poll.title, "P2");
        assert_eq!(res[1].party, "A");
        assert_eq!(res[1].yes_fraction, 0.0);
    }

    #[test]
    fn proponents_tie_goes_to_first_party_name() {
        let ballots = BallotTable::new(vec![
            ballot("Z", "z1", "2022-02-02", "P1", Outcome::Yes),
            ballot("M", "m1", "2022-02-02", "P1", Outcome::Yes),
            ballot("M", "m2", "2022-02-02", "P1", Outcome::Yes),
        ]);
        let res = strongest_proponents(&ballots, &mandates_from_ballots(&ballots));
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].party, "M");
        assert_eq!(res[0].ballots, 2);
    }

    #[test]
    fn proponents_use_mandates() {
        let ballots = small_table();
        let mut mandates = MandateMap::new();
        // Only b1 is known, and moved to party D.
        mandates.insert("b1".to_string(), "D".to_string());
        let res = strongest_proponents(&ballots, &mandates);
        assert_eq!(res.len(), 2);
        assert!(res.iter().all(|p| p.party == "D" && p.ballots == 1));
    }

    #[test]
    fn mandates_follow_latest_poll() {
        let ballots = BallotTable::new(vec![
            ballot("B", "x", "2023-01-01", "P2", Outcome::Yes),
            ballot("A", "x", "2022-01-01", "P1", Outcome::Yes),
        ]);
        let mandates = mandates_from_ballots(&ballots);
        assert_eq!(mandates.get("x").map(|s| s.as_str()), Some("B"));
    }

    #[test]
    fn summary_statistics() {
        let t = scored(&[
            ("2022-01-01", "B", 0.1),
            ("2022-01-02", "B", 0.3),
            ("2022-01-03", "B", 0.5),
            ("2022-01-04", "B", 0.7),
            ("2022-01-05", "B", 0.9),
            ("2022-01-01", "C", 0.05),
        ]);
        let res = summarize_similarity(&t);
        assert_eq!(res.len(), 2);
        // Sorted by mean
        assert_eq!(res[0].counterpart, "C");
        assert_eq!(res[0].count, 1);
        assert_eq!(res[0].std, None);
        assert_eq!(res[0].median, 0.05);
        let b = &res[1];
        assert_eq!(b.count, 5);
        assert!((b.mean - 0.5).abs() < 1e-12);
        assert!((b.q25 - 0.3).abs() < 1e-12);
        assert!((b.median - 0.5).abs() < 1e-12);
        assert!((b.q75 - 0.7).abs() < 1e-12);
        assert_eq!(b.min, 0.1);
        assert_eq!(b.max, 0.9);
        assert!((b.std.unwrap() - 0.1_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn summary_quartiles_interpolate() {
        let t = scored(&[("2022-01-01", "B", 0.0), ("2022-01-02", "B", 1.0)]);
        let res = summarize_similarity(&t);
        assert_eq!(res[0].q25, 0.25);
        assert_eq!(res[0].median, 0.5);
        assert_eq!(res[0].q75, 0.75);
    }

    #[test]
    fn yearly_means() {
        let t = scored(&[
            ("2021-05-01", "B", 0.2),
            ("2021-06-01", "B", 0.4),
            ("2022-01-01", "B", 1.0),
            ("2021-01-01", "C", 0.0),
        ]);
        let res = similarity_over_time(&t);
        let got: Vec<(i32, &str, usize)> = res
            .iter()
            .map(|y| (y.year, y.counterpart.as_str(), y.count))
            .collect();
        assert_eq!(got, vec![(2021, "B", 2), (2021, "C", 1), (2022, "B", 1)]);
        assert!((res[0].mean - 0.3).abs() < 1e-12);
        assert_eq!(res[2].mean, 1.0);
    }

    #[test]
    fn empty_tables_reduce_to_nothing() {
        let t = scored(&[]);
        assert!(summarize_similarity(&t).is_empty());
        assert!(similarity_over_time(&t).is_empty());
        let ballots = BallotTable::default();
        assert!(strongest_proponents(&ballots, &MandateMap::new()).is_empty());
    }
}
