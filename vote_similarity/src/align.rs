use log::{debug, info};
use snafu::ensure;
use std::collections::BTreeMap;

use crate::config::*;

// The party distributions of each poll, sorted by party name.
fn index_by_poll(parties: &[PartyDistribution]) -> BTreeMap<&PollKey, Vec<&PartyDistribution>> {
    let mut index: BTreeMap<&PollKey, Vec<&PartyDistribution>> = BTreeMap::new();
    for p in parties.iter() {
        index.entry(&p.poll).or_default().push(p);
    }
    for rows in index.values_mut() {
        rows.sort_by(|a, b| a.party.cmp(&b.party));
    }
    index
}

fn has_party(parties: &[PartyDistribution], party: &str) -> bool {
    parties.iter().any(|p| p.party == party)
}

/// Aligns the ballots of a politician with the distributions of the parties.
///
/// This is an inner join on the poll. It fans out: each poll of the politician
/// is paired with every party that has a distribution for that poll, so the
/// number of rows is the sum, over the polls shared by both sides, of the
/// number of parties on that poll. Polls that only one side voted on are
/// dropped.
pub fn align_entity_with_parties(
    entity: &EntityVotes,
    parties: &[PartyDistribution],
    suffixes: &Suffixes,
) -> AlignedTable {
    let index = index_by_poll(parties);
    let mut rows: Vec<AlignedPair> = Vec::new();
    for vote in entity.votes.iter() {
        let Some(counterparts) = index.get(&vote.poll) else {
            debug!(
                "align_entity_with_parties: no party distribution for poll {}",
                vote.poll
            );
            continue;
        };
        for p in counterparts.iter() {
            rows.push(AlignedPair {
                poll: vote.poll.clone(),
                left_name: entity.entity.clone(),
                right_name: p.party.clone(),
                left: vote.outcomes,
                right: p.fractions,
            });
        }
    }
    info!(
        "align_entity_with_parties: {} aligned on {:?} (poll, party) rows",
        entity.entity,
        rows.len()
    );
    AlignedTable {
        suffixes: suffixes.clone(),
        rows,
    }
}

fn join_parties(
    left: &[&PartyDistribution],
    right: &BTreeMap<&PollKey, Vec<&PartyDistribution>>,
    party_b: &str,
    rows: &mut Vec<AlignedPair>,
) {
    for a in left.iter() {
        let matched = right
            .get(&a.poll)
            .and_then(|ps| ps.iter().find(|p| p.party == party_b));
        if let Some(b) = matched {
            rows.push(AlignedPair {
                poll: a.poll.clone(),
                left_name: a.party.clone(),
                right_name: b.party.clone(),
                left: a.fractions,
                right: b.fractions,
            });
        }
    }
}

/// Aligns the distributions of two parties on the polls they both voted on.
pub fn align_party_with_party(
    parties: &[PartyDistribution],
    party_a: &str,
    party_b: &str,
    suffixes: &Suffixes,
) -> Result<AlignedTable, SimilarityError> {
    ensure!(
        has_party(parties, party_a),
        PartyNotFoundSnafu { party: party_a }
    );
    ensure!(
        has_party(parties, party_b),
        PartyNotFoundSnafu { party: party_b }
    );
    let left: Vec<&PartyDistribution> = parties.iter().filter(|p| p.party == party_a).collect();
    let index = index_by_poll(parties);
    let mut rows: Vec<AlignedPair> = Vec::new();
    join_parties(&left, &index, party_b, &mut rows);
    debug!(
        "align_party_with_party: {} vs {}: {:?} shared polls",
        party_a,
        party_b,
        rows.len()
    );
    Ok(AlignedTable {
        suffixes: suffixes.clone(),
        rows,
    })
}

/// Aligns one party with each of the other parties.
///
/// The other parties are visited in name order, each of them is aligned with
/// `party_a` and the results are concatenated. Every other party appears
/// exactly once per poll it shares with `party_a`.
pub fn align_party_with_all_parties(
    parties: &[PartyDistribution],
    party_a: &str,
    suffixes: &Suffixes,
) -> Result<AlignedTable, SimilarityError> {
    ensure!(
        has_party(parties, party_a),
        PartyNotFoundSnafu { party: party_a }
    );
    let mut others: Vec<&str> = parties
        .iter()
        .map(|p| p.party.as_str())
        .filter(|p| *p != party_a)
        .collect();
    others.sort_unstable();
    others.dedup();

    let left: Vec<&PartyDistribution> = parties.iter().filter(|p| p.party == party_a).collect();
    let index = index_by_poll(parties);
    let mut rows: Vec<AlignedPair> = Vec::new();
    for party_b in others.iter() {
        join_parties(&left, &index, party_b, &mut rows);
    }
    info!(
        "align_party_with_all_parties: {} vs {:?} other parties: {:?} rows",
        party_a,
        others.len(),
        rows.len()
    );
    Ok(AlignedTable {
        suffixes: suffixes.clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::*;

    #[test]
    fn entity_with_parties_fans_out() {
        let ballots = small_table();
        let parties = party_distributions(&ballots).unwrap();
        let x = prepare_votes_of_entity(&ballots, "x").unwrap();
        let res = align_entity_with_parties(&x, &parties, &Suffixes::entity_vs_party());

        // P1: A, B, C; P2: A, B
        assert_eq!(res.rows.len(), 5);
        assert_eq!(res.suffixes, Suffixes::entity_vs_party());
        let names: Vec<(&str, &str)> = res
            .rows
            .iter()
            .map(|r| (r.poll.title.as_str(), r.right_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("P1", "A"), ("P1", "B"), ("P1", "C"), ("P2", "A"), ("P2", "B")]
        );
        assert!(res.rows.iter().all(|r| r.left_name == "x"));
        assert_eq!(res.rows[0].left, vector([1.0, 0.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn entity_polls_without_parties_are_dropped() {
        let ballots = small_table();
        let parties: Vec<PartyDistribution> = party_distributions(&ballots)
            .unwrap()
            .into_iter()
            .filter(|p| p.poll.title == "P1")
            .collect();
        let x = prepare_votes_of_entity(&ballots, "x").unwrap();
        let res = align_entity_with_parties(&x, &parties, &Suffixes::entity_vs_party());
        assert_eq!(res.rows.len(), 3);
        assert!(res.rows.iter().all(|r| r.poll.title == "P1"));
    }

    #[test]
    fn party_with_party_shared_polls() {
        let parties = party_distributions(&small_table()).unwrap();
        let res =
            align_party_with_party(&parties, "A", "C", &Suffixes::party_vs_party()).unwrap();
        assert_eq!(res.rows.len(), 1);
        assert_eq!(res.rows[0].left_name, "A");
        assert_eq!(res.rows[0].right_name, "C");
        assert_eq!(res.rows[0].right, vector([1.0, 0.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn party_with_all_parties_is_complete() {
        let parties = party_distributions(&small_table()).unwrap();
        let res = align_party_with_all_parties(&parties, "A", &Suffixes::party_vs_party()).unwrap();
        let names: Vec<(&str, &str)> = res
            .rows
            .iter()
            .map(|r| (r.right_name.as_str(), r.poll.title.as_str()))
            .collect();
        assert_eq!(names, vec![("B", "P1"), ("B", "P2"), ("C", "P1")]);
        assert!(res.rows.iter().all(|r| r.left_name == "A"));
    }

    #[test]
    fn party_with_all_parties_single_party() {
        let ballots = BallotTable::new(vec![ballot("A", "a1", "2022-02-02", "P1", Outcome::Yes)]);
        let parties = party_distributions(&ballots).unwrap();
        let res = align_party_with_all_parties(&parties, "A", &Suffixes::party_vs_party()).unwrap();
        assert!(res.rows.is_empty());
    }

    #[test]
    fn unknown_party_is_reported() {
        let parties = party_distributions(&small_table()).unwrap();
        let err =
            align_party_with_all_parties(&parties, "Z", &Suffixes::party_vs_party()).unwrap_err();
        assert_eq!(
            err,
            SimilarityError::PartyNotFound {
                party: "Z".to_string()
            }
        );
        let err = align_party_with_party(&parties, "A", "Z", &Suffixes::party_vs_party())
            .unwrap_err();
        assert!(err.to_string().contains('Z'));
    }
}
