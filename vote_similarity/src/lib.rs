/*!
Voting similarity between politicians and parties.

The crate turns a table of roll-call ballots into outcome distributions per
party and poll, aligns two sets of outcome vectors on the poll they belong to,
and scores every aligned poll with the cosine similarity of the two vectors.

```
use vote_similarity::builder::Builder;
use vote_similarity::*;

let mut builder = Builder::new();
builder.add_ballot_simple("A", "anna", "2022-02-02", "budget", "yes")?;
builder.add_ballot_simple("A", "bob", "2022-02-02", "budget", "no")?;
builder.add_ballot_simple("B", "clara", "2022-02-02", "budget", "yes")?;
let ballots = builder.build();

let parties = party_distributions(&ballots)?;
let anna = prepare_votes_of_entity(&ballots, "anna")?;
let suffixes = Suffixes::entity_vs_party();
let aligned = align_entity_with_parties(&anna, &parties, &suffixes);
let scored = compute_similarity(aligned, &suffixes)?;
assert_eq!(scored.rows.len(), 2);

# Ok::<(), SimilarityError>(())
```
*/
mod align;
pub mod builder;
mod config;
pub mod manual;
mod reduce;
mod score;

use log::{debug, info};
use snafu::ensure;
use std::collections::BTreeMap;

pub use crate::align::*;
pub use crate::config::*;
pub use crate::reduce::*;
pub use crate::score::*;

/// The outcome columns of a row before the missing ones are filled in.
pub type OutcomeColumns = [Option<f64>; 5];

/// Makes sure that every outcome of the vocabulary has a value.
///
/// The outcomes that have no value are set to `fill_value`.
pub fn fill_missing_outcomes(columns: &OutcomeColumns, fill_value: f64) -> OutcomeVector {
    let mut values = [fill_value; 5];
    for (slot, cell) in values.iter_mut().zip(columns.iter()) {
        if let Some(x) = cell {
            *slot = *x;
        }
    }
    OutcomeVector(values)
}

/// Computes the total and relative votes by party for each poll.
///
/// Only the outcomes that occur among the ballots of a group are reported. The
/// fractions of a (party, poll) group sum to one. The output is sorted by
/// party, poll and outcome.
pub fn votes_by_party(ballots: &BallotTable) -> Vec<PartyOutcomeShare> {
    info!(
        "votes_by_party: computing votes by party and poll over {:?} ballots",
        ballots.len()
    );
    let mut groups: BTreeMap<(&str, &PollKey), [u64; 5]> = BTreeMap::new();
    for b in ballots.ballots.iter() {
        let counts = groups
            .entry((b.party.as_str(), &b.poll))
            .or_insert([0; 5]);
        counts[b.outcome.index()] += 1;
    }

    let mut res: Vec<PartyOutcomeShare> = Vec::new();
    for ((party, poll), counts) in groups {
        let total: u64 = counts.iter().sum();
        for outcome in Outcome::ALL {
            let count = counts[outcome.index()];
            if count > 0 {
                res.push(PartyOutcomeShare {
                    party: party.to_string(),
                    poll: poll.clone(),
                    outcome,
                    fraction: count as f64 / total as f64,
                    count,
                });
            }
        }
    }
    debug!("votes_by_party: {:?} outcome shares", res.len());
    res
}

/// Pivots the long-form shares into one outcome vector per (party, poll).
///
/// Outcomes that no member of the party chose are set to 0.
pub fn pivot_party_votes(
    shares: &[PartyOutcomeShare],
) -> Result<Vec<PartyDistribution>, SimilarityError> {
    let mut cells: BTreeMap<(&str, &PollKey), OutcomeColumns> = BTreeMap::new();
    for s in shares.iter() {
        let row = cells
            .entry((s.party.as_str(), &s.poll))
            .or_insert([None; 5]);
        let cell = &mut row[s.outcome.index()];
        // There is no aggregation: a cell can only be written once.
        ensure!(
            cell.is_none(),
            DuplicateEntrySnafu {
                party: s.party.clone(),
                poll: s.poll.to_string(),
                outcome: s.outcome.label(),
            }
        );
        *cell = Some(s.fraction);
    }

    let res: Vec<PartyDistribution> = cells
        .into_iter()
        .map(|((party, poll), columns)| PartyDistribution {
            party: party.to_string(),
            poll: poll.clone(),
            fractions: fill_missing_outcomes(&columns, 0.0),
        })
        .collect();
    debug!("pivot_party_votes: {:?} party distributions", res.len());
    Ok(res)
}

/// The outcome distributions of every party on every poll.
pub fn party_distributions(
    ballots: &BallotTable,
) -> Result<Vec<PartyDistribution>, SimilarityError> {
    pivot_party_votes(&votes_by_party(ballots))
}

/// Prepares the ballots of a single politician as one-hot outcome vectors.
///
/// Fails if the politician did not cast any ballot in the table.
pub fn prepare_votes_of_entity(
    ballots: &BallotTable,
    entity: &str,
) -> Result<EntityVotes, SimilarityError> {
    let mut votes: Vec<EntityVote> = ballots
        .ballots
        .iter()
        .filter(|b| b.politician_id == entity)
        .map(|b| {
            let mut columns: OutcomeColumns = [None; 5];
            columns[b.outcome.index()] = Some(1.0);
            EntityVote {
                poll: b.poll.clone(),
                party: b.party.clone(),
                outcomes: fill_missing_outcomes(&columns, 0.0),
            }
        })
        .collect();
    ensure!(!votes.is_empty(), EntityNotFoundSnafu { entity });

    votes.sort_by(|a, b| (&a.poll, &a.party).cmp(&(&b.poll, &b.party)));
    info!(
        "prepare_votes_of_entity: {} voted on {:?} polls",
        entity,
        votes.len()
    );
    Ok(EntityVotes {
        entity: entity.to_string(),
        votes,
    })
}
