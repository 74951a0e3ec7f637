// ********* Input data structures ***********

use chrono::NaiveDate;
use snafu::Snafu;
use std::collections::BTreeMap;
use std::fmt::Display;

/// The version of the outcome vocabulary.
///
/// Every table that carries outcome columns is laid out according to [`Outcome::ALL`].
/// Any change to that list must bump this number.
pub const VOCABULARY_VERSION: u32 = 1;

/// All the possible outcomes of a ballot in a roll-call poll.
///
/// The set is closed: a ballot table that contains anything else is rejected
/// when it is built.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Outcome {
    Yes,
    No,
    Abstain,
    /// The ballot was handed in but could not be counted.
    Invalid,
    /// The politician did not hand in a ballot.
    NoShow,
}

impl Outcome {
    /// The vocabulary, in the order used by every outcome column.
    pub const ALL: [Outcome; 5] = [
        Outcome::Yes,
        Outcome::No,
        Outcome::Abstain,
        Outcome::Invalid,
        Outcome::NoShow,
    ];

    /// Position of this outcome in [`Outcome::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The canonical label, also used as the column name in the outputs.
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Yes => "yes",
            Outcome::No => "no",
            Outcome::Abstain => "abstain",
            Outcome::Invalid => "invalid",
            Outcome::NoShow => "no_show",
        }
    }

    /// The column name used in the Bundestag roll-call sheets.
    pub fn sheet_label(self) -> &'static str {
        match self {
            Outcome::Yes => "ja",
            Outcome::No => "nein",
            Outcome::Abstain => "Enthaltung",
            Outcome::Invalid => "ungültig",
            Outcome::NoShow => "nichtabgegeben",
        }
    }

    /// Reads an outcome from either the canonical or the sheet label.
    pub fn parse(s: &str) -> Option<Outcome> {
        let s = s.trim();
        if s == "no-show" {
            return Some(Outcome::NoShow);
        }
        Outcome::ALL
            .iter()
            .copied()
            .find(|o| o.label() == s || o.sheet_label() == s)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identifies a roll-call poll: a poll is only comparable across tables through this key.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct PollKey {
    pub date: NaiveDate,
    pub title: String,
}

impl PollKey {
    pub fn new(date: NaiveDate, title: impl Into<String>) -> PollKey {
        PollKey {
            date,
            title: title.into(),
        }
    }
}

impl Display for PollKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.title)
    }
}

/// The recorded outcome of one politician on one poll.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    pub party: String,
    pub politician_id: String,
    pub poll: PollKey,
    pub outcome: Outcome,
}

/// The ballots the engine works on.
///
/// **Precondition:** there is at most one ballot per (politician, poll). This is
/// not checked here: duplicates must be removed by whoever produces the table,
/// otherwise the fractions of the affected distributions are silently wrong.
///
/// Build it with [`crate::builder::Builder`] to get outcome and column validation.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BallotTable {
    pub(crate) ballots: Vec<Ballot>,
}

impl BallotTable {
    pub fn new(ballots: Vec<Ballot>) -> BallotTable {
        BallotTable { ballots }
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    /// The distinct parties, sorted by name.
    pub fn parties(&self) -> Vec<String> {
        let mut parties: Vec<String> = self.ballots.iter().map(|b| b.party.clone()).collect();
        parties.sort();
        parties.dedup();
        parties
    }

    /// The distinct polls, in chronological order.
    pub fn polls(&self) -> Vec<PollKey> {
        let mut polls: Vec<PollKey> = self.ballots.iter().map(|b| b.poll.clone()).collect();
        polls.sort();
        polls.dedup();
        polls
    }
}

// ******** Outcome vectors *********

/// A dense vector with one slot per outcome of the vocabulary.
///
/// The slots are never missing: an outcome that did not occur is stored as zero.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct OutcomeVector(pub(crate) [f64; 5]);

impl OutcomeVector {
    pub const ZERO: OutcomeVector = OutcomeVector([0.0; 5]);

    pub fn from_values(values: [f64; 5]) -> OutcomeVector {
        OutcomeVector(values)
    }

    /// The indicator vector of a single outcome.
    pub fn one_hot(outcome: Outcome) -> OutcomeVector {
        let mut values = [0.0; 5];
        values[outcome.index()] = 1.0;
        OutcomeVector(values)
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        self.0[outcome.index()]
    }

    pub fn values(&self) -> &[f64; 5] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        Outcome::ALL.iter().map(move |o| (*o, self.0[o.index()]))
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|x| *x == 0.0)
    }

    pub fn dot(&self, other: &OutcomeVector) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }
}

/// One cell of the long-form distribution table: the share of one outcome
/// among the ballots of one party on one poll.
#[derive(PartialEq, Debug, Clone)]
pub struct PartyOutcomeShare {
    pub party: String,
    pub poll: PollKey,
    pub outcome: Outcome,
    pub fraction: f64,
    pub count: u64,
}

/// The wide-form distribution of a party on a poll.
#[derive(PartialEq, Debug, Clone)]
pub struct PartyDistribution {
    pub party: String,
    pub poll: PollKey,
    pub fractions: OutcomeVector,
}

/// The one-hot ballot of a single politician on a poll.
#[derive(PartialEq, Debug, Clone)]
pub struct EntityVote {
    pub poll: PollKey,
    /// The party the politician voted for on this poll.
    pub party: String,
    pub outcomes: OutcomeVector,
}

/// All the one-hot ballots of a single politician, in poll order.
#[derive(PartialEq, Debug, Clone)]
pub struct EntityVotes {
    pub entity: String,
    pub votes: Vec<EntityVote>,
}

// ******** Aligned and scored tables *********

/// Which side of an aligned table a column belongs to.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Side {
    Left,
    Right,
}

/// The column suffixes that tell the two vectors of an aligned table apart.
///
/// The aligner stamps them on its output and the scorer must be called with the same ones.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Suffixes {
    pub left: String,
    pub right: String,
}

impl Suffixes {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Suffixes {
        Suffixes {
            left: left.into(),
            right: right.into(),
        }
    }

    /// A politician (bare columns) against parties (`_party`).
    pub fn entity_vs_party() -> Suffixes {
        Suffixes::new("", "_party")
    }

    /// A party against another party: both sides are suffixed.
    pub fn party_vs_party() -> Suffixes {
        Suffixes::new("_a", "_b")
    }

    /// The name of a column on one side, e.g. `yes_party`.
    pub fn column(&self, side: Side, name: &str) -> String {
        match side {
            Side::Left => format!("{}{}", name, self.left),
            Side::Right => format!("{}{}", name, self.right),
        }
    }
}

/// Two outcome vectors for the same poll.
#[derive(PartialEq, Debug, Clone)]
pub struct AlignedPair {
    pub poll: PollKey,
    /// The politician or party on the left side.
    pub left_name: String,
    /// The party on the right side.
    pub right_name: String,
    pub left: OutcomeVector,
    pub right: OutcomeVector,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AlignedTable {
    pub suffixes: Suffixes,
    pub rows: Vec<AlignedPair>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ScoredPair {
    pub pair: AlignedPair,
    /// In [0, 1]: 1 for parallel vectors, 0 for disjoint ones.
    pub similarity: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SimilarityTable {
    pub suffixes: Suffixes,
    pub rows: Vec<ScoredPair>,
}

// ******** Reductions *********

/// Descriptive statistics of the similarity against one counterpart.
#[derive(PartialEq, Debug, Clone)]
pub struct SimilaritySummary {
    pub counterpart: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, undefined for a single row.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct YearlySimilarity {
    pub year: i32,
    pub counterpart: String,
    pub mean: f64,
    pub count: usize,
}

/// The party with the highest share of yes votes on a poll.
#[derive(PartialEq, Debug, Clone)]
pub struct Proponent {
    pub poll: PollKey,
    pub party: String,
    pub yes_fraction: f64,
    /// Number of ballots cast by members of that party on the poll.
    pub ballots: u64,
}

/// Politician id -> party.
pub type MandateMap = BTreeMap<String, String>;

// ********* Configuration **********

/// Renames party labels that the sources spell differently.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PartyAliases(BTreeMap<String, String>);

impl PartyAliases {
    pub fn new(aliases: BTreeMap<String, String>) -> PartyAliases {
        PartyAliases(aliases)
    }

    /// The spellings found in the Bundestag roll-call sheets.
    pub fn bundestag() -> PartyAliases {
        let aliases = [
            ("BÜNDNIS`90/DIE GRÜNEN", "BÜ90/GR"),
            ("DIE LINKE", "DIE LINKE."),
            ("fraktionslos", "Fraktionslos"),
            ("fraktionslose", "Fraktionslos"),
        ];
        PartyAliases(
            aliases
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn resolve<'a>(&'a self, party: &'a str) -> &'a str {
        self.0.get(party).map(|s| s.as_str()).unwrap_or(party)
    }
}

/// Errors that prevent a stage from producing its table.
#[derive(PartialEq, Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SimilarityError {
    #[snafu(display("{entity} not found among the politicians of the ballot table"))]
    EntityNotFound { entity: String },

    #[snafu(display("{party} not found among the party distributions"))]
    PartyNotFound { party: String },

    #[snafu(display("required column {column} is missing"))]
    MissingColumn { column: String },

    #[snafu(display("record {record}: no value for column {column}"))]
    ShortRow { record: usize, column: String },

    #[snafu(display("record {record}: outcome {value:?} is not part of the vocabulary"))]
    UnknownOutcome { record: usize, value: String },

    #[snafu(display("record {record}: could not read poll date {value:?}"))]
    InvalidDate { record: usize, value: String },

    #[snafu(display("party {party}, poll {poll}: outcome {outcome} appears more than once"))]
    DuplicateEntry {
        party: String,
        poll: String,
        outcome: String,
    },

    #[snafu(display("poll {poll}: outcome vector has a negative or non-finite component {value}"))]
    InvalidComponent { poll: String, value: f64 },

    #[snafu(display("suffixes {found:?} do not match the suffixes {expected:?} of the aligned table"))]
    SuffixMismatch { expected: Suffixes, found: Suffixes },
}
