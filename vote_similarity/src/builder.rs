use chrono::NaiveDate;
use log::debug;
use snafu::{ensure, OptionExt};

pub use crate::config::*;

/// The columns of a ballot table, with all the names accepted for each of them.
///
/// The first name is the canonical one, the others come from the Bundestag sheets.
pub const BALLOT_COLUMNS: [(&str, &[&str]); 5] = [
    ("party", &["party", "Fraktion/Gruppe"]),
    ("politician_id", &["politician_id", "Bezeichnung"]),
    ("poll_date", &["poll_date", "date"]),
    ("poll_title", &["poll_title", "title"]),
    ("outcome", &["outcome", "vote"]),
];

/// Reads a poll date, either as `2022-02-02`, `02.02.2022`, `20220202` or a
/// timestamp starting with the ISO date.
pub fn parse_poll_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d.%m.%Y"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
        .or_else(|| {
            s.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

/// Finds the position of each of the ballot columns in a header.
pub fn resolve_columns(header: &[String]) -> Result<[usize; 5], SimilarityError> {
    let mut indexes = [0; 5];
    for (slot, (canonical, names)) in indexes.iter_mut().zip(BALLOT_COLUMNS.iter()) {
        *slot = header
            .iter()
            .position(|h| names.contains(&h.trim()))
            .context(MissingColumnSnafu {
                column: *canonical,
            })?;
    }
    Ok(indexes)
}

/// A builder for ballot tables.
///
/// It validates every ballot against the outcome vocabulary and renames the
/// parties according to the aliases.
///
/// ```
/// use vote_similarity::builder::Builder;
/// # use vote_similarity::SimilarityError;
///
/// let mut builder = Builder::new().party_aliases(&vote_similarity::PartyAliases::bundestag());
///
/// builder.add_ballot_simple("DIE LINKE", "anna", "2022-02-02", "budget", "ja")?;
/// assert!(builder.add_ballot_simple("SPD", "bob", "2022-02-02", "budget", "maybe").is_err());
///
/// let ballots = builder.build();
/// assert_eq!(ballots.parties(), vec!["DIE LINKE.".to_string()]);
///
/// # Ok::<(), SimilarityError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _aliases: PartyAliases,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn party_aliases(self, aliases: &PartyAliases) -> Builder {
        Builder {
            _aliases: aliases.clone(),
            _ballots: self._ballots,
        }
    }

    /// Adds a ballot given as strings.
    ///
    /// The outcome may use the canonical labels (`yes`, `no`, ...) or the labels
    /// of the Bundestag sheets (`ja`, `nein`, ...).
    pub fn add_ballot_simple(
        &mut self,
        party: &str,
        politician_id: &str,
        poll_date: &str,
        poll_title: &str,
        outcome: &str,
    ) -> Result<(), SimilarityError> {
        let record = self._ballots.len() + 1;
        let date = parse_poll_date(poll_date).context(InvalidDateSnafu {
            record,
            value: poll_date,
        })?;
        let outcome = Outcome::parse(outcome).context(UnknownOutcomeSnafu {
            record,
            value: outcome,
        })?;
        self.add_ballot(Ballot {
            party: party.trim().to_string(),
            politician_id: politician_id.trim().to_string(),
            poll: PollKey::new(date, poll_title.trim()),
            outcome,
        })
    }

    pub fn add_ballot(&mut self, ballot: Ballot) -> Result<(), SimilarityError> {
        let party = self._aliases.resolve(&ballot.party).to_string();
        self._ballots.push(Ballot { party, ..ballot });
        Ok(())
    }

    /// Adds the rows of a table, whose columns are described by `header`.
    ///
    /// The columns are found by name (see [`BALLOT_COLUMNS`]), other columns are ignored.
    /// Errors name the record, counted from 1 without the header.
    pub fn add_records<I, R>(&mut self, header: &[String], records: I) -> Result<(), SimilarityError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let indexes = resolve_columns(header)?;
        debug!("add_records: column indexes {:?}", indexes);
        for (idx, fields) in records.into_iter().enumerate() {
            let fields = fields.as_ref();
            let record = idx + 1;
            let mut cells: [&str; 5] = [""; 5];
            for ((cell, col_idx), (canonical, _)) in
                cells.iter_mut().zip(indexes.iter()).zip(BALLOT_COLUMNS.iter())
            {
                *cell = fields
                    .get(*col_idx)
                    .context(ShortRowSnafu {
                        record,
                        column: *canonical,
                    })?
                    .as_str();
            }
            let [party, politician_id, poll_date, poll_title, outcome] = cells;
            ensure!(
                !poll_title.trim().is_empty(),
                ShortRowSnafu {
                    record,
                    column: "poll_title"
                }
            );
            let date = parse_poll_date(poll_date).context(InvalidDateSnafu {
                record,
                value: poll_date,
            })?;
            let outcome = Outcome::parse(outcome).context(UnknownOutcomeSnafu {
                record,
                value: outcome,
            })?;
            self.add_ballot(Ballot {
                party: party.trim().to_string(),
                politician_id: politician_id.trim().to_string(),
                poll: PollKey::new(date, poll_title.trim()),
                outcome,
            })?;
        }
        Ok(())
    }

    pub fn build(self) -> BallotTable {
        BallotTable::new(self._ballots)
    }
}
