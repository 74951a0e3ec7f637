use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use vote_similarity::builder::Builder;
use vote_similarity::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::sim::config_reader::*;
use crate::sim::io_common::RawTable;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_sheets;

#[derive(Debug, Snafu)]
pub enum BsimError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("{path}: line {lineno}: could not understand cell {content}"))]
    ExcelWrongCellType {
        path: String,
        lineno: u64,
        content: String,
    },
    #[snafu(display("{path}: line {lineno}: expected exactly one outcome, found {found}"))]
    ExcelVoteColumns {
        path: String,
        lineno: u64,
        found: usize,
    },
    #[snafu(display("{path}: required column {column} is missing"))]
    ExcelMissingColumn { path: String, column: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("{path}: could not parse line {lineno}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{path}: {source}"))]
    Ballots {
        source: SimilarityError,
        path: String,
    },
    #[snafu(display("{source}"))]
    Engine { source: SimilarityError },
    #[snafu(display("Missing parent directory for {path}"))]
    MissingParentDir { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, BsimError>;
pub type BSimResult<T> = Result<T, Box<BsimError>>;

fn vector_to_json(js: &mut JSMap<String, JSValue>, v: &OutcomeVector, suffixes: &Suffixes, side: Side) {
    for (outcome, value) in v.iter() {
        js.insert(suffixes.column(side, outcome.label()), json!(value));
    }
}

fn similarity_rows_to_json(table: &SimilarityTable, left_label: &str) -> Vec<JSValue> {
    let suffixes = &table.suffixes;
    let mut l: Vec<JSValue> = Vec::new();
    for row in table.rows.iter() {
        let pair = &row.pair;
        let mut js: JSMap<String, JSValue> = JSMap::new();
        js.insert("date".to_string(), json!(pair.poll.date.to_string()));
        js.insert("title".to_string(), json!(pair.poll.title));
        js.insert(suffixes.column(Side::Left, left_label), json!(pair.left_name));
        js.insert(suffixes.column(Side::Right, "party"), json!(pair.right_name));
        vector_to_json(&mut js, &pair.left, suffixes, Side::Left);
        vector_to_json(&mut js, &pair.right, suffixes, Side::Right);
        js.insert("similarity".to_string(), json!(row.similarity));
        l.push(JSValue::Object(js));
    }
    l
}

fn summary_to_json(summary: &[SimilaritySummary]) -> Vec<JSValue> {
    summary
        .iter()
        .map(|s| {
            json!({
                "party": s.counterpart,
                "count": s.count,
                "mean": s.mean,
                "std": s.std,
                "min": s.min,
                "25%": s.q25,
                "50%": s.median,
                "75%": s.q75,
                "max": s.max,
            })
        })
        .collect()
}

fn over_time_to_json(yearly: &[YearlySimilarity]) -> Vec<JSValue> {
    yearly
        .iter()
        .map(|y| json!({"year": y.year, "party": y.counterpart, "mean": y.mean, "count": y.count}))
        .collect()
}

fn proponents_to_json(proponents: &[Proponent]) -> Vec<JSValue> {
    proponents
        .iter()
        .map(|p| {
            json!({
                "date": p.poll.date.to_string(),
                "title": p.poll.title,
                "party": p.party,
                "yesFraction": p.yes_fraction,
                "ballots": p.ballots,
            })
        })
        .collect()
}

fn comparison_to_json(
    target_key: &str,
    target: &str,
    left_label: &str,
    table: &SimilarityTable,
    include_rows: bool,
) -> JSValue {
    let mut js: JSMap<String, JSValue> = JSMap::new();
    js.insert(target_key.to_string(), json!(target));
    js.insert(
        "summary".to_string(),
        JSValue::Array(summary_to_json(&summarize_similarity(table))),
    );
    js.insert(
        "overTime".to_string(),
        JSValue::Array(over_time_to_json(&similarity_over_time(table))),
    );
    if include_rows {
        js.insert(
            "rows".to_string(),
            JSValue::Array(similarity_rows_to_json(table, left_label)),
        );
    }
    JSValue::Object(js)
}

fn read_ballot_data(root_path: &Path, cfs: &FileSource, builder: &mut Builder) -> SimResult<()> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    let table: RawTable = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ballots(&p2)?,
        "json" => io_json::read_json_ballots(&p2)?,
        "xlsx" => io_sheets::read_sheet_ballots(&p2, cfs)?,
        x => whatever!("Provider not implemented {:?}", x),
    };
    debug!(
        "read_ballot_data: {:?}: header {:?}, {:?} records",
        p2,
        table.header,
        table.records.len()
    );
    builder
        .add_records(&table.header, table.records)
        .context(BallotsSnafu { path: p2 })
}

fn compare_politician(
    ballots: &BallotTable,
    parties: &[PartyDistribution],
    politician: &str,
) -> SimResult<SimilarityTable> {
    let suffixes = Suffixes::entity_vs_party();
    let entity = prepare_votes_of_entity(ballots, politician).context(EngineSnafu {})?;
    let aligned = align_entity_with_parties(&entity, parties, &suffixes);
    compute_similarity(aligned, &suffixes).context(EngineSnafu {})
}

fn compare_party(parties: &[PartyDistribution], party: &str) -> SimResult<SimilarityTable> {
    let suffixes = Suffixes::party_vs_party();
    let aligned = align_party_with_all_parties(parties, party, &suffixes).context(EngineSnafu {})?;
    compute_similarity(aligned, &suffixes).context(EngineSnafu {})
}

fn build_summary_js(config: &SimConfig, ballots: &BallotTable) -> SimResult<JSValue> {
    let include_rows = config.output_settings.include_rows.unwrap_or(false);
    let vocabulary: Vec<&str> = Outcome::ALL.iter().map(|o| o.label()).collect();
    let mut js: JSMap<String, JSValue> = JSMap::new();
    js.insert(
        "config".to_string(),
        json!({
            "analysis": config.output_settings.analysis_name,
            "vocabulary": vocabulary,
            "vocabularyVersion": VOCABULARY_VERSION,
            "ballots": ballots.len(),
            "polls": ballots.polls().len(),
            "parties": ballots.parties(),
        }),
    );

    let parties = party_distributions(ballots).context(EngineSnafu {})?;

    if let Some(politician) = &config.analysis.politician {
        let table = compare_politician(ballots, &parties, politician)?;
        info!(
            "build_summary_js: {} vs parties: {:?} rows, fingerprint {}",
            politician,
            table.rows.len(),
            table.fingerprint()
        );
        js.insert(
            "politicianVsParties".to_string(),
            comparison_to_json("politician", politician, "politician", &table, include_rows),
        );
    }

    if let Some(party) = &config.analysis.party {
        let table = compare_party(&parties, party)?;
        info!(
            "build_summary_js: {} vs other parties: {:?} rows, fingerprint {}",
            party,
            table.rows.len(),
            table.fingerprint()
        );
        js.insert(
            "partyVsParties".to_string(),
            comparison_to_json("party", party, "party", &table, include_rows),
        );
    }

    if config.analysis.proponents.unwrap_or(false) {
        let proponents = strongest_proponents(ballots, &mandates_from_ballots(ballots));
        js.insert(
            "proponents".to_string(),
            JSValue::Array(proponents_to_json(&proponents)),
        );
    }

    Ok(JSValue::Object(js))
}

fn write_summary(out: Option<&str>, pretty_js: &str) -> SimResult<()> {
    match out {
        None | Some("stdout") => {
            println!("{}", pretty_js);
            Ok(())
        }
        Some(path) => fs::write(path, pretty_js).context(WritingOutputSnafu { path }),
    }
}

fn load_config(config_path: Option<&str>, overrides: &Overrides) -> SimResult<(SimConfig, PathBuf)> {
    let (config, root) = match config_path {
        Some(path) => {
            let config = read_config(path)?;
            let root = Path::new(path)
                .parent()
                .context(MissingParentDirSnafu { path })?
                .to_path_buf();
            (config, root)
        }
        None => (SimConfig::default(), PathBuf::new()),
    };
    // A file given on the command line is relative to the working directory.
    let root = if overrides.input.is_some() {
        PathBuf::new()
    } else {
        root
    };
    Ok((config.with_overrides(overrides), root))
}

pub fn run_analysis(
    config_path: Option<String>,
    overrides: &Overrides,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> BSimResult<()> {
    analyze(config_path, overrides, out, check_summary_path).map_err(Box::new)
}

fn analyze(
    config_path: Option<String>,
    overrides: &Overrides,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> SimResult<()> {
    let (config, root_p) = load_config(config_path.as_deref(), overrides)?;
    info!("config: {:?}", config);

    if config.ballot_sources.is_empty() {
        whatever!("No ballot source: use --input or add ballotSources to the configuration");
    }

    let aliases = config
        .party_aliases
        .clone()
        .map(PartyAliases::new)
        .unwrap_or_else(PartyAliases::bundestag);
    let mut builder = Builder::new().party_aliases(&aliases);
    for cfs in config.ballot_sources.iter() {
        read_ballot_data(&root_p, cfs, &mut builder)?;
    }
    let ballots = builder.build();
    info!(
        "run_analysis: {:?} ballots, {:?} polls, parties: {:?}",
        ballots.len(),
        ballots.polls().len(),
        ballots.parties()
    );

    let result_js = build_summary_js(&config, &ballots)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(out.as_deref(), &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        debug!("summary: {:?}", summary_ref);
        if summary_ref != result_js {
            let pretty_js_summary_ref =
                serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between computed summary and reference summary")
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> String {
        format!("{}/tests/data", env!("CARGO_MANIFEST_DIR"))
    }

    fn run_analysis_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> BSimResult<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let test_dir = test_dir();
        info!("Running test {}", test_name);
        run_analysis(
            Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
            &Overrides::default(),
            None,
            Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        )
    }

    fn test_wrapper(test_name: &str) {
        let res = run_analysis_test(
            test_name,
            format!("{}_config.json", test_name).as_str(),
            format!("{}_expected_summary.json", test_name).as_str(),
        );
        if let Err(e) = res {
            panic!("An error occured {}", e);
        }
    }

    #[test]
    fn unanimous() {
        test_wrapper("unanimous");
    }

    #[test]
    fn unanimous_json_input() {
        let res = run_analysis_test(
            "unanimous",
            "unanimous_json_config.json",
            "unanimous_expected_summary.json",
        );
        assert!(res.is_ok(), "{:?}", res.err().map(|e| e.to_string()));
    }

    #[test]
    fn sheet() {
        test_wrapper("sheet");
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let res = run_analysis_test(
            "unanimous",
            "unanimous_config.json",
            "unanimous_wrong_summary.json",
        );
        let err = res.unwrap_err();
        assert!(err.to_string().contains("Difference detected"));
    }

    #[test]
    fn unknown_politician_is_named() {
        let overrides = Overrides {
            politician: Some("nobody".to_string()),
            ..Overrides::default()
        };
        let res = run_analysis(
            Some(format!("{}/unanimous/unanimous_config.json", test_dir())),
            &overrides,
            None,
            None,
        );
        let err = res.unwrap_err();
        assert!(matches!(
            *err,
            BsimError::Engine {
                source: SimilarityError::EntityNotFound { .. }
            }
        ));
        assert!(err.to_string().contains("nobody"));
    }

    #[test]
    fn input_override_with_missing_column() {
        let overrides = Overrides {
            input: Some(format!("{}/broken/missing_outcome.csv", test_dir())),
            input_type: Some("csv".to_string()),
            ..Overrides::default()
        };
        let err = run_analysis(None, &overrides, None, None).unwrap_err();
        assert!(matches!(
            *err,
            BsimError::Ballots {
                source: SimilarityError::MissingColumn { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("outcome"));
    }

    #[test]
    fn unknown_outcome_fails_the_table() {
        let overrides = Overrides {
            input: Some(format!("{}/broken/unknown_outcome.csv", test_dir())),
            ..Overrides::default()
        };
        let err = run_analysis(None, &overrides, None, None).unwrap_err();
        assert!(err.to_string().contains("perhaps"), "{}", err);
        // The bad value is on the second record, after the header line.
        assert!(err.to_string().contains("record 2"), "{}", err);
    }

    #[test]
    fn sheet_without_title_is_rejected() {
        let overrides = Overrides {
            input: Some(format!("{}/sheet/20220202_1.xlsx", test_dir())),
            input_type: Some("xlsx".to_string()),
            ..Overrides::default()
        };
        // Without a configuration the poll of the sheet is unknown.
        let err = run_analysis(None, &overrides, None, None).unwrap_err();
        assert!(err.to_string().contains("pollTitle"), "{}", err);
    }

    #[test]
    fn sheet_with_two_outcomes_is_rejected() {
        let res = run_analysis(
            Some(format!("{}/broken/two_outcomes_config.json", test_dir())),
            &Overrides::default(),
            None,
            None,
        );
        let err = res.unwrap_err();
        assert!(
            matches!(
                *err,
                BsimError::ExcelVoteColumns {
                    lineno: 3,
                    found: 2,
                    ..
                }
            ),
            "{}",
            err
        );
    }

    #[test]
    fn missing_sources() {
        let err = run_analysis(None, &Overrides::default(), None, None).unwrap_err();
        assert!(err.to_string().contains("No ballot source"));
    }

    #[test]
    fn summary_written_to_file() {
        let out = std::env::temp_dir().join(format!("bsim-summary-{}.json", std::process::id()));
        let out_s = out.display().to_string();
        run_analysis(
            Some(format!("{}/unanimous/unanimous_config.json", test_dir())),
            &Overrides::default(),
            Some(out_s.clone()),
            None,
        )
        .unwrap();
        let written = read_summary(out_s).unwrap();
        assert_eq!(written["config"]["ballots"], json!(12));
        let _ = fs::remove_file(out);
    }

    #[test]
    fn reference_keeps_all_float_digits() {
        let path = std::env::temp_dir().join(format!("bsim-reference-{}.json", std::process::id()));
        fs::write(&path, r#"{"mean": 0.39999999999999997, "q": 0.47434164902525683}"#).unwrap();
        let js = read_summary(path.display().to_string()).unwrap();
        assert_eq!(js["mean"], json!(0.39999999999999997_f64));
        assert_ne!(js["mean"], json!(0.4_f64));
        assert_eq!(js["q"].as_f64(), Some(0.47434164902525683));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn sheet_input_keeps_configured_poll() {
        let out = std::env::temp_dir().join(format!("bsim-sheet-{}.json", std::process::id()));
        let out_s = out.display().to_string();
        let overrides = Overrides {
            input: Some(format!("{}/sheet/20220202_1.xlsx", test_dir())),
            input_type: Some("xlsx".to_string()),
            ..Overrides::default()
        };
        run_analysis(
            Some(format!("{}/sheet/sheet_config.json", test_dir())),
            &overrides,
            Some(out_s.clone()),
            None,
        )
        .unwrap();
        let written = read_summary(out_s).unwrap();
        assert_eq!(written["config"]["ballots"], json!(10));
        assert_eq!(written["config"]["polls"], json!(1));
        // The title comes from the configuration, the date from the file name.
        assert_eq!(written["proponents"][0]["title"], json!("Impfpflicht"));
        assert_eq!(written["proponents"][0]["date"], json!("2022-02-02"));
        let _ = fs::remove_file(out);
    }
}
