// Roll-call sheets as published by the Bundestag.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use std::collections::HashMap;

use vote_similarity::builder::parse_poll_date;

use crate::sim::io_common::{simplify_file_name, RawTable};
use crate::sim::*;

const PARTY_COLUMN: &str = "Fraktion/Gruppe";
const ID_COLUMN: &str = "Bezeichnung";

pub fn read_sheet_ballots(path: &str, cfs: &FileSource) -> SimResult<RawTable> {
    let (poll_date, poll_title) = sheet_poll(path, cfs)?;
    debug!(
        "read_sheet_ballots: path: {:?} poll: {} {:?}",
        path, poll_date, poll_title
    );
    let wrange = get_range(path, cfs)?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu { path })?;
    debug!("read_sheet_ballots: header: {:?}", header);
    let col_names: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, x)| match x {
            DataType::String(s) => Some((s.trim().to_string(), idx)),
            _ => None,
        })
        .collect();
    let get_col = |name: &str| -> SimResult<usize> {
        col_names
            .get(name)
            .copied()
            .context(ExcelMissingColumnSnafu { path, column: name })
    };
    let party_idx = get_col(PARTY_COLUMN)?;
    let id_idx = get_col(ID_COLUMN)?;
    let mut outcome_idxs: Vec<(usize, Outcome)> = Vec::new();
    for outcome in Outcome::ALL {
        outcome_idxs.push((get_col(outcome.sheet_label())?, outcome));
    }

    let mut records: Vec<Vec<String>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // The header is on the first line.
        let lineno = (idx + 2) as u64;
        let party = read_text_cell(path, lineno, row.get(party_idx))?;
        let politician_id = read_text_cell(path, lineno, row.get(id_idx))?;
        let mut marked: Vec<Outcome> = Vec::new();
        for (col_idx, outcome) in outcome_idxs.iter() {
            if is_marked(path, lineno, row.get(*col_idx))? {
                marked.push(*outcome);
            }
        }
        let outcome = match marked.as_slice() {
            [outcome] => *outcome,
            _ => {
                return ExcelVoteColumnsSnafu {
                    path,
                    lineno,
                    found: marked.len(),
                }
                .fail();
            }
        };
        records.push(vec![
            party,
            politician_id,
            poll_date.clone(),
            poll_title.clone(),
            outcome.label().to_string(),
        ]);
    }
    let header = ["party", "politician_id", "poll_date", "poll_title", "outcome"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Ok(RawTable { header, records })
}

/// The poll of a sheet: the date comes from the configuration, from a title
/// of the form `02.02.2022: title`, or from a file name such as `20220202_1.xlsx`.
fn sheet_poll(path: &str, cfs: &FileSource) -> SimResult<(String, String)> {
    let file_name = simplify_file_name(path);
    let full_title = match &cfs.poll_title {
        Some(t) => t.trim().to_string(),
        None => whatever!("{}: pollTitle is required for xlsx sources", file_name),
    };
    if let Some(d) = &cfs.poll_date {
        return Ok((d.clone(), full_title));
    }
    if let Some((prefix, rest)) = full_title.split_once(':') {
        if parse_poll_date(prefix).is_some() {
            return Ok((prefix.trim().to_string(), rest.trim().to_string()));
        }
    }
    match file_name.split('_').next() {
        Some(prefix) if parse_poll_date(prefix).is_some() => {
            Ok((prefix.to_string(), full_title))
        }
        _ => whatever!(
            "{}: pollDate is required when neither the title nor the file name carry a date",
            file_name
        ),
    }
}

fn read_text_cell(path: &str, lineno: u64, cell: Option<&DataType>) -> SimResult<String> {
    match cell {
        Some(DataType::String(s)) => Ok(s.trim().to_string()),
        Some(DataType::Int(i)) => Ok(i.to_string()),
        cell => ExcelWrongCellTypeSnafu {
            path,
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn is_marked(path: &str, lineno: u64, cell: Option<&DataType>) -> SimResult<bool> {
    match cell {
        Some(DataType::Float(f)) => Ok(*f == 1.0),
        Some(DataType::Int(i)) => Ok(*i == 1),
        Some(DataType::String(s)) => Ok(s.trim() == "1"),
        Some(DataType::Empty) | None => Ok(false),
        Some(cell) => ExcelWrongCellTypeSnafu {
            path,
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn get_range(path: &str, cfs: &FileSource) -> SimResult<calamine::Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = &cfs.excel_worksheet_name {
        workbook
            .worksheet_range(worksheet_name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })
    }
}
