// Primitives for reading CSV files.

use crate::sim::{io_common::RawTable, *};

pub fn read_csv_ballots(path: &str) -> SimResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_ballots: header: {:?}", header);

    let mut records: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        records.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(RawTable { header, records })
}
