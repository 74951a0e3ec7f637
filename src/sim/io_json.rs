// Ballot tables stored as a JSON array of flat objects.

use crate::sim::io_common::{json_cell, simplify_file_name, RawTable};
use crate::sim::*;

pub fn read_json_ballots(path: &str) -> SimResult<RawTable> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let file_name = simplify_file_name(path);
    let rows = match js.as_array() {
        Some(rows) => rows,
        None => whatever!("{}: expected an array of ballots", file_name),
    };

    let mut header: Vec<String> = Vec::new();
    for row in rows.iter() {
        if let Some(obj) = row.as_object() {
            for key in obj.keys() {
                if !header.contains(key) {
                    header.push(key.clone());
                }
            }
        }
    }
    debug!("read_json_ballots: {:?}: header: {:?}", file_name, header);

    let mut records: Vec<Vec<String>> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let obj = match row.as_object() {
            Some(obj) => obj,
            None => whatever!("{}: entry {} is not an object", file_name, idx + 1),
        };
        let mut record: Vec<String> = Vec::new();
        for key in header.iter() {
            let cell = match obj.get(key).map(json_cell) {
                Some(Some(cell)) => cell,
                Some(None) => {
                    whatever!("{}: entry {}: {} is not a scalar", file_name, idx + 1, key)
                }
                None => whatever!("{}: entry {}: missing key {}", file_name, idx + 1, key),
            };
            record.push(cell);
        }
        records.push(record);
    }
    Ok(RawTable { header, records })
}
