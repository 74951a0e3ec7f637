use crate::sim::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "analysisName")]
    pub analysis_name: Option<String>,
    #[serde(rename = "includeRows")]
    pub include_rows: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    // Roll-call sheets do not carry the poll they belong to.
    #[serde(rename = "pollDate")]
    pub poll_date: Option<String>,
    #[serde(rename = "pollTitle")]
    pub poll_title: Option<String>,
}

impl FileSource {
    pub fn from_path(path: &str, provider: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: path.to_string(),
            excel_worksheet_name: None,
            poll_date: None,
            poll_title: None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisTargets {
    pub politician: Option<String>,
    pub party: Option<String>,
    pub proponents: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<FileSource>,
    #[serde(rename = "partyAliases")]
    pub party_aliases: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub analysis: AnalysisTargets,
}

/// The options of the command line that take precedence over the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub politician: Option<String>,
    pub party: Option<String>,
}

impl SimConfig {
    pub fn with_overrides(self, overrides: &Overrides) -> SimConfig {
        let ballot_sources = match &overrides.input {
            Some(path) => {
                let provider = overrides.input_type.as_deref().unwrap_or("csv");
                // Keep the poll of a single roll-call sheet.
                let template = self
                    .ballot_sources
                    .first()
                    .filter(|cfs| cfs.provider == provider);
                vec![FileSource {
                    poll_date: template.and_then(|cfs| cfs.poll_date.clone()),
                    poll_title: template.and_then(|cfs| cfs.poll_title.clone()),
                    ..FileSource::from_path(path, provider)
                }]
            }
            None => self.ballot_sources,
        };
        SimConfig {
            ballot_sources,
            analysis: AnalysisTargets {
                politician: overrides
                    .politician
                    .clone()
                    .or(self.analysis.politician),
                party: overrides.party.clone().or(self.analysis.party),
                proponents: self.analysis.proponents,
            },
            ..self
        }
    }
}

pub fn read_config(path: &str) -> SimResult<SimConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(&config_str).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: String) -> SimResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
