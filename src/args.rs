use clap::Parser;

/// This is a program that measures how similarly politicians and parties vote.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the analysis: ballot sources, party aliases
    /// and targets. See the manual of the vote_similarity crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, bsim will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the ballots are read from this file. It replaces the
    /// ballot sources of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, json or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (string, optional) The politician to compare with every party. Overrides the configuration.
    #[clap(long, value_parser)]
    pub politician: Option<String>,

    /// (string, optional) The party to compare with every other party. Overrides the configuration.
    #[clap(long, value_parser)]
    pub party: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
