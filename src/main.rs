use clap::Parser;
use log::LevelFilter;

mod args;
mod sim;

use crate::sim::config_reader::Overrides;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::builder().filter_level(LevelFilter::Debug).init();
    } else {
        env_logger::init();
    }

    let overrides = Overrides {
        input: args.input.clone(),
        input_type: args.input_type.clone(),
        politician: args.politician.clone(),
        party: args.party.clone(),
    };

    let res = sim::run_analysis(args.config, &overrides, args.out, args.reference);

    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        std::process::exit(1);
    }
}
