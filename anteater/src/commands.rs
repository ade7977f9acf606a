use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("anteater")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("anteater")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Show debug logging, including every rejected link")
                .required(false)
                .conflicts_with("quiet"),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("JSON configuration file (default: built-in ICS settings)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes the default configuration to a file for editing")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the configuration")
                        .default_value("~/.config/anteater/config.json"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing configuration file")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl the configured university subdomains, keeping statistics for the \
                report.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Seed URL (repeatable; default: the four department home pages)")
                        .value_parser(clap::value_parser!(Url))
                        .action(clap::ArgAction::Append)
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers fetching pages")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-m --"max-pages" <COUNT>)
                        .required(false)
                        .help("Stop after fetching this many pages (0 = no limit)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-d --"delay" <MILLISECONDS>)
                        .required(false)
                        .help("Pause each worker takes between requests")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-s --"state" <PATH>)
                        .required(false)
                        .help("Statistics snapshot file, resumed if present")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("report")
                .about("Print the report for a saved statistics snapshot")
                .arg(
                    arg!(-s --"state" <PATH>)
                        .required(false)
                        .help("Statistics snapshot file (default: from configuration)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-n --"top" <COUNT>)
                        .required(false)
                        .help("Number of most frequent words to list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("check")
                .about("Show whether URLs would be queued, and which rule rejects them")
                .arg(
                    arg!([URLS] ...)
                        .required(false)
                        .help("URLs to evaluate")
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to evaluate")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
