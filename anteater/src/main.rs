use anteater::handlers::{
    CrawlOverrides, check_urls, crawl_and_report, format_verdict, load_config, load_statistics,
    load_urls_from_file, load_urls_from_source, parse_format, print_divider, produce_report,
    write_default_config,
};
use anteater_core::crawl::CrawlOptions;
use anteater_core::policy::AdmissionPolicy;
use anteater_core::report::ReportOptions;
use anyhow::{Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    init_tracing(verbose, quiet);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        // No subcommand provided, just show the banner
        None => return,
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        Some(("report", primary_command)) => handle_report(primary_command),
        Some(("check", primary_command)) => handle_check(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

// RUST_LOG applies unless -v or -q is given.
fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_banner() {
    println!(
        "{} {}",
        "anteater".bright_green().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("{}", "focused crawler for university subdomains".dimmed());
    println!();
}

// Handler functions
fn handle_init(args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<String>("PATH") else {
        bail!("No configuration path given");
    };
    let force = args.get_flag("force");

    let written = write_default_config(&PathBuf::from(path), force)?;
    println!(
        "{} Wrote default configuration to {}",
        "✓".green().bold(),
        written.display().to_string().bright_white()
    );
    Ok(())
}

async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let urls: Vec<Url> = sub_matches
        .get_many::<Url>("url")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let seeds = load_urls_from_source(&urls, hosts_file)?;

    let mut config = load_config(sub_matches.get_one::<PathBuf>("config"))?;
    CrawlOverrides {
        workers: sub_matches.get_one::<usize>("threads").copied(),
        max_pages: sub_matches.get_one::<usize>("max-pages").copied(),
        delay_ms: sub_matches.get_one::<u64>("delay").copied(),
        state_path: sub_matches.get_one::<PathBuf>("state").cloned(),
    }
    .apply(&mut config)?;

    let format = parse_format(
        sub_matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;
    let output = sub_matches.get_one::<PathBuf>("output");
    let state_path = config.stats.resolved_state_path();

    if !quiet {
        print_divider();
        println!("{} {} seed(s)", "→".blue(), seeds.len());
        println!("{} Workers: {}", "→".blue(), config.fetch.workers);
        if config.fetch.max_pages > 0 {
            println!("{} Page limit: {}", "→".blue(), config.fetch.max_pages);
        }
        println!(
            "{} State: {}",
            "→".blue(),
            state_path.display().to_string().bright_white()
        );
        print_divider();
        println!();
    }

    let options = ReportOptions {
        parent_domain: config.stats.parent_domain.clone(),
        ..ReportOptions::default()
    };

    let (summary, report) = crawl_and_report(
        CrawlOptions {
            seeds,
            config,
            show_progress_bars: !quiet,
        },
        &options,
        format,
        output,
    )
    .await?;

    if summary.interrupted {
        println!("{} Crawl interrupted; statistics saved", "⚠".yellow().bold());
    }
    println!(
        "{} Fetched {} pages: {} accepted, {} near-duplicates, {} too short, {} without content",
        "✓".green().bold(),
        summary.fetched,
        summary.accepted,
        summary.duplicates,
        summary.too_short,
        summary.no_content
    );

    if let Some(report) = report {
        println!();
        println!("{}", report);
    } else if let Some(path) = output {
        println!("{} Report saved to {}", "✓".green().bold(), path.display());
    }
    Ok(())
}

fn handle_report(sub_matches: &ArgMatches) -> Result<()> {
    let config = load_config(sub_matches.get_one::<PathBuf>("config"))?;
    let state_path = sub_matches
        .get_one::<PathBuf>("state")
        .cloned()
        .unwrap_or_else(|| config.stats.resolved_state_path());
    let format = parse_format(
        sub_matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;
    let output = sub_matches.get_one::<PathBuf>("output");

    let options = ReportOptions {
        top_n: sub_matches.get_one::<usize>("top").copied().unwrap_or(50),
        parent_domain: config.stats.parent_domain.clone(),
    };

    let stats = load_statistics(&state_path)?;
    match produce_report(&stats, &options, format, output)? {
        Some(report) => println!("{}", report),
        None => {
            if let Some(path) = output {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
    }
    Ok(())
}

fn handle_check(sub_matches: &ArgMatches) -> Result<()> {
    let config = load_config(sub_matches.get_one::<PathBuf>("config"))?;
    let urls: Vec<String> = match sub_matches.get_one::<PathBuf>("hosts-file") {
        Some(path) => load_urls_from_file(path)?,
        None => sub_matches
            .get_many::<String>("URLS")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
    };
    if urls.is_empty() {
        bail!("Give at least one URL or --hosts-file");
    }

    let policy = AdmissionPolicy::new(&config.policy)?;
    let verdicts = check_urls(&policy, &urls);
    for (url, admission) in &verdicts {
        println!("{}", format_verdict(url, admission));
    }

    let admitted = verdicts.iter().filter(|(_, a)| a.is_admitted()).count();
    println!();
    println!(
        "{} of {} admitted",
        admitted.to_string().bright_white().bold(),
        verdicts.len()
    );
    Ok(())
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
