use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use garrison::perms::Identity;
use garrison::registry::{Kernel, LoadReport};
use garrison::store::FileStore;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

const DEFAULT_DB_DIR: &str = ".garrison";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("garrison=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check(args) => check(args),
        Commands::Save(args) => save(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn db_dir(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_DB_DIR),
        None => PathBuf::from(DEFAULT_DB_DIR),
    })
}

/// Local CLI use is single-operator: the acting identity is an admin.
fn load(
    db_dir: &PathBuf,
    user: &str,
) -> Result<(Kernel, Identity, LoadReport, Vec<String>), garrison::Error> {
    let identity = Identity::admin(user);
    tracing::info!(db = %db_dir.display(), user, "loading db directory");
    let store = FileStore::new(db_dir);
    let (records, warnings) = store.load();
    let mut kernel = Kernel::new(&identity)?;
    let report = kernel.load_all(&identity, &records)?;
    Ok((kernel, identity, report, warnings))
}

fn check(args: cli::CheckArgs) -> Result<ExitCode, garrison::Error> {
    let dir = db_dir(args.db_dir);
    let (kernel, _identity, report, warnings) = load(&dir, &args.user)?;

    for warning in &warnings {
        println!("warning: {warning}");
    }
    for error in &report.errors {
        println!("error: {error}");
    }
    for resolved in kernel.hosts_with_ledgers() {
        if resolved.ledger.is_empty() && !args.verbose {
            continue;
        }
        println!(
            "{} ({}): {} issue(s)",
            resolved.host.name(),
            resolved.host.config_group(),
            resolved.ledger.len()
        );
        for message in resolved.ledger.messages() {
            println!("  {message}");
        }
    }
    println!(
        "loaded {} users, {} groups, {} user categories, {} group categories, {} hosts from {}",
        report.users,
        report.groups,
        report.user_categories,
        report.group_categories,
        report.hosts,
        dir.display()
    );

    let clean = report.errors.is_empty()
        && kernel.hosts_with_ledgers().all(|r| r.ledger.is_empty());
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn save(args: cli::SaveArgs) -> Result<ExitCode, garrison::Error> {
    let dir = db_dir(args.db_dir);
    let (kernel, identity, report, _warnings) = load(&dir, &args.user)?;
    for error in &report.errors {
        println!("skipped: {error}");
    }

    let store = FileStore::new(&dir);
    let exported = kernel.export_all(&identity)?;
    for result in store.save_all(&exported)? {
        println!("{result}");
    }
    Ok(ExitCode::SUCCESS)
}
