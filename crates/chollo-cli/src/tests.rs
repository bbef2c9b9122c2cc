use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["chollo-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["chollo-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn parses_seed_stores_defaults() {
    let cli = Cli::try_parse_from(["chollo-cli", "seed-stores"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::SeedStores {
            file: None,
            dry_run: false,
        })
    ));
}

#[test]
fn parses_seed_stores_with_file_and_dry_run() {
    let cli = Cli::try_parse_from([
        "chollo-cli",
        "seed-stores",
        "--file",
        "/tmp/stores.yaml",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::SeedStores {
            file: Some(ref f),
            dry_run: true,
        }) if f == &PathBuf::from("/tmp/stores.yaml")
    ));
}

#[test]
fn parses_rename_store() {
    let cli = Cli::try_parse_from([
        "chollo-cli",
        "rename-store",
        "--domain",
        "amazon.com",
        "--name",
        "Amazon",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::RenameStore {
            ref domain,
            ref name,
        }) if domain == "amazon.com" && name == "Amazon"
    ));
}

#[test]
fn rename_store_requires_both_flags() {
    assert!(Cli::try_parse_from(["chollo-cli", "rename-store", "--domain", "amazon.com"]).is_err());
    assert!(Cli::try_parse_from(["chollo-cli", "rename-store", "--name", "Amazon"]).is_err());
}

#[test]
fn parses_backfill_defaults() {
    let cli = Cli::try_parse_from(["chollo-cli", "backfill"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Backfill {
            limit: 500,
            concurrency: 8,
        })
    ));
}

#[test]
fn parses_backfill_with_limit_and_concurrency() {
    let cli = Cli::try_parse_from([
        "chollo-cli",
        "backfill",
        "--limit",
        "50",
        "--concurrency",
        "2",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Backfill {
            limit: 50,
            concurrency: 2,
        })
    ));
}
