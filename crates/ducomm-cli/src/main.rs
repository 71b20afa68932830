// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use ducomm_app::{Action, AgencyRow, AgencyScope, ViewFactory};
use ducomm_db::Store;
use ducomm_shell::Shell;
use runtime::DbBackend;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DUCOMM_LOG";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    init_logging();

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `ducomm --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or {}",
            db_path.display(),
            ducomm_db::DB_PATH_ENV
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }

    let factory =
        ViewFactory::new(config.authorizer()).with_search_debounce(config.search_debounce()?);
    if options.check_only {
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("start async runtime")?;
    let rows = runtime.block_on(browse(DbBackend::new(store), factory, &options))?;

    if options.json {
        let output: Vec<AgencyOutput<'_>> = rows.iter().map(AgencyOutput::from).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("encode agencies as JSON")?
        );
    } else {
        print_table(&rows);
    }
    Ok(())
}

/// Drives one agencies list through the shell with the requested filters
/// and returns the rows it settles on.
async fn browse(
    backend: DbBackend,
    factory: ViewFactory,
    options: &CliOptions,
) -> Result<Vec<AgencyRow>> {
    let mut shell = Shell::new(Arc::new(backend), factory);
    shell.open_agencies();

    if options.all {
        shell.dispatch(Action::SetScope(AgencyScope::AllDispatchCenters));
    }
    if let Some(search) = &options.search {
        shell.dispatch(Action::SetSearchText(search.clone()));
    }
    if options.include_inactive {
        shell.dispatch(Action::SetActiveOnly(false));
    }
    shell.dispatch(Action::Refresh);
    shell.run_until_idle().await;

    let list = shell
        .current()
        .and_then(|view| view.as_agencies())
        .ok_or_else(|| anyhow!("agencies list is not showing"))?;
    if let Some(message) = list.error_message() {
        bail!("list agencies: {message}");
    }
    Ok(list.rows().to_vec())
}

#[derive(Debug, Serialize)]
struct AgencyOutput<'a> {
    id: i64,
    dispatch_center: &'a str,
    short: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    owned: bool,
    active: bool,
    can_edit: bool,
}

impl<'a> From<&'a AgencyRow> for AgencyOutput<'a> {
    fn from(row: &'a AgencyRow) -> Self {
        Self {
            id: row.id.get(),
            dispatch_center: &row.dispatch_center_code,
            short: &row.short,
            name: &row.name,
            kind: &row.kind,
            owned: row.owned,
            active: row.active,
            can_edit: row.can_edit,
        }
    }
}

fn print_table(rows: &[AgencyRow]) {
    if rows.is_empty() {
        println!("no agencies match");
        return;
    }
    println!(
        "{:<6} {:<10} {:<32} {:<8} {:<6} {:<6}",
        "CENTER", "SHORT", "NAME", "TYPE", "OWNED", "ACTIVE"
    );
    for row in rows {
        println!(
            "{:<6} {:<10} {:<32} {:<8} {:<6} {:<6}",
            row.dispatch_center_code,
            row.short,
            row.name,
            row.kind,
            yes_no(row.owned),
            yes_no(row.active),
        );
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    all: bool,
    search: Option<String>,
    include_inactive: bool,
    json: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        all: false,
        search: None,
        include_inactive: false,
        json: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--search" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--search requires text to match"))?;
                options.search = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--all" => {
                options.all = true;
            }
            "--include-inactive" => {
                options.include_inactive = true;
            }
            "--json" => {
                options.json = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("ducomm: dispatch config agencies");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Use seeded demo data (in-memory)");
    println!("  --check                  Validate config and database, then exit");
    println!("  --all                    List agencies of every dispatch center");
    println!("  --search <text>          Only agencies whose short or name contains text");
    println!("  --include-inactive       Include inactive agencies");
    println!("  --json                   Print agencies as JSON");
    println!("  --help                   Show this help");
}
