//! Command execution against a running lookup store.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use lookupcache_core::auth::CredentialStore;
use lookupcache_core::{
    Action, ApiClient, ChannelStatus, Config, LookupApi, LookupState, LookupStore, TableKey,
    TableSnapshot,
};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::{Command, Invocation, USAGE};

pub async fn run(invocation: Invocation, config: Config) -> Result<ExitCode> {
    let verbose = invocation.verbose;
    match invocation.command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(ExitCode::SUCCESS)
        }
        Command::Login { username } => login(username),
        Command::Logout { username } => logout(&username),
        Command::Fetch { tables } => {
            let outcome = fetch_tables(Session::start(&config, verbose)?, &tables).await?;
            print_tables(&outcome.state, &tables)?;
            Ok(exit_code(!report_problems(&outcome.problems(&tables))))
        }
        Command::Status { tables } => {
            let outcome = fetch_tables(Session::start(&config, verbose)?, &tables).await?;
            print_status(&outcome.state, &tables, config.stale_after_minutes);
            Ok(exit_code(!report_problems(&outcome.problems(&tables))))
        }
        Command::Create { table, record } => {
            write(&config, verbose, &table, Action::create_requested(table.as_str(), record)).await
        }
        Command::Update { table, id, record } => {
            write(
                &config,
                verbose,
                &table,
                Action::update_requested(table.as_str(), id, record),
            )
            .await
        }
        Command::Delete { table, id } => {
            write(&config, verbose, &table, Action::delete_requested(table.as_str(), id)).await
        }
    }
}

/// A store plus the task that collects its applied actions.
struct Session {
    store: LookupStore,
    tap: JoinHandle<Vec<String>>,
}

/// What a session ended with.
struct Outcome {
    state: LookupState,
    /// `<Action>: <message>` for every failure applied during the session
    failures: Vec<String>,
}

impl Session {
    fn start(config: &Config, verbose: bool) -> Result<Self> {
        let api = ApiClient::from_config(config)?;
        info!(api_url = %api.base_url(), "Starting lookup store");
        Ok(Self::with_api(Arc::new(api), verbose))
    }

    fn with_api(api: Arc<dyn LookupApi>, verbose: bool) -> Self {
        let store = LookupStore::spawn(api);
        // Must subscribe before the first dispatch
        let tap = tokio::spawn(collect_actions(store.subscribe(), verbose));
        Self { store, tap }
    }

    /// Wait for all work to finish, stop the store and return what happened.
    async fn finish(self) -> Result<Outcome> {
        let state = self.store.settle().await?;
        self.store.shutdown().await;
        let failures = self.tap.await.context("Action collector panicked")?;
        Ok(Outcome { state, failures })
    }
}

impl Outcome {
    /// Every failure seen, then every requested table that never loaded.
    ///
    /// The shared read status only holds the last result, so a later fetch
    /// of another table can clear an earlier failure. The tap and the data
    /// map do not forget.
    fn problems(&self, tables: &[String]) -> Vec<String> {
        let mut problems = self.failures.clone();
        for table in tables {
            if self.state.records(&TableKey::from(table.as_str())).is_none() {
                problems.push(format!("{}: not loaded", table));
            }
        }
        problems
    }
}

async fn fetch_tables(session: Session, tables: &[String]) -> Result<Outcome> {
    for table in tables {
        session.store.fetch(table.as_str()).await?;
    }
    session.finish().await
}

async fn write(config: &Config, verbose: bool, table: &str, action: Action) -> Result<ExitCode> {
    let name = action.name();
    let session = Session::start(config, verbose)?;
    session.store.dispatch(action).await?;
    let outcome = session.finish().await?;

    if report_failure(name, &outcome.state.write_status) {
        return Ok(ExitCode::FAILURE);
    }
    let tables = [table.to_string()];
    print_tables(&outcome.state, &tables)?;
    Ok(exit_code(!report_problems(&outcome.problems(&tables))))
}

/// Record the failures among applied actions, echoing each one when verbose.
async fn collect_actions(mut rx: broadcast::Receiver<Action>, verbose: bool) -> Vec<String> {
    let mut failures = Vec::new();
    loop {
        match rx.recv().await {
            Ok(action) => {
                if verbose {
                    match serde_json::to_string(&action) {
                        Ok(json) => eprintln!("action: {}", json),
                        Err(_) => eprintln!("action: {}", action.name()),
                    }
                }
                if let Some(message) = action.failure_message() {
                    failures.push(format!("{}: {}", action.name(), message));
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Action collector lagged");
                failures.push(format!("{} actions missed", skipped));
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    failures
}

/// Print each problem. Returns whether there were any.
fn report_problems(problems: &[String]) -> bool {
    for problem in problems {
        eprintln!("{}", problem);
    }
    !problems.is_empty()
}

/// Print the channel's error, if any. Returns whether there was one.
fn report_failure(what: &str, status: &ChannelStatus) -> bool {
    match status.error {
        Some(ref error) => {
            eprintln!("{} failed: {}", what, error);
            true
        }
        None => false,
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// `{table: [records...]}` for every requested table that is loaded.
fn tables_json(state: &LookupState, tables: &[String]) -> Value {
    let mut out = Map::new();
    for table in tables {
        if let Some(records) = state.records(&TableKey::from(table.as_str())) {
            out.insert(table.clone(), Value::Array(records.to_vec()));
        }
    }
    Value::Object(out)
}

fn print_tables(state: &LookupState, tables: &[String]) -> Result<()> {
    let json = serde_json::to_string_pretty(&tables_json(state, tables))?;
    println!("{}", json);
    Ok(())
}

fn print_status(state: &LookupState, tables: &[String], stale_after_minutes: i64) {
    for table in tables {
        match state.snapshot(&TableKey::from(table.as_str())) {
            Some(snapshot) => {
                let stale = if snapshot.is_stale(stale_after_minutes) {
                    " (stale)"
                } else {
                    ""
                };
                println!(
                    "{:<24} {:>14}  fetched {}{}",
                    table,
                    record_count(snapshot),
                    snapshot.age_display(),
                    stale
                );
            }
            None => println!("{:<24} not loaded", table),
        }
    }
    println!("read:  {}", describe(&state.read_status));
    println!("write: {}", describe(&state.write_status));
}

fn record_count(snapshot: &TableSnapshot) -> String {
    if snapshot.is_empty() {
        "empty".to_string()
    } else {
        format!("{} records", snapshot.len())
    }
}

fn describe(status: &ChannelStatus) -> String {
    match (status.loading, status.error.as_deref()) {
        (true, _) => "loading".to_string(),
        (false, Some(error)) => format!("error: {}", error),
        (false, None) => "ok".to_string(),
    }
}

fn login(username: String) -> Result<ExitCode> {
    let token = rpassword::prompt_password(format!("API token for {}: ", username))
        .context("Failed to read token")?;
    let token = token.trim();
    if token.is_empty() {
        eprintln!("No token given, nothing stored");
        return Ok(ExitCode::FAILURE);
    }

    CredentialStore::store_token(&username, token)?;
    let mut config = Config::load_stored()?;
    config.username = Some(username.clone());
    config.save()?;
    debug!(%username, "Token stored");
    println!("Logged in as {}", username);
    Ok(ExitCode::SUCCESS)
}

fn logout(username: &str) -> Result<ExitCode> {
    CredentialStore::delete_token(username)?;
    let mut config = Config::load_stored()?;
    if config.username.as_deref() == Some(username) {
        config.username = None;
        config.save()?;
    }
    println!("Logged out {}", username);
    Ok(ExitCode::SUCCESS)
}
