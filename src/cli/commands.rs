use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::cli::error::{validate_tag, CliError};
use crate::cli::output::{
    format_activities_table, format_current, format_duration, format_facts_json,
    format_facts_table, get_terminal_width, is_tty,
};
use crate::cli::parser::parse_raw_fact;
use crate::config::{Config, DbConfig};
use crate::db::DbConnection;
use crate::filter::SearchFilters;
use crate::logging;
use crate::models::{Activity, Category, Fact};
use crate::report::{export_to_file, ExportFormat};
use crate::repo::{ActivityRepo, CategoryRepo, FactQuery, FactRepo, StoreError};
use crate::utils::{
    complete_start, complete_timeframe, parse_partial, parse_time_range, AppDirs,
    PartialDateTime, APP_NAME,
};

pub const LICENSE_TEXT: &str = "\
'hamster-cli' is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

'hamster-cli' is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with 'hamster-cli'.  If not, see <http://www.gnu.org/licenses/>.";

#[derive(Parser)]
#[command(name = "hamster")]
#[command(about = "A command line time tracker: start, stop, search and export facts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options selecting facts, shared by every command that works on stored facts
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only facts starting at or after this time ("YYYY-MM-DD HH:MM", "YYYY-MM-DD" or "HH:MM")
    #[arg(short = 's', long, value_name = "TIME")]
    pub start: Option<String>,
    /// Only facts ending at or before this time
    #[arg(short = 'e', long, value_name = "TIME")]
    pub end: Option<String>,
    /// Search expression matched against the activity name (e.g. "coding and review")
    #[arg(short = 'a', long, value_name = "EXPR")]
    pub activity: Option<String>,
    /// Search expression matched against the category name
    #[arg(short = 'c', long, value_name = "EXPR")]
    pub category: Option<String>,
    /// Search expression matched against the tags
    #[arg(short = 't', long, value_name = "EXPR")]
    pub tag: Option<String>,
    /// Search expression matched against the description
    #[arg(short = 'd', long, value_name = "EXPR")]
    pub description: Option<String>,
    /// Select a single stored fact by ID, ignoring all other filters.
    /// The ongoing fact is not selectable; use current/stop/cancel for it.
    #[arg(short = 'k', long, value_name = "ID")]
    pub key: Option<i64>,
}

impl FilterArgs {
    fn search_filters(&self) -> Result<SearchFilters> {
        Ok(SearchFilters::parse(
            self.activity.as_deref(),
            self.category.as_deref(),
            self.tag.as_deref(),
            self.description.as_deref(),
        )?)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search facts whose activity contains SEARCH_TERM
    Search {
        /// Case-insensitive part of the activity name
        search_term: String,
        /// Time range ("START - END", "START" or "-MINUTES")
        #[arg(allow_hyphen_values = true)]
        time_range: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List facts within a time range
    List {
        /// Time range ("START - END", "START" or "-MINUTES")
        #[arg(allow_hyphen_values = true)]
        time_range: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Start tracking a fact, or add a complete one
    Start {
        /// Fact shorthand: "[HH:MM[-HH:MM] | -MINUTES] activity[@category] [#tag ...][, description]"
        #[arg(allow_hyphen_values = true)]
        raw_fact: String,
        /// Start time, overrides any time in the shorthand
        start: Option<String>,
        /// End time. Without any end information the fact is ongoing.
        end: Option<String>,
    },
    /// Stop the ongoing fact and save it
    Stop,
    /// Discard the ongoing fact without saving it
    Cancel,
    /// Show the ongoing fact
    Current,
    /// Export facts to a file
    Export {
        /// One of: csv, tsv, ical, xml
        #[arg(default_value = "csv")]
        format: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file (defaults to the export path from the config plus extension)
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List all categories
    Categories,
    /// List activities, optionally filtered by name
    Activities {
        /// Case-insensitive part of the activity name
        search_term: Option<String>,
    },
    /// Add tags to all matching facts
    Tag {
        /// Tags to add (a leading '#' is optional)
        #[arg(required = true)]
        tags: Vec<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Apply without confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Delete all matching facts
    Remove {
        #[command(flatten)]
        filters: FilterArgs,
        /// Apply without confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Modify all matching facts
    Edit {
        #[command(flatten)]
        filters: FilterArgs,
        /// New activity name (requires --set-category)
        #[arg(long, value_name = "NAME")]
        set_activity: Option<String>,
        /// New category name, empty for none (requires --set-activity)
        #[arg(long, value_name = "NAME")]
        set_category: Option<String>,
        /// New description, empty to clear it
        #[arg(long, value_name = "TEXT")]
        set_description: Option<String>,
        /// New start date and/or time
        #[arg(long, value_name = "TIME")]
        set_start: Option<String>,
        /// New end date and/or time
        #[arg(long, value_name = "TIME")]
        set_end: Option<String>,
        /// Apply without confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Show details about the runtime environment
    Details,
    /// Show license information
    License,
}

/// Everything a command handler needs: the store, the config and a fixed "now"
pub struct Controller {
    pub conn: Connection,
    pub config: Config,
    pub now: NaiveDateTime,
}

impl Controller {
    pub fn new(conn: Connection, config: Config, now: NaiveDateTime) -> Self {
        Self { conn, config, now }
    }

    fn day_start(&self) -> NaiveTime {
        self.config.backend.day_start
    }

    fn min_delta(&self) -> i64 {
        self.config.backend.fact_min_delta
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::new(APP_NAME)?;
    let config = Config::load(&dirs)?;
    logging::init(&config.client)?;
    log::debug!("Loaded config from {}", config.path.display());

    // These two never touch the store
    match cli.command {
        Commands::License => {
            println!("{}", LICENSE_TEXT);
            Ok(())
        }
        Commands::Details => {
            println!("{}", details(&config));
            Ok(())
        }
        command => {
            let conn = DbConnection::connect(&config.backend)?;
            let controller = Controller::new(conn, config, Local::now().naive_local());
            handle_command(&controller, command)
        }
    }
}

fn handle_command(ctl: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Search { search_term, time_range, filters, json } => {
            handle_search(ctl, Some(&search_term), time_range.as_deref(), &filters, json)
        }
        Commands::List { time_range, filters, json } => {
            handle_search(ctl, None, time_range.as_deref(), &filters, json)
        }
        Commands::Start { raw_fact, start, end } => handle_start(ctl, &raw_fact, start.as_deref(), end.as_deref()),
        Commands::Stop => handle_stop(ctl),
        Commands::Cancel => handle_cancel(ctl),
        Commands::Current => handle_current(ctl),
        Commands::Export { format, filters, output } => handle_export(ctl, &format, &filters, output),
        Commands::Categories => handle_categories(ctl),
        Commands::Activities { search_term } => handle_activities(ctl, search_term.as_deref()),
        Commands::Tag { tags, filters, yes } => handle_tag(ctl, &tags, &filters, yes),
        Commands::Remove { filters, yes } => handle_remove(ctl, &filters, yes),
        Commands::Edit { filters, set_activity, set_category, set_description, set_start, set_end, yes } => {
            let edit = FactEdit::from_args(
                set_activity.as_deref(),
                set_category.as_deref(),
                set_description.as_deref(),
                set_start.as_deref(),
                set_end.as_deref(),
            )?;
            handle_edit(ctl, &filters, &edit, yes)
        }
        // Answered in `run` before the store is opened
        Commands::License | Commands::Details => Ok(()),
    }
}

/// Resolve the time bounds given positionally and/or via --start/--end.
/// No time information at all means no bounds.
fn resolve_range(
    ctl: &Controller,
    time_range: Option<&str>,
    filters: &FilterArgs,
) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
    let mut frame = parse_time_range(time_range.unwrap_or(""))?;
    if let Some(start) = filters.start.as_deref() {
        frame.set_start(parse_partial(start)?);
    }
    if let Some(end) = filters.end.as_deref() {
        frame.set_end(parse_partial(end)?);
    }

    if frame.is_empty() {
        return Ok((None, None));
    }
    if !frame.has_start() {
        // Only an end: complete it relative to its own day
        let mut anchored = frame;
        anchored.start_date = frame.end_date.or(Some(ctl.now.date()));
        anchored.start_time = Some(NaiveTime::MIN);
        let (_, end) = complete_timeframe(&anchored, ctl.day_start(), ctl.now)?;
        return Ok((None, Some(end)));
    }

    let (start, end) = complete_timeframe(&frame, ctl.day_start(), ctl.now)?;
    Ok((Some(start), Some(end)))
}

/// Facts selected by `filters`. `--key` short-circuits everything else and
/// only finds complete facts.
pub fn find_facts(
    ctl: &Controller,
    search_term: Option<&str>,
    time_range: Option<&str>,
    filters: &FilterArgs,
) -> Result<Vec<Fact>> {
    if let Some(key) = filters.key {
        let fact = FactRepo::get(&ctl.conn, key)?.ok_or(StoreError::FactNotFound(key))?;
        return Ok(vec![fact]);
    }

    let search = filters.search_filters()?;
    let (start, end) = resolve_range(ctl, time_range, filters)?;
    let query = FactQuery {
        start,
        end,
        filter_term: search_term.map(str::to_string).filter(|t| !t.trim().is_empty()),
    };
    log::debug!("Fact query: {:?}", query);

    let facts = FactRepo::get_all(&ctl.conn, &query)?;
    Ok(search.apply(facts))
}

/// Drop repeated facts (an `or` filter may yield a fact twice)
fn unique_by_id(facts: Vec<Fact>) -> Vec<Fact> {
    let mut seen = HashSet::new();
    facts
        .into_iter()
        .filter(|fact| fact.id.map_or(true, |id| seen.insert(id)))
        .collect()
}

fn handle_search(
    ctl: &Controller,
    search_term: Option<&str>,
    time_range: Option<&str>,
    filters: &FilterArgs,
    json: bool,
) -> Result<()> {
    let facts = find_facts(ctl, search_term, time_range, filters)?;
    if json {
        println!("{}", format_facts_json(&facts)?);
    } else {
        println!("{}", format_facts_table(&facts, is_tty(), get_terminal_width()));
    }
    Ok(())
}

/// Build the fact described by the start arguments.
///
/// Explicit START/END override times from the shorthand. Without any end
/// information the fact is ongoing; without any start information it starts now.
pub fn build_start_fact(
    ctl: &Controller,
    raw_fact: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Fact> {
    let raw = parse_raw_fact(raw_fact, ctl.now)?;

    let mut frame = raw.timeframe;
    if let Some(start) = start.filter(|s| !s.trim().is_empty()) {
        frame.set_start(parse_partial(start)?);
    }
    if let Some(end) = end.filter(|e| !e.trim().is_empty()) {
        frame.set_end(parse_partial(end)?);
    }
    if !frame.has_start() {
        frame.set_start(PartialDateTime::from(ctl.now));
    }

    let mut fact = Fact::new(Activity::new(raw.activity, raw.category.map(Category::new)));
    fact.tags = raw.tags;
    fact.description = raw.description;

    if frame.has_end() {
        let (start, end) = complete_timeframe(&frame, ctl.day_start(), ctl.now)?;
        fact.start = Some(start);
        fact.end = Some(end);
    } else {
        fact.start = Some(complete_start(&frame, ctl.day_start(), ctl.now)?);
    }

    log::debug!("New fact instance created: {}", fact);
    Ok(fact)
}

fn handle_start(ctl: &Controller, raw_fact: &str, start: Option<&str>, end: Option<&str>) -> Result<()> {
    let fact = build_start_fact(ctl, raw_fact, start, end)?;
    let saved = FactRepo::save(&ctl.conn, &fact, ctl.min_delta())?;

    if saved.is_ongoing() {
        println!("Started tracking: {}", saved);
    } else {
        println!("Added fact #{}: {}", saved.id.unwrap_or_default(), saved);
    }
    Ok(())
}

fn handle_stop(ctl: &Controller) -> Result<()> {
    let fact = FactRepo::stop_tmp_fact(&ctl.conn, ctl.now, ctl.min_delta())?;
    let duration = fact.delta().map(format_duration).unwrap_or_default();
    println!("Stopped: {} ({})", fact, duration);
    Ok(())
}

fn handle_cancel(ctl: &Controller) -> Result<()> {
    let fact = FactRepo::cancel_tmp_fact(&ctl.conn)?;
    log::debug!("Tracking canceled: {}", fact);
    println!("Tracking canceled.");
    Ok(())
}

fn handle_current(ctl: &Controller) -> Result<()> {
    match FactRepo::get_tmp_fact(&ctl.conn)? {
        Some(fact) => println!("{}", format_current(&fact, ctl.now)),
        None => println!("Nothing is being tracked right now. Use 'hamster start' to begin."),
    }
    Ok(())
}

fn handle_export(ctl: &Controller, format: &str, filters: &FilterArgs, output: Option<PathBuf>) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let facts = find_facts(ctl, None, None, filters)?;

    let path = output.unwrap_or_else(|| ctl.config.client.export_path.with_extension(format.extension()));
    export_to_file(format, &facts, &path)?;

    println!("Facts have been exported to: {}", path.display());
    Ok(())
}

fn handle_categories(ctl: &Controller) -> Result<()> {
    for category in CategoryRepo::get_all(&ctl.conn)? {
        println!("{}", category.name);
    }
    Ok(())
}

fn handle_activities(ctl: &Controller, search_term: Option<&str>) -> Result<()> {
    let activities = ActivityRepo::get_all(&ctl.conn, search_term)?;
    println!(
        "{}",
        format_activities_table(&activities, &ctl.config.client.unsorted_localized, is_tty())
    );
    Ok(())
}

/// Show the facts about to change and ask the user to confirm
fn confirm(facts: &[Fact], action: &str) -> Result<bool> {
    println!("{}", format_facts_table(facts, is_tty(), get_terminal_width()));
    print!("{} {} fact(s)? (y/n): ", action, facts.len());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read confirmation")?;

    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        _ => {
            println!("Cancelled.");
            Ok(false)
        }
    }
}

/// Facts to mutate; fails when nothing matches
fn select_for_update(ctl: &Controller, filters: &FilterArgs) -> Result<Vec<Fact>> {
    let facts = unique_by_id(find_facts(ctl, None, None, filters)?);
    if facts.is_empty() {
        return Err(CliError::NoMatchingFacts.into());
    }
    Ok(facts)
}

fn handle_tag(ctl: &Controller, tags: &[String], filters: &FilterArgs, yes: bool) -> Result<()> {
    let tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .collect();
    if tags.is_empty() {
        return Err(CliError::NoTags.into());
    }
    for tag in &tags {
        validate_tag(tag)?;
    }

    let facts = select_for_update(ctl, filters)?;
    if !yes && !confirm(&facts, "Tag")? {
        return Ok(());
    }

    for mut fact in facts {
        fact.tags.extend(tags.iter().cloned());
        FactRepo::update(&ctl.conn, &fact, ctl.min_delta())?;
        println!("Tagged fact #{}: {}", fact.id.unwrap_or_default(), fact);
    }
    Ok(())
}

fn handle_remove(ctl: &Controller, filters: &FilterArgs, yes: bool) -> Result<()> {
    let facts = select_for_update(ctl, filters)?;
    if !yes && !confirm(&facts, "Remove")? {
        return Ok(());
    }

    for fact in facts {
        if let Some(id) = fact.id {
            FactRepo::remove(&ctl.conn, id)?;
            println!("Removed fact #{}: {}", id, fact);
        }
    }
    Ok(())
}

/// Changes requested by `hamster edit`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactEdit {
    pub activity: Option<Activity>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub start: Option<PartialDateTime>,
    pub end: Option<PartialDateTime>,
}

impl FactEdit {
    pub fn from_args(
        activity: Option<&str>,
        category: Option<&str>,
        description: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self> {
        let activity = match (activity, category) {
            (Some(activity), Some(category)) => {
                let activity = activity.trim();
                if activity.is_empty() {
                    return Err(StoreError::EmptyActivity.into());
                }
                let category = Some(category.trim()).filter(|c| !c.is_empty());
                Some(Activity::new(activity, category.map(Category::new)))
            }
            (None, None) => None,
            _ => return Err(CliError::AmbiguousEdit.into()),
        };

        let edit = FactEdit {
            activity,
            description: description.map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
            start: start.map(parse_partial).transpose()?,
            end: end.map(parse_partial).transpose()?,
        };
        if edit.is_empty() {
            return Err(CliError::NothingToEdit.into());
        }
        Ok(edit)
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_none() && self.description.is_none() && self.start.is_none() && self.end.is_none()
    }

    /// The edited copy of `fact`. Partial times keep the missing part from the old value.
    pub fn apply(&self, fact: &Fact) -> Fact {
        let mut edited = fact.clone();
        if let Some(activity) = &self.activity {
            edited.activity = activity.clone();
        }
        if let Some(description) = &self.description {
            edited.description = description.clone();
        }
        if let Some(start) = self.start {
            edited.start = merge_partial(start, fact.start);
        }
        if let Some(end) = self.end {
            edited.end = merge_partial(end, fact.end);
        }
        edited
    }
}

fn merge_partial(partial: PartialDateTime, existing: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    let date = partial.date.or_else(|| existing.map(|e| e.date()))?;
    let time = partial
        .time
        .or_else(|| existing.map(|e| e.time()))
        .unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

fn handle_edit(ctl: &Controller, filters: &FilterArgs, edit: &FactEdit, yes: bool) -> Result<()> {
    let facts = select_for_update(ctl, filters)?;
    if !yes && !confirm(&facts, "Edit")? {
        return Ok(());
    }

    for fact in facts {
        let edited = edit.apply(&fact);
        let saved = FactRepo::update(&ctl.conn, &edited, ctl.min_delta())?;
        println!("Updated fact #{}: {}", saved.id.unwrap_or_default(), saved);
    }
    Ok(())
}

/// Runtime environment summary printed by `hamster details`
pub fn details(config: &Config) -> String {
    let logfile = config
        .client
        .logfile_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(file logging disabled)".to_string());

    let db_info = match &config.backend.db {
        DbConfig::Sqlite { path } => format!(
            "Using '{}' with database stored under: {}",
            config.backend.store.as_str(),
            path.display()
        ),
        DbConfig::Remote { engine, host, port, name, user, .. } => format!(
            "Using '{}' connecting to database {} on {}{} as user {}.",
            engine,
            name,
            host,
            port.as_ref().map(|p| format!(":{}", p)).unwrap_or_default(),
            user
        ),
    };

    [
        format!("You are running {} version {}.", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        format!("Configuration found under: {}.", config.path.display()),
        format!("Logfile stored under: {}.", logfile),
        format!("Reports exported to: {}.", config.client.export_path.display()),
        db_info,
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(month: u32, day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, month, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn controller(now: NaiveDateTime) -> (TempDir, Controller) {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let config = Config::from_raw(RawConfig::default(), temp_dir.path().join("hamster_cli.toml"), &dirs).unwrap();
        let conn = DbConnection::connect_in_memory().unwrap();
        (temp_dir, Controller::new(conn, config, now))
    }

    fn add(ctl: &Controller, raw: &str, start: &str, end: &str) -> Fact {
        let fact = build_start_fact(ctl, raw, Some(start), Some(end)).unwrap();
        FactRepo::save(&ctl.conn, &fact, ctl.min_delta()).unwrap()
    }

    #[test]
    fn test_start_with_explicit_start_and_end() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let fact = build_start_fact(&ctl, "foo@bar", Some("2015-12-12 13:00"), Some("2015-12-12 16:30")).unwrap();

        assert_eq!(fact.activity.name, "foo");
        assert_eq!(fact.category_name(), Some("bar"));
        assert_eq!(fact.start, Some(at(12, 12, 13, 0)));
        assert_eq!(fact.end, Some(at(12, 12, 16, 30)));
    }

    #[test]
    fn test_start_without_end_is_ongoing() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let fact = build_start_fact(&ctl, "foo@bar", Some("2015-12-12 13:00"), None).unwrap();
        assert_eq!(fact.start, Some(at(12, 12, 13, 0)));
        assert!(fact.is_ongoing());
    }

    #[test]
    fn test_explicit_start_overrides_shorthand() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));

        let fact = build_start_fact(&ctl, "10:00-18:00 foo@bar", Some("2015-12-12 13:00"), Some("")).unwrap();
        assert_eq!(fact.start, Some(at(12, 12, 13, 0)));
        assert_eq!(fact.end, Some(at(12, 25, 18, 0)));

        let fact = build_start_fact(&ctl, "11:00 foo@bar", Some("2015-12-12 13:00"), Some("")).unwrap();
        assert_eq!(fact.start, Some(at(12, 12, 13, 0)));
        assert!(fact.is_ongoing());
    }

    #[test]
    fn test_start_defaults_to_now() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let fact = build_start_fact(&ctl, "foo #bar, notes", None, None).unwrap();
        assert_eq!(fact.start, Some(at(12, 25, 18, 0)));
        assert!(fact.is_ongoing());
        assert!(fact.tags.contains("bar"));
        assert_eq!(fact.description.as_deref(), Some("notes"));
    }

    #[test]
    fn test_start_relative_shorthand() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let fact = build_start_fact(&ctl, "-30 foo", None, None).unwrap();
        assert_eq!(fact.start, Some(at(12, 25, 17, 30)));
    }

    #[test]
    fn test_start_while_ongoing_fails() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        handle_start(&ctl, "first", Some("2015-12-25 17:00"), None).unwrap();

        let err = handle_start(&ctl, "second", None, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::OngoingFactExists(_))));

        let ongoing = FactRepo::get_tmp_fact(&ctl.conn).unwrap().unwrap();
        assert_eq!(ongoing.activity.name, "first");
    }

    #[test]
    fn test_stop_without_ongoing_fact() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let err = handle_stop(&ctl).unwrap_err();
        assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::NoOngoingFact));
        assert!(FactRepo::get_all(&ctl.conn, &FactQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_find_facts_time_range_and_filters() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        add(&ctl, "coding@work", "2015-12-12 09:00", "2015-12-12 10:00");
        add(&ctl, "code review@work #team", "2015-12-12 11:00", "2015-12-12 12:00");
        add(&ctl, "coding@hobby", "2015-12-13 20:00", "2015-12-13 21:00");

        let all = find_facts(&ctl, None, None, &FilterArgs::default()).unwrap();
        assert_eq!(all.len(), 3);

        let day = find_facts(&ctl, None, Some("2015-12-12"), &FilterArgs::default()).unwrap();
        assert_eq!(day.len(), 2);

        let searched = find_facts(&ctl, Some("coding"), None, &FilterArgs::default()).unwrap();
        assert_eq!(searched.len(), 2);

        let filters = FilterArgs {
            category: Some("work".to_string()),
            tag: Some("team".to_string()),
            ..FilterArgs::default()
        };
        let filtered = find_facts(&ctl, None, None, &filters).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].activity.name, "code review");

        let filters = FilterArgs {
            start: Some("2015-12-13".to_string()),
            ..FilterArgs::default()
        };
        assert_eq!(find_facts(&ctl, None, None, &filters).unwrap().len(), 1);

        let filters = FilterArgs {
            end: Some("2015-12-12".to_string()),
            ..FilterArgs::default()
        };
        assert_eq!(find_facts(&ctl, None, None, &filters).unwrap().len(), 2);
    }

    #[test]
    fn test_find_facts_key_bypasses_filters() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let saved = add(&ctl, "coding@work", "2015-12-12 09:00", "2015-12-12 10:00");
        let id = saved.id.unwrap();

        let filters = FilterArgs {
            key: Some(id),
            activity: Some("no such activity".to_string()),
            ..FilterArgs::default()
        };
        let found = find_facts(&ctl, None, None, &filters).unwrap();
        assert_eq!(found.len(), 1);

        let filters = FilterArgs {
            key: Some(id + 100),
            ..FilterArgs::default()
        };
        let err = find_facts(&ctl, None, None, &filters).unwrap_err();
        assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::FactNotFound(id + 100)));
    }

    #[test]
    fn test_or_filter_duplicates_are_collapsed_for_updates() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        add(&ctl, "coding@work", "2015-12-12 09:00", "2015-12-12 10:00");

        let filters = FilterArgs {
            activity: Some("coding or cod".to_string()),
            ..FilterArgs::default()
        };
        assert_eq!(find_facts(&ctl, None, None, &filters).unwrap().len(), 2);
        assert_eq!(select_for_update(&ctl, &filters).unwrap().len(), 1);
    }

    #[test]
    fn test_select_for_update_without_matches() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let err = select_for_update(&ctl, &FilterArgs::default()).unwrap_err();
        assert_eq!(err.downcast_ref::<CliError>(), Some(&CliError::NoMatchingFacts));
    }

    #[test]
    fn test_tag_and_remove_with_yes() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let saved = add(&ctl, "coding@work", "2015-12-12 09:00", "2015-12-12 10:00");
        let id = saved.id.unwrap();
        let filters = FilterArgs {
            key: Some(id),
            ..FilterArgs::default()
        };

        handle_tag(&ctl, &["#urgent".to_string()], &filters, true).unwrap();
        let tagged = FactRepo::get(&ctl.conn, id).unwrap().unwrap();
        assert!(tagged.tags.contains("urgent"));

        handle_remove(&ctl, &filters, true).unwrap();
        assert!(FactRepo::get(&ctl.conn, id).unwrap().is_none());
    }

    #[test]
    fn test_edit_requires_activity_and_category_together() {
        let err = FactEdit::from_args(Some("foo"), None, None, None, None).unwrap_err();
        assert_eq!(err.downcast_ref::<CliError>(), Some(&CliError::AmbiguousEdit));

        let err = FactEdit::from_args(None, Some("bar"), None, None, None).unwrap_err();
        assert_eq!(err.downcast_ref::<CliError>(), Some(&CliError::AmbiguousEdit));

        let err = FactEdit::from_args(None, None, None, None, None).unwrap_err();
        assert_eq!(err.downcast_ref::<CliError>(), Some(&CliError::NothingToEdit));
    }

    #[test]
    fn test_edit_apply() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let saved = add(&ctl, "coding@work, old", "2015-12-12 09:00", "2015-12-12 10:00");

        let edit = FactEdit::from_args(Some("review"), Some(""), Some(""), Some("08:30"), Some("2015-12-13")).unwrap();
        let edited = edit.apply(&saved);

        assert_eq!(edited.serialized_name(), "review");
        assert!(edited.description.is_none());
        assert_eq!(edited.start, Some(at(12, 12, 8, 30)));
        assert_eq!(edited.end, Some(at(12, 13, 10, 0)));

        let filters = FilterArgs {
            key: saved.id,
            ..FilterArgs::default()
        };
        handle_edit(&ctl, &filters, &edit, true).unwrap();
        let stored = FactRepo::get(&ctl.conn, saved.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.serialized_name(), "review");
    }

    #[test]
    fn test_details_mentions_paths() {
        let (_dir, ctl) = controller(at(12, 25, 18, 0));
        let text = details(&ctl.config);
        assert!(text.contains("You are running"));
        assert!(text.contains("Configuration found under:"));
        assert!(text.contains("Logfile stored under:"));
        assert!(text.contains("Reports exported to:"));
        assert!(text.contains("Using 'sqlite' with database stored under:"));
    }
}
