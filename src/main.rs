use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use frc_scout::alliance::{
    self, get_lists_path, load_lists, save_lists, AllianceProjection, ListKind, Position,
    Preference, RecommendationRequest, SelectionSync, SlotKey, SyncError, SyncOutcome,
};
use frc_scout::backend::{clear_cache, get_cache_path, BackendClient, BackendError, ResponseCache};
use frc_scout::charts::{
    metric_series, positioning_stats, ChartMetric, ChartSession, Grouping,
};
use frc_scout::config::{load_config, run_init_wizard, Config};
use frc_scout::fetch::{fetch_match_datasets, fetch_snapshot, fetch_team_averages};
use frc_scout::output;
use frc_scout::record::{normalize_records, ColumnAliases, TeamRecord};
use frc_scout::scoring::{
    compute_score, compute_score_value, validate_scoring, ScoringRules, Specialization,
};
use frc_scout::search::search_teams;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum ListsAction {
    /// Show all three lists
    Show,
    /// Add a team to a list (do_not_pick, avoid, defense)
    Add { list: ListKind, team: u32 },
    /// Remove a team from a list
    Remove { list: ListKind, team: u32 },
    /// Move a team to a new rank on the defense list
    Move { team: u32, rank: u32 },
    /// Replace a list with the JSON array in a file
    Import { list: ListKind, file: PathBuf },
    /// Print a list as JSON
    Export { list: ListKind },
    /// Replace local lists with the server's
    Pull,
    /// Upload local lists to the server
    Push,
}

#[derive(Subcommand, Debug)]
enum AllianceAction {
    /// Show the alliance board
    Show,
    /// Put a team in a slot
    Set {
        alliance: u8,
        position: Position,
        team: u32,
        /// Overwrite changes saved elsewhere since the last sync
        #[arg(long)]
        force: bool,
    },
    /// Empty a slot
    Clear {
        alliance: u8,
        position: Position,
        #[arg(long)]
        force: bool,
    },
    /// Empty the whole board
    Reset {
        #[arg(long)]
        force: bool,
    },
    /// Follow the board, printing it whenever it changes (Ctrl-C to stop)
    Sync,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a config file interactively
    Init,
    /// Event rankings with average scores (default if no subcommand)
    Rankings {
        /// Only show the first N teams
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Averages, ranking and positioning for one team
    Team {
        team: u32,
        /// Include per-match positioning stats
        #[arg(short, long)]
        positioning: bool,
    },
    /// Score a JSON record (or array of match records) from a file
    Score { file: PathBuf },
    /// Recommend alliance partners
    Recommend {
        /// Our team (defaults to team_number from config)
        #[arg(short, long)]
        team: Option<u32>,
        /// balanced, offense or defense
        #[arg(short, long, default_value = "balanced")]
        preference: Preference,
        /// Only suggest this robot type: algae_net, algae_processor, coral or any
        #[arg(short, long, default_value = "any")]
        robot_type: Specialization,
    },
    /// Chart a metric for one or more teams
    Chart {
        #[arg(required = true)]
        teams: Vec<u32>,
        /// total, auto, teleop or defense
        #[arg(short, long, default_value = "total")]
        metric: ChartMetric,
        /// per-match or average
        #[arg(short, long, default_value = "per-match")]
        grouping: Grouping,
    },
    /// Manage do-not-pick, avoid and defense lists
    Lists {
        #[command(subcommand)]
        action: Option<ListsAction>,
    },
    /// Shared alliance selection board
    Alliance {
        #[command(subcommand)]
        action: Option<AllianceAction>,
    },
    /// Project a match between two alliances and suggest a strategy for each
    Strategy {
        /// Red alliance teams
        #[arg(long, required = true, num_args = 1..=3)]
        red: Vec<u32>,
        /// Blue alliance teams
        #[arg(long, required = true, num_args = 1..=3)]
        blue: Vec<u32>,
    },
    /// Find teams by number, or list leaders with a word like "best auto" or "defense"
    Search {
        #[arg(required = true)]
        term: Vec<String>,
    },
    /// Ask the scouting assistant a question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Delete cached server responses
    ClearCache,
}

#[derive(Parser, Debug)]
#[command(name = "frc-scout")]
#[command(about = "FRC scouting companion: team scores and alliance picks", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/frc-scout/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Always hit the server; do not read or write the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("frc_scout={}", log_level)));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Network failures exit with EXIT_NETWORK, everything else with EXIT_ERROR.
fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if cause.downcast_ref::<BackendError>().is_some() {
            return EXIT_NETWORK;
        }
        if let Some(SyncError::Backend(_)) = cause.downcast_ref::<SyncError>() {
            return EXIT_NETWORK;
        }
    }
    EXIT_ERROR
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("Failed to install rustls crypto provider");
        std::process::exit(EXIT_ERROR);
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let command = cli.command.unwrap_or(Commands::Rankings { limit: None });
    let config_path = cli.config.map(PathBuf::from);

    // Commands that need no config
    match command {
        Commands::Init => {
            if let Err(e) = run_init_wizard(config_path) {
                eprintln!("Init failed: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::ClearCache => {
            if let Err(e) = clear_cache() {
                eprintln!("Failed to clear cache: {:#}", e);
                std::process::exit(EXIT_ERROR);
            }
            println!("Cache cleared ({})", get_cache_path().display());
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = config.validate() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let cache = if cli.no_cache {
        ResponseCache::disabled()
    } else {
        ResponseCache::new(get_cache_path())
    };
    let client = match BackendClient::new(&config.backend.url, config.timeout(), cache) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {:#}", e);
            std::process::exit(EXIT_NETWORK);
        }
    };

    let start_time = Instant::now();
    let app = App {
        aliases: config.aliases(),
        config,
        client,
        use_colors: output::should_use_colors(),
        verbose: cli.verbose,
    };

    if let Err(e) = app.run(command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code_for(&e));
    }

    debug!("Done in {:?}", start_time.elapsed());
    std::process::exit(EXIT_SUCCESS);
}

struct App {
    config: Config,
    aliases: ColumnAliases,
    client: BackendClient,
    use_colors: bool,
    verbose: bool,
}

impl App {
    async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Rankings { limit } => self.rankings(limit).await,
            Commands::Team { team, positioning } => self.team(team, positioning).await,
            Commands::Score { file } => self.score(&file),
            Commands::Recommend {
                team,
                preference,
                robot_type,
            } => self.recommend(team, preference, robot_type).await,
            Commands::Chart {
                teams,
                metric,
                grouping,
            } => self.chart(&teams, metric, grouping).await,
            Commands::Lists { action } => self.lists(action.unwrap_or(ListsAction::Show)).await,
            Commands::Alliance { action } => {
                self.alliance(action.unwrap_or(AllianceAction::Show)).await
            }
            Commands::Strategy { red, blue } => self.strategy(&red, &blue).await,
            Commands::Search { term } => self.search(&term.join(" ")).await,
            Commands::Ask { question } => self.ask(&question.join(" ")).await,
            Commands::Init | Commands::ClearCache => Ok(()),
        }
    }

    /// Rules from config, else from the server's game config, else built-in.
    async fn rules(&self) -> ScoringRules {
        if let Some(rules) = &self.config.scoring {
            return rules.clone();
        }
        match self.client.get_scoring_rules().await {
            Ok(Some(rules)) => match validate_scoring(&rules) {
                Ok(()) => {
                    debug!("Using scoring rules from server ({} rules)", rules.len());
                    rules
                }
                Err(errors) => {
                    warn!("Server scoring rules invalid ({}), using defaults", errors.join("; "));
                    ScoringRules::default()
                }
            },
            Ok(None) => ScoringRules::default(),
            Err(e) => {
                warn!("Could not load scoring rules from server, using defaults: {}", e);
                ScoringRules::default()
            }
        }
    }

    async fn rankings(&self, limit: Option<usize>) -> Result<()> {
        let (points, match_counts, records, rules) = tokio::join!(
            self.client.get_team_rankings(),
            self.client.get_team_match_counts(),
            self.client.get_all_team_averages(&self.aliases),
            self.rules(),
        );
        let points = points.context("Failed to load team rankings")?;
        let records = records.context("Failed to load team averages")?;
        let match_counts = match_counts.unwrap_or_else(|e| {
            warn!("Match counts unavailable: {}", e);
            Default::default()
        });

        let table = alliance::RankingTable::build(&points, &match_counts);
        println!(
            "{}",
            output::format_rankings(&table, &records, &rules, limit, self.use_colors)
        );
        Ok(())
    }

    async fn team(&self, team: u32, positioning: bool) -> Result<()> {
        let (record, points, match_counts, rules) = tokio::join!(
            self.client.get_team_averages(team, &self.aliases),
            self.client.get_team_rankings(),
            self.client.get_team_match_counts(),
            self.rules(),
        );
        let record = record.with_context(|| format!("Failed to load data for Team {}", team))?;
        let points = points.context("Failed to load team rankings")?;
        let table = alliance::RankingTable::build(&points, &match_counts.unwrap_or_default());

        let stats = if positioning {
            let matches = self
                .client
                .get_match_data(team, &self.aliases)
                .await
                .with_context(|| format!("Failed to load match data for Team {}", team))?;
            if matches.is_empty() {
                println!("No match data found for Team {}.", team);
                None
            } else {
                Some(positioning_stats(&matches))
            }
        } else {
            None
        };

        println!(
            "{}",
            output::format_team_detail(team, &record, &table, &rules, stats.as_ref(), self.use_colors)
        );
        Ok(())
    }

    /// Offline: scores with the configured rules or the built-in table.
    fn score(&self, file: &Path) -> Result<()> {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let raw: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", file.display()))?;
        let rules = self.config.scoring.clone().unwrap_or_default();

        if raw.is_array() {
            let records = normalize_records(&raw, &self.aliases)
                .with_context(|| format!("Invalid match records in {}", file.display()))?;
            for record in &records {
                let label = match record.match_number {
                    Some(n) => format!("Match {}", n),
                    None => "Match ?".to_string(),
                };
                println!("{}", label);
                let breakdown = compute_score(record, &rules);
                println!("{}", output::format_breakdown(&breakdown, self.verbose, self.use_colors));
            }
        } else {
            let breakdown = compute_score_value(&raw, &rules, &self.aliases);
            println!("{}", output::format_breakdown(&breakdown, self.verbose, self.use_colors));
        }
        Ok(())
    }

    async fn recommend(
        &self,
        team: Option<u32>,
        preference: Preference,
        robot_type: Specialization,
    ) -> Result<()> {
        let my_team = team
            .or(self.config.team_number)
            .context("No team given: pass --team or set team_number in the config")?;

        let lists = load_lists(&get_lists_path())?.lists;
        let snapshot = fetch_snapshot(&self.client, &self.aliases, preference).await?;
        let request = RecommendationRequest {
            my_team,
            preference,
            robot_type,
        };

        let set = alliance::rank(&request, &snapshot, &lists)?;
        println!(
            "{}",
            output::format_recommendations(&set, my_team, self.use_colors)
        );
        Ok(())
    }

    async fn chart(&self, teams: &[u32], metric: ChartMetric, grouping: Grouping) -> Result<()> {
        let (fan_in, rules) = tokio::join!(
            fetch_match_datasets(
                &self.client,
                teams,
                &self.aliases,
                self.config.max_concurrent_fetches
            ),
            self.rules(),
        );

        for failure in &fan_in.failures {
            eprintln!("Could not load Team {}: {}", failure.team, failure.error);
        }
        if fan_in.datasets.is_empty() {
            anyhow::bail!("No match data could be loaded for the requested teams");
        }

        let series = fan_in
            .datasets
            .iter()
            .map(|d| {
                (
                    format!("Team {}", d.team),
                    metric_series(&d.matches, metric, grouping, &rules),
                )
            })
            .collect();

        let mut session = ChartSession::default();
        let chart = session.create(metric, grouping, series)?;
        println!("{}", output::format_chart(chart, self.use_colors));
        Ok(())
    }

    async fn strategy(&self, red: &[u32], blue: &[u32]) -> Result<()> {
        if let Some(team) = red.iter().find(|t| blue.contains(*t)) {
            anyhow::bail!("Team {} cannot play on both alliances", team);
        }

        let teams: Vec<u32> = red.iter().chain(blue).copied().collect();
        let (fan_in, rules) = tokio::join!(
            fetch_team_averages(
                &self.client,
                &teams,
                &self.aliases,
                self.config.max_concurrent_fetches
            ),
            self.rules(),
        );
        for failure in &fan_in.failures {
            eprintln!("Could not load Team {}: {}", failure.team, failure.error);
        }

        let records: BTreeMap<u32, TeamRecord> = fan_in
            .datasets
            .into_iter()
            .filter_map(|d| d.matches.into_iter().next().map(|record| (d.team, record)))
            .collect();
        if records.is_empty() {
            anyhow::bail!("No team data could be loaded for either alliance");
        }

        let report = alliance::analyze(
            AllianceProjection::build(red, &records, &rules),
            AllianceProjection::build(blue, &records, &rules),
        );
        println!("{}", output::format_strategy(&report, self.use_colors));
        Ok(())
    }

    async fn search(&self, term: &str) -> Result<()> {
        let (records, rules) = tokio::join!(
            self.client.get_all_team_averages(&self.aliases),
            self.rules(),
        );
        let records = records.context("Failed to load team averages")?;
        let hits = search_teams(term, &records, &rules);
        println!("{}", output::format_search(&hits, term, self.use_colors));
        Ok(())
    }

    async fn lists(&self, action: ListsAction) -> Result<()> {
        let path = get_lists_path();
        let mut state = load_lists(&path)?;

        match action {
            ListsAction::Show => {
                println!("{}", output::format_lists(&state.lists, self.use_colors));
                if let Some(updated) = state.updated_at {
                    println!(
                        "\nUpdated {}",
                        updated.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                    );
                }
                return Ok(());
            }
            ListsAction::Export { list } => {
                println!("{}", serde_json::to_string_pretty(&state.lists.export(list))?);
                return Ok(());
            }
            ListsAction::Push => {
                for kind in ListKind::ALL {
                    self.client.save_list(kind, &state.lists).await?;
                }
                println!("Uploaded all lists to {}", self.client.base_url());
                return Ok(());
            }
            ListsAction::Add { list, team } => {
                state.lists.add(list, team)?;
                println!("Added Team {} to {}", team, list.label());
            }
            ListsAction::Remove { list, team } => {
                state.lists.remove(list, team)?;
                println!("Removed Team {} from {}", team, list.label());
            }
            ListsAction::Move { team, rank } => {
                state.lists.move_defense(team, rank)?;
                println!("Moved Team {} to defense rank {}", team, rank);
            }
            ListsAction::Import { list, file } => {
                let content = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let raw: Value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON in {}", file.display()))?;
                let count = state.lists.import(list, &raw)?;
                println!("Imported {} teams into {}", count, list.label());
            }
            ListsAction::Pull => {
                state.lists = self.client.load_pick_lists().await?;
                println!("Pulled lists from {}", self.client.base_url());
            }
        }

        save_lists(&path, &mut state)
    }

    async fn alliance(&self, action: AllianceAction) -> Result<()> {
        let mut sync = SelectionSync::new(self.client.clone());
        sync.poll().await?;

        let force = match action {
            AllianceAction::Show => {
                println!("{}", output::format_alliances(&sync.state().selections, self.use_colors));
                return Ok(());
            }
            AllianceAction::Sync => {
                let interval = self.config.sync_interval()?;
                println!("{}", output::format_alliances(&sync.state().selections, self.use_colors));
                let use_colors = self.use_colors;
                let shutdown = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                };
                sync.run(interval, shutdown, |state, outcome| match outcome {
                    SyncOutcome::Unchanged => {}
                    SyncOutcome::Updated | SyncOutcome::Reset => {
                        println!();
                        println!("{}", output::format_alliances(&state.selections, use_colors));
                    }
                })
                .await;
                return Ok(());
            }
            AllianceAction::Set {
                alliance,
                position,
                team,
                force,
            } => {
                let slot = SlotKey::new(alliance, position)?;
                if let Some(previous) = sync.state_mut().assign(slot, team)? {
                    println!("Replaced Team {} in {}", previous, slot);
                }
                force
            }
            AllianceAction::Clear {
                alliance,
                position,
                force,
            } => {
                let slot = SlotKey::new(alliance, position)?;
                let team = sync.state_mut().clear(slot)?;
                println!("Cleared Team {} from {}", team, slot);
                force
            }
            AllianceAction::Reset { force } => {
                sync.state_mut().reset();
                force
            }
        };

        sync.save(force).await?;
        println!("{}", output::format_alliances(&sync.state().selections, self.use_colors));
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<()> {
        let (snapshot, rules) = tokio::join!(
            fetch_snapshot(&self.client, &self.aliases, Preference::Defense),
            self.rules(),
        );
        let answer = frc_scout::assistant::ask(question, &snapshot?, &rules);
        debug!("Assistant intent: {}", answer.intent.name());
        println!("{}", output::format_answer(&answer, self.use_colors));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_preferences() {
        for preference in ["balanced", "offense", "defense"] {
            let cli = Cli::try_parse_from(["frc-scout", "recommend", "--preference", preference]);
            assert!(cli.is_ok(), "{} should parse", preference);
        }
        assert!(Cli::try_parse_from(["frc-scout", "recommend", "--preference", "specialist"]).is_err());
    }

    #[test]
    fn test_strategy_alliances() {
        let cli = Cli::try_parse_from([
            "frc-scout", "strategy", "--red", "254", "971", "--blue", "1678", "118", "2056",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Strategy { red, blue }) => {
                assert_eq!(red, vec![254, 971]);
                assert_eq!(blue, vec![1678, 118, 2056]);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["frc-scout", "strategy", "--red", "254"]).is_err());
        assert!(Cli::try_parse_from([
            "frc-scout", "strategy", "--red", "1", "2", "3", "4", "--blue", "5",
        ])
        .is_err());
    }

    #[test]
    fn test_exit_code_for_backend_error() {
        let err = anyhow::Error::new(BackendError::Status {
            endpoint: "/get_team_rankings".to_string(),
            status: http::StatusCode::BAD_GATEWAY,
        })
        .context("Failed to load team rankings");
        assert_eq!(exit_code_for(&err), EXIT_NETWORK);
        assert_eq!(exit_code_for(&anyhow::anyhow!("bad input")), EXIT_ERROR);
    }
}
