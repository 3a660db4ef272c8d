use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use engine::gameweek::GameweekData;
use engine::h2h::{self, H2hLeague};
use engine::reconcile::GapReconciler;
use engine::source::{StatsSource, current_gameweek};
use engine::tournament::TournamentController;
use engine::{LeagueContext, LeagueStore, LeaguesConfig, LiveScoringCalculator, ScoringRules};
use provider::{FplClient, FplSource, ProviderConfig};
use serde::Serialize;
use storage::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fpl-league")]
#[command(about = "Live fantasy league standings, tournaments and H2H reconciliation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "FPL_LEAGUES", default_value = "./leagues.json")]
    leagues: PathBuf,

    /// Keep league state in memory instead of Postgres.
    #[arg(long)]
    in_memory: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Tournament standings for the current gameweek.
    Tournament {
        league: String,
        #[arg(long)]
        gameweek: Option<i32>,
    },
    /// Live H2H table, reconciling stored history first.
    H2h { league: String },
    /// Rebuild missing H2H gameweeks without computing the live table.
    Reconcile { league: String },
    /// A participant's stored H2H rows over a gameweek range.
    History {
        league: String,
        participant: i64,
        #[arg(long, default_value_t = 1)]
        from: i32,
        #[arg(long, default_value_t = 38)]
        to: i32,
    },
    /// Stored H2H standings and match results for one gameweek.
    Results { league: String, gameweek: i32 },
    /// Live score breakdown for a single entry.
    Score {
        entry: i64,
        #[arg(long)]
        gameweek: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "fpl_league={0},engine={0},provider={0},storage={0}",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Commands::Migrate = cli.command {
        let db = connect(cli.database_url.as_deref()).await?;
        db.run_migrations().await.context("failed to run migrations")?;
        tracing::info!("Migrations applied");
        return Ok(());
    }

    let provider_config = ProviderConfig::from_env()?;
    let source = FplSource::new(FplClient::new(&provider_config)?);

    if let Commands::Score { entry, gameweek } = cli.command {
        return handle_score(&source, entry, gameweek).await;
    }

    let leagues = LeaguesConfig::load(&cli.leagues)
        .with_context(|| format!("failed to load leagues from {}", cli.leagues.display()))?;
    let concurrency = leagues.fetch.concurrency.min(provider_config.max_concurrency);

    let store: Box<dyn LeagueStore> = if cli.in_memory {
        tracing::info!("Using in-memory league store");
        Box::new(engine::store::MemoryStore::new())
    } else {
        Box::new(connect(cli.database_url.as_deref()).await?)
    };
    let context = LeagueContext::new(&leagues);

    match cli.command {
        Commands::Tournament { league, gameweek } => {
            let config = leagues
                .tournament(&league)
                .with_context(|| format!("unknown tournament league '{league}'"))?;
            let controller = TournamentController::new(config, &source, store.as_ref(), concurrency);
            let standings = match gameweek {
                Some(gw) => controller.standings_for(gw).await?,
                None => {
                    let handle = context
                        .tournament(&league)
                        .with_context(|| format!("no handle for '{league}'"))?;
                    controller.standings(&handle).await?
                }
            };
            print_json(&standings)?;
        }
        Commands::H2h { league } => {
            let config = leagues
                .h2h_league(&league)
                .with_context(|| format!("unknown H2H league '{league}'"))?;
            let handle = context
                .h2h(&league)
                .with_context(|| format!("no handle for '{league}'"))?;
            let table = H2hLeague::new(config, &source, store.as_ref(), concurrency)
                .table(&handle)
                .await?;
            print_json(&table)?;
        }
        Commands::Reconcile { league } => {
            let config = leagues
                .h2h_league(&league)
                .with_context(|| format!("unknown H2H league '{league}'"))?;
            let handle = context
                .h2h(&league)
                .with_context(|| format!("no handle for '{league}'"))?;

            let events = source.events().await?;
            let Some(current) = current_gameweek(&events) else {
                bail!("provider reports no gameweeks");
            };
            let teams = h2h::resolve_teams(config, &source).await?;
            let outcome = GapReconciler::new(config, &teams, &source, store.as_ref(), concurrency)
                .run(&*handle, current, &events)
                .await?;
            tracing::info!(league = %league, current, outcome = ?outcome, "Reconciliation finished");
            print_json(&outcome)?;
        }
        Commands::History {
            league,
            participant,
            from,
            to,
        } => {
            if leagues.h2h_league(&league).is_none() {
                bail!("unknown H2H league '{league}'");
            }
            let rows = store
                .participant_history(&league, participant, from, to)
                .await?;
            print_json(&rows)?;
        }
        Commands::Results { league, gameweek } => {
            if leagues.h2h_league(&league).is_none() {
                bail!("unknown H2H league '{league}'");
            }
            let (standings, matches) = tokio::try_join!(
                store.standings(&league, gameweek),
                store.matches(&league, gameweek),
            )?;
            if standings.is_empty() {
                bail!("no stored results for '{league}' gameweek {gameweek}");
            }
            print_json(&serde_json::json!({
                "league_key": league,
                "gameweek": gameweek,
                "standings": standings,
                "matches": matches,
            }))?;
        }
        Commands::Migrate | Commands::Score { .. } => bail!("not a league command"),
    }

    Ok(())
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<Database> {
    let url = database_url.context("DATABASE_URL is required unless --in-memory is set")?;
    Database::new(url)
        .await
        .context("failed to connect to database")
}

async fn handle_score(source: &FplSource, entry: i64, gameweek: Option<i32>) -> anyhow::Result<()> {
    let gameweek = match gameweek {
        Some(gw) => gw,
        None => {
            let events = source.events().await?;
            current_gameweek(&events).context("provider reports no gameweeks")?
        }
    };

    let Some(roster) = source.roster(entry, gameweek).await? else {
        bail!("entry {entry} has no picks for gameweek {gameweek}");
    };
    let data = GameweekData::load(source, gameweek).await?;
    let score = LiveScoringCalculator::new(ScoringRules::default()).score(
        &roster,
        &data.snapshot,
        &data.bonus,
    );

    let name = |player: i64| {
        data.snapshot
            .web_name(player)
            .map(str::to_string)
            .unwrap_or_else(|| player.to_string())
    };

    println!("Entry {entry}, gameweek {gameweek}");
    println!(
        "  points: {} (gross {}, transfer cost {})",
        score.points, score.gross_points, score.transfer_cost
    );
    println!("  captaincy: {:?}", score.captaincy);
    if !score.chip.label().is_empty() {
        println!("  chip: {}", score.chip.label());
    }
    for sub in &score.substitutions {
        println!(
            "  sub: {} -> {} ({} pts)",
            name(sub.outgoing),
            name(sub.incoming),
            sub.points
        );
    }
    for player in &score.reserved {
        println!("  waiting on: {}", name(*player));
    }
    for pick in &roster.picks {
        let projected = data.bonus.get(pick.element);
        if projected > 0 && data.snapshot.stat(pick.element).bonus == 0 {
            println!("  projected bonus: {} +{}", name(pick.element), projected);
        }
    }
    for issue in &score.issues {
        println!("  roster issue: {issue:?}");
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
