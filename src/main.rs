use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use auto_ease::logging::{init_tracing, LogOptions};
use auto_ease::{
    adjust_cards, adjust_deck, card_stats, export_deck, import_deck, BatchOptions, CardId, DeckId,
    EaseFactor, EaseResult, EaseSnapshot, EngineConfig, MemoryStore, ProgressSink, ReviewOutcome,
    DEFAULT_LEASH, DEFAULT_MAX_EASE, DEFAULT_MIN_EASE, DEFAULT_PROGRESS_EVERY,
    DEFAULT_TARGET_RATIO, DEFAULT_WEIGHT,
};

/// Feedback-controlled ease factors for spaced-repetition decks
#[derive(Parser, Debug)]
#[command(name = "auto-ease", version)]
struct Cli {
    /// Log filter (error, warn, info, debug, trace or EnvFilter directives)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Also write daily log files to this directory
    #[arg(long, global = true, env = "AUTO_EASE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Success rate to converge on, in (0, 1)
    #[arg(long, global = true, env = "AUTO_EASE_TARGET_RATIO", default_value_t = DEFAULT_TARGET_RATIO)]
    target_ratio: f64,

    /// Moving average weight, in (0, 1]
    #[arg(long, global = true, env = "AUTO_EASE_WEIGHT", default_value_t = DEFAULT_WEIGHT)]
    weight: f64,

    /// Base size of a single ease adjustment
    #[arg(long, global = true, env = "AUTO_EASE_LEASH", default_value_t = DEFAULT_LEASH)]
    leash: f64,

    #[arg(long, global = true, env = "AUTO_EASE_MIN_EASE", default_value_t = DEFAULT_MIN_EASE)]
    min_ease: EaseFactor,

    #[arg(long, global = true, env = "AUTO_EASE_MAX_EASE", default_value_t = DEFAULT_MAX_EASE)]
    max_ease: EaseFactor,

    /// Ignore learning and relearning answers
    #[arg(
        long,
        global = true,
        env = "AUTO_EASE_REVIEWS_ONLY",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    reviews_only: bool,
}

impl EngineArgs {
    fn config(&self) -> EngineConfig {
        EngineConfig {
            target_ratio: self.target_ratio,
            weight: self.weight,
            leash: self.leash,
            min_ease: self.min_ease,
            max_ease: self.max_ease,
            reviews_only: self.reviews_only,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay review histories and rewrite ease factors in the collection
    Recompute {
        /// Collection file (JSON)
        collection: PathBuf,
        /// Only this deck (default: every deck)
        deck: Option<DeckId>,
        /// Cards between two progress reports
        #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
        progress_every: usize,
    },

    /// Show how the controller sees one card
    Stats {
        collection: PathBuf,
        card: CardId,
        /// Preview the ease after this answer (again, hard, good, easy or 1-4)
        #[arg(long, value_parser = parse_answer)]
        answer: Option<ReviewOutcome>,
    },

    /// Write a deck's ease factors to a snapshot file
    Export {
        collection: PathBuf,
        deck: DeckId,
        snapshot: PathBuf,
    },

    /// Restore a deck's ease factors from a snapshot file
    Import {
        collection: PathBuf,
        deck: DeckId,
        snapshot: PathBuf,
    },
}

fn parse_answer(raw: &str) -> Result<ReviewOutcome, String> {
    let outcome = match raw.to_ascii_lowercase().as_str() {
        "again" => Some(ReviewOutcome::Again),
        "hard" => Some(ReviewOutcome::Hard),
        "good" => Some(ReviewOutcome::Good),
        "easy" => Some(ReviewOutcome::Easy),
        other => other.parse::<u8>().ok().and_then(ReviewOutcome::from_ease),
    };
    outcome.ok_or_else(|| format!("'{raw}' is not an answer (again, hard, good, easy or 1-4)"))
}

struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, processed: usize, label: &str) {
        tracing::info!(processed, "{label}");
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_options = LogOptions {
        level: cli.log_level.clone(),
        dir: cli.log_dir.clone(),
    };
    let _log_guard = match init_tracing(&log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("auto-ease: cannot set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "auto-ease failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> EaseResult<()> {
    let config = cli.engine.config();
    config.validate()?;

    match cli.command {
        Command::Recompute {
            collection,
            deck,
            progress_every,
        } => {
            let store = MemoryStore::load(&collection)?;
            let options = BatchOptions { progress_every };
            let report = match deck {
                Some(deck_id) => adjust_deck(&store, &config, deck_id, &options, &LogProgress)?,
                None => {
                    let cards: Vec<CardId> = store
                        .collection()
                        .decks
                        .iter()
                        .flat_map(|d| d.cards.iter().map(|c| c.id))
                        .collect();
                    adjust_cards(&store, &config, &cards, &options, &LogProgress)?
                }
            };
            store.collection().save(&collection)?;
            println!("{report}");
        }
        Command::Stats {
            collection,
            card,
            answer,
        } => {
            let store = MemoryStore::load(&collection)?;
            println!("{}", card_stats(&store, &config, card, answer)?);
        }
        Command::Export {
            collection,
            deck,
            snapshot,
        } => {
            let store = MemoryStore::load(&collection)?;
            let exported = export_deck(&store, deck)?;
            exported.save(&snapshot)?;
            println!(
                "Exported {} ease factors to {}",
                exported.factors.len(),
                snapshot.display()
            );
        }
        Command::Import {
            collection,
            deck,
            snapshot,
        } => {
            let store = MemoryStore::load(&collection)?;
            let report = import_deck(&store, deck, &EaseSnapshot::load(&snapshot)?)?;
            store.collection().save(&collection)?;
            println!(
                "Imported ease factors: {} updated, {} unchanged",
                report.updated, report.unchanged
            );
        }
    }
    Ok(())
}
