//! Duel engine - command line driver
//!
//! `replay` runs a scripted match from card data, two deck files and a JSON
//! list of intents; `parse-text` shows how ability text is understood.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use duel_engine::{
    core::PlayerId,
    game::{
        effect_parser, snapshot, targeting, Intent, LogCategory, MatchConfig, TargetContext, VerbosityLevel,
    },
    loader::{CardDatabase, DeckLoader, MatchInitializer},
};
use std::fs;
use std::path::PathBuf;

/// Verbosity level for match output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "duel")]
#[command(about = "Duel - two-player card game rules engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted match and print its event log
    Replay {
        /// Card database (JSON array of card records)
        #[arg(long, value_name = "CARDS_JSON")]
        cards: PathBuf,

        /// Deck file for seat 0 (goes first)
        #[arg(value_name = "PLAYER1_DECK")]
        deck1: PathBuf,

        /// Deck file for seat 1
        #[arg(value_name = "PLAYER2_DECK")]
        deck2: PathBuf,

        /// Intent script (JSON array of intents)
        #[arg(long, value_name = "INTENTS_JSON")]
        intents: PathBuf,

        /// Match configuration (JSON); defaults apply when omitted
        #[arg(long, value_name = "CONFIG_JSON")]
        config: Option<PathBuf>,

        /// Override the configured RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Resolve pending decisions with their defaults
        #[arg(long)]
        auto_decisions: bool,

        #[arg(long, default_value = "Player 1")]
        p1_name: String,

        #[arg(long, default_value = "Player 2")]
        p2_name: String,

        /// Verbosity level (silent/0, minimal/1, normal/2, verbose/3)
        #[arg(long, short = 'v', default_value = "normal")]
        verbosity: VerbosityArg,

        /// Stop at the first rejected intent instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Write the final snapshot to this file
        #[arg(long, value_name = "FILE")]
        snapshot_output: Option<PathBuf>,

        /// Redact the written snapshot for this seat (0 or 1)
        #[arg(long, value_name = "SEAT")]
        viewer: Option<u32>,
    },

    /// Show parsed clauses and inferred targets for ability text
    ParseText {
        /// Effect text, e.g. "Deal 3 to an enemy unit here. Draw 1."
        text: String,

        /// Optional trigger text, e.g. "When you play me"
        #[arg(long)]
        trigger: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            cards,
            deck1,
            deck2,
            intents,
            config,
            seed,
            auto_decisions,
            p1_name,
            p2_name,
            verbosity,
            strict,
            snapshot_output,
            viewer,
        } => run_replay(ReplayArgs {
            cards,
            deck1,
            deck2,
            intents,
            config,
            seed,
            auto_decisions,
            p1_name,
            p2_name,
            verbosity: verbosity.0,
            strict,
            snapshot_output,
            viewer,
        }),
        Commands::ParseText { text, trigger } => run_parse_text(&text, trigger.as_deref()),
    }
}

struct ReplayArgs {
    cards: PathBuf,
    deck1: PathBuf,
    deck2: PathBuf,
    intents: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    auto_decisions: bool,
    p1_name: String,
    p2_name: String,
    verbosity: VerbosityLevel,
    strict: bool,
    snapshot_output: Option<PathBuf>,
    viewer: Option<u32>,
}

fn run_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MatchConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.auto_decisions {
        config.auto_decisions = true;
    }

    let card_db = CardDatabase::load_from_file(&args.cards)
        .with_context(|| format!("loading cards {}", args.cards.display()))?;
    println!("Loaded {} cards", card_db.len());

    let deck1 = DeckLoader::load_from_file(&args.deck1)
        .with_context(|| format!("loading deck {}", args.deck1.display()))?;
    let deck2 = DeckLoader::load_from_file(&args.deck2)
        .with_context(|| format!("loading deck {}", args.deck2.display()))?;

    let script = fs::read_to_string(&args.intents)
        .with_context(|| format!("reading intents {}", args.intents.display()))?;
    let intents: Vec<Intent> = serde_json::from_str(&script).context("parsing intent script")?;

    let mut m = MatchInitializer::new(&card_db).init_match(
        args.p1_name.as_str(),
        &deck1,
        args.p2_name.as_str(),
        &deck2,
        config,
    )?;
    m.logger.set_verbosity(args.verbosity);

    let mut rejected = 0;
    for (step, intent) in intents.into_iter().enumerate() {
        let name = intent.name();
        if let Err(err) = m.apply(intent) {
            if !err.is_rejection() {
                return Err(err).with_context(|| format!("intent #{} ({})", step, name));
            }
            rejected += 1;
            if args.strict {
                bail!("intent #{} ({}) rejected: {}", step, name, err);
            }
        }
        if m.is_over() {
            break;
        }
    }

    if let Some(path) = &args.snapshot_output {
        let snap = match args.viewer {
            Some(seat) if seat < 2 => snapshot::redacted_for(&m, PlayerId::new(seat)),
            Some(seat) => bail!("no seat {}", seat),
            None => snapshot::capture(&m),
        };
        fs::write(path, snap.to_json()?).with_context(|| format!("writing {}", path.display()))?;
    }

    let unsupported = m.logger.count(LogCategory::Unsupported);
    m.logger.flush_buffer();

    println!("\n=== Replay finished ===");
    println!("  Turn {} ({:?})", m.turn_number(), m.phase());
    for player in m.players.iter() {
        println!("  {}: {} point(s)", player.name, player.score);
    }
    if let Some(winner) = m.winner {
        println!("  Winner: {}", m.player_name(winner));
    }
    println!("  Rejected intents: {}", rejected);
    println!("  Unsupported clauses: {}", unsupported);
    if let Some(path) = &args.snapshot_output {
        println!("  Snapshot written to {}", path.display());
    }
    Ok(())
}

fn run_parse_text(text: &str, trigger: Option<&str>) -> anyhow::Result<()> {
    println!("Normalized: {}", effect_parser::normalize(text));
    println!("Clauses:");
    for (i, clause) in effect_parser::parse_effect(text).iter().enumerate() {
        println!("  {}. {:?}", i + 1, clause.primitive);
        println!("     from \"{}\"", clause.text);
    }

    let ctx = TargetContext {
        controller: PlayerId::new(0),
        origin: None,
        source: None,
    };
    match targeting::infer(text, &ctx) {
        targeting::Inferred::Known(req) => println!("Targets: {:?}", req),
        targeting::Inferred::Ambiguous(reason) => println!("Targets: ambiguous ({})", reason),
    }

    if let Some(trigger) = trigger {
        let def = duel_engine::core::CardDefinition::new("cli", "Text", duel_engine::core::CardType::Unit)
            .with_ability(trigger, text);
        println!("Timing: {:?}", effect_parser::ability_timing(&def));
    }
    Ok(())
}
