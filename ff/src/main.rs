//! Focus Flow - LLM-guided task breakdown with a growing garden
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::sync::broadcast;
use tracing::info;

use focusflow::cli::{Cli, Command};
use focusflow::coach::{Attachment, AttachmentKind, UserInput};
use focusflow::config::Config;
use focusflow::domain::{Completion, EnergyLevel, Growth, ProgressionState, STAGE_COUNT, TaskBatch, XP_TO_LEVEL_UP};
use focusflow::session::FocusSession;
use focusflow::state::StateEvent;

/// Width of the XP bar in characters
const BAR_WIDTH: usize = 30;

fn setup_logging(cli_level: Option<&str>, config_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("focusflow")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI > config > INFO
    let level = cli_level
        .or(config_level)
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    let log_file = fs::File::create(log_dir.join("focusflow.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "Focus Flow loaded config: provider={}, model={}",
        config.llm.provider,
        config.llm.model()
    );

    // Only `ask` talks to the model
    if matches!(cli.command, Some(Command::Ask { .. })) {
        config.validate()?;
    }

    let root = std::env::current_dir().context("Failed to read current directory")?;
    let session = FocusSession::from_config(&config, &root)?;

    let result = match cli.command {
        Some(Command::Ask {
            text,
            energy,
            image,
            audio,
        }) => cmd_ask(&session, text, energy, image, audio).await,
        Some(Command::Tasks) => cmd_tasks(&session).await,
        Some(Command::Done { id }) => cmd_done(&session, &id).await,
        Some(Command::Grow) => cmd_grow(&session).await,
        Some(Command::Reset) => cmd_reset(&session).await,
        Some(Command::Garden) | None => cmd_garden(&session).await,
    };

    session.shutdown().await?;
    result
}

async fn cmd_ask(
    session: &FocusSession,
    text: Option<String>,
    energy: EnergyLevel,
    image: Option<PathBuf>,
    audio: Option<PathBuf>,
) -> Result<()> {
    let mut input = UserInput::text(text.unwrap_or_default()).with_energy(energy);
    if let Some(path) = image {
        input = input.with_image(Attachment::from_path(&path, AttachmentKind::Image)?);
    }
    if let Some(path) = audio {
        input = input.with_audio(Attachment::from_path(&path, AttachmentKind::Audio)?);
    }

    let Some(guidance) = session.submit(input).await? else {
        println!("{}", "Nothing to send. Type something or attach an image or recording.".yellow());
        return Ok(());
    };

    println!("{}", guidance.message.bold());
    if !guidance.spoken_response.is_empty() && guidance.spoken_response != guidance.message {
        println!("{}", guidance.spoken_response.italic().dimmed());
    }
    println!("{} {}", "mood:".dimmed(), guidance.emotion().to_string().cyan());
    println!();

    print_batch(&session.batch().await?);
    Ok(())
}

async fn cmd_tasks(session: &FocusSession) -> Result<()> {
    let batch = session.batch().await?;
    if batch.is_empty() {
        println!("No tasks yet. Try: ff ask \"what's on your mind\"");
        return Ok(());
    }
    print_batch(&batch);
    Ok(())
}

async fn cmd_done(session: &FocusSession, id: &str) -> Result<()> {
    let mut events = session.subscribe_events();

    match session.complete_task(id).await? {
        Completion::Completed { id, reward } => {
            println!("{} Completed {} {}", "✓".green(), id.cyan(), format!("+{} XP", reward).green());
        }
        Completion::AlreadyCompleted { id } => {
            println!("{} already completed", id.cyan());
            return Ok(());
        }
        Completion::NotFound { id } => {
            println!("{} No task with id {}", "✗".red(), id.cyan());
            return Ok(());
        }
    }

    session.settle().await?;
    print_growth(&mut events);

    let batch = session.batch().await?;
    if batch.all_completed() {
        println!("{}", "Batch complete. Nice work.".green().bold());
    }
    print_garden(&session.progress().await?);
    Ok(())
}

async fn cmd_grow(session: &FocusSession) -> Result<()> {
    let mut events = session.subscribe_events();
    session.grow().await?;
    session.settle().await?;
    print_growth(&mut events);
    print_garden(&session.progress().await?);
    Ok(())
}

async fn cmd_reset(session: &FocusSession) -> Result<()> {
    session.reset().await?;
    println!("{} Batch cleared", "✓".green());
    Ok(())
}

async fn cmd_garden(session: &FocusSession) -> Result<()> {
    print_garden(&session.progress().await?);
    Ok(())
}

fn print_growth(events: &mut broadcast::Receiver<StateEvent>) {
    while let Ok(event) = events.try_recv() {
        if let StateEvent::ExperienceApplied(growth) = event {
            print_growth_line(&growth);
        }
    }
}

fn print_growth_line(growth: &Growth) {
    if growth.cycles_completed > 0 {
        println!(
            "{} The garden bloomed and started cycle {}",
            "✿".magenta(),
            growth.after.cycle + 1
        );
    } else if growth.leveled_up() {
        println!(
            "{} Grew into a {}",
            growth.after.garden_stage().glyph(),
            growth.after.garden_stage().label().green()
        );
    }
}

fn print_garden(progress: &ProgressionState) {
    let stage = progress.garden_stage();
    let filled = (progress.progress_ratio() * BAR_WIDTH as f64) as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)));

    println!(
        "{} {} {}",
        stage.glyph(),
        stage.label().bold(),
        format!("(stage {}/{}, cycle {})", stage.index() + 1, STAGE_COUNT, progress.cycle + 1).dimmed()
    );
    println!("{} {}/{} XP", bar.green(), progress.xp, XP_TO_LEVEL_UP);
    println!("{} {}", "level".dimmed(), progress.level());
}

fn print_batch(batch: &TaskBatch) {
    for task in batch.tasks() {
        let mark = if task.completed { "✓".green() } else { "○".normal() };
        let title = if task.completed {
            task.title.dimmed()
        } else {
            task.title.normal()
        };
        println!(
            "{} {} {} {} {}",
            mark,
            task.id.cyan(),
            title,
            format!("[{}, {}]", task.duration, task.difficulty).dimmed(),
            format!("+{} XP", task.reward()).green()
        );
        if let Some(reasoning) = &task.reasoning {
            println!("    {}", reasoning.dimmed());
        }
    }
    println!(
        "{}",
        format!(
            "{}/{} done ({:.0}%)",
            batch.completed_count(),
            batch.len(),
            batch.progress_percent()
        )
        .dimmed()
    );
}
