//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::EnergyLevel;

/// Focus Flow - small steps, growing garden
#[derive(Parser)]
#[command(
    name = "ff",
    about = "Break overwhelming moments into small tasks and grow a garden as you finish them",
    version,
    after_help = "Logs are written to: ~/.local/share/focusflow/logs/focusflow.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to showing the garden)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Describe what's going on and get a fresh batch of tasks
    Ask {
        /// What you are trying to do, or how you feel
        text: Option<String>,

        /// Current energy level (high or low)
        #[arg(short, long, default_value = "high")]
        energy: EnergyLevel,

        /// Image of your surroundings or work
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Voice recording
        #[arg(short, long)]
        audio: Option<PathBuf>,
    },

    /// List tasks in the current batch
    Tasks,

    /// Mark a task as completed
    Done {
        /// Task id (see `ff tasks`)
        id: String,
    },

    /// Give the garden a manual boost
    Grow,

    /// Show garden progress
    Garden,

    /// Discard the current batch (garden progress is kept)
    Reset,
}
