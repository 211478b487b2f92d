//! Developer tasks for the turbulence workspace.
//!
//! ```text
//! cargo xtask completions [--out DIR]
//! cargo xtask man [--out DIR]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out: PathBuf,
        /// Only generate for these shells (default: all)
        #[arg(long, value_enum)]
        shell: Vec<CompletionShell>,
    },
    /// Generate man pages for the CLI and each subcommand
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Elvish,
    Powershell,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Self::Bash,
            CompletionShell::Zsh => Self::Zsh,
            CompletionShell::Fish => Self::Fish,
            CompletionShell::Elvish => Self::Elvish,
            CompletionShell::Powershell => Self::PowerShell,
        }
    }
}

const BIN_NAME: &str = "turbulence";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Xtask::parse().task {
        Task::Completions { out, shell } => completions(&out, &shell),
        Task::Man { out } => man(&out),
    }
}

fn completions(out: &Path, shells: &[CompletionShell]) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(out)?;
    let shells: Vec<Shell> = if shells.is_empty() {
        vec![
            Shell::Bash,
            Shell::Zsh,
            Shell::Fish,
            Shell::Elvish,
            Shell::PowerShell,
        ]
    } else {
        shells.iter().copied().map(Shell::from).collect()
    };

    let mut cmd = turbulence::command();
    for shell in shells {
        let path = clap_complete::generate_to(shell, &mut cmd, BIN_NAME, out)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn man(out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(out)?;
    let cmd = turbulence::command();

    write_page(out, BIN_NAME, cmd.clone())?;
    for sub in cmd.get_subcommands() {
        let name = format!("{BIN_NAME}-{}", sub.get_name());
        write_page(out, &name, sub.clone())?;
    }
    Ok(())
}

fn write_page(out: &Path, name: &str, cmd: clap::Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    let path = out.join(format!("{name}.1"));
    fs::write(&path, buffer)?;
    println!("wrote {}", path.display());
    Ok(())
}
