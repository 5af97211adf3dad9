//! xtask for dirsum - build automation and tooling
//!
//! Currently generates man pages from the clap definitions.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs;
use std::path::Path;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for dirsum")]
enum Task {
    /// Generate man pages from clap definitions
    GenerateManPages {
        /// Output directory for man pages (default: ./man)
        #[arg(short, long, default_value = "man")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    match Task::parse() {
        Task::GenerateManPages { output } => generate_man_pages(&output)?,
    }
    Ok(())
}

fn generate_man_pages(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let cmd = dirsum::cli::Cli::command();
    render(clap_mangen::Man::new(cmd.clone()), &output_dir.join("dirsum.1"))?;

    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "completion") {
        let title = format!("dirsum-{}", sub.get_name());
        let page = clap_mangen::Man::new(sub.clone()).title(title.clone());
        render(page, &output_dir.join(format!("{title}.1")))?;
    }

    println!("\nMan pages generated in: {}", output_dir.display());
    println!("  man {}/dirsum.1", output_dir.display());
    Ok(())
}

fn render(page: clap_mangen::Man, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create man page: {}", path.display()))?;
    page.render(&mut std::io::BufWriter::new(file))?;
    println!("✓ Generated: {}", path.display());
    Ok(())
}
