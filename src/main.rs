//! mdmd - render markdown with mermaid diagrams in the terminal.
//!
//! # Usage
//!
//! ```bash
//! mdmd README.md
//! cat notes.md | mdmd --no-pager
//! mdmd --width 72 --charset ascii docs/*.md
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use mdmd::config::{
    ConfigFlags, EnvSettings, RenderOptions, clear_config_flags, global_config_path,
    load_config_flags, local_override_path, save_config_flags,
};
use mdmd::diagram::{Charset, TextRenderer};
use mdmd::pager::{PagerCommand, TerminalInfo, select_output_mode, write_output};
use mdmd::render::render_document;
use mdmd::{input, perf};

/// Render markdown with mermaid diagrams in the terminal
#[derive(Parser, Debug)]
#[command(name = "mdmd", version, about, long_about = None)]
struct Cli {
    /// Markdown files to render (reads standard input when omitted)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Write output directly instead of through a pager
    #[arg(long)]
    no_pager: bool,

    /// Disable colors and text styles
    #[arg(long)]
    no_color: bool,

    /// Disable syntax highlighting of code blocks
    #[arg(long)]
    no_highlight: bool,

    /// Wrap output at N columns (also the widest diagram allowed)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    width: Option<u16>,

    /// Characters used to draw diagrams
    #[arg(long, value_enum)]
    charset: Option<Charset>,

    /// Print timing information to stderr
    #[arg(long)]
    perf: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    const fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            no_pager: self.no_pager,
            no_color: self.no_color,
            no_highlight: self.no_highlight,
            perf: self.perf,
            width: self.width,
            charset: self.charset,
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("mdmd: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    perf::set_enabled(effective.perf);

    let env = EnvSettings::from_env();
    let terminal = TerminalInfo::detect();
    let options = RenderOptions::resolve(&effective, &env, &terminal);
    tracing::debug!(?options, "resolved render options");

    let inputs: Vec<Option<&Path>> = if cli.files.is_empty() {
        vec![None]
    } else {
        cli.files.iter().map(|path| Some(path.as_path())).collect()
    };

    let mut output = String::new();
    let mut read_failed = false;
    for path in inputs {
        let source = match input::read_document(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("mdmd: {err}");
                read_failed = true;
                continue;
            }
        };
        let rendered = render_document(&source, &options, &TextRenderer);
        for failure in &rendered.failures {
            eprintln!(
                "warning: mermaid block {} could not be rendered: {}",
                failure.index + 1,
                failure.error
            );
        }
        if !output.is_empty() && !rendered.text.is_empty() {
            output.push('\n');
        }
        output.push_str(&rendered.text);
    }

    let mode = select_output_mode(output.lines().count(), &terminal, options.pager);
    let pager = PagerCommand::resolve(&env);
    let pager_code = write_output(&output, mode, &pager, &env, &mut io::stdout().lock())?;

    if read_failed {
        return Ok(ExitCode::FAILURE);
    }
    if pager_code != 0 {
        return Ok(ExitCode::from(u8::try_from(pager_code).unwrap_or(1)));
    }
    Ok(ExitCode::SUCCESS)
}
