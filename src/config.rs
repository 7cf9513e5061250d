//! Saved defaults, environment settings and the per-invocation render options.
//!
//! Config files hold command-line flag tokens, one or more per line, with `#`
//! comments. The global file lives in the platform config directory and a
//! `.mdmdrc` in the working directory adds to it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::diagram::Charset;
use crate::pager::TerminalInfo;

/// Columns used when the terminal width is unknown.
pub const DEFAULT_WIDTH: u16 = 80;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub no_pager: bool,
    pub no_color: bool,
    pub no_highlight: bool,
    pub perf: bool,
    pub width: Option<u16>,
    pub charset: Option<Charset>,
}

impl ConfigFlags {
    /// Merge two flag sets. Booleans accumulate and `other` wins for values.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            no_pager: self.no_pager || other.no_pager,
            no_color: self.no_color || other.no_color,
            no_highlight: self.no_highlight || other.no_highlight,
            perf: self.perf || other.perf,
            width: other.width.or(self.width),
            charset: other.charset.or(self.charset),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("mdmd").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("mdmd")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(xdg).join("mdmd").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("mdmd").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".mdmdrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# mdmd defaults (saved with --save)".to_string()];
    if flags.no_pager {
        lines.push("--no-pager".to_string());
    }
    if flags.no_color {
        lines.push("--no-color".to_string());
    }
    if flags.no_highlight {
        lines.push("--no-highlight".to_string());
    }
    if let Some(width) = flags.width {
        lines.push(format!("--width {width}"));
    }
    if let Some(charset) = flags.charset {
        let name = match charset {
            Charset::Unicode => "unicode",
            Charset::Ascii => "ascii",
        };
        lines.push(format!("--charset {name}"));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known flags out of a token list. Unknown tokens and bad values are
/// skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--no-pager" => flags.no_pager = true,
            "--no-color" => flags.no_color = true,
            "--no-highlight" => flags.no_highlight = true,
            "--perf" => flags.perf = true,
            "--width" | "-w" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.width = parse_width(next).or(flags.width);
                    i += 1;
                }
            }
            "--charset" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.charset = parse_charset(next).or(flags.charset);
                    i += 1;
                }
            }
            _ => {
                if let Some(value) = token.strip_prefix("--width=") {
                    flags.width = parse_width(value).or(flags.width);
                } else if let Some(value) = token.strip_prefix("--charset=") {
                    flags.charset = parse_charset(value).or(flags.charset);
                }
            }
        }
        i += 1;
    }
    flags
}

fn parse_width(s: &str) -> Option<u16> {
    s.parse::<u16>().ok().filter(|w| *w > 0)
}

fn parse_charset(s: &str) -> Option<Charset> {
    match s {
        "unicode" => Some(Charset::Unicode),
        "ascii" => Some(Charset::Ascii),
        _ => None,
    }
}

/// Environment variables that affect rendering, read once per run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    /// `NO_COLOR` is set and non-empty.
    pub no_color: bool,
    /// `MDMD_NO_PAGER` is set and non-empty.
    pub no_pager: bool,
    /// `MDMD_PAGER`, falling back to `PAGER`.
    pub pager: Option<String>,
    /// `LESS` is already set.
    pub less_set: bool,
}

impl EnvSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            no_color: non_empty("NO_COLOR").is_some(),
            no_pager: non_empty("MDMD_NO_PAGER").is_some(),
            pager: non_empty("MDMD_PAGER").or_else(|| non_empty("PAGER")),
            less_set: lookup("LESS").is_some(),
        }
    }
}

/// Settings for rendering one invocation. Built once, read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Columns to lay out for. Always positive.
    pub width: u16,
    pub color: bool,
    pub highlight: bool,
    pub pager: bool,
    pub charset: Charset,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            color: false,
            highlight: true,
            pager: false,
            charset: Charset::default(),
        }
    }
}

impl RenderOptions {
    /// Combine effective flags, environment and terminal facts.
    ///
    /// Color needs an interactive terminal and is turned off by `--no-color`
    /// or `NO_COLOR`.
    pub fn resolve(flags: &ConfigFlags, env: &EnvSettings, terminal: &TerminalInfo) -> Self {
        let width = flags
            .width
            .or(terminal.columns)
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_WIDTH);
        Self {
            width,
            color: terminal.is_terminal && !flags.no_color && !env.no_color,
            highlight: !flags.no_highlight,
            pager: !flags.no_pager && !env.no_pager,
            charset: flags.charset.unwrap_or_default(),
        }
    }
}
