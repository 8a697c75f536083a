use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::components::Timings;

/// Persistent defaults, read from rc files and merged with the command line.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub json: bool,
    pub verbose: bool,
    pub epsilon: Option<f64>,
    pub dismiss_delay_ms: Option<u64>,
    pub transition_ms: Option<u64>,
    pub move_threshold: Option<f64>,
}

impl ConfigFlags {
    /// Merge two flag sets. Switches are OR'ed; options from `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            json: self.json || other.json,
            verbose: self.verbose || other.verbose,
            epsilon: other.epsilon.or(self.epsilon),
            dismiss_delay_ms: other.dismiss_delay_ms.or(self.dismiss_delay_ms),
            transition_ms: other.transition_ms.or(self.transition_ms),
            move_threshold: other.move_threshold.or(self.move_threshold),
        }
    }

    /// Widget timings with every configured override applied.
    pub fn to_timings(&self) -> Timings {
        let defaults = Timings::default();
        Timings {
            scroll_epsilon: self.epsilon.unwrap_or(defaults.scroll_epsilon),
            dismiss_delay_ms: self.dismiss_delay_ms.unwrap_or(defaults.dismiss_delay_ms),
            transition_ms: self.transition_ms.unwrap_or(defaults.transition_ms),
            pointer_move_threshold: self
                .move_threshold
                .unwrap_or(defaults.pointer_move_threshold),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("docnav").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("docnav")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("docnav").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("docnav").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".docnavrc")
}

/// Read flags from an rc file. A missing file yields the defaults.
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
    let mut lines = vec!["# docnav defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.json {
        lines.push("--json".to_string());
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    if let Some(epsilon) = flags.epsilon {
        lines.push(format!("--epsilon {epsilon}"));
    }
    if let Some(ms) = flags.dismiss_delay_ms {
        lines.push(format!("--dismiss-delay {ms}"));
    }
    if let Some(ms) = flags.transition_ms {
        lines.push(format!("--transition {ms}"));
    }
    if let Some(px) = flags.move_threshold {
        lines.push(format!("--move-threshold {px}"));
    }
    if let Some(parent) = path.parent() {
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

/// Extract known flags from a token list. Unknown tokens and unparsable
/// values are ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        match name {
            "--watch" => flags.watch = true,
            "--json" => flags.json = true,
            "--verbose" | "-v" => flags.verbose = true,
            "--epsilon" | "--dismiss-delay" | "--transition" | "--move-threshold" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        i += 1;
                        tokens.get(i).map(String::as_str)
                    }
                };
                if let Some(value) = value {
                    apply_option(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_option(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--epsilon" => flags.epsilon = value.parse().ok(),
        "--dismiss-delay" => flags.dismiss_delay_ms = value.parse().ok(),
        "--transition" => flags.transition_ms = value.parse().ok(),
        "--move-threshold" => flags.move_threshold = value.parse().ok(),
        _ => {}
    }
}
