//! # Terminal Output
//!
//! Color and marker selection for the `nuget-resolve` CLI.
//!
//! Colors follow the `--color` flag first. In `auto` mode the usual
//! environment conventions apply:
//! - `NO_COLOR` (any value) disables colors
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even when stdout is not a TTY
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} {}", out.marker(Marker::Success), out.paint_name("nuget.org"));
//! ```

use std::env;

use console::style;

/// Output configuration for the CLI.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and glyphs should be used.
    pub use_color: bool,
}

/// Status markers printed in front of a result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Success,
    Failure,
    Disabled,
    Skipped,
}

impl OutputConfig {
    /// Build from the value of `--color` (`always`, `never` or `auto`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_ascii_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        console::set_colors_enabled(use_color);
        console::set_colors_enabled_stderr(use_color);
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    /// The marker text, a glyph with colors or a bracketed tag without.
    pub fn marker(&self, marker: Marker) -> String {
        let (glyph, plain) = match marker {
            Marker::Success => ("✔", "[ok]"),
            Marker::Failure => ("✘", "[failed]"),
            Marker::Disabled => ("○", "[disabled]"),
            Marker::Skipped => ("-", "[skipped]"),
        };
        if !self.use_color {
            return plain.to_string();
        }
        match marker {
            Marker::Success => style(glyph).green().to_string(),
            Marker::Failure => style(glyph).red().bold().to_string(),
            Marker::Disabled | Marker::Skipped => style(glyph).dim().to_string(),
        }
    }

    /// A source or package name, bold when colors are on.
    pub fn paint_name(&self, name: &str) -> String {
        if self.use_color {
            style(name).bold().to_string()
        } else {
            name.to_string()
        }
    }

    /// Secondary detail such as a path or provenance, dimmed when colors
    /// are on.
    pub fn paint_detail(&self, detail: &str) -> String {
        if self.use_color {
            style(detail).dim().to_string()
        } else {
            detail.to_string()
        }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
