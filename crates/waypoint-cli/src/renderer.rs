//! Terminal output: rich markdown, plain markdown or JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use termimad::{crossterm::style::Color, MadSkin};

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Markdown styled through termimad
    Rich,
    /// Markdown printed verbatim
    Plain,
    /// Pretty-printed JSON of the underlying records
    Json,
}

/// Terminal renderer that switches between the output modes.
pub struct TerminalRenderer {
    mode: OutputMode,
    skin: MadSkin,
}

impl TerminalRenderer {
    /// Create a new terminal renderer
    pub fn new(mode: OutputMode) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.code_block.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { mode, skin }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Prints `markdown`, or `value` as JSON in JSON mode.
    pub fn render<T: Serialize + ?Sized>(&self, markdown: &str, value: &T) -> Result<()> {
        match self.mode {
            OutputMode::Json => {
                let json =
                    serde_json::to_string_pretty(value).context("Failed to serialize output")?;
                println!("{json}");
            }
            OutputMode::Plain => print!("{markdown}"),
            OutputMode::Rich => {
                for line in markdown.lines() {
                    // termimad hides the hashes; keep them so headings read as in plain mode.
                    if line.starts_with('#') {
                        println!("\x1b[34m{line}\x1b[0m");
                    } else {
                        self.skin.print_inline(line);
                        println!();
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(OutputMode::Rich)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer() {
        let renderer = TerminalRenderer::new(OutputMode::Plain);
        assert_eq!(renderer.mode(), OutputMode::Plain);
        renderer.render("# Title\n", &()).expect("render");
    }

    #[test]
    fn test_json_renderer() {
        let renderer = TerminalRenderer::new(OutputMode::Json);
        renderer
            .render("ignored", &serde_json::json!({"order": 1}))
            .expect("render");
    }

    #[test]
    fn test_default_is_rich() {
        assert_eq!(TerminalRenderer::default().mode(), OutputMode::Rich);
    }
}
