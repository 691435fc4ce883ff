use inksac::prelude::*;

/// Colours for the shell's own messages. Job output is never styled.
#[derive(Debug, Clone, Copy)]
pub struct Highlighter {
    enabled: bool,
}

impl Highlighter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn detect() -> Self {
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self::new(!matches!(support, ColorSupport::NoColor))
    }

    pub fn heading(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let style = Style::builder().foreground(Color::Cyan).bold().build();
        text.style(style).to_string()
    }

    pub fn flag(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let style = Style::builder().foreground(Color::Yellow).build();
        text.style(style).to_string()
    }

    pub fn error(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let style = Style::builder().foreground(Color::Red).bold().build();
        text.style(style).to_string()
    }
}
