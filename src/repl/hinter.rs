//! Hinter for reedline - suggests the rest of a previously run query inline

use nu_ansi_term::{Color, Style};
use reedline::{Hinter, History, SearchQuery};

/// History-based inline hints
pub struct PromHinter {
    style: Style,
    /// Hint returned by complete_hint
    current_hint: String,
}

impl PromHinter {
    pub fn new() -> Self {
        Self {
            style: Style::new().italic().fg(Color::DarkGray),
            current_hint: String::new(),
        }
    }

    /// Remainder of the latest history line that extends `line`
    fn lookup(line: &str, history: &dyn History) -> Option<String> {
        let item = history
            .search(SearchQuery::last_with_prefix(line.to_string(), None))
            .ok()?
            .into_iter()
            .next()?;

        let previous = item.command_line.as_str();
        (previous.len() > line.len() && previous.starts_with(line))
            .then(|| previous[line.len()..].to_string())
    }
}

impl Default for PromHinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Hinter for PromHinter {
    fn handle(
        &mut self,
        line: &str,
        pos: usize,
        history: &dyn History,
        use_ansi_coloring: bool,
        _cwd: &str,
    ) -> String {
        self.current_hint.clear();

        // Only hint at the end of a non-empty line
        if pos != line.len() || line.trim().is_empty() {
            return String::new();
        }

        let Some(hint) = Self::lookup(line, history) else {
            return String::new();
        };
        self.current_hint = hint;

        if use_ansi_coloring {
            self.style.paint(&self.current_hint).to_string()
        } else {
            self.current_hint.clone()
        }
    }

    /// Hints are accepted whole
    fn next_hint_token(&self) -> String {
        String::new()
    }

    fn complete_hint(&self) -> String {
        self.current_hint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reedline::{FileBackedHistory, HistoryItem};

    fn history_with(lines: &[&str]) -> FileBackedHistory {
        let mut history = FileBackedHistory::new(100).unwrap();
        for line in lines {
            history
                .save(HistoryItem::from_command_line(*line))
                .unwrap();
        }
        history
    }

    #[test]
    fn test_empty_line_no_hint() {
        let mut hinter = PromHinter::new();
        let history = history_with(&["up"]);
        assert_eq!(hinter.handle("", 0, &history, false, "/tmp"), "");
    }

    #[test]
    fn test_cursor_not_at_end_no_hint() {
        let mut hinter = PromHinter::new();
        let history = history_with(&["rate(up[5m])"]);
        assert_eq!(hinter.handle("rate", 2, &history, false, "/tmp"), "");
    }

    #[test]
    fn test_hint_from_history() {
        let mut hinter = PromHinter::new();
        let history = history_with(&["rate(up[5m])"]);
        assert_eq!(hinter.handle("rate(", 5, &history, false, "/tmp"), "up[5m])");
        assert_eq!(hinter.complete_hint(), "up[5m])");
        assert_eq!(hinter.next_hint_token(), "");
    }
}
