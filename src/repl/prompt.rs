//! Custom prompt implementation for promsh

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Prompt showing the datasource and whether it is reachable
pub struct PromPrompt {
    /// Host, or snapshot name
    host: String,
    connected: bool,
}

impl PromPrompt {
    pub fn new(host: String, connected: bool) -> Self {
        Self { host, connected }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Prompt for PromPrompt {
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        if self.connected {
            format!("{}> ", self.host).into()
        } else {
            format!("{} (disconnected)> ", self.host).into()
        }
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        "".into()
    }

    /// Empty since the indicator is part of the left prompt
    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> std::borrow::Cow<'_, str> {
        "".into()
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        "... ".into()
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_prompt() {
        let prompt = PromPrompt::new("localhost:9090".to_string(), true);
        assert_eq!(prompt.render_prompt_left(), "localhost:9090> ");
    }

    #[test]
    fn test_disconnected_prompt() {
        let mut prompt = PromPrompt::new("localhost:9090".to_string(), true);
        prompt.set_connected(false);
        assert_eq!(
            prompt.render_prompt_left(),
            "localhost:9090 (disconnected)> "
        );
    }

    #[test]
    fn test_indicators() {
        let prompt = PromPrompt::new("prom".to_string(), true);
        assert_eq!(prompt.render_prompt_right(), "");
        assert_eq!(prompt.render_prompt_indicator(PromptEditMode::Default), "");
        assert_eq!(prompt.render_prompt_multiline_indicator(), "... ");
    }
}
