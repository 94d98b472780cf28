//! JSON formatting with optional color highlighting

use colored_json::prelude::*;
use serde::Serialize;

use crate::error::Result;

/// JSON formatter with pretty printing support
pub struct JsonFormatter {
    /// Enable pretty printing
    pretty: bool,

    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool, use_colors: bool) -> Self {
        Self { pretty, use_colors }
    }

    /// Serialize `value` as JSON
    pub fn format<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json_str = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        // Compact JSON stays uncolored for piping
        if self.use_colors && self.pretty {
            Ok(json_str.to_colored_json_auto().unwrap_or(json_str))
        } else {
            Ok(json_str)
        }
    }
}
