use serde::{Deserialize, Serialize};

/// Class-file major version for Java 11.
pub const DEFAULT_CLASS_VERSION: u16 = 55;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerOptions {
    pub class_version: u16,
    /// Emit a line-number entry at the head of every block whose first
    /// statement carries a source line.
    pub line_numbers: bool,
    /// Lower methods of one class on scoped worker threads.
    pub parallel: bool,
    /// Abort the class on the first method failure instead of skipping it.
    pub fail_fast: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            class_version: DEFAULT_CLASS_VERSION,
            line_numbers: true,
            parallel: false,
            fail_fast: false,
        }
    }
}

impl LowerOptions {
    pub fn without_line_numbers(mut self) -> Self {
        self.line_numbers = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let options: LowerOptions = serde_json::from_str(r#"{"parallel": true}"#).unwrap();
        assert_eq!(
            options,
            LowerOptions {
                parallel: true,
                ..LowerOptions::default()
            }
        );
        assert!(!options.without_line_numbers().line_numbers);
    }
}
