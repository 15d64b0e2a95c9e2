use std::collections::HashMap;
use std::fs;
use std::str::FromStr;

/// INI-style configuration: optional global `key = value` lines followed by
/// `[section]` blocks. Lines starting with `#` are comments; values may be quoted.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Error reading file {path}: {e}"))?;
        Ok(Self::parse(&content))
    }

    /// Parses configuration text. Malformed lines (no `=`) are skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim();
                current_section = Some(name.to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty_or_default<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Parses a value with `FromStr`. `Ok(None)` when the key is absent or empty.
    pub fn get_parsed<T: FromStr>(&self, section: &str, key: &str) -> Result<Option<T>, String> {
        match self.get_non_empty(section, key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| format!("invalid value for [{section}] {key}: {raw}")),
        }
    }

    /// Reads a boolean flag (`true/false`, `yes/no`, `1/0`, `on/off`).
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        match self.get_non_empty(section, key) {
            None => Ok(None),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Some(true)),
                "false" | "no" | "0" | "off" => Ok(Some(false)),
                _ => Err(format!("invalid boolean for [{section}] {key}: {raw}")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::Config;

    const SAMPLE: &str = r#"
# global defaults
file_name = "fallback"

[srtp]
profile = SRTP_AES128_CM_SHA1_80
key_hard_limit = 1000
allow_repeat_tx = yes

[logging]
path =
"#;

    #[test]
    fn parse_splits_globals_and_sections() {
        let c = Config::parse(SAMPLE);
        assert_eq!(c.get_global("file_name"), Some("fallback"));
        assert_eq!(c.get("srtp", "profile"), Some("SRTP_AES128_CM_SHA1_80"));
        assert_eq!(c.get("logging", "path"), Some(""));
        assert_eq!(c.get_non_empty("logging", "path"), None);
    }

    #[test]
    fn non_empty_or_default_falls_back_to_globals() {
        let c = Config::parse(SAMPLE);
        assert_eq!(
            c.get_non_empty_or_default("logging", "file_name", "srtp"),
            "fallback"
        );
        assert_eq!(c.get_non_empty_or_default("logging", "level", "info"), "info");
    }

    #[test]
    fn typed_getters() {
        let c = Config::parse(SAMPLE);
        assert_eq!(c.get_parsed::<u64>("srtp", "key_hard_limit"), Ok(Some(1000)));
        assert_eq!(c.get_parsed::<u64>("srtp", "key_soft_limit"), Ok(None));
        assert!(c.get_parsed::<u64>("srtp", "profile").is_err());
        assert_eq!(c.get_bool("srtp", "allow_repeat_tx"), Ok(Some(true)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/nonexistent/rustysrtp.conf").unwrap_err();
        assert!(err.contains("/nonexistent/rustysrtp.conf"));
    }
}
