// ABOUTME: Snapshot of process environment variables consulted as the lowest-precedence option source.
// ABOUTME: Lets adapters resolve options deterministically and tests inject literal variables.

use std::collections::HashMap;
use std::path::PathBuf;

/// Immutable view of environment variables.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Trimmed value, `None` when unset or blank
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Boolean value; unrecognised spellings count as unset
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(parse_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Home directory from `HOME`, falling back to the platform lookup
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.get("HOME").map(PathBuf::from).or_else(|| {
            directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
        })
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_unset() {
        let env = Env::from_pairs([("A", "  "), ("B", " x ")]);
        assert_eq!(env.get("A"), None);
        assert_eq!(env.get("B"), Some("x"));
        assert_eq!(env.get("C"), None);
    }

    #[test]
    fn test_flag_spellings() {
        let env = Env::from_pairs([("ON", "Yes"), ("OFF", "0"), ("JUNK", "maybe")]);
        assert_eq!(env.flag("ON"), Some(true));
        assert_eq!(env.flag("OFF"), Some(false));
        assert_eq!(env.flag("JUNK"), None);
    }

    #[test]
    fn test_home_dir_prefers_home_var() {
        let env = Env::from_pairs([("HOME", "/home/tester")]);
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/tester")));
    }
}
