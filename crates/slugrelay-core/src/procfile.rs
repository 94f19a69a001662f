use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PROCFILE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+):\s*(.+)$").expect("Procfile line pattern is valid")
});

/// Process name to start command, as declared by a `Procfile`.
///
/// Serializes as a plain JSON object (`{"web": "bundle exec rails s"}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessTypes(BTreeMap<String, String>);

impl ProcessTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `Procfile` content.
    ///
    /// Each line of the form `name: command` declares a process type. Lines
    /// that do not match, or whose command is blank, are skipped. When a name
    /// is declared twice the last declaration wins.
    pub fn parse(content: &str) -> Self {
        let mut types = Self::new();
        for line in content.lines() {
            let Some(caps) = PROCFILE_LINE.captures(line) else {
                continue;
            };
            let command = caps[2].trim();
            if command.is_empty() {
                continue;
            }
            types.insert(&caps[1], command);
        }
        types
    }

    pub fn insert(&mut self, name: &str, command: &str) {
        self.0.insert(name.to_owned(), command.to_owned());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProcessTypes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
