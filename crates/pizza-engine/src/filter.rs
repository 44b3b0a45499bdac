//! Case selection from `--only`, `--skip`, `--tag` and `--suite`
//!
//! Patterns are matched against the whole name; `*` matches any run of
//! characters.

use crate::case::TestCase;
use pizza_config::RunConfig;
use regex::Regex;

pub(crate) struct CaseFilter {
    only: Vec<Regex>,
    skip: Vec<Regex>,
    tags: Vec<Regex>,
    suites: Vec<Regex>,
}

impl CaseFilter {
    pub fn from_config(config: &RunConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            only: compile_all(&config.only)?,
            skip: compile_all(&config.skip)?,
            tags: compile_all(&config.tags)?,
            suites: compile_all(&config.suites)?,
        })
    }

    /// A filter that selects everything
    #[cfg(test)]
    pub fn all() -> Self {
        Self {
            only: Vec::new(),
            skip: Vec::new(),
            tags: Vec::new(),
            suites: Vec::new(),
        }
    }

    /// Whether `case`, registered under the suites in `path`, takes part
    pub fn selects(&self, path: &[&str], case: &TestCase) -> bool {
        let name = case.name();

        if !self.suites.is_empty()
            && !path
                .iter()
                .any(|suite| self.suites.iter().any(|p| p.is_match(suite)))
        {
            return false;
        }
        if !self.only.is_empty() && !self.only.iter().any(|p| p.is_match(name)) {
            return false;
        }
        if self.skip.iter().any(|p| p.is_match(name)) {
            return false;
        }
        if !self.tags.is_empty()
            && !case
                .tags()
                .iter()
                .any(|tag| self.tags.iter().any(|p| p.is_match(tag)))
        {
            return false;
        }
        true
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| wildcard(p)).collect()
}

/// Translate a `*` wildcard pattern into an anchored regex
fn wildcard(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{}$", escaped))
}
