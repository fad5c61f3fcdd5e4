// Package Name Pattern - shell-style globs over package names

use super::error::{DomainError, Result};
use regex::Regex;

/// Compiled package-name glob
///
/// `?` matches one character, `*` any run of characters; everything else is
/// literal. The whole name must match.
#[derive(Debug, Clone)]
pub struct PackagePattern {
    source: String,
    regex: Regex,
}

impl PackagePattern {
    pub fn new(glob: &str) -> Result<Self> {
        let expr = glob_to_regex(glob);
        let regex = Regex::new(&expr).map_err(|e| DomainError::InvalidPackagePattern {
            pattern: glob.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, package_name: &str) -> bool {
        self.regex.is_match(package_name)
    }
}

/// Translate a glob into an anchored regular expression
pub fn glob_to_regex(glob: &str) -> String {
    let mut expr = String::with_capacity(glob.len() + 8);
    expr.push('^');
    for c in glob.chars() {
        match c {
            '?' => expr.push('.'),
            '*' => expr.push_str(".*"),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');
    expr
}
