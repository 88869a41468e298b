// src/manager/repofile.rs

//! `.repo` files
//!
//! INI-style repository definitions, one section per repository:
//!
//! ```text
//! [oss]
//! name=Main Repository
//! enabled=1
//! autorefresh=1
//! baseurl=http://download.example.org/distribution/oss/
//! type=rpm-md
//! ```

use super::{RepoInfo, RepoType};
use crate::error::{Error, Result};
use std::fmt::Write;
use url::Url;

/// Parse every repository section of `text`
///
/// `origin` names the file in error messages.
pub fn parse(text: &str, origin: &str) -> Result<Vec<RepoInfo>> {
    let mut repos = Vec::new();
    let mut current: Option<Section> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let alias = header
                .strip_suffix(']')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .ok_or_else(|| parse_error(origin, lineno, "malformed section header"))?;
            if let Some(section) = current.take() {
                repos.push(section.finish(origin)?);
            }
            current = Some(Section::new(alias));
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| parse_error(origin, lineno, "expected key=value"))?;
        let section = current
            .as_mut()
            .ok_or_else(|| parse_error(origin, lineno, "entry outside of a section"))?;
        section.set(key.trim(), value.trim())?;
    }

    if let Some(section) = current {
        repos.push(section.finish(origin)?);
    }
    Ok(repos)
}

/// Render repositories as a `.repo` file
pub fn write(repos: &[RepoInfo]) -> String {
    let mut out = String::new();
    for (i, repo) in repos.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", repo.alias);
        let _ = writeln!(out, "name={}", repo.name);
        let _ = writeln!(out, "enabled={}", u8::from(repo.enabled));
        let _ = writeln!(out, "autorefresh={}", u8::from(repo.autorefresh));
        for url in &repo.base_urls {
            let _ = writeln!(out, "baseurl={}", url);
        }
        let _ = writeln!(out, "type={}", repo.repo_type);
    }
    out
}

fn parse_error(origin: &str, lineno: usize, reason: &str) -> Error {
    Error::Parse {
        path: origin.to_string(),
        reason: format!("line {}: {}", lineno + 1, reason),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "yes" | "true" | "on")
}

struct Section {
    alias: String,
    name: Option<String>,
    urls: Vec<Url>,
    enabled: bool,
    autorefresh: bool,
    repo_type: RepoType,
}

impl Section {
    fn new(alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            name: None,
            urls: Vec::new(),
            enabled: true,
            autorefresh: true,
            repo_type: RepoType::default(),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "name" => self.name = Some(value.to_string()),
            "baseurl" => {
                let url = Url::parse(value).map_err(|e| Error::InvalidUrl {
                    url: value.to_string(),
                    reason: e.to_string(),
                })?;
                self.urls.push(url);
            }
            "enabled" => self.enabled = parse_bool(value),
            "autorefresh" => self.autorefresh = parse_bool(value),
            "type" => self.repo_type = value.parse()?,
            // gpgcheck, priority, path and friends are not used here
            _ => {}
        }
        Ok(())
    }

    fn finish(self, origin: &str) -> Result<RepoInfo> {
        if self.urls.is_empty() {
            return Err(Error::Parse {
                path: origin.to_string(),
                reason: format!("repository '{}' has no baseurl", self.alias),
            });
        }
        Ok(RepoInfo {
            name: self.name.unwrap_or_else(|| self.alias.clone()),
            alias: self.alias,
            base_urls: self.urls,
            enabled: self.enabled,
            autorefresh: self.autorefresh,
            repo_type: self.repo_type,
            ephemeral: false,
        })
    }
}
