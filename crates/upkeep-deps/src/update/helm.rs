//! Helm chart dependency update

use super::write_if_changed;
use crate::{Error, Result};
use regex::Regex;
use std::path::PathBuf;

/// An update to a Helm chart dependency declaration.
#[derive(Debug, Clone)]
pub struct HelmUpdate {
    /// File containing the declaration
    pub path: PathBuf,
    /// Chart name
    pub name: String,
    /// The current version
    pub current: String,
    /// The latest available version
    pub latest: String,
}

impl HelmUpdate {
    /// Short description of this update.
    pub fn description(&self) -> String {
        format!(
            "Update {} Helm chart from {} to {}",
            self.name, self.current, self.latest
        )
    }

    /// Rewrite the chart's `version:` field, leaving everything else in
    /// the file untouched.
    pub fn apply(&self) -> Result<()> {
        let content = std::fs::read_to_string(&self.path)?;
        let rewritten = self.rewrite(&content)?;
        write_if_changed(&self.path, &content, &rewritten)
    }

    fn rewrite(&self, content: &str) -> Result<String> {
        // Chart dependency lists are block sequences of mappings. Walk the
        // list items, and inside every item naming this chart replace the
        // value of its version line.
        let item_re = Regex::new(r"^(\s*)- ").unwrap();
        let name_re = Regex::new(&format!(
            r#"^\s*(- )?name:\s*["']?{}["']?\s*(#.*)?$"#,
            regex::escape(&self.name)
        ))
        .unwrap();
        let version_re =
            Regex::new(r#"^(\s*(?:- )?version:\s*)(["']?)([^"'\s#]+)(["']?)(\s*(?:#.*)?)$"#)
                .unwrap();

        let lines: Vec<&str> = content.lines().collect();
        let mut blocks: Vec<(usize, usize)> = Vec::new();
        let mut start: Option<usize> = None;
        for (i, line) in lines.iter().enumerate() {
            if item_re.is_match(line) {
                if let Some(s) = start.take() {
                    blocks.push((s, i));
                }
                start = Some(i);
            }
        }
        if let Some(s) = start {
            blocks.push((s, lines.len()));
        }

        let mut output: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        let mut found = false;
        for (begin, end) in blocks {
            if !lines[begin..end].iter().any(|l| name_re.is_match(l)) {
                continue;
            }
            for i in begin..end {
                if let Some(caps) = version_re.captures(lines[i]) {
                    output[i] = format!(
                        "{}{}{}{}{}",
                        &caps[1], &caps[2], self.latest, &caps[4], &caps[5]
                    );
                    found = true;
                    break;
                }
            }
        }

        if !found {
            return Err(Error::DependencyNotFound {
                name: self.name.clone(),
                path: self.path.clone(),
            });
        }

        let mut result = output.join("\n");
        if content.ends_with('\n') {
            result.push('\n');
        }
        Ok(result)
    }
}
