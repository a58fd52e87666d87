//! pre-commit hook pin update

use super::write_if_changed;
use crate::{Error, Result};
use regex::Regex;
use std::path::PathBuf;

/// An update to a pre-commit hook revision pin.
#[derive(Debug, Clone)]
pub struct PreCommitUpdate {
    /// File containing the declaration
    pub path: PathBuf,
    /// URL of the repository providing the hook
    pub repository: String,
    /// The current pinned revision
    pub current: String,
    /// The latest available tag
    pub latest: String,
}

impl PreCommitUpdate {
    /// Short description of this update.
    pub fn description(&self) -> String {
        let short_repo = self
            .repository
            .trim_start_matches("https://github.com/")
            .trim_end_matches('/');
        format!(
            "Update {} pre-commit hook from {} to {}",
            short_repo, self.current, self.latest
        )
    }

    /// Rewrite the hook's `rev:` field, leaving every other entry and all
    /// formatting untouched.
    pub fn apply(&self) -> Result<()> {
        let content = std::fs::read_to_string(&self.path)?;
        let rewritten = self.rewrite(&content)?;
        write_if_changed(&self.path, &content, &rewritten)
    }

    fn rewrite(&self, content: &str) -> Result<String> {
        let repo_re = Regex::new(r"^\s*-\s+repo:\s*(\S+)\s*$").unwrap();
        let rev_re = Regex::new(r#"^(\s*rev:\s*)(["']?)([^"'\s#]+)(["']?)(\s*(?:#.*)?)$"#).unwrap();

        let mut output = Vec::new();
        let mut in_target = false;
        let mut found = false;
        for line in content.lines() {
            if let Some(caps) = repo_re.captures(line) {
                in_target = &caps[1] == self.repository;
            } else if in_target {
                if let Some(caps) = rev_re.captures(line) {
                    output.push(format!(
                        "{}{}{}{}{}",
                        &caps[1], &caps[2], self.latest, &caps[4], &caps[5]
                    ));
                    found = true;
                    in_target = false;
                    continue;
                }
            }
            output.push(line.to_string());
        }

        if !found {
            return Err(Error::DependencyNotFound {
                name: self.repository.clone(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"repos:
  - repo: https://github.com/pre-commit/pre-commit-hooks
    rev: v3.1.0
    hooks:
      - id: check-yaml
      - id: trailing-whitespace
  - repo: https://github.com/timothycrosley/isort
    rev: 4.3.21  # pinned pending config rework
    hooks:
      - id: isort
"#;

    fn update(dir: &TempDir, repository: &str, current: &str, latest: &str) -> PreCommitUpdate {
        PreCommitUpdate {
            path: dir.path().join(".pre-commit-config.yaml"),
            repository: repository.to_string(),
            current: current.to_string(),
            latest: latest.to_string(),
        }
    }

    #[test]
    fn test_apply_changes_only_target_rev() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".pre-commit-config.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        update(
            &tmp,
            "https://github.com/pre-commit/pre-commit-hooks",
            "v3.1.0",
            "v3.4.0",
        )
        .apply()
        .unwrap();

        let result = std::fs::read_to_string(&path).unwrap();
        assert_eq!(result, CONFIG.replace("rev: v3.1.0", "rev: v3.4.0"));
        assert!(result.contains("rev: 4.3.21  # pinned pending config rework"));
    }

    #[test]
    fn test_apply_preserves_trailing_comment() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".pre-commit-config.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        update(
            &tmp,
            "https://github.com/timothycrosley/isort",
            "4.3.21",
            "5.0.0",
        )
        .apply()
        .unwrap();

        let result = std::fs::read_to_string(&path).unwrap();
        assert!(result.contains("rev: 5.0.0  # pinned pending config rework"));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".pre-commit-config.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        let u = update(
            &tmp,
            "https://github.com/pre-commit/pre-commit-hooks",
            "v3.1.0",
            "v3.4.0",
        );
        u.apply().unwrap();
        let once = std::fs::read_to_string(&path).unwrap();
        u.apply().unwrap();
        let twice = std::fs::read_to_string(&path).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_repository_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".pre-commit-config.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        let result = update(&tmp, "https://github.com/psf/black", "19.0", "20.0").apply();
        assert!(matches!(result, Err(Error::DependencyNotFound { .. })));
    }
}
