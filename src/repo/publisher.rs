use crate::repo::error::{RepoError, Result};
use git2::Repository;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOptions {
    pub remote_name: String,
    /// Existing repository URL to link instead of creating one.
    pub remote_url: Option<String>,
    /// Repository to create with `gh repo create` (name or owner/name).
    pub create_repo: Option<String>,
    pub private: bool,
    pub branch: String,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            remote_name: "origin".to_string(),
            remote_url: None,
            create_repo: None,
            private: false,
            branch: "main".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub remote_name: String,
    pub remote_url: String,
    pub branch: String,
    pub created_repo: bool,
    pub pushed: bool,
}

/// Creates or links the remote repository and pushes the current branch.
///
/// Network operations go through the `git` and `gh` CLIs so the
/// operator's credential helpers and `gh auth` sessions apply unchanged.
pub struct RemotePublisher;

impl RemotePublisher {
    pub async fn publish(root: &Path, options: &PublishOptions) -> Result<PublishOutcome> {
        require_tool(
            "git",
            "Install it from https://git-scm.com/downloads and re-run.",
        )?;

        if let Some(repo_name) = &options.create_repo {
            return Self::create_and_push(root, repo_name, options).await;
        }

        let remote_url = Self::ensure_remote(root, options)?;
        Self::push(root, &options.remote_name, &options.branch).await?;

        Ok(PublishOutcome {
            remote_name: options.remote_name.clone(),
            remote_url,
            branch: options.branch.clone(),
            created_repo: false,
            pushed: true,
        })
    }

    /// `gh repo create` makes the repository, wires the remote, and
    /// pushes in one step.
    async fn create_and_push(
        root: &Path,
        repo_name: &str,
        options: &PublishOptions,
    ) -> Result<PublishOutcome> {
        require_tool(
            "gh",
            "Install the GitHub CLI from https://cli.github.com and run `gh auth login`, \
             or pass --remote-url to link an existing repository instead.",
        )?;

        let visibility = if options.private {
            "--private"
        } else {
            "--public"
        };
        run_command(
            root,
            "gh",
            &[
                "repo",
                "create",
                repo_name,
                visibility,
                "--source",
                ".",
                "--remote",
                &options.remote_name,
                "--push",
            ],
        )
        .await?;

        let remote_url = remote_url_of(root, &options.remote_name)
            .unwrap_or_else(|| format!("https://github.com/{repo_name}"));
        info!(repo = repo_name, url = %remote_url, "repository created and pushed");

        Ok(PublishOutcome {
            remote_name: options.remote_name.clone(),
            remote_url,
            branch: options.branch.clone(),
            created_repo: true,
            pushed: true,
        })
    }

    /// Point `remote_name` at the requested URL, or keep whatever is
    /// already configured when no URL was given.
    fn ensure_remote(root: &Path, options: &PublishOptions) -> Result<String> {
        let repo = Repository::open(root)?;

        let result = match (&options.remote_url, repo.find_remote(&options.remote_name)) {
            (Some(url), Ok(existing)) => {
                if existing.url() != Some(url.as_str()) {
                    warn!(
                        remote = %options.remote_name,
                        "re-pointing existing remote at {url}"
                    );
                    repo.remote_set_url(&options.remote_name, url)?;
                }
                Ok(url.clone())
            }
            (Some(url), Err(_)) => {
                repo.remote(&options.remote_name, url)?;
                debug!(remote = %options.remote_name, url = %url, "remote added");
                Ok(url.clone())
            }
            (None, Ok(existing)) => Ok(existing.url().unwrap_or_default().to_string()),
            (None, Err(_)) => Err(RepoError::NoRemote),
        };
        result
    }

    async fn push(root: &Path, remote: &str, branch: &str) -> Result<()> {
        run_command(root, "git", &["push", "-u", remote, branch]).await?;
        info!(remote, branch, "pushed");
        Ok(())
    }
}

fn require_tool(tool: &str, instructions: &str) -> Result<()> {
    which::which(tool).map_err(|_| RepoError::ToolMissing {
        tool: tool.to_string(),
        instructions: instructions.to_string(),
    })?;
    Ok(())
}

fn remote_url_of(root: &Path, remote_name: &str) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let remote = repo.find_remote(remote_name).ok()?;
    remote.url().map(str::to_string)
}

async fn run_command(root: &Path, program: &str, args: &[&str]) -> Result<String> {
    debug!(program, ?args, "running command");
    let output = Command::new(program)
        .args(args)
        .current_dir(root)
        .output()
        .await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(RepoError::CommandFailed {
            command: format!("{program} {}", args.join(" ")),
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::preparer::RepoPreparer;

    #[tokio::test]
    async fn linking_a_url_adds_the_remote() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.py"), "\n").unwrap();
        RepoPreparer::prepare(dir.path(), "init").await.unwrap();

        let options = PublishOptions {
            remote_url: Some("https://github.com/example/aether.git".to_string()),
            ..Default::default()
        };
        let url = RemotePublisher::ensure_remote(dir.path(), &options).unwrap();

        assert_eq!(url, "https://github.com/example/aether.git");
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(
            repo.find_remote("origin").unwrap().url(),
            Some("https://github.com/example/aether.git")
        );
    }

    #[tokio::test]
    async fn relinking_repoints_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.py"), "\n").unwrap();
        RepoPreparer::prepare(dir.path(), "init").await.unwrap();

        let first = PublishOptions {
            remote_url: Some("https://github.com/example/old.git".to_string()),
            ..Default::default()
        };
        RemotePublisher::ensure_remote(dir.path(), &first).unwrap();

        let second = PublishOptions {
            remote_url: Some("https://github.com/example/new.git".to_string()),
            ..Default::default()
        };
        RemotePublisher::ensure_remote(dir.path(), &second).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let remotes = repo.remotes().unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(
            repo.find_remote("origin").unwrap().url(),
            Some("https://github.com/example/new.git")
        );
    }

    #[tokio::test]
    async fn publish_without_remote_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.py"), "\n").unwrap();
        RepoPreparer::prepare(dir.path(), "init").await.unwrap();

        let outcome = RemotePublisher::ensure_remote(dir.path(), &PublishOptions::default());
        assert!(matches!(outcome, Err(RepoError::NoRemote)));
    }

    #[test]
    fn missing_tool_names_the_tool() {
        let err = require_tool("definitely-not-a-real-tool-xyz", "install it").unwrap_err();
        match err {
            RepoError::ToolMissing { tool, .. } => {
                assert_eq!(tool, "definitely-not-a-real-tool-xyz")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
