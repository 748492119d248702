use crate::repo::error::Result;
use git2::{IndexAddOption, Repository, Signature};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, info};

/// Ignore rules every prepared work tree gets. Secret files and caches
/// must never reach the remote.
pub const IGNORE_RULES: &[&str] = &[
    "__pycache__/",
    "*.pyc",
    ".env",
    "secrets.toml",
    ".streamlit/secrets.toml",
    "venv/",
    ".venv/",
    "*.log",
    ".DS_Store",
];

/// What [`RepoPreparer::prepare`] did to the work tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareOutcome {
    pub initialized: bool,
    pub ignore_updated: bool,
    /// New commit id, or `None` when the tree already matched HEAD.
    pub commit: Option<String>,
    pub staged_files: usize,
    pub branch: String,
}

/// Initializes version control, maintains ignore rules, stages the tree,
/// and commits. Safe to re-run; an unchanged tree commits nothing.
pub struct RepoPreparer;

impl RepoPreparer {
    pub async fn prepare(root: &Path, message: &str) -> Result<PrepareOutcome> {
        let root = root.to_path_buf();
        let message = message.to_string();
        task::spawn_blocking(move || Self::prepare_sync(&root, &message)).await?
    }

    fn prepare_sync(root: &Path, message: &str) -> Result<PrepareOutcome> {
        let (repo, initialized) = match Repository::open(root) {
            Ok(repo) => (repo, false),
            Err(_) => {
                info!(path = %root.display(), "initializing repository");
                (Repository::init(root)?, true)
            }
        };

        let ignore_updated = ensure_ignore_rules(&root.join(".gitignore"))?;

        let mut index = repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let staged_files = index.len();

        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let head_commit = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };

        // Nothing to commit when the staged tree matches HEAD.
        if let Some(parent) = &head_commit {
            if parent.tree_id() == tree_id {
                debug!("work tree matches HEAD, no commit created");
                return Ok(PrepareOutcome {
                    initialized,
                    ignore_updated,
                    commit: None,
                    staged_files,
                    branch: current_branch(&repo),
                });
            }
        }

        let signature = deploy_signature(&repo)?;
        let parents: Vec<&git2::Commit> = head_commit.iter().collect();
        let commit_id = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        // The guides publish to `main`; rename the default branch on the
        // first commit the way `git branch -M main` does.
        if head_commit.is_none() {
            let branch_name = current_branch(&repo);
            if branch_name != "main" {
                let mut branch = repo.find_branch(&branch_name, git2::BranchType::Local)?;
                branch.rename("main", true)?;
                repo.set_head("refs/heads/main")?;
            }
        }

        info!(commit = %commit_id, "committed work tree");
        Ok(PrepareOutcome {
            initialized,
            ignore_updated,
            commit: Some(commit_id.to_string()),
            staged_files,
            branch: current_branch(&repo),
        })
    }
}

fn current_branch(repo: &Repository) -> String {
    repo.head()
        .ok()
        .and_then(|h| h.shorthand().map(str::to_string))
        .unwrap_or_else(|| "main".to_string())
}

/// Committer identity, falling back to a deploy signature when the
/// operator has no git identity configured.
fn deploy_signature(repo: &Repository) -> Result<Signature<'static>> {
    match repo.signature() {
        Ok(sig) => Ok(sig),
        Err(_) => Ok(Signature::now("AETHER Deploy", "deploy@aether.local")?),
    }
}

/// Create or extend `.gitignore`; returns whether anything changed.
fn ensure_ignore_rules(path: &PathBuf) -> Result<bool> {
    let existing = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let present: Vec<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<&str> = IGNORE_RULES
        .iter()
        .copied()
        .filter(|rule| !present.contains(rule))
        .collect();

    if missing.is_empty() {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    for rule in missing {
        updated.push_str(rule);
        updated.push('\n');
    }
    std::fs::write(path, updated)?;
    Ok(true)
}
