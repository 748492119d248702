use crate::secrets::error::{Result, SecretError};
use crate::types::{PlatformKind, TargetDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

const REDACTED: &str = "********";

/// A problem found while validating secrets against a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretProblem {
    pub key: String,
    pub issue: String,
    pub remediation: String,
    /// Blocking problems must be fixed before the app can serve its
    /// first request; the rest are advisories.
    pub blocking: bool,
}

/// Flat TOML key-value store for deployment secrets.
///
/// Values never appear in logs or reports. The only place a real value
/// leaves this type is [`SecretStore::render_for`], which exists to be
/// pasted into a platform dashboard.
#[derive(Debug, Clone)]
pub struct SecretStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl SecretStore {
    /// Default location outside any work tree, so secrets stay out of
    /// version control by construction.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(SecretError::NoConfigDir)?;
        Ok(base.join("aether-deploy").join("secrets.toml"))
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| SecretError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::parse(&content, path)
    }

    /// Load a store, treating a missing file as empty.
    pub async fn load_or_empty(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path).await
        } else {
            debug!(path = %path.display(), "secrets file absent, starting empty");
            Ok(Self::empty(path))
        }
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(content).map_err(|source| SecretError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let mut values = BTreeMap::new();
        for (key, value) in table {
            match value {
                toml::Value::String(s) => {
                    values.insert(key, s);
                }
                _ => return Err(SecretError::NonStringValue { key }),
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SecretError::WriteFailed {
                    path: self.path.clone(),
                    source,
                })?;
        }

        let rendered = self.render_toml();
        tokio::fs::write(&self.path, rendered)
            .await
            .map_err(|source| SecretError::WriteFailed {
                path: self.path.clone(),
                source,
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms).map_err(|source| {
                SecretError::WriteFailed {
                    path: self.path.clone(),
                    source,
                }
            })?;
        }

        info!(path = %self.path.display(), keys = self.values.len(), "secrets saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Key listing safe to print: every value replaced by a mask.
    pub fn redacted(&self) -> BTreeMap<String, String> {
        self.values
            .keys()
            .map(|k| (k.clone(), REDACTED.to_string()))
            .collect()
    }

    /// Check the store against what a target needs before first request.
    pub fn validate(&self, target: &TargetDescriptor) -> Vec<SecretProblem> {
        let mut problems = Vec::new();

        for key in &target.required_secrets {
            match self.get(key) {
                None => problems.push(SecretProblem {
                    key: key.clone(),
                    issue: "not configured".to_string(),
                    remediation: format!(
                        "set it with `aether-deploy secrets set {key} <value>` and add it in the {} dashboard",
                        target.display_name
                    ),
                    blocking: true,
                }),
                Some(value) if value.trim().is_empty() => problems.push(SecretProblem {
                    key: key.clone(),
                    issue: "configured but empty".to_string(),
                    remediation: format!("give {key} a real value before deploying"),
                    blocking: true,
                }),
                Some(_) => {}
            }
        }

        if let Some(api_url) = self.get("API_URL") {
            if !api_url.trim().is_empty() {
                problems.extend(validate_api_url(api_url));
            }
        }

        problems
    }

    /// Paste-able configuration block for a platform dashboard. This is
    /// the one deliberate place real values are shown.
    pub fn render_for(&self, target: &TargetDescriptor) -> String {
        let mut lines = Vec::new();
        match target.kind {
            PlatformKind::StreamlitCloud => {
                lines.push("# Paste into share.streamlit.io -> App settings -> Secrets".to_string());
            }
            PlatformKind::HuggingFaceSpaces => {
                lines.push(
                    "# Add each entry under Settings -> Variables and secrets".to_string(),
                );
            }
            PlatformKind::Render => {
                lines.push("# Add as environment variables in the Render dashboard".to_string());
            }
            PlatformKind::Replit => {
                lines.push("# Add each entry in the Replit Secrets pane".to_string());
            }
        }

        let toml_style = matches!(
            target.kind,
            PlatformKind::StreamlitCloud | PlatformKind::HuggingFaceSpaces
        );

        for key in self.render_keys(target) {
            let value = self.get(&key).unwrap_or_default();
            if toml_style {
                lines.push(format!("{key} = {}", toml_string(value)));
            } else {
                lines.push(format!("{key}={value}"));
            }
        }

        lines.join("\n") + "\n"
    }

    /// Required keys first (with placeholders when unset), then the rest.
    fn render_keys(&self, target: &TargetDescriptor) -> Vec<String> {
        let mut keys: Vec<String> = target.required_secrets.clone();
        for key in self.values.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    fn render_toml(&self) -> String {
        let mut out = String::from("# AETHER deployment secrets. Keep this file out of version control.\n");
        for (key, value) in &self.values {
            out.push_str(&format!("{key} = {}\n", toml_string(value)));
        }
        out
    }
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn validate_api_url(api_url: &str) -> Vec<SecretProblem> {
    let mut problems = Vec::new();

    match Url::parse(api_url) {
        Ok(url) => {
            let local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
            if url.scheme() == "http" && !local {
                problems.push(SecretProblem {
                    key: "API_URL".to_string(),
                    issue: "plain http to a non-local host".to_string(),
                    remediation:
                        "serve the backend over HTTPS; hosted frontends block mixed content"
                            .to_string(),
                    blocking: false,
                });
            } else if !["http", "https"].contains(&url.scheme()) {
                problems.push(SecretProblem {
                    key: "API_URL".to_string(),
                    issue: format!("unsupported scheme {}", url.scheme()),
                    remediation: "use an http(s) URL pointing at the deployed API".to_string(),
                    blocking: true,
                });
            }
            if local {
                problems.push(SecretProblem {
                    key: "API_URL".to_string(),
                    issue: "points at localhost".to_string(),
                    remediation:
                        "a cloud frontend cannot reach localhost; use the deployed backend URL"
                            .to_string(),
                    blocking: false,
                });
            }
        }
        Err(e) => problems.push(SecretProblem {
            key: "API_URL".to_string(),
            issue: format!("not a valid URL: {e}"),
            remediation: "use an http(s) URL pointing at the deployed API".to_string(),
            blocking: true,
        }),
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::registry;

    fn store_with(pairs: &[(&str, &str)]) -> SecretStore {
        let mut store = SecretStore::empty("/tmp/secrets.toml");
        for (k, v) in pairs {
            store.set(*k, *v);
        }
        store
    }

    #[test]
    fn parses_flat_toml() {
        let store = SecretStore::parse(
            "API_URL = \"https://api.example.com\"\nOPENAI_API_KEY = \"sk-test\"\n",
            Path::new("secrets.toml"),
        )
        .unwrap();
        assert_eq!(store.get("API_URL"), Some("https://api.example.com"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn rejects_non_string_values() {
        let err = SecretStore::parse("PORT = 8000\n", Path::new("secrets.toml")).unwrap_err();
        match err {
            SecretError::NonStringValue { key } => assert_eq!(key, "PORT"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn redaction_never_shows_values() {
        let store = store_with(&[("OPENAI_API_KEY", "sk-secret-value")]);
        let redacted = store.redacted();
        assert_eq!(redacted["OPENAI_API_KEY"], "********");
        assert!(!format!("{redacted:?}").contains("sk-secret-value"));
    }

    #[test]
    fn missing_required_key_is_blocking() {
        let store = store_with(&[]);
        let target = registry::descriptor(crate::types::PlatformKind::Render);
        let problems = store.validate(target);
        assert!(problems
            .iter()
            .any(|p| p.key == "OPENAI_API_KEY" && p.blocking));
    }

    #[test]
    fn empty_value_is_blocking() {
        let store = store_with(&[("API_URL", "  ")]);
        let target = registry::descriptor(crate::types::PlatformKind::StreamlitCloud);
        let problems = store.validate(target);
        assert!(problems.iter().any(|p| p.key == "API_URL" && p.blocking));
    }

    #[test]
    fn plain_http_remote_url_warns_about_https() {
        let store = store_with(&[("API_URL", "http://api.example.com")]);
        let target = registry::descriptor(crate::types::PlatformKind::StreamlitCloud);
        let problems = store.validate(target);
        let https = problems
            .iter()
            .find(|p| p.remediation.contains("HTTPS"))
            .expect("expected HTTPS advisory");
        assert!(!https.blocking);
    }

    #[test]
    fn localhost_url_warns_for_cloud_frontend() {
        let store = store_with(&[("API_URL", "http://localhost:8000")]);
        let target = registry::descriptor(crate::types::PlatformKind::StreamlitCloud);
        let problems = store.validate(target);
        assert!(problems.iter().any(|p| p.issue.contains("localhost")));
    }

    #[test]
    fn streamlit_render_is_toml_with_placeholders() {
        let store = store_with(&[]);
        let target = registry::descriptor(crate::types::PlatformKind::StreamlitCloud);
        let block = store.render_for(target);
        assert!(block.contains("App settings"));
        assert!(block.contains("API_URL = \"\""));
    }

    #[test]
    fn render_env_style_for_render() {
        let store = store_with(&[("OPENAI_API_KEY", "sk-test")]);
        let target = registry::descriptor(crate::types::PlatformKind::Render);
        let block = store.render_for(target);
        assert!(block.contains("OPENAI_API_KEY=sk-test"));
    }

    #[tokio::test]
    async fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        let mut store = SecretStore::empty(&path);
        store.set("API_URL", "https://api.example.com");
        store.save().await.unwrap();

        let reloaded = SecretStore::load(&path).await.unwrap();
        assert_eq!(reloaded.get("API_URL"), Some("https://api.example.com"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
