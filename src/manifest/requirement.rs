use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators allowed in a requirement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
    Ne,
    Compatible,
}

impl CompareOp {
    fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ne => "!=",
            CompareOp::Compatible => "~=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    pub op: CompareOp,
    pub version: String,
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// One line of a pip requirements file.
///
/// Grammar covered: `name[extra,extra]` followed by comma-separated
/// version constraints and an optional `;` environment marker. Anything
/// fancier (URLs, editable installs, hash pins) is rejected so the
/// operator sees the offending line instead of silent misparsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    pub constraints: Vec<VersionConstraint>,
    pub marker: Option<String>,
}

impl Requirement {
    /// Parse one non-empty, non-comment requirement line.
    pub fn parse(line: &str) -> Result<Requirement, String> {
        let line = strip_inline_comment(line).trim();
        if line.is_empty() {
            return Err("empty requirement".to_string());
        }
        if line.starts_with('-') {
            return Err(format!("pip options are not supported: {line}"));
        }
        if line.contains("://") || line.contains('@') {
            return Err(format!("URL requirements are not supported: {line}"));
        }

        let (spec, marker) = match line.split_once(';') {
            Some((spec, marker)) => (spec.trim(), Some(marker.trim().to_string())),
            None => (line, None),
        };

        let (name_part, constraint_part) = split_name(spec);
        let (name, extras) = parse_name_extras(name_part)?;
        let constraints = parse_constraints(constraint_part)?;

        Ok(Requirement {
            name,
            extras,
            constraints,
            marker,
        })
    }

    /// Distribution name normalized per the packaging rules: lowercase,
    /// runs of `-`, `_`, `.` collapsed to a single `-`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        let rendered: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join(","))?;
        if let Some(marker) = &self.marker {
            write!(f, " ; {marker}")?;
        }
        Ok(())
    }
}

/// Normalize a distribution name for comparisons.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = false;
    for ch in name.chars() {
        if ch == '-' || ch == '_' || ch == '.' {
            if !last_dash {
                out.push('-');
                last_dash = true;
            }
        } else {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        }
    }
    out.trim_matches('-').to_string()
}

/// Strip a trailing ` # comment`. A `#` glued to text is part of the value.
fn strip_inline_comment(line: &str) -> &str {
    match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line.strip_prefix('#').map_or(line, |_| ""),
    }
}

fn split_name(spec: &str) -> (&str, &str) {
    let idx = spec
        .find(|c| ['=', '>', '<', '!', '~'].contains(&c))
        .unwrap_or(spec.len());
    (spec[..idx].trim(), spec[idx..].trim())
}

fn parse_name_extras(name_part: &str) -> Result<(String, Vec<String>), String> {
    if name_part.is_empty() {
        return Err("missing package name".to_string());
    }

    let (name, extras) = match name_part.split_once('[') {
        Some((name, rest)) => {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("unterminated extras in {name_part}"))?;
            let extras = inner
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            (name.trim(), extras)
        }
        None => (name_part, Vec::new()),
    };

    if name.is_empty() {
        return Err("missing package name".to_string());
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ['-', '_', '.'].contains(&c));
    if !valid || !name.chars().next().unwrap().is_ascii_alphanumeric() {
        return Err(format!("invalid package name: {name}"));
    }

    Ok((name.to_string(), extras))
}

fn parse_constraints(constraint_part: &str) -> Result<Vec<VersionConstraint>, String> {
    if constraint_part.is_empty() {
        return Ok(Vec::new());
    }

    let mut constraints = Vec::new();
    for clause in constraint_part.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            return Err("empty version clause".to_string());
        }

        let (op, version) = if let Some(v) = clause.strip_prefix("==") {
            (CompareOp::Eq, v)
        } else if let Some(v) = clause.strip_prefix(">=") {
            (CompareOp::Ge, v)
        } else if let Some(v) = clause.strip_prefix("<=") {
            (CompareOp::Le, v)
        } else if let Some(v) = clause.strip_prefix("~=") {
            (CompareOp::Compatible, v)
        } else if let Some(v) = clause.strip_prefix("!=") {
            (CompareOp::Ne, v)
        } else if let Some(v) = clause.strip_prefix('>') {
            (CompareOp::Gt, v)
        } else if let Some(v) = clause.strip_prefix('<') {
            (CompareOp::Lt, v)
        } else {
            return Err(format!("unrecognized version clause: {clause}"));
        };

        let version = version.trim();
        if version.is_empty() {
            return Err(format!("missing version after {op}", op = op.as_str()));
        }
        let valid = version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ['.', '*', '+', '-', '_'].contains(&c));
        if !valid {
            return Err(format!("invalid version: {version}"));
        }

        constraints.push(VersionConstraint {
            op,
            version: version.to_string(),
        });
    }

    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_pinned_requirement() {
        let req = Requirement::parse("torch==2.1.0").unwrap();
        assert_eq!(req.name, "torch");
        assert_eq!(req.constraints.len(), 1);
        assert_eq!(req.constraints[0].op, CompareOp::Eq);
        assert_eq!(req.constraints[0].version, "2.1.0");
    }

    #[test]
    fn parses_extras_and_ranges() {
        let req = Requirement::parse("uvicorn[standard]>=0.23.0,<1.0").unwrap();
        assert_eq!(req.name, "uvicorn");
        assert_eq!(req.extras, vec!["standard"]);
        assert_eq!(req.constraints.len(), 2);
        assert_eq!(req.constraints[1].op, CompareOp::Lt);
    }

    #[test]
    fn parses_bare_name() {
        let req = Requirement::parse("streamlit").unwrap();
        assert_eq!(req.name, "streamlit");
        assert!(req.constraints.is_empty());
        assert!(req.extras.is_empty());
    }

    #[test]
    fn keeps_environment_marker() {
        let req = Requirement::parse("uvloop>=0.17 ; sys_platform != \"win32\"").unwrap();
        assert_eq!(req.name, "uvloop");
        assert_eq!(req.marker.as_deref(), Some("sys_platform != \"win32\""));
    }

    #[test]
    fn strips_trailing_comment() {
        let req = Requirement::parse("fastapi==0.104.1  # web framework").unwrap();
        assert_eq!(req.name, "fastapi");
        assert_eq!(req.constraints[0].version, "0.104.1");
    }

    #[test]
    fn rejects_url_requirements() {
        assert!(Requirement::parse("torch @ https://example.com/torch.whl").is_err());
        assert!(Requirement::parse("git+https://example.com/repo.git").is_err());
    }

    #[test]
    fn rejects_pip_options() {
        assert!(Requirement::parse("-r other.txt").is_err());
        assert!(Requirement::parse("--index-url https://example.com").is_err());
    }

    #[test]
    fn rejects_garbage_clause() {
        assert!(Requirement::parse("fastapi=0.104").is_err());
        assert!(Requirement::parse("==1.0").is_err());
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("Sentence_Transformers"), "sentence-transformers");
        assert_eq!(normalize_name("PyYAML"), "pyyaml");
        assert_eq!(normalize_name("ruamel.yaml"), "ruamel-yaml");
    }

    #[test]
    fn renders_canonical_form() {
        let req = Requirement::parse("uvicorn[standard]>=0.23.0,<1.0").unwrap();
        assert_eq!(req.to_string(), "uvicorn[standard]>=0.23.0,<1.0");
    }

    proptest! {
        #[test]
        fn parse_never_panics(line in ".{0,120}") {
            let _ = Requirement::parse(&line);
        }

        #[test]
        fn valid_pins_always_parse(
            name in "[a-zA-Z][a-zA-Z0-9_-]{0,30}",
            major in 0u32..100,
            minor in 0u32..100,
        ) {
            let line = format!("{name}=={major}.{minor}");
            let req = Requirement::parse(&line).unwrap();
            prop_assert_eq!(req.name, name);
            prop_assert_eq!(req.constraints.len(), 1);
        }
    }
}
