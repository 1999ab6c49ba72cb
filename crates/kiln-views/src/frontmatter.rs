//! Frontmatter extraction and parsing.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Parsed frontmatter from a page template.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Layout to wrap the page in (file stem under the layouts directory)
    #[serde(default)]
    pub layout: Option<String>,

    /// Every other key, exposed to the templates as-is
    #[serde(flatten)]
    pub vars: BTreeMap<String, serde_json::Value>,
}

/// Extract frontmatter from a page template.
///
/// Returns the parsed frontmatter and the remaining template body.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    if !trimmed.starts_with("---") {
        return Ok((None, source));
    }

    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    if yaml_content.is_empty() {
        return Ok((Some(Frontmatter::default()), remaining.trim_start()));
    }

    let frontmatter: Frontmatter = serde_yaml::from_str(yaml_content)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    Ok((Some(frontmatter), remaining.trim_start()))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_layout_and_vars() {
        let source = r#"---
layout: landing
title: Contacts
tags: [a, b]
---

<h1>{{ title }}</h1>
"#;

        let (fm, body) = extract_frontmatter(source).unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.layout.as_deref(), Some("landing"));
        assert_eq!(fm.vars["title"], serde_json::json!("Contacts"));
        assert_eq!(fm.vars["tags"], serde_json::json!(["a", "b"]));
        assert!(body.starts_with("<h1>"));
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "<p>No frontmatter here.</p>";

        let (fm, body) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(body, source);
    }

    #[test]
    fn accepts_empty_block() {
        let (fm, body) = extract_frontmatter("---\n---\n<p>x</p>").unwrap();

        assert_eq!(fm, Some(Frontmatter::default()));
        assert_eq!(body, "<p>x</p>");
    }

    #[test]
    fn errors_on_unclosed_frontmatter() {
        let result = extract_frontmatter("---\ntitle: Test\n<p>No closing</p>");

        assert!(matches!(result, Err(FrontmatterError::Unclosed)));
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let result = extract_frontmatter("---\ntitle: [invalid yaml\n---\n");

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }
}
