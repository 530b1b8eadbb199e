//! Frontmatter and tag extraction from markdown notes

use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;
use tracing::debug;

/// Frontmatter key whose value `disable` keeps a note in place
pub const DISABLE_KEY: &str = "NoteMover";
const DISABLE_VALUE: &str = "disable";

static INLINE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(\[,;])#([\p{L}\p{N}_/\-]+)").expect("invalid inline tag regex")
});

/// What a note's content declares about itself
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub tags: Vec<String>,
    pub properties: IndexMap<String, Vec<String>>,
    pub disabled: bool,
}

/// Parse frontmatter properties, frontmatter tags and inline tags.
pub fn parse(content: &str) -> Metadata {
    let (yaml, body) = split_frontmatter(content);

    let mapping = yaml
        .and_then(|y| match serde_yaml::from_str::<Value>(y) {
            Ok(Value::Mapping(m)) => Some(m),
            Ok(Value::Null) => None,
            Ok(_) => {
                debug!("Frontmatter is not a mapping");
                None
            }
            Err(e) => {
                debug!("Invalid frontmatter: {}", e);
                None
            }
        })
        .unwrap_or_default();

    let mut metadata = Metadata::default();

    for (key, value) in &mapping {
        let Some(key) = scalar_text(key) else {
            continue;
        };

        if key == DISABLE_KEY && value.as_str() == Some(DISABLE_VALUE) {
            metadata.disabled = true;
        }

        if key == "tags" || key == "tag" {
            for tag in tag_values(value) {
                push_unique(&mut metadata.tags, tag);
            }
        }

        metadata.properties.insert(key, string_values(value));
    }

    for tag in inline_tags(body) {
        push_unique(&mut metadata.tags, tag);
    }

    metadata
}

/// Split a leading `---` block from the body
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, content)
}

/// Values of one property as a list of strings.
///
/// Lists keep their scalar members; a string is split on commas.
pub fn string_values(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Frontmatter tags, separated by commas or whitespace, `#`-prefixed
fn tag_values(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    };

    raw.iter()
        .flat_map(|s| s.split(|c: char| c == ',' || c.is_whitespace()))
        .map(|t| t.trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", t))
        .collect()
}

/// `#tag` tokens outside fenced code blocks. Purely numeric tokens are not tags.
fn inline_tags(body: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        for caps in INLINE_TAG_RE.captures_iter(line) {
            let name = &caps[1];
            if name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            tags.push(format!("#{}", name));
        }
    }

    tags
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}
