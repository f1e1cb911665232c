//! Section splitting for markdown and block-structured documents.
//!
//! Sections are keyed by their lowercased heading text. A heading with no
//! lines before the next heading produces no entry; a heading followed only
//! by blank lines keeps an empty-string entry. When a markdown document has
//! no headings at all, `**Label:** value` pairs stand in as sections.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,3}\s+(.+)$").unwrap());

static BOLD_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+):\*\*([^*\n]*)").unwrap());

/// Splits markdown content on H1–H3 headings.
pub fn sections_from_markdown(content: &str) -> Map<String, Value> {
    let mut sections = Map::new();
    let mut current: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(caps) = HEADING_RE.captures(line) {
            if let Some(heading) = current.take()
                && !body.is_empty()
            {
                sections.insert(heading, joined(&body));
            }
            current = Some(caps[1].to_lowercase());
            body.clear();
        } else if current.is_some() {
            body.push(line);
        }
    }
    if let Some(heading) = current
        && !body.is_empty()
    {
        sections.insert(heading, joined(&body));
    }

    if sections.is_empty() {
        for caps in BOLD_PAIR_RE.captures_iter(content) {
            let value = caps[2].trim();
            if !value.is_empty() {
                sections.insert(caps[1].to_lowercase(), Value::String(value.to_string()));
            }
        }
    }

    sections
}

/// Splits a block-structured document (`blocks[].{type, text}`) on heading
/// blocks; paragraph blocks accumulate under the current heading.
pub fn sections_from_blocks(blocks: &[Value]) -> Map<String, Value> {
    let mut sections = Map::new();
    let mut current: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for block in blocks {
        let text = block.get("text").and_then(Value::as_str).unwrap_or("");
        match block.get("type").and_then(Value::as_str) {
            Some("heading") => {
                if let Some(heading) = current.take()
                    && !body.is_empty()
                {
                    sections.insert(heading, joined(&body));
                }
                current = Some(text.to_lowercase());
                body.clear();
            }
            Some("paragraph") if current.is_some() => body.push(text),
            _ => {}
        }
    }
    if let Some(heading) = current
        && !body.is_empty()
    {
        sections.insert(heading, joined(&body));
    }

    sections
}

fn joined(body: &[&str]) -> Value {
    Value::String(body.join("\n").trim().to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_split_into_sections() {
        let content = "\
# Vigência
O contrato vigora por 24 meses.

## Pagamento
Pagamento mensal de R$ 10.000,00.
Vencimento todo dia 5.
";
        let sections = sections_from_markdown(content);
        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections["vigência"],
            Value::String("O contrato vigora por 24 meses.".into())
        );
        assert_eq!(
            sections["pagamento"],
            Value::String("Pagamento mensal de R$ 10.000,00.\nVencimento todo dia 5.".into())
        );
    }

    #[test]
    fn heading_with_no_body_produces_no_entry() {
        let content = "# Empty\n## Filled\ntext here\n";
        let sections = sections_from_markdown(content);
        assert_eq!(sections.len(), 1);
        assert!(sections.contains_key("filled"));
    }

    #[test]
    fn blank_body_keeps_empty_string_entry() {
        let content = "# Spacer\n\n\n";
        let sections = sections_from_markdown(content);
        assert_eq!(sections["spacer"], Value::String(String::new()));
    }

    #[test]
    fn later_duplicate_heading_wins() {
        let content = "# Terms\nfirst\n# Terms\nsecond\n";
        let sections = sections_from_markdown(content);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections["terms"], Value::String("second".into()));
    }

    #[test]
    fn bold_pairs_stand_in_when_no_headings() {
        let content = "**Client:** TechCorp Inc.\n**Empty:**\n**Vendor:** DevSolutions\n";
        let sections = sections_from_markdown(content);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections["client"], Value::String("TechCorp Inc.".into()));
        assert!(!sections.contains_key("empty"));
    }

    #[test]
    fn bold_pairs_are_ignored_when_headings_exist() {
        let content = "# Main\n**Client:** TechCorp\n";
        let sections = sections_from_markdown(content);
        assert_eq!(sections.len(), 1);
        assert!(sections.contains_key("main"));
    }

    #[test]
    fn blocks_split_on_heading_blocks() {
        let blocks = vec![
            serde_json::json!({"type": "paragraph", "text": "preamble is dropped"}),
            serde_json::json!({"type": "heading", "text": "Scope"}),
            serde_json::json!({"type": "paragraph", "text": "first"}),
            serde_json::json!({"type": "paragraph", "text": "second"}),
            serde_json::json!({"type": "heading", "text": "Term"}),
            serde_json::json!({"type": "paragraph", "text": "24 months"}),
        ];
        let sections = sections_from_blocks(&blocks);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections["scope"], Value::String("first\nsecond".into()));
        assert_eq!(sections["term"], Value::String("24 months".into()));
    }

    #[test]
    fn blocks_without_headings_yield_nothing() {
        let blocks = vec![serde_json::json!({"type": "paragraph", "text": "loose"})];
        assert!(sections_from_blocks(&blocks).is_empty());
    }
}
