//! Assembles resolved entity data and relationship sentences into a document.
//!
//! Section order is fixed: metadata header, Types, Properties, Relationships.
//! Relationship sentences keep the order they were produced in (which follows
//! the Graph Index) and are deduplicated exactly.
//!
//! Source text is written one line per value: embedded line breaks become
//! spaces so a literal can never open a section of its own.

use std::borrow::Cow;
use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use pulldown_cmark::{html, Event, Options, Parser};

use crate::config::GeneratorConfig;
use crate::predicates::PropertyKind;
use crate::resolver::{PropertyValue, ResolvedEntity};

/// Placeholder line for an empty section.
const EMPTY_SECTION: &str = "_None._";

/// Renders the Markdown body of an entity document.
#[must_use]
pub fn assemble(
    resolved: &ResolvedEntity,
    statements: &[String],
    generated_at: &DateTime<Utc>,
    config: &GeneratorConfig,
) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str(&format!("# {}\n\n", one_line(&resolved.canonical_label)));
    out.push_str(&format!("- **Identifier:** `{}`\n", one_line(&resolved.id)));
    out.push_str(&format!(
        "- **Generated:** {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    out.push_str("\n## Types\n\n");
    if resolved.types.is_empty() {
        out.push_str(EMPTY_SECTION);
        out.push('\n');
    }
    for ty in &resolved.types {
        out.push_str(&format!("- {} (`{}`)\n", one_line(&ty.label), one_line(&ty.id)));
    }

    out.push_str("\n## Properties\n");
    if resolved.properties.is_empty() {
        out.push('\n');
        out.push_str(EMPTY_SECTION);
        out.push('\n');
    }
    for group in &resolved.properties {
        out.push_str(&format!("\n### {}\n\n", group.kind.heading()));
        for value in &group.values {
            out.push_str(&property_line(group.kind, value, config));
        }
    }

    out.push_str("\n## Relationships\n\n");
    let statements = dedup_statements(statements);
    if statements.is_empty() {
        out.push_str(EMPTY_SECTION);
        out.push('\n');
    }
    for statement in statements {
        out.push_str(&format!("- {}\n", one_line(statement)));
    }

    out
}

/// Drops repeated sentences, keeping the first occurrence of each.
#[must_use]
pub fn dedup_statements(statements: &[String]) -> Vec<&str> {
    let mut seen: HashSet<&str> = HashSet::new();
    statements
        .iter()
        .map(String::as_str)
        .filter(|s| seen.insert(*s))
        .collect()
}

/// Joins the lines of `text` with single spaces, dropping blank ones.
#[must_use]
pub fn one_line(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    let joined = text
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Cow::Owned(joined)
}

/// Cuts `text` to `max_chars` characters and appends `marker` when it is
/// longer than that.
#[must_use]
pub fn truncate(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", text[..cut].trim_end(), marker),
        None => text.to_string(),
    }
}

fn property_line(kind: PropertyKind, value: &PropertyValue, config: &GeneratorConfig) -> String {
    let flat = one_line(&value.text);
    let text = match (kind, config.max_comment_chars) {
        (PropertyKind::Comment, Some(max)) => truncate(&flat, max, &config.truncation_marker),
        _ => flat.into_owned(),
    };
    let mut line = match kind {
        PropertyKind::Label | PropertyKind::Comment => format!("- {text}"),
        PropertyKind::Geometry | PropertyKind::Date | PropertyKind::Other => {
            format!("- **{}**: {}", value.predicate, text)
        }
    };
    if let Some(lang) = &value.language {
        line.push_str(&format!(" ({lang})"));
    }
    if let Some(reference) = &value.reference {
        line.push_str(&format!(" (`{}`)", one_line(reference)));
    }
    line.push('\n');
    line
}

/// Converts Markdown to HTML using pulldown-cmark.
///
/// Raw HTML in the source (which can only come from graph literals) is
/// emitted as escaped text, never as markup.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, opts).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Wraps rendered document HTML in a standalone page.
#[must_use]
pub fn render_html_page(title: &str, identifier: &str, content_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta name="dc.identifier" content="{identifier}">
<title>{title}</title>
</head>
<body>
<main id="main-content">
<article class="entity-document">
{content_html}
</article>
</main>
</body>
</html>
"#,
        title = escape_html(title),
        identifier = escape_html(identifier),
        content_html = content_html,
    )
}

/// Escapes HTML special characters in a string.
#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{PropertyGroup, TypeRef};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn asinou() -> ResolvedEntity {
        ResolvedEntity {
            id: "http://example.org/Asinou".to_string(),
            canonical_label: "Asinou".to_string(),
            labels: Vec::new(),
            types: vec![TypeRef {
                id: "http://example.org/Church".to_string(),
                label: "Church".to_string(),
            }],
            properties: vec![
                PropertyGroup {
                    kind: PropertyKind::Label,
                    values: vec![
                        PropertyValue {
                            predicate: "label".to_string(),
                            text: "Asinou".to_string(),
                            language: Some("en".to_string()),
                            reference: None,
                        },
                        PropertyValue {
                            predicate: "label".to_string(),
                            text: "Panagia Phorbiottisa".to_string(),
                            language: Some("el".to_string()),
                            reference: None,
                        },
                    ],
                },
                PropertyGroup {
                    kind: PropertyKind::Comment,
                    values: vec![PropertyValue {
                        predicate: "comment".to_string(),
                        text: "A twelfth-century church in the Troodos mountains.".to_string(),
                        language: None,
                        reference: None,
                    }],
                },
            ],
        }
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let doc = assemble(
            &asinou(),
            &["Asinou is composed of Nave".to_string()],
            &at(),
            &GeneratorConfig::default(),
        );
        let header = doc.find("# Asinou").expect("header");
        let types = doc.find("## Types").expect("types");
        let props = doc.find("## Properties").expect("properties");
        let rels = doc.find("## Relationships").expect("relationships");
        assert!(header < types && types < props && props < rels);
        assert!(doc.contains("- **Generated:** 2024-05-01T12:00:00Z"));
        assert!(doc.contains("- Panagia Phorbiottisa (el)"));
        assert!(doc.contains("- Church (`http://example.org/Church`)"));
    }

    #[test]
    fn statements_dedup_without_reordering() {
        let statements = vec![
            "B precedes A".to_string(),
            "A is same as C".to_string(),
            "B precedes A".to_string(),
        ];
        assert_eq!(
            dedup_statements(&statements),
            vec!["B precedes A", "A is same as C"]
        );
    }

    #[test]
    fn empty_sections_are_marked() {
        let resolved = ResolvedEntity {
            id: "http://example.org/Ghost".to_string(),
            canonical_label: "Ghost".to_string(),
            labels: Vec::new(),
            types: Vec::new(),
            properties: Vec::new(),
        };
        let doc = assemble(&resolved, &[], &at(), &GeneratorConfig::default());
        assert_eq!(doc.matches(EMPTY_SECTION).count(), 3);
    }

    #[test]
    fn comments_truncate_with_marker() {
        let config = GeneratorConfig {
            max_comment_chars: Some(18),
            ..GeneratorConfig::default()
        };
        let doc = assemble(&asinou(), &[], &at(), &config);
        assert!(doc.contains("- A twelfth-century [...]\n"));
        // Labels are never truncated.
        assert!(doc.contains("- Panagia Phorbiottisa (el)"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Παναγία", 3, "…"), "Παν…");
        assert_eq!(truncate("short", 10, "…"), "short");
    }

    #[test]
    fn multi_line_literal_stays_in_its_list_item() {
        let mut resolved = asinou();
        resolved.properties[1].values[0].text =
            "First para.\n\n## Relationships\r\n\n- A is composed of Fake".to_string();
        let doc = assemble(&resolved, &[], &at(), &GeneratorConfig::default());

        let headings = doc.lines().filter(|l| *l == "## Relationships").count();
        assert_eq!(headings, 1);
        assert!(doc.contains("- First para. ## Relationships - A is composed of Fake\n"));
        assert!(!doc.lines().any(|l| l == "- A is composed of Fake"));
    }

    #[test]
    fn raw_html_is_escaped_in_html_output() {
        let html = markdown_to_html("# <script>alert(1)</script>\n\n<div onclick=\"x\">y</div>\n");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<div"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(markdown_to_html("**bold**").contains("<strong>bold</strong>"));
    }

    #[test]
    fn html_page_escapes_title() {
        let page = render_html_page("A & B", "http://example.org/x", "<p>x</p>");
        assert!(page.contains("<title>A &amp; B</title>"));
        assert!(markdown_to_html("# T\n").contains("<h1>T</h1>"));
    }
}
