//! Rendering of the normalized frontmatter and the `<doc_metadata>` block.

use docweave_shared::{Category, TransformedDocument};

/// Opening marker of the metadata comment block.
pub const METADATA_OPEN: &str = "<doc_metadata>";

/// Escape text for inclusion in XML element content or attributes.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Document type used in the metadata block.
fn doc_type(category: Category) -> &'static str {
    match category {
        Category::Tutorial => "tutorial",
        Category::Ref => "reference",
        _ => "guide",
    }
}

/// Frontmatter block including both `---` delimiters.
pub fn render_frontmatter(doc: &TransformedDocument) -> String {
    let title = serde_json::Value::from(doc.title.as_str());
    let tags = serde_json::Value::from(doc.tags.clone());
    format!(
        "---\nid: {}\ntitle: {title}\ncategory: {}\ntags: {tags}\ndifficulty: {}\nreading_time: {}\n---\n",
        doc.identity.id,
        doc.category,
        doc.difficulty.as_str(),
        doc.reading_time_minutes,
    )
}

/// `<doc_metadata>` block wrapped in an HTML comment.
pub fn render_metadata_block(doc: &TransformedDocument) -> String {
    let mut lines = vec![
        "<!--".to_string(),
        METADATA_OPEN.to_string(),
        format!("  <type>{}</type>", doc_type(doc.category)),
        format!("  <category>{}</category>", xml_escape(&doc.identity.subcategory)),
        format!("  <title>{}</title>", xml_escape(&doc.title)),
        format!("  <description>{}</description>", xml_escape(&doc.summary)),
        format!("  <difficulty_level>{}</difficulty_level>", doc.difficulty.as_str()),
        format!(
            "  <estimated_reading_time>{}</estimated_reading_time>",
            doc.reading_time_minutes
        ),
        format!("  <tags>{}</tags>", xml_escape(&doc.tags.join(","))),
    ];

    if doc.entities.is_empty() {
        lines.push("  <entities />".into());
    } else {
        lines.push("  <entities>".into());
        lines.extend(
            doc.entities
                .iter()
                .map(|e| format!("    <entity>{}</entity>", xml_escape(e))),
        );
        lines.push("  </entities>".into());
    }

    if doc.dependencies.is_empty() {
        lines.push("  <dependencies />".into());
    } else {
        lines.push("  <dependencies>".into());
        lines.extend(doc.dependencies.iter().map(|d| {
            format!(
                "    <dependency type=\"{}\">{}</dependency>",
                d.kind.as_str(),
                xml_escape(&d.name)
            )
        }));
        lines.push("  </dependencies>".into());
    }

    lines.push("</doc_metadata>".into());
    lines.push("-->".into());
    lines.join("\n")
}

/// Full output file: frontmatter, metadata block, then body.
pub fn render_document(doc: &TransformedDocument) -> String {
    format!(
        "{}\n{}\n\n{}\n",
        render_frontmatter(doc),
        render_metadata_block(doc),
        doc.body.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_shared::{Dependency, DependencyKind, Difficulty, DocumentIdentity};

    fn doc() -> TransformedDocument {
        TransformedDocument {
            identity: DocumentIdentity {
                id: "ref/api/auth".into(),
                output_filename: "ref-api-auth.md".into(),
                subcategory: "api".into(),
                slug: "auth".into(),
            },
            source_path: "api/auth.md".into(),
            title: "Auth \"tokens\" & keys".into(),
            category: Category::Ref,
            tags: vec!["reference".into(), "api".into(), "auth".into()],
            difficulty: Difficulty::Intermediate,
            reading_time_minutes: 3,
            word_count: 600,
            summary: "How <tokens> work.".into(),
            entities: vec!["GET /v1/token".into()],
            dependencies: vec![Dependency {
                name: "oauth".into(),
                kind: DependencyKind::Api,
            }],
            linked_doc_ids: vec![],
            body: "# Auth\n\nText.\n".into(),
        }
    }

    #[test]
    fn frontmatter_quotes_title_and_tags() {
        let fm = render_frontmatter(&doc());
        assert!(fm.starts_with("---\nid: ref/api/auth\n"));
        assert!(fm.contains("title: \"Auth \\\"tokens\\\" & keys\"\n"));
        assert!(fm.contains("tags: [\"reference\",\"api\",\"auth\"]\n"));
        assert!(fm.contains("reading_time: 3\n"));
        assert!(fm.ends_with("---\n"));
    }

    #[test]
    fn metadata_block_escapes_text() {
        let block = render_metadata_block(&doc());
        assert!(block.starts_with("<!--\n<doc_metadata>\n  <type>reference</type>"));
        assert!(block.contains("<title>Auth &quot;tokens&quot; &amp; keys</title>"));
        assert!(block.contains("<description>How &lt;tokens&gt; work.</description>"));
        assert!(block.contains("<estimated_reading_time>3</estimated_reading_time>"));
        assert!(block.contains("<dependency type=\"api\">oauth</dependency>"));
        assert!(block.ends_with("</doc_metadata>\n-->"));
    }

    #[test]
    fn document_layout() {
        let rendered = render_document(&doc());
        let body_start = rendered.find("-->\n\n# Auth").expect("body after block");
        assert!(body_start > 0);
        assert!(rendered.ends_with("Text.\n"));
    }
}
