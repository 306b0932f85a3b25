//! Internal link resolution and rewriting.
//!
//! Relative targets are resolved against the linking file's directory and
//! matched exactly against the source paths of known documents. Matches are
//! rewritten to the flat output filename; everything else is left untouched.

use docweave_shared::LinkMap;
use docweave_shared::syntax::{self, FenceTracker, LineClass};

/// A relative link target resolved to a source-root path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget<'a> {
    /// Normalized `/`-separated path relative to the source root.
    pub path: String,
    /// Anchor including the leading `#`, if any.
    pub anchor: Option<&'a str>,
}

/// Resolve `target` as written in the file at `source_path`.
///
/// Returns `None` for external URLs, anchor-only links, root-absolute paths,
/// and paths that escape the source root.
pub fn resolve_target<'a>(source_path: &str, target: &'a str) -> Option<ResolvedTarget<'a>> {
    // `[x](path "title")`
    let target = target.split_whitespace().next()?;
    if target.starts_with('#') || target.starts_with('/') || syntax::is_external(target) {
        return None;
    }

    let (path_part, anchor) = match target.find('#') {
        Some(idx) => (&target[..idx], Some(&target[idx..])),
        None => (target, None),
    };
    if path_part.is_empty() {
        return None;
    }

    let mut segments: Vec<&str> = source_path.split('/').collect();
    segments.pop();

    for part in path_part.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    (!segments.is_empty()).then(|| ResolvedTarget {
        path: segments.join("/"),
        anchor,
    })
}

/// The rewritten target for a link, if it points at a known document.
pub fn rewrite_target(source_path: &str, target: &str, links: &LinkMap) -> Option<String> {
    let resolved = resolve_target(source_path, target)?;
    let identity = links.get(&resolved.path)?;
    Some(format!(
        "./{}{}",
        identity.output_filename,
        resolved.anchor.unwrap_or_default()
    ))
}

/// Result of rewriting every link in a body.
#[derive(Debug, Clone, Default)]
pub struct RewrittenLinks {
    pub body: String,
    /// IDs of known documents linked to, in first-seen order, excluding self.
    pub linked_doc_ids: Vec<String>,
}

/// Rewrite internal links in `body` that resolve to known documents.
pub fn rewrite_links(body: &str, source_path: &str, links: &LinkMap) -> RewrittenLinks {
    let self_id = links.get(source_path).map(|identity| identity.id.as_str());
    let mut fences = FenceTracker::new();
    let mut linked_doc_ids: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for line in body.lines() {
        if fences.classify(line) != LineClass::Text {
            out.push(line.to_string());
            continue;
        }

        let mut rewritten = String::with_capacity(line.len());
        let mut cursor = 0;
        for (range, text, target) in syntax::line_links(line) {
            let Some(resolved) = resolve_target(source_path, target) else {
                continue;
            };
            let Some(identity) = links.get(&resolved.path) else {
                continue;
            };

            rewritten.push_str(&line[cursor..range.start]);
            rewritten.push_str(&format!(
                "[{text}](./{}{})",
                identity.output_filename,
                resolved.anchor.unwrap_or_default()
            ));
            cursor = range.end;

            if Some(identity.id.as_str()) != self_id && !linked_doc_ids.contains(&identity.id) {
                linked_doc_ids.push(identity.id.clone());
            }
        }
        rewritten.push_str(&line[cursor..]);
        out.push(rewritten);
    }

    let mut body_out = out.join("\n");
    if body.ends_with('\n') {
        body_out.push('\n');
    }

    RewrittenLinks {
        body: body_out,
        linked_doc_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_shared::DocumentIdentity;

    fn link_map() -> LinkMap {
        let mut map = LinkMap::new();
        for (path, id) in [
            ("guide/setup.md", "tutorial/guide/setup"),
            ("ref/api.md", "ref/ref/api"),
            ("index.md", "meta/general/index"),
        ] {
            map.insert(
                path.into(),
                DocumentIdentity {
                    id: id.into(),
                    output_filename: format!("{}.md", id.replace('/', "-")),
                    subcategory: id.split('/').nth(1).unwrap_or_default().into(),
                    slug: id.rsplit('/').next().unwrap_or_default().into(),
                },
            );
        }
        map
    }

    #[test]
    fn resolves_relative_paths() {
        let resolved = resolve_target("guide/setup.md", "../ref/api.md#auth").expect("resolve");
        assert_eq!(resolved.path, "ref/api.md");
        assert_eq!(resolved.anchor, Some("#auth"));

        let resolved = resolve_target("guide/setup.md", "./next.md").expect("resolve");
        assert_eq!(resolved.path, "guide/next.md");
    }

    #[test]
    fn skips_external_anchor_and_rooted_targets() {
        assert!(resolve_target("a.md", "https://example.com/x.md").is_none());
        assert!(resolve_target("a.md", "#section").is_none());
        assert!(resolve_target("a.md", "/abs/path.md").is_none());
        assert!(resolve_target("a.md", "../../outside.md").is_none());
    }

    #[test]
    fn rewrites_known_targets_only() {
        let body = "See [API](../ref/api.md#auth), [missing](./nope.md), and [site](https://x.io).\n";
        let result = rewrite_links(body, "guide/setup.md", &link_map());
        assert_eq!(
            result.body,
            "See [API](./ref-ref-api.md#auth), [missing](./nope.md), and [site](https://x.io).\n"
        );
        assert_eq!(result.linked_doc_ids, vec!["ref/ref/api".to_string()]);
    }

    #[test]
    fn leaves_fenced_and_image_links() {
        let body = "![diagram](../ref/api.md)\n```\n[API](../ref/api.md)\n```";
        let result = rewrite_links(body, "guide/setup.md", &link_map());
        assert_eq!(result.body, body);
        assert!(result.linked_doc_ids.is_empty());
    }

    #[test]
    fn self_links_not_counted() {
        let body = "[Top](./setup.md) [Home](../index.md) [Home again](../index.md)";
        let result = rewrite_links(body, "guide/setup.md", &link_map());
        assert_eq!(
            result.linked_doc_ids,
            vec!["meta/general/index".to_string()]
        );
        assert!(result.body.contains("[Top](./tutorial-guide-setup.md)"));
    }

    #[test]
    fn rewrite_target_for_see_also() {
        assert_eq!(
            rewrite_target("index.md", "guide/setup.md", &link_map()).as_deref(),
            Some("./tutorial-guide-setup.md")
        );
        assert!(rewrite_target("index.md", "guide/other.md", &link_map()).is_none());
    }
}
