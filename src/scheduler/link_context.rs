//! Anchor-context extraction for discovered links.
//!
//! A child task's relevance is seeded from the text *around* its anchor in
//! the parent page, not from the raw URL string: the line where the link
//! first appears plus a couple of lines on each side.

use url::Url;

use crate::utils::constants::LINK_CONTEXT_LINES;

/// Return the text window surrounding `link`'s first occurrence in `text`.
///
/// Matches on the full URL first, then falls back to the last path segment
/// (the slug usually survives markdown link rewriting). Returns `None` when
/// the anchor cannot be located at all; callers then fall back to the URL
/// string itself.
#[must_use]
pub fn link_context(text: &str, link: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return None;
    }

    let slug = Url::parse(link).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segments| segments.next_back().map(String::from))
            .filter(|s| s.len() >= 3)
    });

    let hit = lines.iter().position(|line| line.contains(link)).or_else(|| {
        slug.as_deref()
            .and_then(|slug| lines.iter().position(|line| line.contains(slug)))
    })?;

    let start = hit.saturating_sub(LINK_CONTEXT_LINES);
    let end = (hit + LINK_CONTEXT_LINES + 1).min(lines.len());
    Some(lines[start..end].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_window_around_full_url() {
        let text = "intro line\nsecond line\nsee https://a.test/docs for details\nafter\ntail";
        let ctx = link_context(text, "https://a.test/docs").expect("Should find anchor");
        assert!(ctx.contains("see https://a.test/docs"));
        assert!(ctx.contains("intro line"));
        assert!(ctx.contains("tail"));
    }

    #[test]
    fn falls_back_to_path_slug() {
        let text = "a\nb\nthe pricing page explains everything\nc";
        let ctx =
            link_context(text, "https://a.test/products/pricing").expect("Should match slug");
        assert!(ctx.contains("pricing page"));
    }

    #[test]
    fn returns_none_when_anchor_missing() {
        assert!(link_context("nothing relevant here", "https://a.test/xyzzy-page").is_none());
    }
}
