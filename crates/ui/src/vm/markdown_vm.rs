use std::collections::{HashMap, HashSet};

/// Lesson markdown to sanitized HTML ready for `dangerous_inner_html`.
#[must_use]
pub fn markdown_to_html(input: &str) -> String {
    let mut options = pulldown_cmark::Options::empty();
    options.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);
    options.insert(pulldown_cmark::Options::ENABLE_TABLES);
    options.insert(pulldown_cmark::Options::ENABLE_TASKLISTS);

    let parser = pulldown_cmark::Parser::new_ext(input, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    sanitize_html(&html)
}

#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "div", "span", "br", "hr", "em", "strong", "b", "i", "del", "code", "pre",
        "blockquote", "ul", "ol", "li", "a", "h1", "h2", "h3", "h4", "h5", "h6", "table",
        "thead", "tbody", "tr", "th", "td", "input",
    ]
    .into_iter()
    .collect();

    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    attributes.insert("a", ["href"].into_iter().collect());
    attributes.insert("code", ["class"].into_iter().collect());
    attributes.insert("input", ["type", "checked", "disabled"].into_iter().collect());

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(attributes)
        .clean(html)
        .to_string()
}

/// First paragraph of plain text, for module cards and lesson teasers.
#[must_use]
pub fn plain_excerpt(input: &str, max_chars: usize) -> String {
    let first = input
        .split("\n\n")
        .map(str::trim)
        .find(|block| !block.is_empty() && !block.starts_with('#'))
        .unwrap_or_default();
    let flat: String = first
        .chars()
        .filter(|ch| !matches!(ch, '*' | '_' | '`'))
        .map(|ch| if ch == '\n' { ' ' } else { ch })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::{markdown_to_html, plain_excerpt};

    #[test]
    fn markdown_to_html_sanitizes_links() {
        let html = markdown_to_html("[Link](javascript:alert(1))");
        assert!(html.contains("Link"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn markdown_to_html_drops_script_tags() {
        let html = markdown_to_html("Hello\n\n<script>alert(1)</script>");
        assert!(html.contains("Hello"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn markdown_keeps_headings_and_code_language() {
        let html = markdown_to_html("## Models\n\n```python\nclass Post: pass\n```\n");
        assert!(html.contains("<h2>Models</h2>"), "{html}");
        assert!(html.contains("language-python"), "{html}");
    }

    #[test]
    fn excerpt_skips_headings_and_truncates() {
        let text = "# Title\n\nDjango **models** map\nclasses to tables.\n\nMore.";
        assert_eq!(plain_excerpt(text, 100), "Django models map classes to tables.");
        assert_eq!(plain_excerpt(text, 6), "Django…");
        assert_eq!(plain_excerpt("", 10), "");
    }
}
