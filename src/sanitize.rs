//! Sanitization of untrusted offer markup.
//!
//! Descriptions and instructions come from an external scrape target, so
//! they pass through an allow-list before any rendering: a handful of inline
//! formatting tags survive (attribute-free), `<a>` keeps only an http(s)
//! `href`, script/style vanish with their content, everything else is
//! stripped and stray angle brackets are entity-escaped.

use regex::Regex;

/// Tags that survive sanitization (attributes dropped).
const ALLOWED_TAGS: &[&str] = &["b", "i", "em", "strong", "p", "br", "ul", "ol", "li", "a"];

/// Sanitize an untrusted HTML fragment down to the allow-list.
pub fn sanitize_html(input: &str) -> String {
    // script/style content must not leak through as text
    let block_re = Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap();
    let stripped = block_re.replace_all(input, "");

    let tag_re = Regex::new(r"(?is)<\s*(/?)\s*([a-z][a-z0-9]*)\b([^>]*)>").unwrap();

    let mut out = String::with_capacity(stripped.len());
    let mut last = 0;
    for caps in tag_re.captures_iter(&stripped) {
        let m = caps.get(0).expect("regex match has a full capture");
        out.push_str(&escape_text(&stripped[last..m.start()]));
        last = m.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_lowercase();
        if !ALLOWED_TAGS.contains(&name.as_str()) {
            continue;
        }

        if closing {
            if name != "br" {
                out.push_str(&format!("</{name}>"));
            }
        } else if name == "a" {
            match href_attr(&caps[3]) {
                Some(href) => out.push_str(&format!("<a href=\"{href}\">")),
                None => out.push_str("<a>"),
            }
        } else {
            out.push_str(&format!("<{name}>"));
        }
    }
    out.push_str(&escape_text(&stripped[last..]));
    out
}

/// Escape angle brackets and bare ampersands, leaving existing entities alone.
fn escape_text(text: &str) -> String {
    let amp_re = Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*;|#[0-9]+;)?").unwrap();
    amp_re
        .replace_all(text, |caps: &regex::Captures| match caps.get(1) {
            Some(entity) => format!("&{}", entity.as_str()),
            None => "&amp;".to_string(),
        })
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Extract an http(s) href from a raw attribute blob, if present.
fn href_attr(attrs: &str) -> Option<String> {
    let href_re = Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap();
    let caps = href_re.captures(attrs)?;
    let href = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .trim();
    let lower = href.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(href.replace('"', "%22"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_tags_survive_without_attributes() {
        let out = sanitize_html(r#"<p class="x">Refer a <strong>friend</strong></p>"#);
        assert_eq!(out, "<p>Refer a <strong>friend</strong></p>");
    }

    #[test]
    fn test_script_removed_with_content() {
        let out = sanitize_html("before<script>alert('x')</script>after");
        assert_eq!(out, "beforeafter");
    }

    #[test]
    fn test_disallowed_tag_stripped_text_kept() {
        let out = sanitize_html("<div>£50 reward</div>");
        assert_eq!(out, "£50 reward");
    }

    #[test]
    fn test_event_handlers_dropped() {
        let out = sanitize_html(r#"<b onclick="steal()">hi</b>"#);
        assert_eq!(out, "<b>hi</b>");
    }

    #[test]
    fn test_anchor_keeps_http_href_only() {
        let out = sanitize_html(r#"<a href="https://x.test/offer" target="_blank">go</a>"#);
        assert_eq!(out, r#"<a href="https://x.test/offer">go</a>"#);

        let js = sanitize_html(r#"<a href="javascript:alert(1)">go</a>"#);
        assert_eq!(js, "<a>go</a>");
    }

    #[test]
    fn test_stray_brackets_escaped() {
        let out = sanitize_html("1 < 2 and 3 > 2 & done");
        assert_eq!(out, "1 &lt; 2 and 3 &gt; 2 &amp; done");
    }

    #[test]
    fn test_existing_entities_preserved() {
        let out = sanitize_html("fish &amp; chips &#163;5");
        assert_eq!(out, "fish &amp; chips &#163;5");
    }
}
