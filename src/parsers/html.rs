//! Minimal HTML text helpers for the scraping parsers and the generic
//! extractor. Deliberately tolerant: upstream markup is messy and the
//! consumers only need text content, never a DOM.

/// Case-insensitive slice between an opening tag (with attributes) and its
/// closing tag. Example: `slice_between_ci(html, "<main", "</main>")`.
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = s.to_lowercase();
    let open_lc = open_pat.to_lowercase();
    let close_lc = close_pat.to_lowercase();

    let open_idx = lc.find(&open_lc)?;
    let after_open = s[open_idx..].find('>')? + open_idx + 1;
    let close_idx_rel = lc[after_open..].find(&close_lc)?;
    Some(&s[after_open..after_open + close_idx_rel])
}

/// Remove every `<tag ...>...</tag>` block, case-insensitive.
pub fn remove_tag_blocks(html: &str, tag: &str) -> String {
    let open_pat = format!("<{}", tag.to_lowercase());
    let close_pat = format!("</{}>", tag.to_lowercase());
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    loop {
        let lc = rest.to_lowercase();
        let Some(start) = lc.find(&open_pat) else {
            out.push_str(rest);
            return out;
        };
        // require a tag boundary so "<nav" does not eat "<navigator-widget"
        let boundary_ok = lc[start + open_pat.len()..]
            .chars()
            .next()
            .is_none_or(|c| c == '>' || c.is_whitespace() || c == '/');
        if !boundary_ok {
            out.push_str(&rest[..start + open_pat.len()]);
            rest = &rest[start + open_pat.len()..];
            continue;
        }
        out.push_str(&rest[..start]);
        match lc[start..].find(&close_pat) {
            Some(end_rel) => rest = &rest[start + end_rel + close_pat.len()..],
            None => return out,
        }
    }
}

/// Remove `<...>` segments, then collapse whitespace.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                if in_tag {
                    in_tag = false;
                    out.push(' ');
                } else {
                    out.push(ch);
                }
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&normalize_entities(&out))
}

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every `<script type="application/ld+json">` body on the page.
pub fn json_ld_blocks(html: &str) -> Vec<String> {
    let lc = html.to_lowercase();
    let mut blocks = Vec::new();
    let mut from = 0usize;
    while let Some(rel) = lc[from..].find("<script") {
        let start = from + rel;
        let Some(tag_end_rel) = lc[start..].find('>') else {
            break;
        };
        let tag_end = start + tag_end_rel + 1;
        let tag = &lc[start..tag_end];
        let Some(close_rel) = lc[tag_end..].find("</script>") else {
            break;
        };
        let close = tag_end + close_rel;
        if tag.contains("ld+json") {
            blocks.push(html[tag_end..close].trim().to_string());
        }
        from = close + "</script>".len();
    }
    blocks
}

const BOILERPLATE_TAGS: [&str; 9] = [
    "script", "style", "nav", "header", "footer", "noscript", "form", "select", "svg",
];

/// Distill a page into the text most likely to describe events: table
/// content first, then main/article, then the whole page with boilerplate
/// removed.
pub fn distill_text(html: &str) -> String {
    let mut cleaned = html.to_string();
    for tag in BOILERPLATE_TAGS {
        cleaned = remove_tag_blocks(&cleaned, tag);
    }

    let tables = table_text(&cleaned);
    if let Some(text) = tables {
        if text.len() > 200 {
            return text;
        }
    }

    for (open, close) in [("<main", "</main>"), ("<article", "</article>")] {
        if let Some(inner) = slice_between_ci(&cleaned, open, close) {
            let text = strip_tags(inner);
            if text.len() > 200 {
                return text;
            }
        }
    }

    strip_tags(&cleaned)
}

/// Concatenated text of all non-trivial tables, cells separated by " | ",
/// rows by newline.
fn table_text(html: &str) -> Option<String> {
    let lc = html.to_lowercase();
    let mut parts = Vec::new();
    let mut from = 0usize;
    while let Some(rel) = lc[from..].find("<table") {
        let start = from + rel;
        let Some(close_rel) = lc[start..].find("</table>") else {
            break;
        };
        let end = start + close_rel + "</table>".len();
        let block = &html[start..end];
        let with_separators = block
            .replace("</td>", " | ")
            .replace("</TD>", " | ")
            .replace("</th>", " | ")
            .replace("</TH>", " | ")
            .replace("</tr>", "\n")
            .replace("</TR>", "\n");
        let text = with_separators
            .lines()
            .map(strip_tags)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.len() > 50 {
            parts.push(text);
        }
        from = end;
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_tags("<p>Dressage &amp; Showing</p>"),
            "Dressage & Showing"
        );
        assert_eq!(strip_tags("a<br/>b"), "a b");
    }

    #[test]
    fn slices_between_tags() {
        let html = "<html><main class=\"x\">hello <b>world</b></main></html>";
        assert_eq!(
            slice_between_ci(html, "<main", "</main>"),
            Some("hello <b>world</b>")
        );
        assert_eq!(slice_between_ci(html, "<aside", "</aside>"), None);
    }

    #[test]
    fn removes_blocks() {
        let html = "keep<script>drop();</script> this<style>p{}</style>";
        assert_eq!(remove_tag_blocks(&remove_tag_blocks(html, "script"), "style"), "keep this");
    }

    #[test]
    fn finds_json_ld_blocks() {
        let html = r#"<head>
            <script type="application/ld+json">{"@type":"Event"}</script>
            <script>var x = 1;</script>
            <script type='application/ld+json'>[1,2]</script>
        </head>"#;
        let blocks = json_ld_blocks(html);
        assert_eq!(blocks, vec![r#"{"@type":"Event"}"#.to_string(), "[1,2]".to_string()]);
    }

    #[test]
    fn table_text_preferred_by_distill() {
        let rows: String = (1..=12)
            .map(|i| format!("<tr><td>Show number {i}</td><td>2026-04-{i:02}</td></tr>"))
            .collect();
        let html =
            format!("<html><nav>menu menu</nav><table>{rows}</table><p>other filler</p></html>");
        let text = distill_text(&html);
        assert!(text.contains("Show number 1 | 2026-04-01"));
        assert!(!text.contains("menu"));
        assert!(!text.contains("other filler"));
    }
}
