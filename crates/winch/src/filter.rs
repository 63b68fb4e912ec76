//! `winchify` markup transform
//!
//! Rewrites plain `<img>` markup into `<winch-img>` placeholders so existing
//! HTML snippets lazy-load without hand edits.

const OPEN_TAG: &str = "<img";
const CLOSE_TAG: &str = "</img>";

/// Convert image tags to placeholder tags, ASCII case-insensitively.
///
/// ```
/// assert_eq!(
///     winch::winchify(r#"<p><IMG src="a.png"/></p>"#),
///     r#"<p><winch-img src="a.png"></winch-img></p>"#,
/// );
/// ```
pub fn winchify(html: &str) -> String {
    if find_ignore_case(html, OPEN_TAG, 0).is_none() {
        return html.to_string();
    }
    let closed = close_image_tags(html);
    let renamed = replace_ignore_case(&closed, OPEN_TAG, "<winch-img");
    let sourced = replace_ignore_case(&renamed, "ng-src", "img-src");
    replace_ignore_case(&sourced, CLOSE_TAG, "</winch-img>")
}

/// Append `</img>` after every terminated `<img ...>` tag, dropping a
/// self-closing slash
fn close_image_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 16);
    let mut from = 0;
    while let Some(start) = find_ignore_case(html, OPEN_TAG, from) {
        let Some(end) = html[start + OPEN_TAG.len()..]
            .find('>')
            .map(|offset| start + OPEN_TAG.len() + offset)
        else {
            break;
        };
        let tag = &html[start..end];
        let tag = match tag.strip_suffix('/') {
            Some(open) => open.trim_end(),
            None => tag,
        };
        out.push_str(&html[from..start]);
        out.push_str(tag);
        out.push('>');
        out.push_str(CLOSE_TAG);
        from = end + 1;
    }
    out.push_str(&html[from..]);
    out
}

/// Byte offset of the first ASCII case-insensitive `needle` at or after `from`
fn find_ignore_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .get(from..)?
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|offset| from + offset)
}

fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(haystack.len());
    let mut from = 0;
    while let Some(start) = find_ignore_case(haystack, needle, from) {
        out.push_str(&haystack[from..start]);
        out.push_str(replacement);
        from = start + needle.len();
    }
    out.push_str(&haystack[from..]);
    out
}
