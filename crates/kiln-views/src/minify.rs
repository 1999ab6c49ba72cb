//! HTML whitespace collapsing and inline script minification.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use kiln_bundler::minify_script;

/// Elements whose content must not be touched by whitespace collapsing.
static RAW_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("valid raw element regex")
});

static INLINE_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(<script\b([^>]*)>)(.*?)(</script\s*>)$").expect("valid script regex")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--[^\[].*?-->").expect("valid comment regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Whitespace around block-level tags carries no meaning and is dropped.
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(</?(?:!doctype|html|head|body|meta|link|title|base|div|p|ul|ol|li|dl|dt|dd|header|footer|main|nav|section|article|aside|h[1-6]|table|thead|tbody|tfoot|tr|td|th|form|fieldset|legend|hr|br|figure|figcaption|blockquote|address|details|summary|option|select|noscript|template|svg|symbol)\b[^>]*>)\s*",
    )
    .expect("valid block tag regex")
});

/// Collapse whitespace and minify inline scripts.
///
/// Content of `pre`, `textarea`, `script` and `style` elements is preserved,
/// except that inline scripts are minified. Scripts that fail to minify are
/// kept as written.
pub fn minify_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;

    for raw in RAW_ELEMENT.find_iter(html) {
        out.push_str(&collapse(&html[cursor..raw.start()]));
        out.push_str(&minify_raw_element(raw.as_str()));
        cursor = raw.end();
    }
    out.push_str(&collapse(&html[cursor..]));

    out.trim().to_string()
}

fn collapse(fragment: &str) -> String {
    let without_comments = COMMENT.replace_all(fragment, "");
    let single_spaced = WHITESPACE.replace_all(&without_comments, " ");
    BLOCK_TAG
        .replace_all(&single_spaced, |caps: &Captures| caps[1].to_string())
        .into_owned()
}

fn minify_raw_element(element: &str) -> String {
    let Some(caps) = INLINE_SCRIPT.captures(element) else {
        return element.to_string();
    };

    let attrs = caps[2].to_ascii_lowercase();
    let body = &caps[3];
    let is_js = !attrs.contains("type=")
        || attrs.contains("javascript")
        || attrs.contains("type=\"module\"");
    if attrs.contains("src=") || !is_js || body.trim().is_empty() {
        return element.to_string();
    }

    match minify_script(body) {
        Ok(minified) => format!("{}{}{}", &caps[1], minified.trim_end(), &caps[4]),
        Err(e) => {
            tracing::warn!("Leaving inline script unminified: {}", e);
            element.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_whitespace_between_block_tags() {
        let html = "<!DOCTYPE html>\n<html>\n  <body>\n    <div>\n      <p>Hello   <b>big</b>   world</p>\n    </div>\n  </body>\n</html>\n";

        assert_eq!(
            minify_html(html),
            "<!DOCTYPE html><html><body><div><p>Hello <b>big</b> world</p></div></body></html>"
        );
    }

    #[test]
    fn drops_comments_but_keeps_conditionals() {
        let html = "<div><!-- note --><!--[if IE]>x<![endif]--></div>";

        assert_eq!(minify_html(html), "<div><!--[if IE]>x<![endif]--></div>");
    }

    #[test]
    fn preserves_preformatted_content() {
        let html = "<div>\n<pre>  keep\n   this </pre>\n</div>";

        assert_eq!(minify_html(html), "<div><pre>  keep\n   this </pre></div>");
    }

    #[test]
    fn minifies_inline_scripts() {
        let html = "<body>\n<script>\n  var greeting = 'hi';\n  console.log(greeting);\n</script>\n</body>";

        let out = minify_html(html);

        assert!(out.starts_with("<body><script>"));
        assert!(out.ends_with("</script></body>"));
        assert!(!out.contains("\n  var"));
    }

    #[test]
    fn leaves_external_and_non_js_scripts_alone() {
        let external = "<script src=\"js/bundle.js\"></script>";
        let template = "<script type=\"text/template\">\n  <b>{{ x }}</b>\n</script>";

        assert_eq!(minify_html(external), external);
        assert_eq!(minify_html(template), template);
    }
}
