//! Reduce arbitrary feed HTML to text plus `<a href>` and `<br>`.
//!
//! The input is parsed into a proper HTML5 tree (via `scraper`) and walked
//! depth first. Anchors keep only their `href`, line breaks are kept bare, and
//! every other element is dropped while its children are still visited, so
//! `<p>Hello <b>world</b></p>` becomes `Hello world`.

use scraper::{ElementRef, Html, Node};

/// Sanitize a feed entry's HTML body.
///
/// The tree builder recovers from any malformed input, so this never fails;
/// garbage in degrades to whatever text the parser could recover.
pub fn extract_clean_html(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    write_tree(fragment.root_element(), &mut out);

    out.trim().to_string()
}

enum Step<N> {
    Visit(N),
    CloseAnchor,
}

/// Depth-first walk driven by an explicit stack, so nesting depth in the
/// input never grows the call stack.
fn write_tree(root: ElementRef<'_>, out: &mut String) {
    let mut stack: Vec<Step<_>> = root.children().rev().map(Step::Visit).collect();

    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Visit(node) => node,
            Step::CloseAnchor => {
                out.push_str("</a>");
                continue;
            }
        };

        match node.value() {
            Node::Text(text) => push_escaped_text(out, text),
            Node::Element(element) => match element.name() {
                "br" => out.push_str("<br>"),
                name => {
                    if name == "a" {
                        out.push_str("<a");
                        if let Some(href) = element.attr("href") {
                            out.push_str(" href=\"");
                            push_escaped_attr(out, href);
                            out.push('"');
                        }
                        out.push('>');
                        stack.push(Step::CloseAnchor);
                    }
                    stack.extend(node.children().rev().map(Step::Visit));
                }
            },
            // Comments, doctypes and processing instructions carry no text
            _ => {}
        }
    }
}

/// Text nodes arrive entity-decoded; re-escape so `&lt;b&gt;` stays text.
fn push_escaped_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every tag left in the output must be an anchor or a line break.
    fn only_allowed_tags(s: &str) -> bool {
        s.match_indices('<').all(|(i, _)| {
            let rest = &s[i..];
            rest.starts_with("<a ")
                || rest.starts_with("<a>")
                || rest.starts_with("</a>")
                || rest.starts_with("<br>")
        })
    }

    mod structure_tests {
        use super::*;

        #[test]
        fn test_plain_text_passes_through() {
            assert_eq!(extract_clean_html("just some words"), "just some words");
        }

        #[test]
        fn test_empty_input() {
            assert_eq!(extract_clean_html(""), "");
            assert_eq!(extract_clean_html("   \n\t "), "");
        }

        #[test]
        fn test_strips_block_and_inline_tags() {
            let html = "<div><p>Hello <b>bold</b> and <em>em</em></p><p>second</p></div>";
            assert_eq!(extract_clean_html(html), "Hello bold and emsecond");
        }

        #[test]
        fn test_keeps_anchor_with_href_only() {
            let html = r#"<p>See <a href="https://x.example/post" class="link" target="_blank">this post</a>.</p>"#;
            assert_eq!(
                extract_clean_html(html),
                r#"See <a href="https://x.example/post">this post</a>."#
            );
        }

        #[test]
        fn test_anchor_without_href() {
            let html = r#"<a name="top">anchor</a>"#;
            assert_eq!(extract_clean_html(html), "<a>anchor</a>");
        }

        #[test]
        fn test_nested_markup_inside_anchor_is_flattened() {
            let html = r#"<a href="/x"><img src="i.png"><span>label</span></a>"#;
            assert_eq!(extract_clean_html(html), r#"<a href="/x">label</a>"#);
        }

        #[test]
        fn test_keeps_br_in_all_spellings() {
            let html = "line one<br>line two<br/>line three<BR />end";
            assert_eq!(
                extract_clean_html(html),
                "line one<br>line two<br>line three<br>end"
            );
        }

        #[test]
        fn test_drops_comments() {
            let html = "before<!-- hidden -->after";
            assert_eq!(extract_clean_html(html), "beforeafter");
        }

        #[test]
        fn test_trims_surrounding_whitespace() {
            let html = "\n   <p>  padded  </p>\n  ";
            assert_eq!(extract_clean_html(html), "padded");
        }

        #[test]
        fn test_unclosed_tags_recover() {
            let html = "<p>open <b>bold <i>italic";
            assert_eq!(extract_clean_html(html), "open bold italic");
        }

        #[test]
        fn test_deeply_nested_input() {
            let depth = 120_000;
            let html = format!("{}deep{}", "<span>".repeat(depth), "</span>".repeat(depth));
            assert_eq!(extract_clean_html(&html), "deep");
        }

        #[test]
        fn test_deeply_nested_input_inside_anchor() {
            let depth = 120_000;
            let html = format!(
                r#"<a href="/d">{}deep{}</a>tail"#,
                "<div>".repeat(depth),
                "</div>".repeat(depth)
            );
            assert_eq!(extract_clean_html(&html), r#"<a href="/d">deep</a>tail"#);
        }

        #[test]
        fn test_unicode_text_preserved() {
            let html = "<p>你好，世界 🌏</p>";
            assert_eq!(extract_clean_html(html), "你好，世界 🌏");
        }
    }

    mod escaping_tests {
        use super::*;

        #[test]
        fn test_escapes_href_attribute() {
            let html = r#"<a href="https://x.example/?a=1&amp;b=&quot;2&quot;">q</a>"#;
            assert_eq!(
                extract_clean_html(html),
                r#"<a href="https://x.example/?a=1&amp;b=&#34;2&#34;">q</a>"#
            );
        }

        #[test]
        fn test_encoded_markup_stays_text() {
            let html = "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>";
            let out = extract_clean_html(html);
            assert_eq!(out, "&lt;script&gt;alert(1)&lt;/script&gt;");
            assert!(only_allowed_tags(&out));
        }

        #[test]
        fn test_ampersand_in_text() {
            assert_eq!(extract_clean_html("Tom &amp; Jerry"), "Tom &amp; Jerry");
        }
    }

    mod allow_list_tests {
        use super::*;

        #[test]
        fn test_output_never_contains_other_tags() {
            let inputs = [
                "<h1>Title</h1><p>Body <code>x</code></p>",
                "<table><tr><td>cell</td></tr></table>",
                r#"<img src="a.png" onerror="alert(1)">caption"#,
                r#"<iframe src="https://evil.example"></iframe>text"#,
                "<ul><li>one</li><li>two</li></ul>",
                r#"<a href="/a"><a href="/b">nested</a></a>"#,
                "<svg><circle r=\"1\"/></svg>after",
                "<<>>< <a",
            ];

            for input in inputs {
                let out = extract_clean_html(input);
                assert!(only_allowed_tags(&out), "{:?} -> {:?}", input, out);
            }
        }

        #[test]
        fn test_text_preserved_modulo_tags() {
            let html = "<h2>Intro</h2><p>Rust <i>is</i> <strong>fast</strong></p>";
            assert_eq!(extract_clean_html(html), "IntroRust is fast");
        }
    }
}
