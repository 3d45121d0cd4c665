use pulldown_cmark::{CowStr, Event, Options as CmarkOptions, Parser, Tag};

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Relative links and the schemes in `ALLOWED_SCHEMES` pass.
fn is_safe_url(url: &str) -> bool {
    // browsers ignore whitespace and control characters inside a scheme
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();
    match cleaned.find([':', '/', '?', '#']) {
        Some(i) if cleaned[i..].starts_with(':') => {
            let scheme = cleaned[..i].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Renders LLM-written markdown (chat replies, report summaries) to HTML.
/// Raw HTML in the input is shown as text, never passed through, and link or
/// image targets with a script-capable scheme are replaced by `#`.
pub fn render(markdown_input: &str) -> String {
    let mut options = CmarkOptions::empty();
    options.insert(CmarkOptions::ENABLE_TABLES);
    options.insert(CmarkOptions::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown_input, options).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}
