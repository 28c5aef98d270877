//! Markdown rendering of page bodies.

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

/// Render a page body to HTML.
///
/// Headings are demoted one level (the page title owns `<h1>`) and each
/// gets a unique slug `id` so sections can be linked.
pub fn markdown_to_html(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = anchor_headings(Parser::new_ext(body, options).collect());

    let mut html_output = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

fn anchor_headings(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut used = HashMap::new();

    for i in 0..events.len() {
        if matches!(events[i], Event::Start(Tag::Heading { .. })) {
            let slug = unique_slug(slugify(&heading_text(&events[i + 1..])), &mut used);
            if let Event::Start(Tag::Heading { level, id, .. }) = &mut events[i] {
                *level = demote(*level);
                if id.is_none() {
                    *id = Some(CowStr::from(slug));
                }
            }
        } else if let Event::End(TagEnd::Heading(level)) = &mut events[i] {
            *level = demote(*level);
        }
    }

    events
}

/// Plain text of the heading whose contents start at `events[0]`.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

fn demote(level: HeadingLevel) -> HeadingLevel {
    HeadingLevel::try_from((level as usize + 1).min(6)).unwrap_or(HeadingLevel::H6)
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn unique_slug(slug: String, used: &mut HashMap<String, usize>) -> String {
    let Some(&count) = used.get(&slug) else {
        used.insert(slug.clone(), 0);
        return slug;
    };

    let mut n = count;
    let candidate = loop {
        n += 1;
        let candidate = format!("{}-{}", slug, n);
        if !used.contains_key(&candidate) {
            break candidate;
        }
    };

    used.insert(slug, n);
    used.insert(candidate.clone(), 0);
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_are_demoted_with_ids() {
        let html = markdown_to_html("# Morning Walk\n\ntext\n\n## Later, at home\n");
        assert!(html.contains(r#"<h2 id="morning-walk">Morning Walk</h2>"#));
        assert!(html.contains(r#"<h3 id="later-at-home">Later, at home</h3>"#));
    }

    #[test]
    fn test_deepest_heading_stays_h6() {
        let html = markdown_to_html("###### Tiny\n");
        assert!(html.contains(r#"<h6 id="tiny">Tiny</h6>"#));
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let html = markdown_to_html("# Notes\n\n# Notes\n\n# Notes\n");
        assert!(html.contains(r#"id="notes""#));
        assert!(html.contains(r#"id="notes-1""#));
        assert!(html.contains(r#"id="notes-2""#));
    }

    #[test]
    fn test_suffixed_id_does_not_clash_with_literal_heading() {
        let html = markdown_to_html("# Notes\n\n# Notes 1\n\n# Notes\n");
        assert!(html.contains(r#"<h2 id="notes">Notes</h2>"#));
        assert!(html.contains(r#"<h2 id="notes-1">Notes 1</h2>"#));
        assert!(html.contains(r#"<h2 id="notes-2">Notes</h2>"#));

        let html = markdown_to_html("# Notes\n\n# Notes\n\n# Notes 1\n");
        assert!(html.contains(r#"<h2 id="notes-1">Notes</h2>"#));
        assert!(html.contains(r#"<h2 id="notes-1-1">Notes 1</h2>"#));
    }

    #[test]
    fn test_footnotes() {
        let html = markdown_to_html("Claim.[^1]\n\n[^1]: Source.\n");
        assert!(html.contains("footnote"));
        assert!(html.contains("Source."));
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(markdown_to_html("hello *world*"), "<p>hello <em>world</em></p>\n");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Hello,   World! "), "hello-world");
        assert_eq!(slugify("snake_case-and-dash"), "snake-case-and-dash");
        assert_eq!(slugify("!!!"), "section");
    }
}
