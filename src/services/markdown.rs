//! Markdown rendering for blog posts
//!
//! Post bodies are stored as Markdown. The blog service renders them to HTML
//! with pulldown-cmark and derives the reading time and, when the editor left
//! it empty, a plain-text excerpt.
//!
//! ```
//! use latrouvaille::services::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let html = renderer.render("# Bonjour\n\nDu texte en **gras**.");
//! assert!(html.contains("<h1>"));
//! assert!(html.contains("<strong>"));
//! ```

use pulldown_cmark::{html, Event, Options, Parser, TagEnd};

/// Average reading speed used for reading time estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Markdown renderer with the extensions used by the editors
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Tables, strikethrough, task lists and smart punctuation enabled
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        Self { options }
    }

    /// Render Markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }

    /// Text content of the document, markup removed, whitespace collapsed
    pub fn plain_text(&self, markdown: &str) -> String {
        let mut text = String::new();
        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak
                | Event::HardBreak
                | Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item) => text.push(' '),
                _ => {}
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Estimated minutes to read the document, at least one
    pub fn reading_minutes(&self, markdown: &str) -> u32 {
        let words = self.plain_text(markdown).split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
    }

    /// Plain-text excerpt cut on a word boundary, with an ellipsis when cut
    pub fn excerpt(&self, markdown: &str, max_chars: usize) -> String {
        let text = self.plain_text(markdown);
        if text.chars().count() <= max_chars {
            return text;
        }

        let mut excerpt = String::new();
        for word in text.split(' ') {
            let needed = if excerpt.is_empty() { 0 } else { 1 } + word.chars().count();
            if excerpt.chars().count() + needed > max_chars {
                break;
            }
            if !excerpt.is_empty() {
                excerpt.push(' ');
            }
            excerpt.push_str(word);
        }
        if excerpt.is_empty() {
            excerpt = text.chars().take(max_chars).collect();
        }
        excerpt.push('…');
        excerpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markup() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Recette\n\n- poireaux\n- pommes de terre\n\n~~beurre~~");
        assert!(html.contains("<h2>Recette</h2>"));
        assert!(html.contains("<li>poireaux</li>"));
        assert!(html.contains("<del>beurre</del>"));
    }

    #[test]
    fn test_render_table_and_tasks() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n\n- [x] fait");
        assert!(html.contains("<table>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_code_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```html\n<b>gras</b>\n```");
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("language-html"));
    }

    #[test]
    fn test_render_empty_input() {
        assert_eq!(MarkdownRenderer::new().render(""), "");
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let renderer = MarkdownRenderer::new();
        let text = renderer.plain_text("# Titre\n\nUn *petit* [lien](https://example.com) et `code`.");
        assert_eq!(text, "Titre Un petit lien et code.");
    }

    #[test]
    fn test_reading_minutes() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.reading_minutes(""), 1);
        assert_eq!(renderer.reading_minutes("quelques mots"), 1);

        let long = "mot ".repeat(450);
        assert_eq!(renderer.reading_minutes(&long), 3);
        let exact = "mot ".repeat(400);
        assert_eq!(renderer.reading_minutes(&exact), 2);
    }

    #[test]
    fn test_excerpt_cuts_on_word_boundary() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.excerpt("Court texte", 50), "Court texte");
        assert_eq!(renderer.excerpt("Un deux trois quatre", 10), "Un deux…");
        assert_eq!(renderer.excerpt("Anticonstitutionnellement", 5), "Antic…");
    }
}
