#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use owo_colors::OwoColorize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use syntect::easy::HighlightLines;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use syntect::util::LinesWithEndings;

use super::markdown_to_ansi;
use crate::domain::models::CodeBlock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RendererName {
    Rich,
    Simple,
}

impl RendererName {
    pub fn parse(text: &str) -> Option<RendererName> {
        return RendererName::iter().find(|e| return e.to_string() == text);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkdownBlock {
    Heading { level: usize, text: String },
    List { ordered: bool, items: Vec<String> },
    Quote(String),
    Rule,
    Paragraph(String),
}

/// Splits an explanation into paragraph level blocks for plain output. Fenced
/// code is skipped, it is displayed separately.
pub fn parse_markdown(text: &str) -> Vec<MarkdownBlock> {
    return text
        .split("\n\n")
        .map(|e| return e.trim())
        .filter(|e| return !e.is_empty() && !e.starts_with("```"))
        .map(|paragraph| {
            for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
                if let Some(text) = paragraph.strip_prefix(prefix) {
                    return MarkdownBlock::Heading {
                        level,
                        text: text.to_string(),
                    };
                }
            }

            if paragraph.starts_with("- ") {
                let items = paragraph
                    .split('\n')
                    .map(|e| return e.trim_start_matches("- ").to_string())
                    .collect();
                return MarkdownBlock::List {
                    ordered: false,
                    items,
                };
            }

            if paragraph.starts_with("1. ") {
                let items = paragraph
                    .split('\n')
                    .map(|e| {
                        let digits = e.chars().take_while(|c| return c.is_ascii_digit()).count();
                        return e[digits..].trim_start_matches('.').trim().to_string();
                    })
                    .collect();
                return MarkdownBlock::List {
                    ordered: true,
                    items,
                };
            }

            if let Some(text) = paragraph.strip_prefix('>') {
                return MarkdownBlock::Quote(text.trim().to_string());
            }

            if paragraph.starts_with("---") {
                return MarkdownBlock::Rule;
            }

            return MarkdownBlock::Paragraph(paragraph.to_string());
        })
        .collect();
}

/// Turns responses into terminal text.
pub trait Renderer {
    fn name(&self) -> RendererName;

    fn explanation(&self, markdown: &str) -> String;

    fn code(&self, index: usize, block: &CodeBlock) -> String;

    fn title(&self, text: &str) -> String;
}

pub type RendererBox = Box<dyn Renderer + Send + Sync>;

/// Plain text output for terminals without colour support or for piping.
#[derive(Default)]
pub struct SimpleRenderer {}

impl Renderer for SimpleRenderer {
    fn name(&self) -> RendererName {
        return RendererName::Simple;
    }

    fn explanation(&self, markdown: &str) -> String {
        return parse_markdown(markdown)
            .into_iter()
            .map(|block| match block {
                MarkdownBlock::Heading { level, text } => {
                    let underline = if level == 1 { "=" } else { "-" };
                    return format!("{text}\n{}", underline.repeat(text.chars().count()));
                }
                MarkdownBlock::List { ordered, items } => {
                    return items
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| {
                            if ordered {
                                return format!("  {}. {item}", idx + 1);
                            }
                            return format!("  * {item}");
                        })
                        .collect::<Vec<String>>()
                        .join("\n");
                }
                MarkdownBlock::Quote(text) => return format!("  | {text}"),
                MarkdownBlock::Rule => return "-".repeat(40),
                MarkdownBlock::Paragraph(text) => return text,
            })
            .collect::<Vec<String>>()
            .join("\n\n");
    }

    fn code(&self, index: usize, block: &CodeBlock) -> String {
        let body = block
            .code
            .lines()
            .map(|line| return format!("    {line}"))
            .collect::<Vec<String>>()
            .join("\n");

        return format!("[{}] {}\n{body}", index + 1, block.language);
    }

    fn title(&self, text: &str) -> String {
        return format!("{text}\n{}", "=".repeat(text.chars().count()));
    }
}

/// Highlights code with syntect and renders Markdown through pulldown-cmark.
pub struct RichRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl RichRenderer {
    pub fn new(theme_name: &str) -> Result<RichRenderer> {
        let mut themes = ThemeSet::load_defaults();
        let Some(theme) = themes.themes.remove(theme_name) else {
            bail!(format!(
                "Theme {theme_name} does not exist. Available themes are: {}",
                RendererManager::themes().join(", ")
            ));
        };

        return Ok(RichRenderer {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        });
    }

    fn highlight(&self, language: &str, code: &str) -> Result<String> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .unwrap_or_else(|| return self.syntax_set.find_syntax_plain_text());
        let mut highlight = HighlightLines::new(syntax, &self.theme);

        let mut res = String::new();
        for line in LinesWithEndings::from(code) {
            let ranges = highlight.highlight_line(line, &self.syntax_set)?;
            res += &as_24_bit_terminal_escaped(&ranges[..], false);
        }
        res += "\x1b[0m";

        return Ok(res);
    }
}

impl Renderer for RichRenderer {
    fn name(&self) -> RendererName {
        return RendererName::Rich;
    }

    fn explanation(&self, markdown: &str) -> String {
        return markdown_to_ansi(markdown);
    }

    fn code(&self, index: usize, block: &CodeBlock) -> String {
        let header = format!("[{}] {}", index + 1, block.language)
            .dimmed()
            .to_string();

        match self.highlight(&block.language, &block.code) {
            Ok(body) => return format!("{header}\n{body}"),
            Err(err) => {
                tracing::warn!(error = ?err, language = %block.language, "highlighting failed");
                return format!("{header}\n{}", block.code);
            }
        }
    }

    fn title(&self, text: &str) -> String {
        return text.bold().green().to_string();
    }
}

pub struct RendererManager {}

impl RendererManager {
    pub fn get(name: RendererName, theme: &str) -> Result<RendererBox> {
        if name == RendererName::Simple {
            return Ok(Box::<SimpleRenderer>::default());
        }

        return Ok(Box::new(RichRenderer::new(theme)?));
    }

    pub fn themes() -> Vec<String> {
        let mut themes = ThemeSet::load_defaults()
            .themes
            .keys()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        themes.sort();

        return themes;
    }
}
