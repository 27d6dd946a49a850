#[cfg(test)]
#[path = "markdown_test.rs"]
mod tests;

use owo_colors::OwoColorize;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<(String, String)>>,
    row: Vec<(String, String)>,
    has_head: bool,
}

/// Collects pulldown-cmark events into ANSI styled blocks. `line` holds the
/// styled text of the block being built, `plain` the same text without escape
/// codes so table columns can be measured.
#[derive(Default)]
struct AnsiWriter {
    blocks: Vec<String>,
    line: String,
    plain: String,
    heading: Option<HeadingLevel>,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    link: Option<String>,
    quote: usize,
    code_block: bool,
    lists: Vec<Option<u64>>,
    list_lines: Vec<String>,
    table: Option<TableState>,
}

impl AnsiWriter {
    fn styled(&self, text: &str) -> String {
        let mut res = text.to_string();
        if self.heading == Some(HeadingLevel::H1) {
            res = res.underline().to_string();
        }
        if self.heading.is_some() || self.strong > 0 {
            res = res.bold().to_string();
        }
        if self.emphasis > 0 {
            res = res.italic().to_string();
        }
        if self.strikethrough > 0 {
            res = res.strikethrough().to_string();
        }
        if self.link.is_some() {
            res = res.blue().to_string();
        }

        return res;
    }

    fn append(&mut self, styled: &str, plain: &str) {
        self.line += styled;
        self.plain += plain;
    }

    fn take_line(&mut self) -> String {
        self.plain.clear();
        return std::mem::take(&mut self.line);
    }

    fn flush(&mut self) {
        let line = self.take_line();
        if line.trim().is_empty() {
            return;
        }

        if self.quote > 0 {
            let bar = "│".dimmed().to_string();
            let quoted = line
                .lines()
                .map(|e| return format!("  {bar} {}", e.italic()))
                .collect::<Vec<String>>()
                .join("\n");
            self.blocks.push(quoted);
            return;
        }

        self.blocks.push(line.trim_end().to_string());
    }

    fn end_cell(&mut self) {
        let plain = self.plain.trim().to_string();
        let styled = self.take_line().trim().to_string();
        if let Some(table) = self.table.as_mut() {
            table.row.push((styled, plain));
        }
    }

    fn end_row(&mut self, head: bool) {
        if let Some(table) = self.table.as_mut() {
            let row = std::mem::take(&mut table.row);
            table.rows.push(row);
            if head {
                table.has_head = true;
            }
        }
    }

    fn end_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };

        let columns = table.rows.iter().map(|e| return e.len()).max().unwrap_or(0);
        let widths = (0..columns)
            .map(|col| {
                return table
                    .rows
                    .iter()
                    .filter_map(|row| return row.get(col))
                    .map(|(_, plain)| return plain.chars().count())
                    .max()
                    .unwrap_or(0);
            })
            .collect::<Vec<usize>>();

        let mut lines = vec![];
        for (idx, row) in table.rows.iter().enumerate() {
            let cells = widths
                .iter()
                .enumerate()
                .map(|(col, width)| {
                    let (styled, plain) = row
                        .get(col)
                        .map(|(styled, plain)| return (styled.as_str(), plain.as_str()))
                        .unwrap_or(("", ""));
                    let padding = " ".repeat(width.saturating_sub(plain.chars().count()));
                    return format!("{styled}{padding}");
                })
                .collect::<Vec<String>>();
            lines.push(cells.join(" │ ").trim_end().to_string());

            if idx == 0 && table.has_head {
                let rule = widths
                    .iter()
                    .map(|width| return "─".repeat(*width))
                    .collect::<Vec<String>>()
                    .join("─┼─");
                lines.push(rule.dimmed().to_string());
            }
        }

        self.blocks.push(lines.join("\n"));
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading(level, _, _) => {
                self.flush();
                self.heading = Some(level);
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.flush();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                if !self.line.trim().is_empty() {
                    let line = self.take_line();
                    self.list_lines.push(line.trim_end().to_string());
                }

                let indent = "  ".repeat(self.lists.len());
                let mut bullet = "•".to_string();
                if let Some(Some(number)) = self.lists.last_mut() {
                    bullet = format!("{number}.");
                    *number += 1;
                }
                let styled = format!("{indent}{} ", bullet.cyan());
                let plain = format!("{indent}{bullet} ");
                self.append(&styled, &plain);
            }
            Tag::Table(_) => {
                self.flush();
                self.table = Some(TableState::default());
            }
            Tag::TableHead | Tag::TableRow | Tag::TableCell => {}
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link(_, url, _) => self.link = Some(url.to_string()),
            Tag::Image(_, url, _) => {
                let text = format!("[image {url}]");
                self.append(&text.dimmed().to_string(), &text);
            }
            Tag::Paragraph | Tag::FootnoteDefinition(_) => {}
        }
    }

    fn end(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.flush();
                }
            }
            Tag::Heading(..) => {
                self.flush();
                self.heading = None;
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote = self.quote.saturating_sub(1);
            }
            Tag::CodeBlock(_) => {
                let code = self.take_line();
                let body = code
                    .trim_end()
                    .lines()
                    .map(|e| return format!("    {}", e.dimmed()))
                    .collect::<Vec<String>>()
                    .join("\n");
                self.blocks.push(body);
                self.code_block = false;
            }
            Tag::Item => {
                if !self.line.trim().is_empty() {
                    let line = self.take_line();
                    self.list_lines.push(line.trim_end().to_string());
                }
                self.take_line();
            }
            Tag::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    let lines = std::mem::take(&mut self.list_lines);
                    self.blocks.push(lines.join("\n"));
                }
            }
            Tag::TableCell => self.end_cell(),
            Tag::TableHead => self.end_row(true),
            Tag::TableRow => self.end_row(false),
            Tag::Table(_) => self.end_table(),
            Tag::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            Tag::Strong => self.strong = self.strong.saturating_sub(1),
            Tag::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            Tag::Link(..) => {
                if let Some(url) = self.link.take() {
                    let text = format!(" ({url})");
                    self.append(&text.dimmed().to_string(), &text);
                }
            }
            Tag::Image(..) | Tag::FootnoteDefinition(_) => {}
        }
    }

    fn push(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code_block {
                    self.append(&text, &text);
                } else {
                    let styled = self.styled(&text);
                    self.append(&styled, &text);
                }
            }
            Event::Code(code) => {
                self.append(&code.to_string().yellow().to_string(), &code);
            }
            Event::Html(html) => self.append(&html, &html),
            Event::FootnoteReference(label) => {
                let text = format!("[{label}]");
                self.append(&text, &text);
            }
            Event::SoftBreak => self.append(" ", " "),
            Event::HardBreak => self.append("\n", "\n"),
            Event::Rule => {
                self.flush();
                self.blocks.push("─".repeat(40).dimmed().to_string());
            }
            Event::TaskListMarker(checked) => {
                let text = if checked { "[x] " } else { "[ ] " };
                self.append(text, text);
            }
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        return self.blocks.join("\n\n");
    }
}

/// Renders CommonMark with the GitHub table, strikethrough and task list
/// extensions as ANSI styled terminal text.
pub fn markdown_to_ansi(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut writer = AnsiWriter::default();
    for event in Parser::new_ext(text, options) {
        writer.push(event);
    }

    return writer.finish();
}
