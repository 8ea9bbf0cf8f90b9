//! Markdown to document tree using pulldown-cmark
//!
//! This is the rendering collaborator: it produces a fresh `Document` on every
//! load. Frontmatter (YAML/TOML metadata blocks) is skipped.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

use crate::dom::node::{Document, NodeId};

/// A freshly rendered document plus the metadata used in export headers
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub doc: Document,
    pub title: String,
    pub filename: String,
}

impl RenderedDocument {
    pub fn root(&self) -> NodeId {
        self.doc.root()
    }
}

/// Render markdown into a new document
///
/// The title is the text of the first `#` heading, falling back to the file name.
pub fn render_markdown(markdown: &str, filename: &str) -> RenderedDocument {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
        | Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS;

    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.root()];
    let mut in_metadata = false;
    let mut title: Option<String> = None;
    let mut title_buf: Option<String> = None;
    let mut title_depth = 0;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::MetadataBlock(_)) => in_metadata = true,
            Event::End(_) if in_metadata => in_metadata = false,
            _ if in_metadata => {}

            Event::Start(tag) => {
                if matches!(
                    tag,
                    Tag::Heading {
                        level: HeadingLevel::H1,
                        ..
                    }
                ) && title.is_none()
                {
                    title_buf = Some(String::new());
                    title_depth = stack.len();
                }

                let element = open_element(&mut doc, &tag);
                let parent = current(&stack, &doc);
                doc.append_child(parent, element);
                stack.push(element);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
                if title_buf.is_some() && stack.len() == title_depth {
                    title = title_buf.take().map(|buf| buf.trim().to_string());
                }
            }
            Event::Text(text) => {
                if let Some(buf) = title_buf.as_mut() {
                    buf.push_str(&text);
                }
                append_text(&mut doc, &stack, &text);
            }
            Event::Code(text) => {
                if let Some(buf) = title_buf.as_mut() {
                    buf.push_str(&text);
                }
                let code = doc.create_element("code");
                let parent = current(&stack, &doc);
                doc.append_child(parent, code);
                let node = doc.create_text(&text);
                doc.append_child(code, node);
            }
            Event::SoftBreak => append_text(&mut doc, &stack, "\n"),
            Event::HardBreak => {
                let br = doc.create_element("br");
                let parent = current(&stack, &doc);
                doc.append_child(parent, br);
            }
            Event::Rule => {
                let hr = doc.create_element("hr");
                let parent = current(&stack, &doc);
                doc.append_child(parent, hr);
            }
            Event::TaskListMarker(checked) => {
                let input = doc.create_element("input");
                doc.set_attr(input, "type", "checkbox");
                if checked {
                    doc.set_attr(input, "checked", "");
                }
                let parent = current(&stack, &doc);
                doc.append_child(parent, input);
            }
            Event::FootnoteReference(label) => {
                let sup = doc.create_element("sup");
                let parent = current(&stack, &doc);
                doc.append_child(parent, sup);
                let text = doc.create_text(&label);
                doc.append_child(sup, text);
            }
            // Raw HTML and math are not interpreted
            _ => {}
        }
    }

    RenderedDocument {
        doc,
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| filename.to_string()),
        filename: filename.to_string(),
    }
}

fn current(stack: &[NodeId], doc: &Document) -> NodeId {
    stack.last().copied().unwrap_or_else(|| doc.root())
}

fn append_text(doc: &mut Document, stack: &[NodeId], text: &str) {
    let parent = current(stack, doc);
    let node = doc.create_text(text);
    doc.append_child(parent, node);
}

fn open_element(doc: &mut Document, tag: &Tag) -> NodeId {
    let name = match tag {
        Tag::Paragraph => "p",
        Tag::Heading { level, .. } => heading_tag(*level),
        Tag::BlockQuote(_) => "blockquote",
        Tag::CodeBlock(_) => "pre",
        Tag::List(Some(_)) => "ol",
        Tag::List(None) => "ul",
        Tag::Item => "li",
        Tag::FootnoteDefinition(_) => "aside",
        Tag::Table(_) => "table",
        Tag::TableHead => "thead",
        Tag::TableRow => "tr",
        Tag::TableCell => "td",
        Tag::Emphasis => "em",
        Tag::Strong => "strong",
        Tag::Strikethrough => "del",
        Tag::Link { .. } => "a",
        Tag::Image { .. } => "img",
        _ => "div",
    };

    let element = doc.create_element(name);
    match tag {
        Tag::Link { dest_url, .. } => doc.set_attr(element, "href", dest_url),
        Tag::Image { dest_url, .. } => doc.set_attr(element, "src", dest_url),
        Tag::List(Some(start)) if *start != 1 => {
            doc.set_attr(element, "start", &start.to_string())
        }
        Tag::CodeBlock(CodeBlockKind::Fenced(lang)) if !lang.is_empty() => {
            doc.set_attr(element, "data-lang", lang)
        }
        _ => {}
    }
    element
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}
