//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md, raw

use crate::core::model::{Kind, ResultItem, ResultSet};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
            OutputFormat::Raw => self.render_raw(result_set),
        }
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let mut annotations = Vec::new();
        let mut files = Vec::new();
        let mut statuses = Vec::new();
        let mut errors = Vec::new();

        for item in &result_set.items {
            match item.kind {
                Kind::Strike | Kind::Comment => annotations.push(item),
                Kind::File => files.push(item),
                Kind::Status => statuses.push(item),
                Kind::Error => errors.push(item),
            }
        }

        if !errors.is_empty() {
            output.push_str("## Errors\n\n");
            for item in errors {
                for error in &item.errors {
                    output.push_str(&format!("- **{}**: {}\n", error.code, error.message));
                }
            }
            output.push('\n');
        }

        if !statuses.is_empty() {
            output.push_str("## Status\n\n");
            for item in statuses {
                if let Some(serde_json::Value::Object(map)) = &item.data {
                    for (key, value) in map {
                        output.push_str(&format!("- **{}**: {}\n", key, plain_value(value)));
                    }
                }
            }
            output.push('\n');
        }

        if !annotations.is_empty() {
            output.push_str("## Annotations\n\n");
            for item in annotations {
                self.render_annotation_md(&mut output, item);
            }
            output.push('\n');
        }

        if !files.is_empty() {
            output.push_str("## Files\n\n");
            for item in files {
                if let Some(path) = &item.path {
                    output.push_str(&format!("- `{}`", path));
                    if let Some(count) = item.meta.count.filter(|c| *c > 0) {
                        output.push_str(&format!(" ({} annotations)", count));
                    }
                    if item.meta.current {
                        output.push_str(" *current*");
                    }
                    output.push('\n');
                }
            }
            output.push('\n');
        }

        output
    }

    fn render_annotation_md(&self, output: &mut String, item: &ResultItem) {
        let id = item.id.as_deref().unwrap_or("?");
        let quoted = item.excerpt.as_deref().unwrap_or_default();
        match item.kind {
            Kind::Comment => output.push_str(&format!(
                "- `{}` comment on \"{}\": {}",
                id,
                quoted,
                item.comment.as_deref().unwrap_or_default()
            )),
            _ => output.push_str(&format!("- `{}` delete \"{}\"", id, quoted)),
        }
        if let Some(path) = &item.path {
            output.push_str(&format!(" (`{}`)", path));
        }
        output.push('\n');
    }

    /// Render as raw output: quoted text only, one per line
    fn render_raw(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| item.excerpt.clone().or_else(|| item.path.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn plain_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotation::{Annotation, AnnotationId, AnnotationKind};
    use crate::core::model::{BriefError, Meta};

    fn sample_set() -> ResultSet {
        let strike = Annotation {
            id: AnnotationId(1),
            kind: AnnotationKind::Strike,
            quoted_text: "some text".to_string(),
            comment: None,
            created_order: 1,
        };
        let comment = Annotation {
            id: AnnotationId(2),
            kind: AnnotationKind::Comment,
            quoted_text: "First".to_string(),
            comment: Some("Why?".to_string()),
            created_order: 2,
        };
        vec![
            ResultItem::annotation(None, &strike),
            ResultItem::annotation(None, &comment),
        ]
        .into_iter()
        .collect()
    }

    fn renderer(format: OutputFormat) -> Renderer {
        Renderer::with_config(RenderConfig::with_pretty(format, false))
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("raw".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_jsonl_one_line_per_item() {
        let output = renderer(OutputFormat::Jsonl).render(&sample_set());
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"kind\":\"strike\""));
        assert!(lines[1].contains("\"comment\":\"Why?\""));
    }

    #[test]
    fn test_render_json_array() {
        let output = renderer(OutputFormat::Json).render(&sample_set());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_render_json_pretty() {
        let config = RenderConfig::with_pretty(OutputFormat::Json, true);
        let output = Renderer::with_config(config).render(&sample_set());
        assert!(output.contains("\n  "));
    }

    #[test]
    fn test_render_markdown_annotations() {
        let output = renderer(OutputFormat::Markdown).render(&sample_set());
        assert!(output.contains("## Annotations"));
        assert!(output.contains("- `ann-1` delete \"some text\""));
        assert!(output.contains("- `ann-2` comment on \"First\": Why?"));
    }

    #[test]
    fn test_render_markdown_files_and_errors() {
        let mut set = ResultSet::new();
        set.push(ResultItem::file("a.md").with_meta(Meta {
            count: Some(2),
            current: true,
        }));
        set.push(ResultItem::file("b.md"));
        set.push(ResultItem::error(BriefError::new("NOT_FOUND", "missing")));

        let output = renderer(OutputFormat::Markdown).render(&set);
        assert!(output.contains("## Errors"));
        assert!(output.contains("- **NOT_FOUND**: missing"));
        assert!(output.contains("- `a.md` (2 annotations) *current*"));
        assert!(output.contains("- `b.md`\n"));
    }

    #[test]
    fn test_render_markdown_status() {
        let mut set = ResultSet::new();
        set.push(ResultItem::status(
            serde_json::json!({ "mode": "single", "count": 3 }),
        ));
        let output = renderer(OutputFormat::Markdown).render(&set);
        assert!(output.contains("- **mode**: single"));
        assert!(output.contains("- **count**: 3"));
    }

    #[test]
    fn test_render_raw() {
        let output = renderer(OutputFormat::Raw).render(&sample_set());
        assert_eq!(output, "some text\nFirst");
    }

    #[test]
    fn test_render_empty_set() {
        let set = ResultSet::new();
        assert_eq!(renderer(OutputFormat::Jsonl).render(&set), "");
        assert_eq!(renderer(OutputFormat::Json).render(&set), "[]");
    }
}
