//! Export flow - serialize annotations as a change request
//!
//! Output layout:
//! ```text
//! <source>
//! {title}
//! {filename}
//! </source>
//!
//! <annotations>
//! 1. [DELETE] "quoted"
//! 2. [COMMENT on "quoted"] comment
//! </annotations>
//!
//! Please apply these annotations to the source document.
//! ```
//! Folder exports name the folder in `<source>` and group lines under
//! `## <path>` headers, numbering continuously across files.

use crate::core::annotation::{Annotation, AnnotationKind, AnnotationStore};
use crate::error::AnnotateError;

const SINGLE_INSTRUCTION: &str = "Please apply these annotations to the source document.";
const FOLDER_INSTRUCTION: &str = "Please apply these annotations to the source documents.";

/// One numbered export line
pub fn format_line(number: usize, annotation: &Annotation) -> String {
    match annotation.kind {
        AnnotationKind::Strike => format!("{}. [DELETE] \"{}\"", number, annotation.quoted_text),
        AnnotationKind::Comment => format!(
            "{}. [COMMENT on \"{}\"] {}",
            number,
            annotation.quoted_text,
            annotation.comment.as_deref().unwrap_or_default()
        ),
    }
}

/// Export of the single implicit document
pub fn format_single(title: &str, filename: &str, store: &AnnotationStore) -> Result<String, AnnotateError> {
    if store.is_empty() {
        return Err(AnnotateError::NothingToExport);
    }

    let mut out = format!("<source>\n{}\n{}\n</source>\n\n<annotations>\n", title, filename);
    for (i, annotation) in store.list().iter().enumerate() {
        out.push_str(&format_line(i + 1, annotation));
        out.push('\n');
    }
    out.push_str("</annotations>\n\n");
    out.push_str(SINGLE_INSTRUCTION);
    Ok(out)
}

/// Export of every annotated file of a folder, in `files` order
///
/// Files whose store is empty are skipped.
pub fn format_folder(name: &str, files: &[(String, AnnotationStore)]) -> Result<String, AnnotateError> {
    let sections: Vec<&(String, AnnotationStore)> =
        files.iter().filter(|(_, store)| !store.is_empty()).collect();
    if sections.is_empty() {
        return Err(AnnotateError::NothingToExport);
    }

    let mut out = format!("<source>\n{}\n</source>\n\n<annotations>\n", name);
    let mut number = 0;
    for (i, (path, store)) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("## {}\n", path));
        for annotation in store.list() {
            number += 1;
            out.push_str(&format_line(number, annotation));
            out.push('\n');
        }
    }
    out.push_str("</annotations>\n\n");
    out.push_str(FOLDER_INSTRUCTION);
    Ok(out)
}
