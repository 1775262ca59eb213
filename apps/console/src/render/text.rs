//! Plain-text layout of rendered trees for the terminal.

use std::fmt::Write;

use super::{Rendered, RenderedField, VisionRow};

const INDENT: usize = 2;

/// Lays out fields one per line. Flat lists are joined inline, nested values indent.
pub fn format_fields(fields: &[RenderedField]) -> String {
    let mut out = String::new();
    write_fields(&mut out, fields, 0);
    out
}

pub fn format_vision(doc_type: &str, rows: &[VisionRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Document type: {doc_type}");
    let _ = writeln!(out, "{} fields found", rows.len());

    let width = rows.iter().map(|r| r.field.chars().count()).max().unwrap_or(0);
    for row in rows {
        let marker = if row.high_confidence { "" } else { " (review)" };
        let _ = writeln!(
            out,
            "  {:<width$}  {}  [{}%{}]",
            row.field, row.value, row.confidence, marker
        );
    }
    out
}

fn write_fields(out: &mut String, fields: &[RenderedField], depth: usize) {
    for field in fields {
        let pad = " ".repeat(depth * INDENT);
        match &field.value {
            Rendered::Text(text) => {
                let _ = writeln!(out, "{pad}{}: {text}", field.label);
            }
            Rendered::Sequence(items) if is_flat(items) => {
                let _ = writeln!(out, "{pad}{}: {}", field.label, join_flat(items));
            }
            value => {
                let _ = writeln!(out, "{pad}{}:", field.label);
                write_value(out, value, depth + 1);
            }
        }
    }
}

fn write_value(out: &mut String, value: &Rendered, depth: usize) {
    let pad = " ".repeat(depth * INDENT);
    match value {
        Rendered::Text(text) => {
            let _ = writeln!(out, "{pad}{text}");
        }
        Rendered::Fields(fields) => write_fields(out, fields, depth),
        Rendered::Sequence(items) => {
            for item in items {
                match item {
                    Rendered::Text(text) => {
                        let _ = writeln!(out, "{pad}- {text}");
                    }
                    Rendered::Sequence(inner) if is_flat(inner) => {
                        let _ = writeln!(out, "{pad}- {}", join_flat(inner));
                    }
                    nested => {
                        let _ = writeln!(out, "{pad}-");
                        write_value(out, nested, depth + 1);
                    }
                }
            }
        }
    }
}

fn is_flat(items: &[Rendered]) -> bool {
    items.iter().all(|i| matches!(i, Rendered::Text(_)))
}

fn join_flat(items: &[Rendered]) -> String {
    items
        .iter()
        .filter_map(|i| match i {
            Rendered::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Rendered {
        Rendered::Text(s.to_string())
    }

    fn field(label: &str, value: Rendered) -> RenderedField {
        RenderedField {
            label: label.to_string(),
            value,
        }
    }

    #[test]
    fn test_flat_fields_and_lists() {
        let fields = vec![
            field("job title", text("Senior ML Engineer")),
            field("skills", Rendered::Sequence(vec![text("Python"), text("PyTorch")])),
        ];
        assert_eq!(
            format_fields(&fields),
            "job title: Senior ML Engineer\nskills: Python, PyTorch\n"
        );
    }

    #[test]
    fn test_nested_fields_indent() {
        let fields = vec![field(
            "location",
            Rendered::Fields(vec![field("city", text("Austin")), field("remote ok", text("true"))]),
        )];
        assert_eq!(
            format_fields(&fields),
            "location:\n  city: Austin\n  remote ok: true\n"
        );
    }

    #[test]
    fn test_list_of_mappings() {
        let fields = vec![field(
            "rounds",
            Rendered::Sequence(vec![Rendered::Fields(vec![field("stage", text("screen"))])]),
        )];
        assert_eq!(format_fields(&fields), "rounds:\n  -\n    stage: screen\n");
    }

    #[test]
    fn test_empty_fields_render_empty() {
        assert_eq!(format_fields(&[]), "");
    }

    #[test]
    fn test_vision_layout_flags_low_confidence() {
        let rows = vec![
            VisionRow {
                field: "Name".into(),
                value: "Jane Doe".into(),
                confidence: "96".into(),
                high_confidence: true,
            },
            VisionRow {
                field: "Key Skills".into(),
                value: "Rust".into(),
                confidence: "85".into(),
                high_confidence: false,
            },
        ];
        let out = format_vision("Resume", &rows);
        assert!(out.starts_with("Document type: Resume\n2 fields found\n"));
        assert!(out.contains("  Name        Jane Doe  [96%]\n"));
        assert!(out.contains("  Key Skills  Rust  [85% (review)]\n"));
    }
}
