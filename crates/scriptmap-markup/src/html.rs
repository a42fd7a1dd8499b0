/*
 * html.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lenient HTML parsing backed by tree-sitter.
//!
//! tree-sitter recovers from any input, so this parser never rejects a
//! document. `<script>` and `<style>` bodies are raw text: a `<` inside them
//! does not open a tag.

use tree_sitter::{Language, Node, Parser};

use crate::error::{MarkupError, Result};
use crate::types::{Attribute, Content, Document, DocumentMode, Element};

/// Parse an HTML document into element records.
///
/// # Errors
///
/// Returns [`MarkupError::Grammar`] if the tree-sitter grammar cannot be
/// loaded or the parser yields no tree.
pub fn parse(source: &str) -> Result<Document> {
    let language: Language = tree_sitter_html::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| MarkupError::Grammar {
            message: e.to_string(),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| MarkupError::Grammar {
            message: "tree-sitter returned None".to_string(),
        })?;

    let mut elements = Vec::new();
    collect_elements(tree.root_node(), source, 0, &mut elements);

    tracing::trace!(count = elements.len(), "Parsed HTML elements");
    Ok(Document {
        mode: DocumentMode::Html,
        elements,
    })
}

/// Walk the tree in document order, recording each element before its children.
fn collect_elements(node: Node<'_>, source: &str, depth: usize, elements: &mut Vec<Element>) {
    let mut child_depth = depth;
    if matches!(node.kind(), "element" | "script_element" | "style_element") {
        if let Some(element) = element_record(node, source, depth) {
            elements.push(element);
            child_depth = depth + 1;
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_elements(child, source, child_depth, elements);
    }
}

/// Build the record for an `element`, `script_element` or `style_element` node.
fn element_record(node: Node<'_>, source: &str, depth: usize) -> Option<Element> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();

    let tag = children
        .iter()
        .find(|child| matches!(child.kind(), "start_tag" | "self_closing_tag"))?;

    let mut tag_cursor = tag.walk();
    let mut name = None;
    let mut attributes = Vec::new();
    for part in tag.children(&mut tag_cursor) {
        match part.kind() {
            "tag_name" => name = Some(node_text(part, source).to_ascii_lowercase()),
            "attribute" => attributes.push(attribute_record(part, source)),
            _ => {}
        }
    }
    let name = name?;

    let content = if tag.kind() == "start_tag" {
        let content_start = tag.end_byte();
        let content_end = children
            .iter()
            .find(|child| child.kind() == "end_tag")
            .map_or(node.end_byte(), |end_tag| end_tag.start_byte());
        Some(Content {
            range: content_start..content_end.max(content_start),
            edits: Vec::new(),
        })
    } else {
        None
    };

    Some(Element {
        name,
        prefix: None,
        attributes,
        start: node.start_byte(),
        depth,
        content,
    })
}

fn attribute_record(node: Node<'_>, source: &str) -> Attribute {
    let mut cursor = node.walk();
    let mut name = String::new();
    let mut value = String::new();

    for part in node.children(&mut cursor) {
        match part.kind() {
            "attribute_name" => name = node_text(part, source).to_ascii_lowercase(),
            "attribute_value" => value = node_text(part, source).to_string(),
            "quoted_attribute_value" => {
                let mut inner = part.walk();
                value = part
                    .children(&mut inner)
                    .find(|n| n.kind() == "attribute_value")
                    .map_or_else(String::new, |n| node_text(n, source).to_string());
            }
            _ => {}
        }
    }

    Attribute {
        name,
        prefix: None,
        value,
    }
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn content_of<'s>(source: &'s str, element: &Element) -> &'s str {
        element.content.as_ref().unwrap().raw(source)
    }

    #[test]
    fn test_parse_script_content() {
        let source = "<html><body><script>console.log(1)</script></body></html>";
        let doc = parse(source).unwrap();

        let scripts: Vec<_> = doc.elements_named("script").collect();
        assert_eq!(scripts.len(), 1);
        assert_eq!(content_of(source, scripts[0]), "console.log(1)");
        assert_eq!(scripts[0].content.as_ref().unwrap().range.start, 20);
        assert_eq!(scripts[0].depth, 2);
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let source = "<script>if (a < b && c > d) { x = '<div>'; }</script>";
        let doc = parse(source).unwrap();

        let script = doc.elements_named("script").next().unwrap();
        assert_eq!(
            content_of(source, script),
            "if (a < b && c > d) { x = '<div>'; }"
        );
        // No element was invented from the script body
        assert_eq!(doc.elements.len(), 1);
    }

    #[test]
    fn test_document_order() {
        let source = "<div><script>a</script><p>x</p></div><script>b</script>";
        let doc = parse(source).unwrap();

        let names: Vec<_> = doc.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["div", "script", "p", "script"]);

        let bodies: Vec<_> = doc
            .elements_named("script")
            .map(|e| content_of(source, e))
            .collect();
        assert_eq!(bodies, vec!["a", "b"]);
    }

    #[test]
    fn test_attributes() {
        let source = r#"<SCRIPT Type="text/babel" data-indent='+2' async src=app.js></SCRIPT>"#;
        let doc = parse(source).unwrap();

        let script = &doc.elements[0];
        assert_eq!(script.name, "script");
        assert_eq!(script.get_attribute("type"), Some("text/babel"));
        assert_eq!(script.get_attribute("data-indent"), Some("+2"));
        assert_eq!(script.get_attribute("async"), Some(""));
        assert_eq!(script.get_attribute("src"), Some("app.js"));
    }

    #[test]
    fn test_empty_script() {
        let source = r#"<script src="x.js"></script>"#;
        let doc = parse(source).unwrap();

        let content = doc.elements[0].content.as_ref().unwrap();
        assert!(content.range.is_empty());
        assert_eq!(content.range.start, source.find("</").unwrap());
    }

    #[test]
    fn test_unterminated_script_runs_to_end() {
        let source = "<p>x</p><script>\n  go();\n";
        let doc = parse(source).unwrap();

        let script = doc.elements_named("script").next().unwrap();
        assert_eq!(content_of(source, script), "\n  go();\n");
    }

    #[test]
    fn test_multibyte_content() {
        let source = "<script>alert(\"héllo\")</script>";
        let doc = parse(source).unwrap();
        let script = doc.elements_named("script").next().unwrap();
        assert_eq!(content_of(source, script), "alert(\"héllo\")");
    }
}
