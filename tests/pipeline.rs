use std::borrow::Cow;

use mdmd::config::RenderOptions;
use mdmd::diagram::{DiagramError, DiagramOptions, TextRenderer};
use mdmd::extract::Extractor;
use mdmd::render::render_document;

const FIXTURE: &str = include_str!("fixtures/diagrams.md");

#[test]
fn test_fixture_renders_flowcharts_and_keeps_unsupported_source() {
    let rendered = render_document(FIXTURE, &RenderOptions::default(), &TextRenderer);

    assert_eq!(rendered.failures.len(), 1, "{:?}", rendered.failures);
    let failure = &rendered.failures[0];
    assert_eq!(failure.index, 2);
    assert!(matches!(failure.error, DiagramError::Unsupported(_)));

    for label in ["Open pull request", "Review passed?", "API gateway", "Storage"] {
        assert!(rendered.text.contains(label), "missing {label}");
    }
    assert!(rendered.text.contains("Alice->>Bob: Hello"));
    assert!(!rendered.text.contains("```"));
    assert!(!rendered.text.contains('\u{1b}'));
}

#[test]
fn test_fixture_keeps_surrounding_markdown() {
    let rendered = render_document(FIXTURE, &RenderOptions::default(), &TextRenderer);
    let text = &rendered.text;
    assert!(text.starts_with("# Release process\n"));
    assert!(text.contains("(https://example.com/contributing)"));
    assert!(text.contains("• Gateway terminates TLS"));
    assert!(text.contains("✓ Storage is replicated"));
    assert!(text.contains("│ Stage │"));

    let release = text.find("# Release process").unwrap();
    let services = text.find("## Services").unwrap();
    let table = text.find("│ Stage │").unwrap();
    assert!(release < services && services < table);
}

#[test]
fn test_substitution_keeps_segment_order() {
    let echo = |src: &str, _: &DiagramOptions| -> Result<String, DiagramError> {
        Ok(format!("[{src}]"))
    };
    let result = Extractor::new(&echo).substitute(FIXTURE);
    assert_eq!(result.blocks, 3);
    assert_eq!(result.text.matches("```text\n[").count(), 3);
    assert!(!result.text.contains("```mermaid"));
    assert!(result.text.contains("```rust\nfn main() {"));
}

#[test]
fn test_document_without_diagrams_is_untouched_by_extractor() {
    let doc = "# Notes\n\n```python\nprint('hi')\n```\n";
    let result = Extractor::new(&TextRenderer).substitute(doc);
    assert!(matches!(result.text, Cow::Borrowed(d) if d == doc));
}

#[test]
fn test_narrow_width_turns_wide_diagram_into_source() {
    let options = RenderOptions {
        width: 20,
        ..RenderOptions::default()
    };
    let doc = "```mermaid\nflowchart LR\nA[Alpha] --> B[Beta] --> C[Gamma]\n```\n";
    let rendered = render_document(doc, &options, &TextRenderer);
    assert_eq!(rendered.failures.len(), 1);
    assert!(matches!(
        rendered.failures[0].error,
        DiagramError::TooWide { max_width: 15, .. }
    ));
    assert!(rendered.text.contains("flowchart LR"));
}
