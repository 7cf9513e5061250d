//! Mermaid block extraction and substitution.
//!
//! Finds fenced diagram blocks in raw markdown, renders each one through a
//! [`DiagramRenderer`] and splices the result back into the document as a
//! `text` fence. A block that fails to render is degraded to a `text` fence
//! holding its original source and reported as a [`BlockFailure`]; no
//! renderer failure ever escapes [`Extractor::substitute`].
//!
//! Matching is lazy: a block ends at the first triple backtick after its
//! opening marker, even when that backtick run belongs to an inner fence.

use std::borrow::Cow;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};

use crate::diagram::{DiagramError, DiagramOptions, DiagramRenderer};

/// Fence language that marks a diagram block.
pub const DEFAULT_DIAGRAM_TAG: &str = "mermaid";

/// Fence language used for substituted blocks. The highlighter leaves it alone.
pub const SUBSTITUTE_TAG: &str = "text";

const FENCE: &str = "```";

/// Serializes swapping the process-wide panic hook.
static PANIC_HOOK_LOCK: Mutex<()> = Mutex::new(());

/// A diagram block located in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Block body with surrounding whitespace trimmed.
    pub raw_code: String,
    /// Byte range of the whole fenced region, opening marker through the
    /// closing backticks.
    pub span: Range<usize>,
}

/// A block whose conversion failed and was degraded to its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFailure {
    /// Zero-based position of the block in the document.
    pub index: usize,
    pub raw_code: String,
    pub error: DiagramError,
}

/// Result of substituting every diagram block in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution<'a> {
    /// The rewritten document. Borrowed when no block was found.
    pub text: Cow<'a, str>,
    /// Number of diagram blocks found.
    pub blocks: usize,
    pub failures: Vec<BlockFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    OutsideBlock,
    InBlockBody { open: usize, body: usize },
}

/// Locate every diagram block tagged `tag`, left to right, non-overlapping.
///
/// An opening marker is three backticks and `tag` at the start of a line,
/// followed by at least one whitespace character. The body runs to the first
/// triple backtick after that whitespace. A marker with no closing backticks
/// after it is not a block. An empty body still makes a block; the renderer
/// sees an empty string.
pub fn find_blocks(document: &str, tag: &str) -> Vec<DiagramBlock> {
    let marker = format!("{FENCE}{tag}");
    let mut blocks = Vec::new();
    let mut state = ScanState::OutsideBlock;
    let mut pos = 0;

    loop {
        match state {
            ScanState::OutsideBlock => {
                let Some(open) = find_open_marker(document, pos, &marker) else {
                    break;
                };
                let after = open + marker.len();
                let ws_len: usize = document[after..]
                    .chars()
                    .take_while(|ch| ch.is_whitespace())
                    .map(char::len_utf8)
                    .sum();
                if ws_len == 0 {
                    pos = after;
                    continue;
                }
                state = ScanState::InBlockBody {
                    open,
                    body: after + ws_len,
                };
            }
            ScanState::InBlockBody { open, body } => {
                let Some(offset) = document[body..].find(FENCE) else {
                    break;
                };
                let close = body + offset;
                let end = close + FENCE.len();
                blocks.push(DiagramBlock {
                    raw_code: document[body..close].trim().to_string(),
                    span: open..end,
                });
                pos = end;
                state = ScanState::OutsideBlock;
            }
        }
    }

    blocks
}

fn find_open_marker(document: &str, from: usize, marker: &str) -> Option<usize> {
    let mut search = from;
    while let Some(offset) = document[search..].find(marker) {
        let idx = search + offset;
        if idx == 0 || document.as_bytes()[idx - 1] == b'\n' {
            return Some(idx);
        }
        search = idx + marker.len();
    }
    None
}

/// Replaces diagram blocks with rendered text fences.
pub struct Extractor<'r> {
    renderer: &'r dyn DiagramRenderer,
    tag: String,
    options: DiagramOptions,
}

impl std::fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("tag", &self.tag)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'r> Extractor<'r> {
    pub fn new(renderer: &'r dyn DiagramRenderer) -> Self {
        Self {
            renderer,
            tag: DEFAULT_DIAGRAM_TAG.to_string(),
            options: DiagramOptions::default(),
        }
    }

    /// Match fences tagged `tag` instead of `mermaid`.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: DiagramOptions) -> Self {
        self.options = options;
        self
    }

    /// Rewrite `document`, rendering every diagram block.
    ///
    /// All blocks are located on the original text first, so each block is
    /// converted independently of the replacements before it.
    pub fn substitute<'a>(&self, document: &'a str) -> Substitution<'a> {
        let _scope = crate::perf::scope("extract.substitute");
        let blocks = find_blocks(document, &self.tag);
        if blocks.is_empty() {
            return Substitution {
                text: Cow::Borrowed(document),
                blocks: 0,
                failures: Vec::new(),
            };
        }

        let mut out = String::with_capacity(document.len());
        let mut failures = Vec::new();
        let mut cursor = 0;
        for (index, block) in blocks.iter().enumerate() {
            out.push_str(&document[cursor..block.span.start]);
            match self.convert(&block.raw_code) {
                Ok(art) => {
                    tracing::debug!(index, lines = art.lines().count(), "rendered diagram block");
                    push_text_fence(&mut out, &art);
                }
                Err(error) => {
                    tracing::debug!(index, %error, "diagram block fell back to source");
                    push_text_fence(&mut out, &block.raw_code);
                    failures.push(BlockFailure {
                        index,
                        raw_code: block.raw_code.clone(),
                        error,
                    });
                }
            }
            cursor = block.span.end;
        }
        out.push_str(&document[cursor..]);

        Substitution {
            text: Cow::Owned(out),
            blocks: blocks.len(),
            failures,
        }
    }

    fn convert(&self, raw_code: &str) -> Result<String, DiagramError> {
        // A contained panic is reported as a block failure; keep the default
        // hook from printing it to stderr as well.
        let _guard = PANIC_HOOK_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.renderer.render(raw_code, &self.options)
        }));
        panic::set_hook(previous_hook);

        result.unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(DiagramError::Panicked(message))
        })
    }
}

fn push_text_fence(out: &mut String, body: &str) {
    out.push_str(FENCE);
    out.push_str(SUBSTITUTE_TAG);
    out.push('\n');
    out.push_str(body);
    out.push('\n');
    out.push_str(FENCE);
}
