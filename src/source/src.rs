use std::rc::Rc;

use super::span::{FatPos, Pos};

/// A single source file's text plus its line-start byte offsets, used to
/// resolve a `Pos` into a human-facing line/column for diagnostics.
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(text: &str) -> LineMap {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    pub fn resolve(&self, pos: Pos) -> FatPos {
        let line = match self.line_starts.binary_search(&pos.0) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let col = pos.0 - self.line_starts[line];
        FatPos { line: line as u32 + 1, col: col + 1 }
    }
}

pub struct Source {
    pub name: String,
    pub text: String,
    pub lines: LineMap,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Rc<Source> {
        let text = text.into();
        let lines = LineMap::new(&text);
        Rc::new(Source { name: name.into(), text, lines })
    }
}

/// Owns every `Source` loaded for a compilation; the only thing an AST arena
/// or `TypeInfo` ever borrows a span against.
#[derive(Default)]
pub struct SrcMgr {
    sources: Vec<Rc<Source>>,
}

impl SrcMgr {
    pub fn new() -> SrcMgr {
        SrcMgr::default()
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> Rc<Source> {
        let src = Source::new(name, text);
        self.sources.push(src.clone());
        src
    }
}
