//! Type templates: type text with named references replaced by descriptor
//! ids, rendered per target package.
//!
//! The text form writes each reference as `{{id}}`. That form is what helper
//! metadata carries over the wire and what relocated declarations store.

use regex::Regex;
use sr_core::meta::{TypeMeta, TypeSource};
use sr_core::naming::last_segment;
use sr_core::{GenError, Result};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z0-9_-]+)\}\}").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Reference to a descriptor by id.
    Ref(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Template without references.
    pub fn literal(text: &str) -> Self {
        let mut out = Self::default();
        out.push_text(text);
        out
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Ref(id.into())],
        }
    }

    /// Replace byte ranges of `text` with templates.
    ///
    /// Edits are applied in position order; an edit overlapping an earlier
    /// one or reaching past the text is ignored.
    pub fn splice(text: &str, mut edits: Vec<(Range<usize>, Template)>) -> Self {
        edits.sort_by_key(|(range, _)| range.start);
        let mut out = Self::default();
        let mut cursor = 0;
        for (range, template) in edits {
            if range.start < cursor || range.end > text.len() || range.start > range.end {
                continue;
            }
            out.push_text(&text[cursor..range.start]);
            out.append(template);
            cursor = range.end;
        }
        out.push_text(&text[cursor..]);
        out
    }

    /// Read the `{{id}}` text form.
    pub fn parse(text: &str) -> Self {
        let mut out = Self::default();
        let mut cursor = 0;
        for caps in placeholder_re().captures_iter(text) {
            let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_text(&text[cursor..whole.start()]);
            out.segments.push(Segment::Ref(id.as_str().to_string()));
            cursor = whole.end();
        }
        out.push_text(&text[cursor..]);
        out
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Referenced ids in order, with repeats.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Ref(id) => Some(id.as_str()),
            Segment::Text(_) => None,
        })
    }

    pub fn has_refs(&self) -> bool {
        self.ids().next().is_some()
    }

    /// Render for code living in `target_package`.
    pub fn substitute(&self, types: &[TypeMeta], target_package: &str) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Ref(id) => {
                    let meta = find(types, id)?;
                    out.push_str(&qualified_name(meta, target_package));
                }
            }
        }
        Ok(out)
    }

    /// Descriptors this template needs: the ones it references plus,
    /// transitively, those referenced by relocated declarations. Each id
    /// appears once, in discovery order.
    pub fn closure(&self, types: &[TypeMeta]) -> Result<Vec<TypeMeta>> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<String> = self.ids().map(str::to_string).collect();
        let mut out = Vec::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let meta = find(types, &id)?;
            if let Some(code) = meta.code() {
                queue.extend(Self::parse(code).ids().map(str::to_string));
            }
            out.push(meta.clone());
        }
        Ok(out)
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    fn append(&mut self, other: Template) {
        for segment in other.segments {
            match segment {
                Segment::Text(text) => self.push_text(&text),
                Segment::Ref(id) => self.segments.push(Segment::Ref(id)),
            }
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::Ref(id) => write!(f, "{{{{{id}}}}}")?,
            }
        }
        Ok(())
    }
}

fn find<'a>(types: &'a [TypeMeta], id: &str) -> Result<&'a TypeMeta> {
    types
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| GenError::UnknownPlaceholder(id.to_string()))
}

/// How code in `target_package` names a descriptor's type.
pub fn qualified_name(meta: &TypeMeta, target_package: &str) -> String {
    match &meta.source {
        TypeSource::Imported(import) => format!("{}.{}", import.export(), meta.name),
        TypeSource::Relocated { .. } if meta.from == target_package => meta.name.clone(),
        TypeSource::Relocated { .. } => format!("{}.{}", last_segment(&meta.from), meta.name),
    }
}

/// Render an `{{id}}` expression for code living in `target_package`.
pub fn substitute(expr: &str, types: &[TypeMeta], target_package: &str) -> Result<String> {
    Template::parse(expr).substitute(types, target_package)
}
