//! Structured document builder.
//!
//! Generated text is assembled as a list of fragments and only turned into a
//! string at the end. A [`Fragment::Line`] is a soft break: it renders as a
//! newline plus indentation in [`Doc::pretty`] and as its flat text in
//! [`Doc::flat`]. [`Fragment::Nest`] indents every line break inside it by
//! one level.

use std::fmt;

const INDENT: &str = "  ";

/// One piece of a [`Doc`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text without line breaks.
    Text(String),
    /// Soft line break with its single-line rendering.
    Line(&'static str),
    /// Indented sub-document.
    Nest(Doc),
}

/// Ordered fragments of generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doc {
    fragments: Vec<Fragment>,
}

impl Doc {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document holding one text fragment.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.push(text);
        doc
    }

    /// Appends text.
    pub fn push(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.fragments.push(Fragment::Text(text));
        }
        self
    }

    /// Appends a soft line break rendered as `flat` on a single line.
    pub fn line(&mut self, flat: &'static str) -> &mut Self {
        self.fragments.push(Fragment::Line(flat));
        self
    }

    /// Appends an indented sub-document.
    pub fn nest(&mut self, doc: Doc) -> &mut Self {
        self.fragments.push(Fragment::Nest(doc));
        self
    }

    /// Appends the fragments of another document.
    pub fn append(&mut self, doc: Doc) -> &mut Self {
        self.fragments.extend(doc.fragments);
        self
    }

    /// Joins documents with a separator text followed by a soft break.
    #[must_use]
    pub fn join(docs: impl IntoIterator<Item = Doc>, separator: &str, flat: &'static str) -> Self {
        let mut out = Self::new();
        for (i, doc) in docs.into_iter().enumerate() {
            if i > 0 {
                out.push(separator).line(flat);
            }
            out.append(doc);
        }
        out
    }

    /// Returns the text wrapped as `before` + self + `after`.
    #[must_use]
    pub fn wrapped(self, before: &str, after: &str) -> Self {
        let mut out = Self::text(before);
        out.append(self);
        out.push(after);
        out
    }

    /// Returns true if the document renders to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| match f {
            Fragment::Text(t) => t.is_empty(),
            Fragment::Line(flat) => flat.is_empty(),
            Fragment::Nest(doc) => doc.is_empty(),
        })
    }

    /// Fragments in order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Renders with line breaks and two-space indentation.
    #[must_use]
    pub fn pretty(&self) -> String {
        self.pretty_at(0)
    }

    /// Renders with line breaks, starting at the given indentation level.
    #[must_use]
    pub fn pretty_at(&self, level: usize) -> String {
        let mut out = String::new();
        self.render_pretty(level, &mut out);
        out
    }

    /// Renders on a single line.
    #[must_use]
    pub fn flat(&self) -> String {
        let mut out = String::new();
        self.render_flat(&mut out);
        out
    }

    fn render_pretty(&self, level: usize, out: &mut String) {
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(t) => out.push_str(t),
                Fragment::Line(_) => {
                    out.push('\n');
                    for _ in 0..level {
                        out.push_str(INDENT);
                    }
                }
                Fragment::Nest(doc) => doc.render_pretty(level + 1, out),
            }
        }
    }

    fn render_flat(&self, out: &mut String) {
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(t) => out.push_str(t),
                Fragment::Line(flat) => out.push_str(flat),
                Fragment::Nest(doc) => doc.render_flat(out),
            }
        }
    }
}

impl fmt::Display for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

impl From<&str> for Doc {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Doc {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}
