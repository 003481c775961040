//! # Namespace-Aware, Format-Preserving XML Editing
//!
//! MSBuild project files, props files, `packages.config` and `nuget.config`
//! are all small XML documents that this crate reads and sometimes rewrites.
//! Legacy project files commonly declare a default namespace
//! (`http://schemas.microsoft.com/developer/msbuild/2003`), so element lookups
//! here match on local name only, and newly created elements are placed in the
//! root element's namespace. Creating them in the empty namespace would emit
//! `xmlns=""` and produce a document that parses but that MSBuild rejects.
//!
//! Reads go through a [`xot::Xot`] tree. Writes never re-serialize that tree:
//! every edit is recorded against the byte spans of the original text, and
//! [`XmlDocument::to_xml_string`] splices the edited ranges into it. Anything
//! outside an edited range comes back byte for byte, including attribute
//! quoting, entity references, comments, ` />` versus `/>`, CRLF line
//! endings, the declaration, a byte order mark and the trailing newline.
//!
//! New elements are written unprefixed, one per line, indented like their
//! siblings, in the form `<Name Attr="value" />`.
//!
//! Documents that declare a DTD or entities are refused before parsing.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use xot::{Node, Xot};

use crate::error::{Error, Result};

const BOM: char = '\u{feff}';
const DEFAULT_INDENT: &str = "  ";

static UNSAFE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<!\s*(DOCTYPE|ENTITY)").expect("static regex is valid")
});

/// Returns true if `text` contains a DOCTYPE or ENTITY declaration.
///
/// The scan is textual, so a declaration inside a comment or a CDATA section
/// matches too. Such documents are refused on purpose; do not narrow this.
pub fn declares_dtd(text: &str) -> bool {
    UNSAFE_DECLARATION.is_match(text)
}

/// Byte offsets of one element of the original text.
#[derive(Debug, Clone)]
struct ElementSpan {
    /// Qualified name as written, for closing a self-closing tag.
    name: String,
    start: usize,
    start_tag_end: usize,
    /// Equal to `start_tag_end` for a self-closing element.
    end_tag_start: usize,
    end: usize,
    self_closing: bool,
    attributes: Vec<AttributeSpan>,
}

#[derive(Debug, Clone)]
struct AttributeSpan {
    name: String,
    quote: char,
    value_start: usize,
    value_end: usize,
}

/// An element created after parsing, rendered from scratch on output.
#[derive(Debug, Clone)]
struct CreatedElement {
    node: Node,
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
}

/// A change to an element of the original text. `element` and `parent`
/// index into `XmlDocument::spans`.
#[derive(Debug, Clone)]
enum Edit {
    SetAttribute {
        element: usize,
        name: String,
        value: String,
    },
    SetText {
        element: usize,
        text: String,
    },
    Remove {
        element: usize,
    },
    Append {
        parent: usize,
        child: Node,
    },
}

/// Replace `source[start..end]` with `text`.
#[derive(Debug)]
struct Splice {
    start: usize,
    end: usize,
    text: String,
}

/// An XML document loaded for namespace-agnostic reading and editing.
pub struct XmlDocument {
    xot: Xot,
    root: Node,
    /// Original text without the byte order mark.
    source: String,
    bom: bool,
    newline: &'static str,
    indent: String,
    spans: Vec<(Node, ElementSpan)>,
    created: Vec<CreatedElement>,
    edits: Vec<Edit>,
    path: PathBuf,
}

impl std::fmt::Debug for XmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlDocument")
            .field("path", &self.path)
            .field("edits", &self.edits.len())
            .finish_non_exhaustive()
    }
}

impl XmlDocument {
    /// Load and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = crate::filesystem::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse `text`; `path` is only used to label errors and for `save`.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        if declares_dtd(text) {
            return Err(Error::UnsafeDocument {
                path: path.to_path_buf(),
            });
        }

        let xml_error = |message: String| Error::Xml {
            path: path.to_path_buf(),
            message,
        };

        let bom = text.starts_with(BOM);
        let source = text.trim_start_matches(BOM).to_string();

        let mut xot = Xot::new();
        let document = xot.parse(&source).map_err(|e| xml_error(e.to_string()))?;
        let root = xot
            .children(document)
            .find(|node| xot.is_element(*node))
            .ok_or_else(|| xml_error("document has no root element".to_string()))?;

        let elements: Vec<Node> = xot
            .descendants(document)
            .filter(|node| xot.is_element(*node))
            .collect();
        let scanned = scan_elements(&source).map_err(xml_error)?;
        if scanned.len() != elements.len() {
            return Err(xml_error(format!(
                "found {} element tags but parsed {} elements",
                scanned.len(),
                elements.len()
            )));
        }
        let spans = elements.into_iter().zip(scanned).collect();

        let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let indent = detect_indent(&source);

        Ok(Self {
            xot,
            root,
            source,
            bom,
            newline,
            indent,
            spans,
            created: Vec::new(),
            edits: Vec::new(),
            path: path.to_path_buf(),
        })
    }

    /// Path this document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The document (root) element.
    pub fn root(&self) -> Node {
        self.root
    }

    /// Local name of an element node, ignoring its namespace.
    pub fn local_name(&self, node: Node) -> Option<&str> {
        self.xot
            .element(node)
            .map(|element| self.xot.local_name_str(element.name()))
    }

    /// Returns true if `node` is an element with the given local name.
    pub fn is_named(&self, node: Node, local: &str) -> bool {
        self.local_name(node) == Some(local)
    }

    /// Child elements of `node`, in document order.
    pub fn child_elements(&self, node: Node) -> Vec<Node> {
        self.xot
            .children(node)
            .filter(|child| self.xot.is_element(*child))
            .collect()
    }

    /// Child elements of `node` with the given local name.
    pub fn children_named(&self, node: Node, local: &str) -> Vec<Node> {
        self.xot
            .children(node)
            .filter(|child| self.is_named(*child, local))
            .collect()
    }

    /// First child element of `node` with the given local name.
    pub fn first_child_named(&self, node: Node, local: &str) -> Option<Node> {
        self.xot
            .children(node)
            .find(|child| self.is_named(*child, local))
    }

    /// Descendant elements of `node` (excluding `node`) with the given local name.
    pub fn descendants_named(&self, node: Node, local: &str) -> Vec<Node> {
        self.xot
            .descendants(node)
            .filter(|d| *d != node && self.is_named(*d, local))
            .collect()
    }

    /// Value of an unprefixed attribute.
    pub fn attribute(&self, node: Node, name: &str) -> Option<&str> {
        let name_id = self.xot.name(name)?;
        self.xot.get_attribute(node, name_id)
    }

    /// Concatenated, trimmed text content of an element.
    pub fn text(&self, node: Node) -> Option<String> {
        let text: String = self
            .xot
            .descendants(node)
            .filter_map(|d| self.xot.text_str(d))
            .collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Parent element of `node`, if any.
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.xot.parent(node).filter(|p| self.xot.is_element(*p))
    }

    /// Create a detached element named `local` in the root element's namespace.
    pub fn create_element(&mut self, local: &str) -> Node {
        let root_name = self
            .xot
            .element(self.root)
            .map(|element| element.name());
        let name = match root_name {
            Some(root_name) => {
                let namespace = self.xot.namespace_for_name(root_name);
                self.xot.add_name_ns(local, namespace)
            }
            None => self.xot.add_name(local),
        };
        let node = self.xot.new_element(name);
        self.created.push(CreatedElement {
            node,
            name: local.to_string(),
            attributes: Vec::new(),
            text: None,
        });
        node
    }

    /// Set an unprefixed attribute.
    pub fn set_attribute(&mut self, node: Node, name: &str, value: &str) {
        let name_id = self.xot.add_name(name);
        self.xot.set_attribute(node, name_id, value);

        if let Some(index) = self.created_index(node) {
            let attributes = &mut self.created[index].attributes;
            match attributes.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        } else if let Some(element) = self.span_index(node) {
            self.edits.retain(|edit| {
                !matches!(edit, Edit::SetAttribute { element: e, name: n, .. } if *e == element && n == name)
            });
            self.edits.push(Edit::SetAttribute {
                element,
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Replace all children of `node` with a single text node.
    pub fn set_text(&mut self, node: Node, text: &str) -> Result<()> {
        let children: Vec<Node> = self.xot.children(node).collect();
        for child in children {
            self.xot.remove(child).map_err(|e| self.edit_error(e))?;
        }
        let text_node = self.xot.new_text(text);
        self.xot
            .append(node, text_node)
            .map_err(|e| self.edit_error(e))?;

        if let Some(index) = self.created_index(node) {
            self.created[index].text = Some(text.to_string());
        } else if let Some(element) = self.span_index(node) {
            self.edits
                .retain(|edit| !matches!(edit, Edit::SetText { element: e, .. } if *e == element));
            self.edits.push(Edit::SetText {
                element,
                text: text.to_string(),
            });
        }
        Ok(())
    }

    /// Append `child`, a created element, as the last element of `parent`.
    ///
    /// On output the child gets its own line, indented like the parent's
    /// existing children, and the parent's closing tag stays on its own line.
    pub fn append_element(&mut self, parent: Node, child: Node) -> Result<()> {
        self.xot
            .append(parent, child)
            .map_err(|e| self.edit_error(e))?;

        if self.created_index(parent).is_none() {
            if let Some(parent) = self.span_index(parent) {
                self.edits.push(Edit::Append { parent, child });
            }
        }
        Ok(())
    }

    /// Remove `node` together with the whitespace that indents it.
    pub fn remove(&mut self, node: Node) -> Result<()> {
        self.xot.remove(node).map_err(|e| self.edit_error(e))?;

        if self.created_index(node).is_some() {
            self.edits
                .retain(|edit| !matches!(edit, Edit::Append { child, .. } if *child == node));
        } else if let Some(element) = self.span_index(node) {
            self.edits.push(Edit::Remove { element });
        }
        Ok(())
    }

    /// Serialize the document: the original text with every edit spliced in.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut splices = Vec::with_capacity(self.edits.len());
        let mut appends: Vec<(usize, Vec<Node>)> = Vec::new();
        for edit in &self.edits {
            match edit {
                Edit::SetAttribute {
                    element,
                    name,
                    value,
                } => splices.push(self.attribute_splice(*element, name, value)),
                Edit::SetText { element, text } => splices.push(self.text_splice(*element, text)),
                Edit::Remove { element } => splices.push(self.remove_splice(*element)),
                Edit::Append { parent, child } => {
                    match appends.iter_mut().find(|(p, _)| p == parent) {
                        Some((_, children)) => children.push(*child),
                        None => appends.push((*parent, vec![*child])),
                    }
                }
            }
        }
        for (parent, children) in &appends {
            splices.push(self.append_splice(*parent, children));
        }

        // Stable, so insertions at one offset keep their edit order. A splice
        // starting inside an earlier one belongs to a removed element.
        splices.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        let mut out = String::with_capacity(self.source.len() + 256);
        if self.bom {
            out.push(BOM);
        }
        let mut cursor = 0;
        for splice in splices {
            if splice.start < cursor {
                continue;
            }
            out.push_str(&self.source[cursor..splice.start]);
            out.push_str(&splice.text);
            cursor = splice.end;
        }
        out.push_str(&self.source[cursor..]);
        Ok(out)
    }

    /// Serialize and atomically write the document back to its path.
    pub fn save(&self) -> Result<()> {
        let content = self.to_xml_string()?;
        crate::filesystem::atomic_write(&self.path, content.as_bytes())
    }

    fn created_index(&self, node: Node) -> Option<usize> {
        self.created.iter().position(|created| created.node == node)
    }

    fn span_index(&self, node: Node) -> Option<usize> {
        self.spans.iter().position(|(n, _)| *n == node)
    }

    fn attribute_splice(&self, element: usize, name: &str, value: &str) -> Splice {
        let span = &self.spans[element].1;
        match span.attributes.iter().find(|attribute| attribute.name == name) {
            Some(attribute) => Splice {
                start: attribute.value_start,
                end: attribute.value_end,
                text: escape_attribute(value, attribute.quote),
            },
            None => {
                let at = self.tag_close_start(span);
                Splice {
                    start: at,
                    end: at,
                    text: format!(" {}=\"{}\"", name, escape_attribute(value, '"')),
                }
            }
        }
    }

    fn text_splice(&self, element: usize, text: &str) -> Splice {
        let span = &self.spans[element].1;
        if span.self_closing {
            Splice {
                start: self.tag_close_start(span),
                end: span.start_tag_end,
                text: format!(">{}</{}>", escape_text(text), span.name),
            }
        } else {
            Splice {
                start: span.start_tag_end,
                end: span.end_tag_start,
                text: escape_text(text),
            }
        }
    }

    fn remove_splice(&self, element: usize) -> Splice {
        let span = &self.spans[element].1;
        Splice {
            start: self.whitespace_before(span.start, 0),
            end: span.end,
            text: String::new(),
        }
    }

    fn append_splice(&self, parent: usize, children: &[Node]) -> Splice {
        let (parent_node, span) = &self.spans[parent];
        let parent_indent = self
            .line_indent(span.start)
            .unwrap_or_else(|| self.indent.repeat(self.depth(*parent_node)));
        let child_indent = self
            .spans
            .get(parent + 1)
            .filter(|(_, first)| first.start < span.end_tag_start)
            .and_then(|(_, first)| self.line_indent(first.start))
            .unwrap_or_else(|| format!("{parent_indent}{}", self.indent));

        let mut text = String::new();
        for child in children {
            text.push_str(self.newline);
            text.push_str(&child_indent);
            text.push_str(&self.render_created(*child, &child_indent));
        }

        if span.self_closing {
            return Splice {
                start: self.tag_close_start(span),
                end: span.start_tag_end,
                text: format!(
                    ">{text}{}{parent_indent}</{}>",
                    self.newline, span.name
                ),
            };
        }

        let trailing = self.whitespace_before(span.end_tag_start, span.start_tag_end);
        if self.source[trailing..span.end_tag_start].contains('\n') {
            Splice {
                start: trailing,
                end: trailing,
                text,
            }
        } else {
            text.push_str(self.newline);
            text.push_str(&parent_indent);
            Splice {
                start: trailing,
                end: span.end_tag_start,
                text,
            }
        }
    }

    fn render_created(&self, node: Node, indent: &str) -> String {
        let Some(created) = self.created.iter().find(|created| created.node == node) else {
            return String::new();
        };

        let mut out = format!("<{}", created.name);
        for (name, value) in &created.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value, '"')));
        }

        let children = self.child_elements(node);
        if !children.is_empty() {
            let child_indent = format!("{indent}{}", self.indent);
            out.push('>');
            for child in children {
                out.push_str(self.newline);
                out.push_str(&child_indent);
                out.push_str(&self.render_created(child, &child_indent));
            }
            out.push_str(&format!("{}{indent}</{}>", self.newline, created.name));
        } else if let Some(text) = &created.text {
            out.push_str(&format!(">{}</{}>", escape_text(text), created.name));
        } else {
            out.push_str(" />");
        }
        out
    }

    /// Offset of the `>` or `/>` closing a start tag, before any whitespace.
    fn tag_close_start(&self, span: &ElementSpan) -> usize {
        let close = if span.self_closing {
            span.start_tag_end - 2
        } else {
            span.start_tag_end - 1
        };
        self.whitespace_before(close, span.start)
    }

    /// Start of the whitespace run ending at `offset`, not before `floor`.
    fn whitespace_before(&self, offset: usize, floor: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut start = offset;
        while start > floor && bytes[start - 1].is_ascii_whitespace() {
            start -= 1;
        }
        start
    }

    /// Indentation of the line `offset` is on, if only whitespace precedes it.
    fn line_indent(&self, offset: usize) -> Option<String> {
        let before = &self.source[..offset];
        let trimmed = before.trim_end_matches([' ', '\t']);
        if trimmed.is_empty() || trimmed.ends_with('\n') {
            Some(before[trimmed.len()..].to_string())
        } else {
            None
        }
    }

    fn depth(&self, node: Node) -> usize {
        let mut depth = 0;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    fn edit_error(&self, e: impl std::fmt::Display) -> Error {
        Error::Xml {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

/// Indentation unit of the first indented tag, or two spaces.
fn detect_indent(text: &str) -> String {
    text.lines()
        .find_map(|line| {
            let rest = line.trim_start_matches([' ', '\t']);
            let width = line.len() - rest.len();
            (width > 0 && rest.starts_with('<')).then(|| line[..width].to_string())
        })
        .unwrap_or_else(|| DEFAULT_INDENT.to_string())
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str, quote: char) -> String {
    let escaped = value.replace('&', "&amp;").replace('<', "&lt;");
    match quote {
        '\'' => escaped.replace('\'', "&apos;"),
        _ => escaped.replace('"', "&quot;"),
    }
}

/// Locate every element of an already well-formed document, in document order.
fn scan_elements(text: &str) -> std::result::Result<Vec<ElementSpan>, String> {
    let mut spans: Vec<ElementSpan> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let lt = pos + offset;
        let rest = &text[lt..];
        pos = if rest.starts_with("<!--") {
            skip_past(text, lt, "-->")?
        } else if rest.starts_with("<![CDATA[") {
            skip_past(text, lt, "]]>")?
        } else if rest.starts_with("<?") {
            skip_past(text, lt, "?>")?
        } else if rest.starts_with("<!") {
            skip_past(text, lt, ">")?
        } else if rest.starts_with("</") {
            let end = skip_past(text, lt, ">")?;
            let index = open
                .pop()
                .ok_or_else(|| format!("unexpected end tag at byte {lt}"))?;
            spans[index].end_tag_start = lt;
            spans[index].end = end;
            end
        } else {
            let span = scan_start_tag(text, lt)?;
            let end = span.start_tag_end;
            if !span.self_closing {
                open.push(spans.len());
            }
            spans.push(span);
            end
        };
    }

    if open.is_empty() {
        Ok(spans)
    } else {
        Err("unclosed element".to_string())
    }
}

fn skip_past(text: &str, from: usize, marker: &str) -> std::result::Result<usize, String> {
    text[from..]
        .find(marker)
        .map(|offset| from + offset + marker.len())
        .ok_or_else(|| format!("unterminated markup at byte {from}"))
}

fn scan_start_tag(text: &str, lt: usize) -> std::result::Result<ElementSpan, String> {
    let bytes = text.as_bytes();
    let unterminated = || format!("unterminated start tag at byte {lt}");
    let is_name_end = |b: u8| b.is_ascii_whitespace() || matches!(b, b'/' | b'>' | b'=');

    let mut i = lt + 1;
    while i < bytes.len() && !is_name_end(bytes[i]) {
        i += 1;
    }
    let name = text[lt + 1..i].to_string();
    let mut attributes = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let self_closing = match bytes.get(i) {
            None => return Err(unterminated()),
            Some(b'>') => false,
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => true,
            Some(_) => {
                let name_start = i;
                while i < bytes.len() && !is_name_end(bytes[i]) {
                    i += 1;
                }
                let attribute_name = text[name_start..i].to_string();
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if bytes.get(i) != Some(&b'=') {
                    return Err(format!("attribute without value at byte {name_start}"));
                }
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                let quote = match bytes.get(i) {
                    Some(&q) if q == b'"' || q == b'\'' => q as char,
                    _ => return Err(format!("unquoted attribute at byte {name_start}")),
                };
                let value_start = i + 1;
                let value_end = text[value_start..]
                    .find(quote)
                    .map(|offset| value_start + offset)
                    .ok_or_else(unterminated)?;
                attributes.push(AttributeSpan {
                    name: attribute_name,
                    quote,
                    value_start,
                    value_end,
                });
                i = value_end + 1;
                continue;
            }
        };

        let start_tag_end = if self_closing { i + 2 } else { i + 1 };
        return Ok(ElementSpan {
            name,
            start: lt,
            start_tag_end,
            end_tag_start: start_tag_end,
            end: start_tag_end,
            self_closing,
            attributes,
        });
    }
}
