//! Python bindings for the cluetext markup parser.

use cluetext_core::{
    ast::{Block, HandwritingStyle, Page},
    error::{ParseError as CoreParseError, ParseErrorKind as CoreParseErrorKind},
    metrics::total_text_length as core_total_text_length,
    reveal::reveal as core_reveal,
    span::Span as CoreSpan,
    ParseResult as CoreParseResult, Parser as CoreParser,
};
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::PyList;

// ============================================================================
// Span
// ============================================================================

/// Source location in the input text (byte offsets).
#[pyclass(frozen, get_all, name = "Span")]
#[derive(Clone)]
pub struct PySpan {
    pub start: u32,
    pub end: u32,
}

#[pymethods]
impl PySpan {
    fn __repr__(&self) -> String {
        format!("Span({}, {})", self.start, self.end)
    }

    #[getter]
    fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

impl From<CoreSpan> for PySpan {
    fn from(s: CoreSpan) -> Self {
        PySpan {
            start: s.start,
            end: s.end,
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Lettering style of a handwritten region.
#[pyclass(frozen, eq, eq_int, name = "HandwritingStyle")]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PyHandwritingStyle {
    Default,
    Scrawl,
    Elegant,
    Graffiti,
}

#[pymethods]
impl PyHandwritingStyle {
    /// Resolve a markup style name; unknown names give `Default`.
    #[staticmethod]
    fn from_name(name: &str) -> Self {
        HandwritingStyle::from_name(name).into()
    }

    #[getter]
    fn name(&self) -> &'static str {
        HandwritingStyle::from(*self).as_str()
    }
}

impl From<HandwritingStyle> for PyHandwritingStyle {
    fn from(s: HandwritingStyle) -> Self {
        match s {
            HandwritingStyle::Default => PyHandwritingStyle::Default,
            HandwritingStyle::Scrawl => PyHandwritingStyle::Scrawl,
            HandwritingStyle::Elegant => PyHandwritingStyle::Elegant,
            HandwritingStyle::Graffiti => PyHandwritingStyle::Graffiti,
        }
    }
}

impl From<PyHandwritingStyle> for HandwritingStyle {
    fn from(s: PyHandwritingStyle) -> Self {
        match s {
            PyHandwritingStyle::Default => HandwritingStyle::Default,
            PyHandwritingStyle::Scrawl => HandwritingStyle::Scrawl,
            PyHandwritingStyle::Elegant => HandwritingStyle::Elegant,
            PyHandwritingStyle::Graffiti => HandwritingStyle::Graffiti,
        }
    }
}

/// Diagnostic category.
#[pyclass(frozen, eq, eq_int, name = "ParseErrorKind")]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PyParseErrorKind {
    UnclosedDelimiter,
    DepthExceeded,
    IterationLimit,
}

impl From<CoreParseErrorKind> for PyParseErrorKind {
    fn from(k: CoreParseErrorKind) -> Self {
        match k {
            CoreParseErrorKind::UnclosedDelimiter => PyParseErrorKind::UnclosedDelimiter,
            CoreParseErrorKind::DepthExceeded => PyParseErrorKind::DepthExceeded,
            CoreParseErrorKind::IterationLimit => PyParseErrorKind::IterationLimit,
        }
    }
}

/// A parse diagnostic.
#[pyclass(frozen, get_all, name = "ParseError")]
#[derive(Clone)]
pub struct PyParseError {
    pub message: String,
    pub span: Option<PySpan>,
    pub kind: PyParseErrorKind,
    pub recoverable: bool,
}

#[pymethods]
impl PyParseError {
    fn __repr__(&self) -> String {
        format!("ParseError({:?}, {:?})", self.message, self.kind)
    }

    fn __str__(&self) -> String {
        match &self.span {
            Some(s) => format!("{} at bytes {}..{}", self.message, s.start, s.end),
            None => self.message.clone(),
        }
    }
}

impl From<CoreParseError> for PyParseError {
    fn from(e: CoreParseError) -> Self {
        PyParseError {
            message: e.message,
            span: e.span.map(PySpan::from),
            kind: e.kind.into(),
            recoverable: e.recoverable,
        }
    }
}

// ============================================================================
// Block types
// ============================================================================

/// Plain run of characters.
#[pyclass(frozen, get_all, name = "Text")]
pub struct PyText {
    pub content: String,
}

/// Bold text.
#[pyclass(frozen, get_all, name = "Bold")]
pub struct PyBold {
    pub content: String,
}

/// Italic text.
#[pyclass(frozen, get_all, name = "Italic")]
pub struct PyItalic {
    pub content: String,
}

/// Text drawn in a named or hex color.
#[pyclass(frozen, get_all, name = "Colored")]
pub struct PyColored {
    pub content: String,
    pub color: String,
}

/// Handwritten region; revealed all at once.
#[pyclass(frozen, get_all, name = "Handwritten")]
pub struct PyHandwritten {
    pub style: PyHandwritingStyle,
    pub children: PyObject,
}

/// Image reference.
#[pyclass(frozen, get_all, name = "Image")]
pub struct PyImage {
    pub src: String,
}

/// Single newline.
#[pyclass(frozen, name = "LineBreak")]
pub struct PyLineBreak;

/// Blank line between paragraphs.
#[pyclass(frozen, name = "ParagraphBreak")]
pub struct PyParagraphBreak;

#[pymethods]
impl PyText {
    #[new]
    fn new(content: String) -> Self {
        PyText { content }
    }

    fn __repr__(&self) -> String {
        format!("Text({:?})", self.content)
    }
}

#[pymethods]
impl PyBold {
    #[new]
    fn new(content: String) -> Self {
        PyBold { content }
    }

    fn __repr__(&self) -> String {
        format!("Bold({:?})", self.content)
    }
}

#[pymethods]
impl PyItalic {
    #[new]
    fn new(content: String) -> Self {
        PyItalic { content }
    }

    fn __repr__(&self) -> String {
        format!("Italic({:?})", self.content)
    }
}

#[pymethods]
impl PyColored {
    #[new]
    fn new(content: String, color: String) -> Self {
        PyColored { content, color }
    }

    fn __repr__(&self) -> String {
        format!("Colored({:?}, color={:?})", self.content, self.color)
    }
}

#[pymethods]
impl PyHandwritten {
    #[new]
    #[pyo3(signature = (children, style=None), text_signature = "(children, style=None)")]
    fn new(children: &Bound<'_, PyAny>, style: Option<PyHandwritingStyle>) -> PyResult<Self> {
        let list = PyList::empty(children.py());
        for child in children.try_iter()? {
            let child = child?;
            extract_block(&child)?;
            list.append(child)?;
        }
        Ok(PyHandwritten {
            style: style.unwrap_or(PyHandwritingStyle::Default),
            children: list.unbind().into_any(),
        })
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        let children = self.children.bind(py).len()?;
        Ok(format!(
            "Handwritten(style={:?}, children={})",
            self.style, children
        ))
    }
}

#[pymethods]
impl PyImage {
    #[new]
    fn new(src: String) -> Self {
        PyImage { src }
    }

    fn __repr__(&self) -> String {
        format!("Image({:?})", self.src)
    }
}

#[pymethods]
impl PyLineBreak {
    #[new]
    fn new() -> Self {
        PyLineBreak
    }

    fn __repr__(&self) -> &'static str {
        "LineBreak()"
    }
}

#[pymethods]
impl PyParagraphBreak {
    #[new]
    fn new() -> Self {
        PyParagraphBreak
    }

    fn __repr__(&self) -> &'static str {
        "ParagraphBreak()"
    }
}

// ============================================================================
// Conversion
// ============================================================================

fn convert_blocks(py: Python<'_>, blocks: Vec<Block>) -> PyResult<PyObject> {
    let list = PyList::empty(py);
    for block in blocks {
        list.append(convert_block(py, block)?)?;
    }
    Ok(list.unbind().into_any())
}

fn convert_block(py: Python<'_>, block: Block) -> PyResult<PyObject> {
    let object = match block {
        Block::Text(content) => Py::new(
            py,
            PyText {
                content: content.into_owned(),
            },
        )?
        .into_any(),
        Block::Bold(content) => Py::new(
            py,
            PyBold {
                content: content.into_owned(),
            },
        )?
        .into_any(),
        Block::Italic(content) => Py::new(
            py,
            PyItalic {
                content: content.into_owned(),
            },
        )?
        .into_any(),
        Block::Colored { content, color } => Py::new(
            py,
            PyColored {
                content: content.into_owned(),
                color: color.into_owned(),
            },
        )?
        .into_any(),
        Block::Handwritten { style, children } => Py::new(
            py,
            PyHandwritten {
                style: style.into(),
                children: convert_blocks(py, children)?,
            },
        )?
        .into_any(),
        Block::Image(src) => Py::new(
            py,
            PyImage {
                src: src.into_owned(),
            },
        )?
        .into_any(),
        Block::LineBreak => Py::new(py, PyLineBreak)?.into_any(),
        Block::ParagraphBreak => Py::new(py, PyParagraphBreak)?.into_any(),
    };
    Ok(object)
}

/// Rebuild core blocks from any iterable of block objects.
fn extract_blocks(blocks: &Bound<'_, PyAny>) -> PyResult<Vec<Block<'static>>> {
    blocks
        .try_iter()?
        .map(|item| extract_block(&item?))
        .collect()
}

fn extract_block(obj: &Bound<'_, PyAny>) -> PyResult<Block<'static>> {
    if let Ok(t) = obj.downcast::<PyText>() {
        return Ok(Block::Text(t.get().content.clone().into()));
    }
    if let Ok(b) = obj.downcast::<PyBold>() {
        return Ok(Block::Bold(b.get().content.clone().into()));
    }
    if let Ok(i) = obj.downcast::<PyItalic>() {
        return Ok(Block::Italic(i.get().content.clone().into()));
    }
    if let Ok(c) = obj.downcast::<PyColored>() {
        let c = c.get();
        return Ok(Block::Colored {
            content: c.content.clone().into(),
            color: c.color.clone().into(),
        });
    }
    if let Ok(h) = obj.downcast::<PyHandwritten>() {
        let h = h.get();
        return Ok(Block::Handwritten {
            style: h.style.into(),
            children: extract_blocks(h.children.bind(obj.py()))?,
        });
    }
    if let Ok(i) = obj.downcast::<PyImage>() {
        return Ok(Block::Image(i.get().src.clone().into()));
    }
    if obj.is_instance_of::<PyLineBreak>() {
        return Ok(Block::LineBreak);
    }
    if obj.is_instance_of::<PyParagraphBreak>() {
        return Ok(Block::ParagraphBreak);
    }
    Err(PyTypeError::new_err(format!(
        "expected a cluetext block, got {}",
        obj.get_type().name()?
    )))
}

// ============================================================================
// Page
// ============================================================================

/// One page of parsed markup.
#[pyclass(frozen, name = "Page")]
pub struct PyPage {
    #[pyo3(get)]
    pub blocks: PyObject,
}

#[pymethods]
impl PyPage {
    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        Ok(format!("Page(blocks={})", self.blocks.bind(py).len()?))
    }

    fn __len__(&self, py: Python<'_>) -> PyResult<usize> {
        self.blocks.bind(py).len()
    }
}

fn convert_pages(py: Python<'_>, pages: Vec<Page>) -> PyResult<PyObject> {
    let list = PyList::empty(py);
    for page in pages {
        let page = PyPage {
            blocks: convert_blocks(py, page.blocks)?,
        };
        list.append(Py::new(py, page)?)?;
    }
    Ok(list.unbind().into_any())
}

// ============================================================================
// ParseResult
// ============================================================================

/// Pages plus the diagnostics collected while parsing them.
#[pyclass(frozen, name = "ParseResult")]
pub struct PyParseResult {
    #[pyo3(get)]
    pub pages: PyObject,
    #[pyo3(get)]
    pub errors: Vec<PyParseError>,
}

#[pymethods]
impl PyParseResult {
    #[getter]
    fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when output was truncated by the iteration limit.
    #[getter]
    fn truncated(&self) -> bool {
        self.errors.iter().any(|e| !e.recoverable)
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        Ok(format!(
            "ParseResult(ok={}, pages={}, errors={})",
            self.errors.is_empty(),
            self.pages.bind(py).len()?,
            self.errors.len()
        ))
    }
}

// ============================================================================
// Reveal
// ============================================================================

/// Prefix of a block tree shown at some budget.
#[pyclass(frozen, name = "Reveal")]
pub struct PyReveal {
    #[pyo3(get)]
    pub blocks: PyObject,
    #[pyo3(get)]
    pub consumed: usize,
}

#[pymethods]
impl PyReveal {
    /// True once `consumed` reaches `total`.
    fn is_complete(&self, total: usize) -> bool {
        self.consumed >= total
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        Ok(format!(
            "Reveal(consumed={}, blocks={})",
            self.consumed,
            self.blocks.bind(py).len()?
        ))
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Configurable cluetext parser.
///
/// Args:
///     max_depth: deepest handwritten nesting that is parsed (default 3, at most 64)
///     iteration_limit: per-region iteration cap (default 100000)
#[pyclass(frozen, name = "Parser")]
pub struct PyParser {
    inner: CoreParser,
}

#[pymethods]
impl PyParser {
    #[new]
    #[pyo3(
        signature = (max_depth=None, iteration_limit=None),
        text_signature = "(max_depth=None, iteration_limit=None)"
    )]
    fn new(max_depth: Option<usize>, iteration_limit: Option<usize>) -> Self {
        let mut inner = CoreParser::new();
        if let Some(depth) = max_depth {
            inner = inner.with_max_depth(depth);
        }
        if let Some(limit) = iteration_limit {
            inner = inner.with_iteration_limit(limit);
        }
        PyParser { inner }
    }

    /// Parse markup into a list of pages.
    #[pyo3(text_signature = "(self, input)")]
    fn parse(&self, py: Python<'_>, input: &str) -> PyResult<PyObject> {
        convert_pages(py, self.inner.parse(input))
    }

    /// Parse markup and collect diagnostics.
    #[pyo3(text_signature = "(self, input)")]
    fn parse_with_recovery(&self, py: Python<'_>, input: &str) -> PyResult<PyParseResult> {
        let CoreParseResult { pages, errors } = self.inner.parse_with_recovery(input);
        Ok(PyParseResult {
            pages: convert_pages(py, pages)?,
            errors: errors.into_iter().map(PyParseError::from).collect(),
        })
    }

    /// Parse one region of markup at the given nesting depth.
    #[pyo3(signature = (text, depth=0), text_signature = "(self, text, depth=0)")]
    fn parse_blocks(&self, py: Python<'_>, text: &str, depth: usize) -> PyResult<PyObject> {
        convert_blocks(py, self.inner.parse_blocks(text, depth))
    }

    fn __repr__(&self) -> String {
        format!(
            "Parser(max_depth={}, iteration_limit={})",
            self.inner.max_depth(),
            self.inner.iteration_limit()
        )
    }
}

// ============================================================================
// Module functions
// ============================================================================

/// Parse cluetext markup with default options.
///
/// Args:
///     input: Markup string to parse
///
/// Returns:
///     list[Page]: zero or one page
#[pyfunction]
#[pyo3(text_signature = "(input)")]
fn parse(py: Python<'_>, input: &str) -> PyResult<PyObject> {
    convert_pages(py, CoreParser::new().parse(input))
}

/// Parse with default options and collect diagnostics.
///
/// Args:
///     input: Markup string to parse
///
/// Returns:
///     ParseResult: pages and diagnostics
#[pyfunction]
#[pyo3(text_signature = "(input)")]
fn parse_with_recovery(py: Python<'_>, input: &str) -> PyResult<PyParseResult> {
    PyParser::new(None, None).parse_with_recovery(py, input)
}

/// Number of revealable characters in a list of blocks.
///
/// Raises:
///     TypeError: if an element is not a cluetext block
#[pyfunction]
#[pyo3(text_signature = "(blocks)")]
fn total_text_length(blocks: &Bound<'_, PyAny>) -> PyResult<usize> {
    Ok(core_total_text_length(&extract_blocks(blocks)?))
}

/// Prefix of `blocks` that fits in `budget` characters.
///
/// Handwritten blocks appear whole or not at all.
///
/// Raises:
///     TypeError: if an element is not a cluetext block
#[pyfunction]
#[pyo3(text_signature = "(blocks, budget)")]
fn reveal(blocks: &Bound<'_, PyAny>, budget: usize) -> PyResult<PyReveal> {
    let py = blocks.py();
    let blocks = extract_blocks(blocks)?;
    let shown = core_reveal(&blocks, budget);
    Ok(PyReveal {
        blocks: convert_blocks(py, shown.blocks)?,
        consumed: shown.consumed,
    })
}

// ============================================================================
// Module
// ============================================================================

/// cluetext - riddle markup parser with typewriter reveal.
#[pymodule]
fn pyclue(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySpan>()?;
    m.add_class::<PyHandwritingStyle>()?;
    m.add_class::<PyParseErrorKind>()?;
    m.add_class::<PyParseError>()?;
    m.add_class::<PyParser>()?;
    m.add_class::<PyParseResult>()?;
    m.add_class::<PyPage>()?;
    m.add_class::<PyReveal>()?;
    m.add_class::<PyText>()?;
    m.add_class::<PyBold>()?;
    m.add_class::<PyItalic>()?;
    m.add_class::<PyColored>()?;
    m.add_class::<PyHandwritten>()?;
    m.add_class::<PyImage>()?;
    m.add_class::<PyLineBreak>()?;
    m.add_class::<PyParagraphBreak>()?;
    m.add_function(wrap_pyfunction!(parse, m)?)?;
    m.add_function(wrap_pyfunction!(parse_with_recovery, m)?)?;
    m.add_function(wrap_pyfunction!(total_text_length, m)?)?;
    m.add_function(wrap_pyfunction!(reveal, m)?)?;
    Ok(())
}
