//! Styled text fragments and the small HTML-like markup used for report body text.
//!
//! The report body is passed around as a fragment such as
//! `"The <b>Ford Focus</b> sold best<br/>Prices are in USD"`. The parser in this
//! module turns that fragment into lines of [`Span`]s, which the element layer
//! then maps onto [`genpdf`] paragraphs.
//!
//! [genpdf]: https://docs.rs/genpdf/

use std::fmt;

use genpdf::style::{Color, Style, StyledString};

/// A slice of text together with its inline style.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<Color>,
}

/// One rendered line of body text.
pub type Line = Vec<Span>;

impl Span {
    /// Creates an unstyled span.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Assigns a color to the span.
    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        style
    }

    /// Converts the span into a `genpdf` styled string.
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

impl From<&Span> for StyledString {
    fn from(span: &Span) -> Self {
        span.to_styled_string()
    }
}

/// Parse errors produced by [`parse_markup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    index: usize,
    message: String,
}

impl ParseError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }

    /// Byte index in the input where the error was detected.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.index)
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Copy, Debug, Default)]
struct StyleState {
    bold: bool,
    italic: bool,
    color: Option<Color>,
}

impl StyleState {
    fn to_span(self, text: String) -> Span {
        Span {
            text,
            bold: self.bold,
            italic: self.italic,
            color: self.color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Element {
    Bold,
    Italic,
    Font,
}

impl Element {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "b" | "strong" => Some(Self::Bold),
            "i" | "em" => Some(Self::Italic),
            "font" => Some(Self::Font),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Font => "font",
        }
    }
}

enum Tag<'a> {
    Break,
    Open(Element, &'a str),
    Close(&'a str),
}

/// Parses a body fragment into lines of styled spans.
///
/// Supported markup:
///
/// - `<br/>`, `<br>` and `<br />` end the current line
/// - `<b>`/`<strong>` for bold and `<i>`/`<em>` for italic text
/// - `<font color="#RRGGBB">` for colored text
/// - the entities `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;` and
///   numeric references such as `&#39;`
///
/// Anything else, as well as unbalanced tags, is rejected with a [`ParseError`].
pub fn parse_markup(input: &str) -> Result<Vec<Line>, ParseError> {
    let mut lines = vec![Line::new()];
    let idx = parse_inner(input, 0, StyleState::default(), None, &mut lines)?;
    debug_assert_eq!(idx, input.len());
    Ok(lines)
}

/// Escapes `&`, `<` and `>` so arbitrary text can be embedded in markup.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn parse_inner(
    input: &str,
    mut index: usize,
    state: StyleState,
    open: Option<Element>,
    lines: &mut Vec<Line>,
) -> Result<usize, ParseError> {
    let mut buffer = String::new();

    while index < input.len() {
        let rest = &input[index..];

        if rest.starts_with('<') {
            let (tag, after) = read_tag(input, index)?;
            flush_buffer(&mut buffer, lines, state);
            match tag {
                Tag::Break => lines.push(Line::new()),
                Tag::Close(name) => {
                    return match open {
                        Some(element) if Element::from_name(&name.to_ascii_lowercase()) == Some(element) => {
                            Ok(after)
                        }
                        Some(element) => Err(ParseError::new(
                            index,
                            format!(
                                "mismatched closing tag `</{}>`; expected `</{}>`",
                                name,
                                element.name()
                            ),
                        )),
                        None => Err(ParseError::new(
                            index,
                            format!("unexpected closing tag `</{}>`", name),
                        )),
                    };
                }
                Tag::Open(element, attributes) => {
                    let mut nested = state;
                    match element {
                        Element::Bold => nested.bold = true,
                        Element::Italic => nested.italic = true,
                        Element::Font => nested.color = Some(parse_font_color(attributes, index)?),
                    }
                    index = parse_inner(input, after, nested, Some(element), lines)?;
                    continue;
                }
            }
            index = after;
            continue;
        }

        if rest.starts_with('&') {
            let (ch, after) = read_entity(input, index)?;
            buffer.push(ch);
            index = after;
            continue;
        }

        let ch = match rest.chars().next() {
            Some(ch) => ch,
            None => break,
        };
        buffer.push(ch);
        index += ch.len_utf8();
    }

    if let Some(element) = open {
        Err(ParseError::new(
            index,
            format!("unterminated `<{}>` element", element.name()),
        ))
    } else {
        flush_buffer(&mut buffer, lines, state);
        Ok(index)
    }
}

fn flush_buffer(buffer: &mut String, lines: &mut [Line], state: StyleState) {
    if buffer.is_empty() {
        return;
    }
    if let Some(line) = lines.last_mut() {
        line.push(state.to_span(std::mem::take(buffer)));
    }
}

fn read_tag(input: &str, index: usize) -> Result<(Tag<'_>, usize), ParseError> {
    let end = input[index..]
        .find('>')
        .map(|offset| index + offset)
        .ok_or_else(|| ParseError::new(index, "unterminated tag; expected `>`"))?;
    let body = input[index + 1..end].trim();
    let after = end + 1;

    if let Some(name) = body.strip_prefix('/') {
        return Ok((Tag::Close(name.trim()), after));
    }

    let (body, self_closing) = match body.strip_suffix('/') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (body, false),
    };
    let (name, attributes) = match body.find(char::is_whitespace) {
        Some(split) => (&body[..split], body[split..].trim()),
        None => (body, ""),
    };

    if name.eq_ignore_ascii_case("br") {
        return if attributes.is_empty() {
            Ok((Tag::Break, after))
        } else {
            Err(ParseError::new(index, "`<br>` does not take attributes"))
        };
    }

    let element = Element::from_name(&name.to_ascii_lowercase())
        .ok_or_else(|| ParseError::new(index, format!("unsupported tag `<{}>`", name)))?;
    if self_closing {
        return Err(ParseError::new(
            index,
            format!("`<{}>` cannot be self-closing", name),
        ));
    }
    Ok((Tag::Open(element, attributes), after))
}

fn parse_font_color(attributes: &str, index: usize) -> Result<Color, ParseError> {
    let value = attributes
        .strip_prefix("color")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::trim)
        .ok_or_else(|| ParseError::new(index, "`<font>` requires a `color` attribute"))?;

    let quoted = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))
        .unwrap_or(value);

    let hex = quoted
        .strip_prefix('#')
        .ok_or_else(|| ParseError::new(index, "expected `#` followed by a hexadecimal RGB value"))?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::new(
            index,
            "invalid RGB specification; expected 6 hexadecimal digits",
        ));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| ParseError::new(index, "invalid RGB specification"))
    };
    Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn read_entity(input: &str, index: usize) -> Result<(char, usize), ParseError> {
    let end = input[index..]
        .find(';')
        .map(|offset| index + offset)
        .ok_or_else(|| ParseError::new(index, "unterminated entity; expected `;`"))?;
    let name = &input[index + 1..end];

    let ch = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => name.strip_prefix('#').and_then(|code| {
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse().ok(),
            };
            value.and_then(char::from_u32)
        }),
    };

    ch.map(|ch| (ch, end + 1))
        .ok_or_else(|| ParseError::new(index, format!("unknown entity `&{};`", name)))
}
