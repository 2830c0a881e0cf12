//! Line oriented parser for the section based configuration format.
//!
//! The format is the classic git-config shape: `[section "subsection"]`
//! headers followed by `key = value` entries. Section and key names are
//! case insensitive, subsection names are kept verbatim.

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    UnterminatedHeader(usize),
    UnterminatedQuote(usize),
    InvalidEscape(usize),
    EntryOutsideSection(usize),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedHeader(line) => {
                write!(f, "unterminated section header on line {line}")
            }
            Self::UnterminatedQuote(line) => write!(f, "unterminated quote on line {line}"),
            Self::InvalidEscape(line) => write!(f, "invalid escape sequence on line {line}"),
            Self::EntryOutsideSection(line) => {
                write!(f, "entry outside of any section on line {line}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Section {
    /// Section name, lowercased.
    pub name: String,
    /// Subsection name, verbatim.
    pub subsection: Option<String>,
    /// Entries in document order, keys lowercased. A bare key without an
    /// equal sign has no value.
    pub entries: Vec<(String, Option<String>)>,
}

impl Section {
    fn named(name: &str, subsection: Option<String>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            subsection,
            entries: Vec::new(),
        }
    }
}

pub fn parse_document(input: &str) -> Result<Vec<Section>, ParseError> {
    let mut sections: Vec<Section> = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            sections.push(parse_header(line, number)?);
        } else {
            let section = sections
                .last_mut()
                .ok_or(ParseError::EntryOutsideSection(number))?;
            section.entries.push(parse_entry(line, number)?);
        }
    }
    Ok(sections)
}

fn parse_header(line: &str, number: usize) -> Result<Section, ParseError> {
    let inner = line
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .map(|(inner, _)| inner.trim())
        .ok_or(ParseError::UnterminatedHeader(number))?;
    match inner.split_once(char::is_whitespace) {
        Some((name, rest)) => {
            let subsection = parse_subsection(rest.trim(), number)?;
            Ok(Section::named(name, Some(subsection)))
        }
        None => Ok(Section::named(inner, None)),
    }
}

fn parse_subsection(input: &str, number: usize) -> Result<String, ParseError> {
    let mut chars = input
        .strip_prefix('"')
        .ok_or(ParseError::UnterminatedQuote(number))?
        .chars();
    let mut value = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(value),
            Some('\\') => match chars.next() {
                Some(found @ ('"' | '\\')) => value.push(found),
                _ => return Err(ParseError::InvalidEscape(number)),
            },
            Some(found) => value.push(found),
            None => return Err(ParseError::UnterminatedQuote(number)),
        }
    }
}

fn parse_entry(line: &str, number: usize) -> Result<(String, Option<String>), ParseError> {
    match line.split_once('=') {
        Some((key, value)) => {
            let value = parse_value(value.trim(), number)?;
            Ok((key.trim().to_ascii_lowercase(), Some(value)))
        }
        None => {
            let key = strip_comment(line);
            Ok((key.trim().to_ascii_lowercase(), None))
        }
    }
}

/// Read a value up to an unquoted comment character, resolving quotes and
/// escape sequences along the way.
fn parse_value(input: &str, number: usize) -> Result<String, ParseError> {
    let mut value = String::new();
    let mut quoted = false;
    let mut chars = input.chars();
    loop {
        match chars.next() {
            Some('"') => quoted = !quoted,
            Some('\\') => match chars.next() {
                Some(found @ ('"' | '\\')) => value.push(found),
                Some('t') => value.push('\t'),
                Some('n') => value.push('\n'),
                _ => return Err(ParseError::InvalidEscape(number)),
            },
            Some('#' | ';') if !quoted => break,
            Some(found) => value.push(found),
            None => break,
        }
    }
    if quoted {
        return Err(ParseError::UnterminatedQuote(number));
    }
    Ok(value.trim().to_string())
}

fn strip_comment(line: &str) -> &str {
    match line.find(['#', ';']) {
        Some(index) => &line[..index],
        None => line,
    }
}
