//! Line-based admin protocol: one command in, one response out.

use std::fmt;

/// A parsed admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `U`: merge the configured update document, or the inline JSON that follows.
    Update(Option<String>),
    /// `R`: dump the catalog.
    Retrieve,
    /// `Q`: stop the listener after replying.
    Quit,
    /// Blank line.
    Empty,
    /// Anything else, echoed back in the error.
    Unknown(String),
}

impl Command {
    /// Parse one request line. Command words are case-sensitive.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match (word, rest.is_empty()) {
            ("U", true) => Command::Update(None),
            ("U", false) => Command::Update(Some(rest.to_string())),
            ("R", true) => Command::Retrieve,
            ("Q", true) => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }

    /// Wire form of the command.
    pub fn to_line(&self) -> String {
        match self {
            Command::Update(None) => "U".to_string(),
            Command::Update(Some(document)) => format!("U {document}"),
            Command::Retrieve => "R".to_string(),
            Command::Quit => "Q".to_string(),
            Command::Empty => String::new(),
            Command::Unknown(raw) => raw.clone(),
        }
    }
}

/// Response written back before the connection closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Update merged this many entries.
    Merged(usize),
    /// Catalog dump as a single JSON document.
    Dump(String),
    /// Acknowledges `Q`.
    ShuttingDown,
    /// Any failure; the server keeps running.
    Error(String),
}

impl Response {
    /// True for responses that report a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Merged(count) => write!(f, "OK merged {count} item(s)"),
            Response::Dump(json) => f.write_str(json),
            Response::ShuttingDown => f.write_str("OK shutting down"),
            Response::Error(message) => write!(f, "ERR {message}"),
        }
    }
}
