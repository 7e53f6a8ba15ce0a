//! Terminal commands.

/// A command typed at the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Press the add button
    Add,
    /// Leave the screen
    Quit,
}

/// Interpret one line of input
///
/// An empty line, `a`, `add` or `+` adds a tile; `q` or `quit` exits. Case and
/// surrounding whitespace are ignored. Anything else is `None`.
#[must_use]
pub fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "a" | "add" | "+" => Some(Input::Add),
        "q" | "quit" => Some(Input::Quit),
        _ => None,
    }
}
