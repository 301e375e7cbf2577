/* Line oriented reader for the automaton specification format shared by DFA and NFA files:
 *
 *   <number of states>
 *   <alphabet, one character per symbol>
 *   <start> <symbol> <end>        (transition records)
 *   <start state>
 *   <accept states, whitespace separated> */

use log::warn;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Largest state count a specification file may declare
pub const MAX_STATES: usize = 1 << 20;

/// List of possible errors while reading an automaton specification
#[derive(Debug, PartialEq, Eq)]
pub enum FormatError {
    MissingStateCount,
    InvalidStateCount(String),
    EmptyAlphabet,
    MalformedTransition(String),
    SymbolNotInAlphabet(char),
    InvalidState(String),
    RedefinedTransition(usize, char),
    TooManyTransitions(String),
    InvalidStartState(String),
    InvalidAcceptState(String),
    TrailingContent(String),
    FileOpenError(String),
    FileReadError(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::MissingStateCount => write!(f, "Error: No state count given!"),
            FormatError::InvalidStateCount(line) => {
                write!(f, "Error: Invalid state count: {}", line)
            }
            FormatError::EmptyAlphabet => write!(f, "Error: No symbols in alphabet!"),
            FormatError::MalformedTransition(line) => {
                write!(f, "Error: Malformed transition: {:?}", line)
            }
            FormatError::SymbolNotInAlphabet(ch) => {
                write!(f, "Error: Symbol {:?} in transition is not in the alphabet!", ch)
            }
            FormatError::InvalidState(state) => {
                write!(f, "Error: {} is not a valid state!", state)
            }
            FormatError::RedefinedTransition(state, ch) => {
                write!(f, "Error: Transition ({}, {:?}) redefined!", state, ch)
            }
            FormatError::TooManyTransitions(line) => {
                write!(f, "Error: Too many transitions, found extra record {:?}", line)
            }
            FormatError::InvalidStartState(line) => {
                write!(f, "Error: Invalid start state: {:?}", line)
            }
            FormatError::InvalidAcceptState(state) => {
                write!(f, "Error: Invalid accept state: {}", state)
            }
            FormatError::TrailingContent(content) => {
                write!(f, "Error: Extra content after accept states: {:?}", content)
            }
            FormatError::FileOpenError(err_line) => write!(f, "{}", err_line),
            FormatError::FileReadError(err_line) => write!(f, "{}", err_line),
        }
    }
}

impl std::error::Error for FormatError {}

/// Read a whole specification file into memory.
pub fn read_spec_file(path: &Path) -> Result<String, FormatError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            let err_line = format!(
                "Error: Failed to open the specification file {}: {}",
                path.display(),
                error
            );
            return Err(FormatError::FileOpenError(err_line));
        }
    };

    let mut contents = String::new();

    if let Err(error) = file.read_to_string(&mut contents) {
        let err_line = format!(
            "Error: Failed to read the specification file {}: {}",
            path.display(),
            error
        );
        return Err(FormatError::FileReadError(err_line));
    }

    Ok(contents)
}

pub(crate) struct SpecReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> SpecReader<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        SpecReader {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    pub(crate) fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.pos).copied();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    pub(crate) fn peek_line(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    pub(crate) fn read_state_count(&mut self) -> Result<usize, FormatError> {
        let line = self.next_line().ok_or(FormatError::MissingStateCount)?;
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [] => Err(FormatError::MissingStateCount),
            [count] => match count.parse::<usize>() {
                Ok(count) if count <= MAX_STATES => Ok(count),
                _ => Err(FormatError::InvalidStateCount(line.to_string())),
            },
            _ => Err(FormatError::InvalidStateCount(line.to_string())),
        }
    }

    /// Every character on the alphabet line is a symbol, spaces included.
    pub(crate) fn read_alphabet(&mut self) -> Result<Vec<char>, FormatError> {
        let line = self.next_line().ok_or(FormatError::EmptyAlphabet)?;

        if line.is_empty() {
            return Err(FormatError::EmptyAlphabet);
        }

        let mut alphabet: Vec<char> = Vec::new();
        for ch in line.chars() {
            if !alphabet.contains(&ch) {
                alphabet.push(ch);
            }
        }
        Ok(alphabet)
    }

    pub(crate) fn read_start_state(&mut self, num_states: usize) -> Result<usize, FormatError> {
        let line = self.next_line().unwrap_or("");
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [state] => match state.parse::<usize>() {
                Ok(state) if state <= num_states => Ok(state),
                _ => Err(FormatError::InvalidStartState(line.to_string())),
            },
            [_, _, _] => Err(FormatError::TooManyTransitions(line.to_string())),
            _ => Err(FormatError::InvalidStartState(line.to_string())),
        }
    }

    pub(crate) fn read_accept_states(
        &mut self,
        num_states: usize,
    ) -> Result<Vec<usize>, FormatError> {
        let line = self.next_line().unwrap_or("");
        let mut accept_states = Vec::new();

        for token in line.split_whitespace() {
            match token.parse::<usize>() {
                Ok(state) if state <= num_states => accept_states.push(state),
                // No transition can reach a state past the declared count
                Ok(state) => warn!("Ignoring accept state {} outside 0..={}", state, num_states),
                Err(_) => return Err(FormatError::InvalidAcceptState(token.to_string())),
            }
        }
        Ok(accept_states)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.lines.len() - self.pos
    }

    pub(crate) fn ensure_exhausted(&mut self) -> Result<(), FormatError> {
        let remaining: Vec<&str> = self.lines[self.pos..].to_vec();
        self.pos = self.lines.len();

        let remaining = remaining.join("\n");
        let remaining = remaining.trim();

        if remaining.is_empty() {
            Ok(())
        } else {
            Err(FormatError::TrailingContent(remaining.to_string()))
        }
    }
}

pub(crate) fn parse_state(token: &str, num_states: usize) -> Result<usize, FormatError> {
    match token.parse::<usize>() {
        Ok(state) if state <= num_states => Ok(state),
        _ => Err(FormatError::InvalidState(token.to_string())),
    }
}

/// A transition symbol is written either bare (`a`) or single quoted (`'a'`).
pub(crate) fn parse_symbol(token: &str, line: &str) -> Result<char, FormatError> {
    let inner = if token.len() > 2 && token.starts_with('\'') && token.ends_with('\'') {
        &token[1..token.len() - 1]
    } else {
        token
    };

    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(FormatError::MalformedTransition(line.to_string())),
    }
}

/// Split a transition record into its three fields. A quoted space symbol, written `' '`,
/// splits into two lone quote tokens and is folded back into a single space.
pub(crate) fn split_record(line: &str) -> Option<(&str, String, &str)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [start, "'", "'", end] => Some((start, " ".to_string(), end)),
        [start, symbol, end] => Some((start, symbol.to_string(), end)),
        _ => None,
    }
}
