/* Longest-match tokenizer. Every token type is a regular expression compiled down to a DFA. The
 * source text is split on whitespace and each chunk is carved into lexemes by trying the longest
 * remaining prefix first and shrinking it from the right until some DFA accepts it. When two
 * token types accept the same prefix, the one declared first wins. */

use crate::dfa::DFA;
use crate::fa::FA;
use crate::format::{read_spec_file, FormatError};
use crate::regex::{strip_quotes, RegEx};
use color_eyre::eyre::{Report, Result};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    category: String,
    lexeme: String,
}

impl Token {
    pub fn new(category: String, lexeme: String) -> Self {
        Token { category, lexeme }
    }
    /// Get the name of the token type the lexeme was classified as
    pub fn get_category(&self) -> &String {
        &self.category
    }
    /// Get the matched text
    pub fn get_lexeme(&self) -> &String {
        &self.lexeme
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.category, self.lexeme)
    }
}

/// List of possible errors in the lexer
#[derive(Debug, PartialEq, Eq)]
pub enum LexError {
    /// Every queued token has been handed out
    EndOfInput,
    /// Text that no token type accepts
    InvalidToken(String),
    /// A token definition file line that is not `NAME expression`
    MalformedSpec(String),
    InvalidLexerFile(String),
    FileOpenError(String),
    FileReadError(String),
    FileWriteError(String),
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::EndOfInput => write!(f, "End of input reached"),
            LexError::InvalidToken(token) => {
                write!(f, "Error: Invalid token found! {} is not a valid token!", token)
            }
            LexError::MalformedSpec(line) => {
                write!(f, "Error: Malformed token definition: {:?}", line)
            }
            LexError::InvalidLexerFile(err_line) => {
                write!(f, "Error: Could not load the saved lexer: {}", err_line)
            }
            LexError::FileOpenError(err_line) => write!(f, "{}", err_line),
            LexError::FileReadError(err_line) => write!(f, "{}", err_line),
            LexError::FileWriteError(err_line) => write!(f, "{}", err_line),
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanEntry {
    Valid(Token),
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lex {
    alphabet: Vec<char>,
    token_table: Vec<(String, DFA)>, // Declaration order is the tie-break priority
    #[serde(skip)]
    pending: VecDeque<ScanEntry>,
}

fn open_error(err: FormatError) -> Report {
    match err {
        FormatError::FileReadError(err_line) => Report::new(LexError::FileReadError(err_line)),
        err => Report::new(LexError::FileOpenError(err.to_string())),
    }
}

fn write_error(path: &Path, error: impl fmt::Display) -> Report {
    let err_line = format!(
        "Error: Failed to write the lexer to {}: {}",
        path.display(),
        error
    );
    Report::new(LexError::FileWriteError(err_line))
}

impl Lex {
    /// Compile each `(name, expression)` definition over the alphabet. The order of the
    /// definitions decides which token type wins when two of them match the same text.
    pub fn new<N, E>(alphabet: &[char], definitions: &[(N, E)]) -> Result<Lex>
    where
        N: AsRef<str>,
        E: AsRef<str>,
    {
        let mut token_table = Vec::with_capacity(definitions.len());

        for (name, expression) in definitions {
            let dfa = RegEx::new(alphabet, expression.as_ref())?.into_dfa();
            debug!(
                "Token type {} compiled to a DFA with {} states",
                name.as_ref(),
                dfa.get_num_states()
            );
            token_table.push((name.as_ref().to_string(), dfa));
        }

        Ok(Lex {
            alphabet: alphabet.to_vec(),
            token_table,
            pending: VecDeque::new(),
        })
    }

    /// Read token definitions: the alphabet on the first line, usually in double quotes, then
    /// one `NAME expression` pair per line.
    pub fn from_spec(spec: &str) -> Result<Lex> {
        let mut lines = spec.lines();

        let alphabet: Vec<char> = match lines.next().map(|line| strip_quotes(line.trim())) {
            Some(alphabet) if !alphabet.is_empty() => alphabet.chars().collect(),
            _ => {
                let err = LexError::MalformedSpec("missing alphabet".to_string());
                return Err(Report::new(err));
            }
        };

        let mut definitions: Vec<(&str, &str)> = Vec::new();

        for line in lines.filter(|line| !line.trim().is_empty()) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [name, expression] => definitions.push((*name, *expression)),
                _ => return Err(Report::new(LexError::MalformedSpec(line.to_string()))),
            }
        }

        Lex::new(&alphabet, &definitions)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Lex> {
        let spec = read_spec_file(path.as_ref()).map_err(open_error)?;
        Lex::from_spec(&spec)
    }

    /// Load the token definitions and scan the source file in one go.
    pub fn from_files<P, Q>(token_file: P, source_file: Q) -> Result<Lex>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let mut lex = Lex::from_file(token_file)?;
        lex.scan_file(source_file)?;
        Ok(lex)
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Names of the token types in priority order
    pub fn token_types(&self) -> impl Iterator<Item = &str> {
        self.token_table.iter().map(|(name, _)| name.as_str())
    }

    /// The first declared token type whose DFA accepts the whole lexeme
    pub fn classify(&self, lexeme: &str) -> Option<&str> {
        self.token_table
            .iter()
            .find(|(_, dfa)| dfa.simulate(lexeme))
            .map(|(name, _)| name.as_str())
    }

    /// Length in bytes and token type of the longest non-empty prefix of `text` that some token
    /// type accepts.
    pub fn longest_match(&self, text: &str) -> Option<(usize, &str)> {
        let mut ends: Vec<usize> = text
            .char_indices()
            .map(|(idx, ch)| idx + ch.len_utf8())
            .collect();

        while let Some(end) = ends.pop() {
            if let Some(category) = self.classify(&text[..end]) {
                return Some((end, category));
            }
        }
        None
    }

    fn scan_chunk(&mut self, chunk: &str) {
        let mut rest = chunk;

        while !rest.is_empty() {
            let matched = self
                .longest_match(rest)
                .map(|(len, category)| (len, category.to_string()));

            match matched {
                Some((len, category)) => {
                    let lexeme = &rest[..len];
                    trace!("Matched {:?} as {}", lexeme, category);
                    self.pending
                        .push_back(ScanEntry::Valid(Token::new(category, lexeme.to_string())));
                    rest = &rest[len..];
                }
                None => {
                    warn!("No token type accepts {:?}", rest);
                    self.pending.push_back(ScanEntry::Invalid(rest.to_string()));
                    break;
                }
            }
        }
    }

    /// Split the source on whitespace and queue the tokens found in every chunk.
    pub fn tokenize(&mut self, source: &str) {
        for chunk in source.split_whitespace() {
            self.scan_chunk(chunk);
        }
        debug!("{} entries queued", self.pending.len());
    }

    pub fn scan_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let source = read_spec_file(path.as_ref()).map_err(open_error)?;
        self.tokenize(&source);
        Ok(())
    }

    /// Hand out the next queued token. Scanning carries on past an invalid token, so calling
    /// again after `InvalidToken` yields whatever followed it.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        match self.pending.pop_front() {
            Some(ScanEntry::Valid(token)) => Ok(token),
            Some(ScanEntry::Invalid(text)) => Err(LexError::InvalidToken(text)),
            None => Err(LexError::EndOfInput),
        }
    }

    /// Write the compiled token table out as json
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let json_string =
            serde_json::to_string_pretty(self).map_err(|err| write_error(path, err))?;
        let mut file = File::create(path).map_err(|err| write_error(path, err))?;
        writeln!(file, "{}", json_string).map_err(|err| write_error(path, err))?;
        Ok(())
    }

    /// Load a lexer from a saved json file. The loaded lexer has nothing queued.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Lex> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|error| {
            let err_line = format!("Error: Failed to open {}: {}", path.display(), error);
            Report::new(LexError::FileOpenError(err_line))
        })?;

        let buf_reader = BufReader::new(file);

        serde_json::from_reader(buf_reader)
            .map_err(|error| Report::new(LexError::InvalidLexerFile(error.to_string())))
    }
}

impl Iterator for Lex {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Err(LexError::EndOfInput) => None,
            entry => Some(entry),
        }
    }
}
