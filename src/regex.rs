/* Regular expression compiler. The expression is split into tokens, explicit concatenation
 * operators are inserted between juxtaposed operands, and a two stack shunting-yard pass builds
 * the operator tree. The tree is compiled into an NFA by composing fragments, and the NFA is
 * turned into a DFA by subset construction.
 *
 * Operators, loosest first: alternation `|`, concatenation (implicit), closure `*`.
 * `e` is the empty string and `\x` is the literal `x`. */

use crate::dfa::DFA;
use crate::fa::{Symbol, EPSILON_MARKER};
use crate::format::{read_spec_file, FormatError};
use crate::nfa::NFA;
use color_eyre::eyre::{Report, Result};
use log::debug;
use std::path::Path;

/// Deepest operator tree the compiler will walk
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Epsilon,
    Literal(char),
    Concat(Vec<Node>),
    Alternation(Vec<Node>),
    Closure(Box<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    Epsilon,
    Alternation,
    Concat,
    Closure,
    LParen,
    RParen,
}

impl Token {
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Literal(_) | Token::Epsilon | Token::RParen | Token::Closure
        )
    }

    fn starts_operand(&self) -> bool {
        matches!(self, Token::Literal(_) | Token::Epsilon | Token::LParen)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegExError {
    EmptyRegex,
    InvalidRegexError(String),
    UnbalancedParenthesisError(String),
    InvalidSymbol(char),
    DanglingEscape(String),
    ExpressionTooDeep(usize),
    MalformedRegexFile(String),
    FileOpenError(String),
    FileReadError(String),
}

impl std::fmt::Display for RegExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegExError::EmptyRegex => write!(f, "Error: Empty regex provided!"),
            RegExError::InvalidRegexError(regex) => {
                write!(f, "Error: Invalid regex provided: {}", regex)
            }
            RegExError::UnbalancedParenthesisError(regex) => {
                write!(f, "Error: {} has unbalanced parenthesis!", regex)
            }
            RegExError::InvalidSymbol(ch) => {
                write!(f, "Error: Symbol {:?} is not in the alphabet!", ch)
            }
            RegExError::DanglingEscape(regex) => {
                write!(f, "Error: {} ends with an unfinished escape!", regex)
            }
            RegExError::ExpressionTooDeep(depth) => {
                write!(f, "Error: Regex nests deeper than {} levels!", depth)
            }
            RegExError::MalformedRegexFile(line) => {
                write!(f, "Error: Malformed regex file: {:?}", line)
            }
            RegExError::FileOpenError(err_line) => write!(f, "{}", err_line),
            RegExError::FileReadError(err_line) => write!(f, "{}", err_line),
        }
    }
}

impl std::error::Error for RegExError {}

/// Strip one pair of surrounding double quotes, if present.
pub(crate) fn strip_quotes(line: &str) -> &str {
    if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
        &line[1..line.len() - 1]
    } else {
        line
    }
}

fn tokenize(regex: &str, alphabet: &[char]) -> Result<Vec<Token>, RegExError> {
    let mut tokens = Vec::new();
    let mut chars = regex.chars();

    while let Some(ch) = chars.next() {
        let token = match ch {
            '\\' => match chars.next() {
                Some(escaped) if alphabet.contains(&escaped) => Token::Literal(escaped),
                Some(escaped) => return Err(RegExError::InvalidSymbol(escaped)),
                None => return Err(RegExError::DanglingEscape(regex.to_string())),
            },
            '|' => Token::Alternation,
            '*' => Token::Closure,
            '(' => Token::LParen,
            ')' => Token::RParen,
            EPSILON_MARKER => Token::Epsilon,
            _ if alphabet.contains(&ch) => Token::Literal(ch),
            _ => return Err(RegExError::InvalidSymbol(ch)),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

// Juxtaposed operands are concatenated: ab, a(, )a, )(, *a, *(
fn insert_concatenation(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len() * 2);

    for token in tokens {
        if let Some(prev) = result.last() {
            if prev.ends_operand() && token.starts_operand() {
                result.push(Token::Concat);
            }
        }
        result.push(token);
    }
    result
}

// Operators must sit between operands, and groups cannot be empty. Checked up front so the
// shunting-yard pass never borrows an operand from outside the current group.
fn check_placement(tokens: &[Token], regex: &str) -> Result<(), RegExError> {
    let invalid = || RegExError::InvalidRegexError(regex.to_string());

    for (idx, token) in tokens.iter().enumerate() {
        let prev = if idx == 0 { None } else { tokens.get(idx - 1) };
        let next = tokens.get(idx + 1);

        let prev_ends = prev.is_some_and(|prev| prev.ends_operand());
        let next_starts = next.is_some_and(|next| next.starts_operand());

        match token {
            Token::Alternation | Token::Concat if !prev_ends || !next_starts => {
                return Err(invalid());
            }
            Token::Closure | Token::RParen if !prev_ends => {
                // A lone ')' is a balance problem rather than a misplaced operator
                if *token == Token::RParen && prev.is_none() {
                    return Err(RegExError::UnbalancedParenthesisError(regex.to_string()));
                }
                return Err(invalid());
            }
            Token::LParen if next.is_none() => {
                return Err(RegExError::UnbalancedParenthesisError(regex.to_string()));
            }
            Token::LParen if !next_starts => return Err(invalid()),
            _ => {}
        }
    }
    Ok(())
}

// Tree heights travel alongside the operands so nothing deeper than MAX_DEPTH is ever built
type Operand = (Node, usize);

fn check_height(height: usize) -> Result<usize, RegExError> {
    if height > MAX_DEPTH {
        return Err(RegExError::ExpressionTooDeep(MAX_DEPTH));
    }
    Ok(height)
}

// Concatenation and alternation are associative, so runs of the same operator are flattened into
// one node. A long expression only grows wider.
fn join(operator: Token, left: Operand, right: Operand) -> Result<Operand, RegExError> {
    let mut children = Vec::new();
    let mut height = 0;

    for (node, node_height) in [left, right] {
        match (operator, node) {
            (Token::Concat, Node::Concat(nodes))
            | (Token::Alternation, Node::Alternation(nodes)) => {
                children.extend(nodes);
                height = height.max(node_height);
            }
            (_, node) => {
                children.push(node);
                height = height.max(node_height + 1);
            }
        }
    }

    let node = if operator == Token::Concat {
        Node::Concat(children)
    } else {
        Node::Alternation(children)
    };
    Ok((node, check_height(height)?))
}

fn reduce(operator: Token, operands: &mut Vec<Operand>, regex: &str) -> Result<(), RegExError> {
    let invalid = || RegExError::InvalidRegexError(regex.to_string());

    if operator != Token::Concat && operator != Token::Alternation {
        return Err(invalid());
    }

    let right = operands.pop().ok_or_else(invalid)?;
    let left = operands.pop().ok_or_else(invalid)?;

    operands.push(join(operator, left, right)?);
    Ok(())
}

fn build_syntax_tree(tokens: &[Token], regex: &str) -> Result<Node, RegExError> {
    let mut operands: Vec<Operand> = Vec::new();
    let mut operators: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Literal(ch) => operands.push((Node::Literal(*ch), 1)),
            Token::Epsilon => operands.push((Node::Epsilon, 1)),
            Token::Closure => {
                // Postfix and binds tightest, so it applies straight to the top operand
                let operand = match operands.pop() {
                    Some((Node::Closure(child), height)) => (Node::Closure(child), height),
                    Some((node, height)) => {
                        (Node::Closure(Box::new(node)), check_height(height + 1)?)
                    }
                    None => return Err(RegExError::InvalidRegexError(regex.to_string())),
                };
                operands.push(operand);
            }
            Token::Concat => {
                while operators.last() == Some(&Token::Concat) {
                    operators.pop();
                    reduce(Token::Concat, &mut operands, regex)?;
                }
                operators.push(Token::Concat);
            }
            Token::Alternation => {
                // Pending concatenations bind tighter and must be resolved first
                while let Some(&top) = operators.last() {
                    if top != Token::Concat && top != Token::Alternation {
                        break;
                    }
                    operators.pop();
                    reduce(top, &mut operands, regex)?;
                }
                operators.push(Token::Alternation);
            }
            Token::LParen => operators.push(Token::LParen),
            Token::RParen => loop {
                match operators.pop() {
                    Some(Token::LParen) => break,
                    Some(operator) => reduce(operator, &mut operands, regex)?,
                    None => {
                        return Err(RegExError::UnbalancedParenthesisError(regex.to_string()))
                    }
                }
            },
        }
    }

    while let Some(operator) = operators.pop() {
        if operator == Token::LParen {
            return Err(RegExError::UnbalancedParenthesisError(regex.to_string()));
        }
        reduce(operator, &mut operands, regex)?;
    }

    match (operands.pop(), operands.is_empty()) {
        (Some((root, _)), true) => Ok(root),
        _ => Err(RegExError::InvalidRegexError(regex.to_string())),
    }
}

/// Parse a regular expression over the given alphabet into its operator tree.
pub fn parse_regex(regex: &str, alphabet: &[char]) -> Result<Node> {
    if regex.is_empty() {
        return Err(Report::new(RegExError::EmptyRegex));
    }

    let tokens = tokenize(regex, alphabet).map_err(Report::new)?;
    let tokens = insert_concatenation(tokens);

    check_placement(&tokens, regex).map_err(Report::new)?;
    build_syntax_tree(&tokens, regex).map_err(Report::new)
}

/// A partially built automaton: the state it is entered through and the dangling states that
/// whatever follows must be attached to.
#[derive(Debug)]
struct Fragment {
    entry: usize,
    exits: Vec<usize>,
}

struct NfaBuilder {
    // Slot 0 is unused, fragment states are numbered from one
    transitions: Vec<Vec<(Symbol, usize)>>,
}

impl NfaBuilder {
    fn new() -> Self {
        NfaBuilder {
            transitions: vec![Vec::new()],
        }
    }

    fn add_state(&mut self) -> usize {
        self.transitions.push(Vec::new());
        self.transitions.len() - 1
    }

    fn add_transition(&mut self, from: usize, symbol: Symbol, to: usize) {
        self.transitions[from].push((symbol, to));
    }

    fn compile(&mut self, node: &Node, depth: usize) -> Result<Fragment, RegExError> {
        if depth > MAX_DEPTH {
            return Err(RegExError::ExpressionTooDeep(MAX_DEPTH));
        }

        let fragment = match node {
            Node::Literal(ch) => {
                let start = self.add_state();
                let end = self.add_state();
                self.add_transition(start, Symbol::Char(*ch), end);
                Fragment {
                    entry: start,
                    exits: vec![end],
                }
            }
            Node::Epsilon => {
                let state = self.add_state();
                Fragment {
                    entry: state,
                    exits: vec![state],
                }
            }
            Node::Concat(children) => {
                let mut fragment: Option<Fragment> = None;

                for child in children {
                    let next = self.compile(child, depth + 1)?;
                    fragment = Some(match fragment {
                        None => next,
                        Some(prev) => {
                            for exit in prev.exits {
                                self.add_transition(exit, Symbol::Epsilon, next.entry);
                            }
                            Fragment {
                                entry: prev.entry,
                                exits: next.exits,
                            }
                        }
                    });
                }

                match fragment {
                    Some(fragment) => fragment,
                    None => self.compile(&Node::Epsilon, depth + 1)?,
                }
            }
            Node::Alternation(children) => {
                let branch = self.add_state();
                let mut exits = Vec::new();

                for child in children {
                    let option = self.compile(child, depth + 1)?;
                    self.add_transition(branch, Symbol::Epsilon, option.entry);
                    exits.extend(option.exits);
                }

                let join = self.add_state();
                for exit in exits {
                    self.add_transition(exit, Symbol::Epsilon, join);
                }
                Fragment {
                    entry: branch,
                    exits: vec![join],
                }
            }
            Node::Closure(child) => match child.as_ref() {
                Node::Literal(ch) => {
                    let state = self.add_state();
                    self.add_transition(state, Symbol::Char(*ch), state);
                    Fragment {
                        entry: state,
                        exits: vec![state],
                    }
                }
                _ => {
                    let entry = self.add_state();
                    let body = self.compile(child, depth + 1)?;

                    self.add_transition(entry, Symbol::Epsilon, body.entry);
                    for exit in body.exits {
                        self.add_transition(exit, Symbol::Epsilon, entry);
                    }

                    let continuation = self.add_state();
                    self.add_transition(entry, Symbol::Epsilon, continuation);
                    Fragment {
                        entry,
                        exits: vec![continuation],
                    }
                }
            },
        };
        Ok(fragment)
    }

    /// A state accepts when it has no way out other than looping on itself.
    fn terminal_states(&self) -> Vec<usize> {
        (1..self.transitions.len())
            .filter(|state| self.transitions[*state].iter().all(|(_, to)| to == state))
            .collect()
    }

    fn into_nfa(self, start: usize, alphabet: &[char]) -> Result<NFA> {
        let num_states = self.transitions.len() - 1;
        let mut nfa = NFA::new(num_states, alphabet.to_vec());

        nfa.set_start_state(start)?;
        for state in self.terminal_states() {
            nfa.set_accept_state(state)?;
        }

        for (from, transitions) in self.transitions.into_iter().enumerate() {
            for (symbol, to) in transitions {
                nfa.add_transition(from, symbol, to)?;
            }
        }
        Ok(nfa)
    }
}

/// Compile an operator tree into an NFA over the given alphabet.
pub fn compile(tree: &Node, alphabet: &[char]) -> Result<NFA> {
    let mut builder = NfaBuilder::new();
    let root = builder.compile(tree, 0).map_err(Report::new)?;
    builder.into_nfa(root.entry, alphabet)
}

#[derive(Debug, Clone)]
pub struct RegEx {
    expression: String,
    alphabet: Vec<char>,
    nfa: NFA,
    dfa: DFA,
}

impl RegEx {
    /// Compile a regular expression over the given alphabet all the way down to a DFA.
    pub fn new(alphabet: &[char], expression: &str) -> Result<RegEx> {
        let tree = parse_regex(expression, alphabet)?;
        let nfa = compile(&tree, alphabet)?;
        let dfa = nfa.to_dfa();

        debug!("Compiled regex {:?}", expression);

        Ok(RegEx {
            expression: expression.to_string(),
            alphabet: alphabet.to_vec(),
            nfa,
            dfa,
        })
    }

    /// Read a regex file: the alphabet on the first line, optionally in double quotes, and the
    /// expression on the second line.
    pub fn from_spec(spec: &str) -> Result<RegEx> {
        let mut lines = spec.lines();

        let alphabet: Vec<char> = match lines.next() {
            Some(line) if !strip_quotes(line).is_empty() => strip_quotes(line).chars().collect(),
            line => {
                let err = RegExError::MalformedRegexFile(line.unwrap_or("").to_string());
                return Err(Report::new(err));
            }
        };

        let expression = match lines.next() {
            Some(line) => strip_quotes(line),
            None => return Err(Report::new(RegExError::EmptyRegex)),
        };

        let trailing: Vec<&str> = lines.filter(|line| !line.trim().is_empty()).collect();
        if let Some(line) = trailing.first() {
            let err = RegExError::MalformedRegexFile(line.to_string());
            return Err(Report::new(err));
        }

        RegEx::new(&alphabet, expression)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<RegEx> {
        let spec = read_spec_file(path.as_ref()).map_err(|err| match err {
            FormatError::FileReadError(err_line) => Report::new(RegExError::FileReadError(err_line)),
            err => Report::new(RegExError::FileOpenError(err.to_string())),
        })?;
        RegEx::from_spec(&spec)
    }

    /// Returns true if the input is in the language of the expression.
    pub fn simulate(&self, input: &str) -> bool {
        self.dfa.simulate(input)
    }

    pub fn dfa(&self) -> &DFA {
        &self.dfa
    }

    pub fn into_dfa(self) -> DFA {
        self.dfa
    }

    pub fn nfa(&self) -> &NFA {
        &self.nfa
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }
}

#[cfg(test)]
mod regex_tests {
    use super::*;
    use crate::fa::FA;

    const AB: &[char] = &['a', 'b'];

    fn lit(ch: char) -> Node {
        Node::Literal(ch)
    }

    fn regex_error(regex: &str, alphabet: &[char]) -> RegExError {
        let err = parse_regex(regex, alphabet).unwrap_err();
        match err.downcast::<RegExError>() {
            Ok(err) => err,
            Err(err) => panic!("Expected a RegExError, got {:?}", err),
        }
    }

    #[test]
    fn test_implicit_concatenation() {
        let tokens = insert_concatenation(tokenize("a(b)*a\\*", &['a', 'b', '*']).unwrap());
        assert_eq!(
            tokens,
            vec![
                Token::Literal('a'),
                Token::Concat,
                Token::LParen,
                Token::Literal('b'),
                Token::RParen,
                Token::Closure,
                Token::Concat,
                Token::Literal('a'),
                Token::Concat,
                Token::Literal('*'),
            ]
        );

        let tokens = insert_concatenation(tokenize("a|b", AB).unwrap());
        assert_eq!(
            tokens,
            vec![Token::Literal('a'), Token::Alternation, Token::Literal('b')]
        );
    }

    #[test]
    fn test_precedence() {
        let tree = parse_regex("a|bb*", AB).unwrap();
        assert_eq!(
            tree,
            Node::Alternation(vec![
                lit('a'),
                Node::Concat(vec![lit('b'), Node::Closure(Box::new(lit('b')))])
            ])
        );
    }

    #[test]
    fn test_runs_are_flattened() {
        let tree = parse_regex("abab", AB).unwrap();
        assert_eq!(
            tree,
            Node::Concat(vec![lit('a'), lit('b'), lit('a'), lit('b')])
        );

        let tree = parse_regex("a|(b|a)", AB).unwrap();
        assert_eq!(tree, Node::Alternation(vec![lit('a'), lit('b'), lit('a')]));

        let tree = parse_regex("a(ba)", AB).unwrap();
        assert_eq!(tree, Node::Concat(vec![lit('a'), lit('b'), lit('a')]));
    }

    #[test]
    fn test_grouping() {
        let tree = parse_regex("(a|b)*", AB).unwrap();
        assert_eq!(
            tree,
            Node::Closure(Box::new(Node::Alternation(vec![lit('a'), lit('b')])))
        );

        let tree = parse_regex("(ab)|b", AB).unwrap();
        assert_eq!(
            tree,
            Node::Alternation(vec![Node::Concat(vec![lit('a'), lit('b')]), lit('b')])
        );
    }

    #[test]
    fn test_repeated_closure_collapses() {
        let regex = format!("a{}", "*".repeat(100_000));
        let tree = parse_regex(&regex, AB).unwrap();
        assert_eq!(tree, Node::Closure(Box::new(lit('a'))));

        let regex = RegEx::new(AB, "(ab)***").unwrap();
        assert!(regex.simulate("abab"));
        assert!(!regex.simulate("aba"));
    }

    #[test]
    fn test_epsilon_and_escapes() {
        assert_eq!(parse_regex("e", AB).unwrap(), Node::Epsilon);

        let alphabet = ['a', '|', '(', 'e'];
        let tree = parse_regex("\\|\\(\\e", &alphabet).unwrap();
        assert_eq!(tree, Node::Concat(vec![lit('|'), lit('('), lit('e')]));
    }

    #[test]
    fn test_invalid_regexes() {
        assert_eq!(regex_error("", AB), RegExError::EmptyRegex);
        assert_eq!(regex_error("ac", AB), RegExError::InvalidSymbol('c'));
        assert_eq!(regex_error("a\\c", AB), RegExError::InvalidSymbol('c'));
        assert!(matches!(
            regex_error("ab\\", AB),
            RegExError::DanglingEscape(_)
        ));
        assert!(matches!(
            regex_error("(ab", AB),
            RegExError::UnbalancedParenthesisError(_)
        ));
        assert!(matches!(
            regex_error("ab)", AB),
            RegExError::UnbalancedParenthesisError(_)
        ));
        assert!(matches!(
            regex_error(")a", AB),
            RegExError::UnbalancedParenthesisError(_)
        ));

        for regex in ["a|", "|a", "*a", "()", "a(|b)", "(a|)", "a||b", "(*a)"] {
            assert!(
                matches!(regex_error(regex, AB), RegExError::InvalidRegexError(_)),
                "{regex}"
            );
        }
    }

    #[test]
    fn test_alternation() {
        let regex = RegEx::new(AB, "a|b").unwrap();
        assert!(regex.simulate("a"));
        assert!(regex.simulate("b"));
        assert!(!regex.simulate("ab"));
        assert!(!regex.simulate(""));
    }

    #[test]
    fn test_concatenation_with_closure() {
        let regex = RegEx::new(AB, "ab*").unwrap();
        assert!(regex.simulate("a"));
        assert!(regex.simulate("ab"));
        assert!(regex.simulate("abb"));
        assert!(!regex.simulate("b"));
        assert!(!regex.simulate("ba"));
        assert!(!regex.simulate(""));
    }

    #[test]
    fn test_epsilon_accepts_only_empty_string() {
        let regex = RegEx::new(AB, "e").unwrap();
        assert!(regex.simulate(""));
        assert!(!regex.simulate("a"));
        assert!(!regex.simulate("b"));
    }

    #[test]
    fn test_star_over_literal() {
        let regex = RegEx::new(AB, "a*").unwrap();
        assert!(regex.simulate(""));
        assert!(regex.simulate("a"));
        assert!(regex.simulate("aaaa"));
        assert!(!regex.simulate("b"));
        assert!(!regex.simulate("aab"));
    }

    #[test]
    fn test_nested_constructs() {
        let regex = RegEx::new(AB, "(a|b)*abb").unwrap();
        assert!(regex.simulate("abb"));
        assert!(regex.simulate("aababb"));
        assert!(!regex.simulate("abba"));

        let regex = RegEx::new(AB, "(ab)*").unwrap();
        assert!(regex.simulate(""));
        assert!(regex.simulate("abab"));
        assert!(!regex.simulate("aba"));

        let regex = RegEx::new(AB, "((a|e)b)*").unwrap();
        assert!(regex.simulate("bab"));
        assert!(regex.simulate(""));
        assert!(!regex.simulate("aab"));

        let regex = RegEx::new(AB, "a(b|e)a*|b").unwrap();
        assert!(regex.simulate("a"));
        assert!(regex.simulate("aba"));
        assert!(regex.simulate("aaa"));
        assert!(regex.simulate("b"));
        assert!(!regex.simulate("abb"));

        let regex = RegEx::new(AB, "(a*)*").unwrap();
        assert!(regex.simulate(""));
        assert!(regex.simulate("aaa"));
        assert!(!regex.simulate("ab"));
    }

    #[test]
    fn test_fragment_accept_states() {
        // a*: one looping state that is both the entry and the accept state
        let regex = RegEx::new(AB, "a*").unwrap();
        let nfa = regex.nfa();
        assert_eq!(nfa.get_num_states(), 1);
        assert_eq!(nfa.get_start_state(), 1);
        assert_eq!(nfa.accept_states(), vec![1]);

        // a|b: branch, two literal fragments and a join state
        let regex = RegEx::new(AB, "a|b").unwrap();
        let nfa = regex.nfa();
        assert_eq!(nfa.get_num_states(), 6);
        assert_eq!(nfa.accept_states(), vec![6]);
    }

    #[test]
    fn test_nfa_and_dfa_agree() {
        let regex = RegEx::new(AB, "(a|b)*a(a|b)").unwrap();
        for input in ["", "a", "aa", "ab", "ba", "bab", "abba", "bbbab"] {
            assert_eq!(regex.nfa().simulate(input), regex.simulate(input), "{input}");
        }
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        // (a(a(a ... )*)*)* alternates concatenation and closure at every level
        let depth = 100_000;
        let regex = format!("{}{}", "(a".repeat(depth), ")*".repeat(depth));
        assert_eq!(
            regex_error(&regex, AB),
            RegExError::ExpressionTooDeep(MAX_DEPTH)
        );

        let err = RegEx::new(AB, &regex).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegExError>(),
            Some(&RegExError::ExpressionTooDeep(MAX_DEPTH))
        );
    }

    #[test]
    fn test_long_expressions_compile() {
        let regex = RegEx::new(AB, &"ab".repeat(300)).unwrap();
        assert!(regex.simulate(&"ab".repeat(300)));
        assert!(!regex.simulate(&"ab".repeat(299)));

        let regex = RegEx::new(AB, &vec!["ab"; 600].join("|")).unwrap();
        assert!(regex.simulate("ab"));
        assert!(!regex.simulate("abab"));
    }

    #[test]
    fn test_from_spec() {
        let regex = RegEx::from_spec("\"ab\"\n\"a(a|b)*\"\n").unwrap();
        assert_eq!(regex.alphabet(), &['a', 'b']);
        assert_eq!(regex.expression(), "a(a|b)*");
        assert!(regex.simulate("abba"));
        assert!(!regex.simulate("ba"));

        let err = RegEx::from_spec("ab\na\nb\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegExError>(),
            Some(RegExError::MalformedRegexFile(_))
        ));
    }
}
