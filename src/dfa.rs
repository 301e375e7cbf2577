/* Deterministic finite automaton: loading from the specification format, building
 * programmatically, writing back out and simulating on input strings. */

use crate::fa::{Symbol, EPSILON_MARKER, FA};
use crate::format::{
    parse_state, parse_symbol, read_spec_file, split_record, FormatError, SpecReader,
};
use bitvec::prelude::*;
use color_eyre::eyre::{Report, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DFA {
    states: Vec<DFAState>,
    num_states: usize,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: Vec<char>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DFAState {
    transitions: HashMap<char, usize>,
}

/// Errors raised by queries against an already built DFA
#[derive(Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The state is outside `0..=num_states`
    StateOutOfRange(usize),
    /// The symbol is neither in the alphabet nor the epsilon marker
    InvalidSymbol(char),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::StateOutOfRange(state) => {
                write!(f, "Error: State {} is out of range!", state)
            }
            QueryError::InvalidSymbol(ch) => write!(
                f,
                "Error: Symbol {:?} must be in the alphabet or the epsilon marker!",
                ch
            ),
        }
    }
}

impl std::error::Error for QueryError {}

impl FA for DFA {
    fn get_num_states(&self) -> usize {
        self.num_states
    }

    fn get_start_state(&self) -> usize {
        self.start_state
    }

    fn get_alphabet(&self) -> &[char] {
        &self.alphabet
    }

    fn get_acceptor_states(&self) -> &BitVec<u8> {
        &self.accept_states
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)> {
        let state = match self.states.get(state_id) {
            Some(state) => state,
            None => return Vec::new(),
        };

        self.alphabet
            .iter()
            .filter_map(|ch| {
                state
                    .transitions
                    .get(ch)
                    .map(|target| (Symbol::Char(*ch), *target))
            })
            .collect()
    }
}

impl DFAState {
    /// Get a list of all outgoing transitions for the given state
    pub fn get_transitions(&self) -> &HashMap<char, usize> {
        &self.transitions
    }
}

impl DFA {
    /// Create a DFA with room for the state labels `0..=num_states` and no transitions.
    pub fn new(num_states: usize, alphabet: Vec<char>) -> Self {
        DFA {
            states: vec![DFAState::default(); num_states + 1],
            num_states,
            start_state: 0,
            accept_states: BitVec::repeat(false, num_states + 1),
            alphabet,
        }
    }

    /// Parse a DFA from the text of a specification file.
    pub fn from_spec(spec: &str) -> Result<DFA> {
        parse_dfa_spec(spec).map_err(Report::new)
    }

    /// Load a DFA from a specification file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DFA> {
        let spec = read_spec_file(path.as_ref()).map_err(Report::new)?;
        DFA::from_spec(&spec)
    }

    /// Add or replace the transition `from --symbol--> to`.
    pub fn add_transition(&mut self, from: usize, symbol: char, to: usize) -> Result<()> {
        self.check_state(from)?;
        self.check_state(to)?;

        if !self.alphabet.contains(&symbol) {
            return Err(Report::new(FormatError::SymbolNotInAlphabet(symbol)));
        }

        self.states[from].transitions.insert(symbol, to);
        Ok(())
    }

    pub fn set_start_state(&mut self, state_id: usize) -> Result<()> {
        self.check_state(state_id)?;
        self.start_state = state_id;
        Ok(())
    }

    pub fn set_accept_state(&mut self, state_id: usize) -> Result<()> {
        self.check_state(state_id)?;
        self.accept_states.set(state_id, true);
        Ok(())
    }

    /// Push a fresh state at the end of the label space and return its label. Used by subset
    /// construction, which numbers its states from one.
    pub(crate) fn push_state(&mut self) -> usize {
        self.states.push(DFAState::default());
        self.accept_states.push(false);
        self.num_states = self.states.len() - 1;
        self.num_states
    }

    pub(crate) fn insert_transition(&mut self, from: usize, symbol: char, to: usize) {
        self.states[from].transitions.insert(symbol, to);
    }

    pub(crate) fn mark_start(&mut self, state_id: usize) {
        self.start_state = state_id;
    }

    pub(crate) fn mark_accepting(&mut self, state_id: usize) {
        self.accept_states.set(state_id, true);
    }

    fn check_state(&self, state_id: usize) -> Result<()> {
        if state_id > self.num_states
            || state_id >= self.states.len()
            || state_id >= self.accept_states.len()
        {
            let err = Report::new(QueryError::StateOutOfRange(state_id));
            return Err(err);
        }
        Ok(())
    }

    /// Returns true if the input is in the language of the DFA. A missing transition, which
    /// includes any symbol outside the alphabet, rejects immediately.
    pub fn simulate(&self, input: &str) -> bool {
        let mut state = self.start_state;

        for ch in input.chars() {
            let next_state = self
                .states
                .get(state)
                .and_then(|dfa_state| dfa_state.transitions.get(&ch));

            state = match next_state {
                Some(next_state) => *next_state,
                None => return false,
            };
        }

        self.is_accepting(state)
    }

    /// Returns the destination of `state` on `symbol`, if one is defined. The state must be in
    /// `0..=num_states` and the symbol must be in the alphabet or be the epsilon marker.
    pub fn transition(&self, state: usize, symbol: char) -> Result<Option<usize>> {
        if state > self.num_states {
            return Err(Report::new(QueryError::StateOutOfRange(state)));
        }

        if symbol != EPSILON_MARKER && !self.alphabet.contains(&symbol) {
            return Err(Report::new(QueryError::InvalidSymbol(symbol)));
        }

        Ok(self
            .states
            .get(state)
            .and_then(|dfa_state| dfa_state.transitions.get(&symbol))
            .copied())
    }

    /// Returns a reference to the DFA state whose id is provided
    pub fn get_state(&self, id: usize) -> Option<&DFAState> {
        self.states.get(id)
    }

    pub fn accept_states(&self) -> Vec<usize> {
        self.accept_states.iter_ones().collect()
    }

    /// Render the DFA in the specification format. Every defined transition is written as one
    /// quoted record, so the output reloads with `from_spec` whenever the table is total.
    pub fn to_spec(&self) -> String {
        let mut spec = String::new();

        let alphabet: String = self.alphabet.iter().collect();
        let _ = writeln!(spec, "{}", self.num_states);
        let _ = writeln!(spec, "{}", alphabet);

        for (state_id, state) in self.states.iter().enumerate() {
            for ch in &self.alphabet {
                if let Some(target) = state.transitions.get(ch) {
                    let _ = writeln!(spec, "{} '{}' {}", state_id, ch, target);
                }
            }
        }

        let accepts: Vec<String> = self
            .accept_states
            .iter_ones()
            .map(|state| state.to_string())
            .collect();

        let _ = writeln!(spec, "{}", self.start_state);
        let _ = writeln!(spec, "{}", accepts.join(" "));

        spec
    }
}

fn parse_dfa_spec(spec: &str) -> Result<DFA, FormatError> {
    let mut reader = SpecReader::new(spec);

    let num_states = reader.read_state_count()?;
    let alphabet = reader.read_alphabet()?;

    // Every state needs one record per symbol, so a count the file cannot back is rejected
    // before anything is allocated
    let num_transitions = num_states
        .checked_mul(alphabet.len())
        .filter(|count| *count <= reader.remaining())
        .ok_or_else(|| FormatError::MalformedTransition(String::new()))?;

    let mut dfa = DFA::new(num_states, alphabet);

    for _ in 0..num_transitions {
        let line = reader.next_line().unwrap_or("");

        let (start, symbol, end) = match split_record(line) {
            Some(record) => record,
            None => return Err(FormatError::MalformedTransition(line.to_string())),
        };

        let symbol = parse_symbol(&symbol, line)?;

        if !dfa.alphabet.contains(&symbol) {
            return Err(FormatError::SymbolNotInAlphabet(symbol));
        }

        let start = parse_state(start, num_states)?;
        let end = parse_state(end, num_states)?;

        if dfa.states[start].transitions.contains_key(&symbol) {
            return Err(FormatError::RedefinedTransition(start, symbol));
        }

        dfa.states[start].transitions.insert(symbol, end);
    }

    dfa.start_state = reader.read_start_state(num_states)?;

    for accept in reader.read_accept_states(num_states)? {
        dfa.accept_states.set(accept, true);
    }

    reader.ensure_exhausted()?;

    debug!(
        "Loaded DFA with {} states over {} symbols",
        num_states,
        dfa.alphabet.len()
    );

    Ok(dfa)
}

#[cfg(test)]
mod dfa_tests {
    use super::*;

    // Strings over {a, b} that end in 'a'
    const ENDS_IN_A: &str = "2\nab\n0 a 1\n0 b 0\n1 a 1\n1 b 0\n0\n1\n";

    fn format_error(spec: &str) -> FormatError {
        let err = DFA::from_spec(spec).unwrap_err();
        match err.downcast::<FormatError>() {
            Ok(err) => err,
            Err(err) => panic!("Expected a FormatError, got {:?}", err),
        }
    }

    #[test]
    fn test_dfa_from_spec() {
        let dfa = DFA::from_spec(ENDS_IN_A).unwrap();

        assert_eq!(dfa.get_num_states(), 2);
        assert_eq!(dfa.get_start_state(), 0);
        assert_eq!(dfa.get_alphabet(), &['a', 'b']);
        assert_eq!(dfa.accept_states(), vec![1]);

        assert!(dfa.simulate("ba"));
        assert!(dfa.simulate("a"));
        assert!(dfa.simulate("abba"));
        assert!(!dfa.simulate("ab"));
        assert!(!dfa.simulate(""));
    }

    #[test]
    fn test_quoted_symbols() {
        let spec = "2\nab\n0 'a' 1\n0 'b' 0\n1 'a' 1\n1 'b' 0\n0\n1\n";
        let dfa = DFA::from_spec(spec).unwrap();
        assert!(dfa.simulate("bba"));
    }

    #[test]
    fn test_one_based_states() {
        let spec = "2\na\n1 a 2\n2 a 1\n1\n2\n";
        let dfa = DFA::from_spec(spec).unwrap();
        assert!(dfa.simulate("a"));
        assert!(dfa.simulate("aaa"));
        assert!(!dfa.simulate("aa"));
    }

    #[test]
    fn test_symbol_outside_alphabet_rejects() {
        let dfa = DFA::from_spec(ENDS_IN_A).unwrap();
        assert!(!dfa.simulate("ca"));
    }

    #[test]
    fn test_format_errors() {
        assert_eq!(format_error(""), FormatError::MissingStateCount);
        assert!(matches!(
            format_error("2 3\nab\n"),
            FormatError::InvalidStateCount(_)
        ));
        assert!(matches!(
            format_error("two\nab\n"),
            FormatError::InvalidStateCount(_)
        ));
        assert_eq!(format_error("2\n\n"), FormatError::EmptyAlphabet);
        assert!(matches!(
            format_error("1\na\n0 a\n0\n0\n"),
            FormatError::MalformedTransition(_)
        ));
        assert!(matches!(
            format_error("1\na\n"),
            FormatError::MalformedTransition(_)
        ));
        assert_eq!(
            format_error("1\na\n0 b 0\n0\n0\n"),
            FormatError::SymbolNotInAlphabet('b')
        );
        assert!(matches!(
            format_error("1\na\n0 a 7\n0\n0\n"),
            FormatError::InvalidState(_)
        ));
        assert!(matches!(
            format_error("1\na\nx a 0\n0\n0\n"),
            FormatError::InvalidState(_)
        ));
        assert_eq!(
            format_error("2\na\n0 a 1\n0 a 0\n0\n1\n"),
            FormatError::RedefinedTransition(0, 'a')
        );
        assert!(matches!(
            format_error("1\na\n0 a 0\n0 a 0\n0\n0\n"),
            FormatError::TooManyTransitions(_)
        ));
        assert!(matches!(
            format_error("1\na\n0 a 0\n0 1\n0\n"),
            FormatError::InvalidStartState(_)
        ));
        assert!(matches!(
            format_error("1\na\n0 a 0\nzero\n0\n"),
            FormatError::InvalidStartState(_)
        ));
        assert!(matches!(
            format_error("1\na\n0 a 0\n9\n0\n"),
            FormatError::InvalidStartState(_)
        ));
        assert!(matches!(
            format_error("1\na\n0 a 0\n0\n0 x\n"),
            FormatError::InvalidAcceptState(_)
        ));
        assert!(matches!(
            format_error("1\na\n0 a 0\n0\n0\nmore\n"),
            FormatError::TrailingContent(_)
        ));
        assert!(matches!(
            format_error("18446744073709551615\na\n"),
            FormatError::InvalidStateCount(_)
        ));
        assert!(matches!(
            format_error("1000000\nab\n0 a 0\n"),
            FormatError::MalformedTransition(_)
        ));
    }

    #[test]
    fn test_out_of_range_accept_states_are_ignored() {
        let dfa = DFA::from_spec("2\nab\n0 a 1\n0 b 0\n1 a 1\n1 b 0\n0\n1 9\n").unwrap();
        assert_eq!(dfa.accept_states(), vec![1]);
        assert!(dfa.simulate("ba"));
    }

    #[test]
    fn test_missing_file() {
        let err = DFA::from_file("test_data/does_not_exist.dfa").unwrap_err();
        match err.downcast_ref::<FormatError>() {
            Some(FormatError::FileOpenError(_)) => {}
            _ => panic!("Expected FileOpenError, got {:?}", err),
        }
    }

    #[test]
    fn test_transition_query() {
        let dfa = DFA::from_spec(ENDS_IN_A).unwrap();

        assert_eq!(dfa.transition(0, 'a').unwrap(), Some(1));
        assert_eq!(dfa.transition(1, 'b').unwrap(), Some(0));
        assert_eq!(dfa.transition(0, EPSILON_MARKER).unwrap(), None);

        let err = dfa.transition(3, 'a').unwrap_err();
        assert_eq!(
            err.downcast_ref::<QueryError>(),
            Some(&QueryError::StateOutOfRange(3))
        );

        let err = dfa.transition(0, 'z').unwrap_err();
        assert_eq!(
            err.downcast_ref::<QueryError>(),
            Some(&QueryError::InvalidSymbol('z'))
        );
    }

    #[test]
    fn test_inconsistent_saved_dfa_does_not_panic() {
        let dfa = DFA::from_spec(ENDS_IN_A).unwrap();
        let mut value = serde_json::to_value(&dfa).unwrap();
        value["num_states"] = serde_json::json!(5);
        let mut dfa: DFA = serde_json::from_value(value).unwrap();

        let err = dfa.transition(4, 'a').unwrap_err();
        assert_eq!(
            err.downcast_ref::<QueryError>(),
            Some(&QueryError::StateOutOfRange(4))
        );
        assert!(dfa.add_transition(4, 'a', 0).is_err());
        assert!(dfa.set_accept_state(4).is_err());
        assert!(dfa.simulate("ba"));
    }

    #[test]
    fn test_programmatic_construction() {
        let mut dfa = DFA::new(2, vec!['0', '1']);
        dfa.add_transition(0, '0', 0).unwrap();
        dfa.add_transition(0, '1', 1).unwrap();
        dfa.add_transition(1, '0', 1).unwrap();
        dfa.add_transition(1, '1', 0).unwrap();
        dfa.set_start_state(0).unwrap();
        dfa.set_accept_state(1).unwrap();

        // Odd number of ones
        assert!(dfa.simulate("1"));
        assert!(dfa.simulate("0100"));
        assert!(!dfa.simulate("11"));

        assert!(dfa.add_transition(0, '2', 1).is_err());
        assert!(dfa.add_transition(5, '0', 1).is_err());
        assert!(dfa.set_start_state(3).is_err());
    }

    #[test]
    fn test_spec_round_trip() {
        let dfa = DFA::from_spec(ENDS_IN_A).unwrap();
        let reloaded = DFA::from_spec(&dfa.to_spec()).unwrap();

        for input in ["", "a", "b", "ab", "ba", "aab", "bba"] {
            assert_eq!(dfa.simulate(input), reloaded.simulate(input), "{input}");
        }
    }

    #[test]
    fn test_fa_trait_implementation_for_dfa() {
        let dfa = DFA::from_spec(ENDS_IN_A).unwrap();

        let transitions = dfa.get_state_transitions(0);
        assert_eq!(
            transitions,
            vec![(Symbol::Char('a'), 1), (Symbol::Char('b'), 0)]
        );
        assert!(dfa.is_accepting(1));
        assert!(!dfa.is_accepting(0));
        assert!(!dfa.is_accepting(42));
    }
}
