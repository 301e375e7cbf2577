/* Nondeterministic finite automaton with epsilon moves. Epsilon closures are computed once per
 * automaton and cached; subset construction turns the NFA into an equivalent total DFA. */

use crate::dfa::DFA;
use crate::fa::{Symbol, FA};
use crate::format::{
    parse_state, parse_symbol, read_spec_file, split_record, FormatError, SpecReader,
};
use bitvec::prelude::*;
use color_eyre::eyre::{Report, Result};
use log::debug;
use std::cell::OnceCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NFAState {
    transitions: HashMap<Symbol, Vec<usize>>,
}

#[derive(Debug, Clone)]
pub struct NFA {
    states: Vec<NFAState>,
    num_states: usize,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: Vec<char>,
    epsilon_closures: OnceCell<Vec<BitVec<u8>>>,
}

impl FA for NFA {
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

        let mut symbols: Vec<&Symbol> = state.transitions.keys().collect();
        symbols.sort();

        let mut transition_list = Vec::new();
        for symbol in symbols {
            for target in &state.transitions[symbol] {
                transition_list.push((*symbol, *target));
            }
        }
        transition_list
    }
}

impl NFAState {
    fn add_transition(&mut self, symbol: Symbol, to: usize) {
        let targets = self.transitions.entry(symbol).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    pub fn get_transitions(&self) -> &HashMap<Symbol, Vec<usize>> {
        &self.transitions
    }

    /// True if the state has epsilon moves and nothing else.
    pub fn is_epsilon_only(&self) -> bool {
        self.transitions.contains_key(&Symbol::Epsilon)
            && self.transitions.keys().all(|symbol| *symbol == Symbol::Epsilon)
    }
}

impl NFA {
    /// Create an NFA with room for the state labels `0..=num_states` and no transitions.
    pub fn new(num_states: usize, alphabet: Vec<char>) -> Self {
        NFA {
            states: vec![NFAState::default(); num_states + 1],
            num_states,
            start_state: 0,
            accept_states: BitVec::repeat(false, num_states + 1),
            alphabet,
            epsilon_closures: OnceCell::new(),
        }
    }

    /// Parse an NFA from the text of a specification file.
    pub fn from_spec(spec: &str) -> Result<NFA> {
        parse_nfa_spec(spec).map_err(Report::new)
    }

    /// Load an NFA from a specification file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NFA> {
        let spec = read_spec_file(path.as_ref()).map_err(Report::new)?;
        NFA::from_spec(&spec)
    }

    pub fn add_transition(&mut self, from: usize, symbol: Symbol, to: usize) -> Result<()> {
        for state in [from, to] {
            if state > self.num_states {
                return Err(Report::new(FormatError::InvalidState(state.to_string())));
            }
        }

        if let Symbol::Char(ch) = symbol {
            if !self.alphabet.contains(&ch) {
                return Err(Report::new(FormatError::SymbolNotInAlphabet(ch)));
            }
        }

        self.states[from].add_transition(symbol, to);
        self.epsilon_closures.take(); // Invalidate the cached closures
        Ok(())
    }

    pub fn set_start_state(&mut self, state_id: usize) -> Result<()> {
        if state_id > self.num_states {
            return Err(Report::new(FormatError::InvalidStartState(
                state_id.to_string(),
            )));
        }
        self.start_state = state_id;
        Ok(())
    }

    pub fn set_accept_state(&mut self, state_id: usize) -> Result<()> {
        if state_id > self.num_states {
            return Err(Report::new(FormatError::InvalidAcceptState(
                state_id.to_string(),
            )));
        }
        self.accept_states.set(state_id, true);
        Ok(())
    }

    pub fn get_state(&self, id: usize) -> Option<&NFAState> {
        self.states.get(id)
    }

    pub fn accept_states(&self) -> Vec<usize> {
        self.accept_states.iter_ones().collect()
    }

    /// The set of states reachable from `state` through zero or more epsilon moves, or `None`
    /// if the state is out of range.
    pub fn epsilon_closure(&self, state: usize) -> Option<&BitVec<u8>> {
        self.closures().get(state)
    }

    fn start_closure(&self) -> BitVec<u8> {
        match self.epsilon_closure(self.start_state) {
            Some(closure) => closure.clone(),
            None => BitVec::repeat(false, self.states.len()),
        }
    }

    fn closures(&self) -> &Vec<BitVec<u8>> {
        self.epsilon_closures
            .get_or_init(|| compute_epsilon_closures(&self.states))
    }

    fn closure_of_set(&self, nfa_states: &BitVec<u8>) -> BitVec<u8> {
        let closures = self.closures();
        let mut result: BitVec<u8> = BitVec::repeat(false, self.states.len());

        for state in nfa_states.iter_ones() {
            for reachable in closures[state].iter_ones() {
                result.set(reachable, true);
            }
        }
        result
    }

    // The set of states reachable via char c from any state within the set q
    fn delta(&self, q: &BitVec<u8>, c: char) -> BitVec<u8> {
        let mut result: BitVec<u8> = BitVec::repeat(false, self.states.len());

        for node in q.iter_ones() {
            if let Some(targets) = self.states[node].transitions.get(&Symbol::Char(c)) {
                for target in targets {
                    result.set(*target, true);
                }
            }
        }
        result
    }

    fn contains_accept(&self, nfa_states: &BitVec<u8>) -> bool {
        nfa_states.iter_ones().any(|state| self.is_accepting(state))
    }

    /// Returns true if the input is in the language of the NFA, tracking the set of active
    /// states directly instead of building a DFA.
    pub fn simulate(&self, input: &str) -> bool {
        let mut current = self.start_closure();

        for ch in input.chars() {
            current = self.closure_of_set(&self.delta(&current, ch));
            if current.not_any() {
                return false;
            }
        }

        self.contains_accept(&current)
    }

    /// Apply the subset construction algorithm to build an equivalent DFA. DFA states are numbered
    /// from one in creation order, so the start state is always 1. The table is total: when the
    /// empty set of NFA states shows up it becomes a reject state that loops on every symbol.
    pub fn to_dfa(&self) -> DFA {
        let mut result = DFA::new(0, self.alphabet.clone());

        let mut q_list: HashMap<BitVec<u8>, usize> = HashMap::new(); // Mapping from nfa state set to DFA state
        let mut work_list: VecDeque<BitVec<u8>> = VecDeque::new();

        let q0 = self.start_closure();
        let d0 = result.push_state();
        result.mark_start(d0);

        if self.contains_accept(&q0) {
            result.mark_accepting(d0);
        }

        q_list.insert(q0.clone(), d0);
        work_list.push_back(q0);

        while let Some(q) = work_list.pop_front() {
            let dq = q_list[&q];

            for c in self.alphabet.iter() {
                let t = self.closure_of_set(&self.delta(&q, *c));

                let dt = match q_list.get(&t) {
                    Some(&existing) => existing,
                    None => {
                        let dt = result.push_state();

                        if t.not_any() {
                            debug!("Subset construction synthesized reject state {}", dt);
                        } else if self.contains_accept(&t) {
                            result.mark_accepting(dt);
                        }

                        q_list.insert(t.clone(), dt);
                        work_list.push_back(t);
                        dt
                    }
                };

                result.insert_transition(dq, *c, dt);
            }
        }

        debug!(
            "Subset construction produced {} DFA states from {} NFA states",
            result.get_num_states(),
            self.num_states
        );

        result
    }
}

fn compute_epsilon_closures(states: &[NFAState]) -> Vec<BitVec<u8>> {
    let num_states = states.len();
    let mut closures = Vec::with_capacity(num_states);

    for origin in 0..num_states {
        let mut visited: BitVec<u8> = BitVec::repeat(false, num_states);
        let mut queue: VecDeque<usize> = VecDeque::new();

        visited.set(origin, true);
        queue.push_back(origin);

        while let Some(state) = queue.pop_front() {
            if let Some(targets) = states[state].transitions.get(&Symbol::Epsilon) {
                for target in targets {
                    if !visited[*target] {
                        visited.set(*target, true);
                        queue.push_back(*target);
                    }
                }
            }
        }

        closures.push(visited);
    }
    closures
}

fn parse_nfa_spec(spec: &str) -> Result<NFA, FormatError> {
    let mut reader = SpecReader::new(spec);

    let num_states = reader.read_state_count()?;
    let alphabet = reader.read_alphabet()?;

    let mut nfa = NFA::new(num_states, alphabet);

    // Transition records run until a blank line or the start-state line
    while let Some(line) = reader.peek_line() {
        if line.trim().is_empty() {
            reader.next_line();
            break;
        }

        let (start, symbol, end) = match split_record(line) {
            Some(record) => record,
            None => break,
        };
        reader.next_line();

        let start = parse_state(start, num_states)?;

        let symbol = match Symbol::from_marker(parse_symbol(&symbol, line)?) {
            Symbol::Char(ch) if !nfa.alphabet.contains(&ch) => {
                return Err(FormatError::SymbolNotInAlphabet(ch));
            }
            symbol => symbol,
        };

        let end = parse_state(end, num_states)?;

        nfa.states[start].add_transition(symbol, end);
    }

    nfa.start_state = reader.read_start_state(num_states)?;

    for accept in reader.read_accept_states(num_states)? {
        nfa.accept_states.set(accept, true);
    }

    reader.ensure_exhausted()?;

    debug!(
        "Loaded NFA with {} states over {} symbols",
        num_states,
        nfa.alphabet.len()
    );

    Ok(nfa)
}
