use bitvec::prelude::BitVec;
use serde::{Deserialize, Serialize};

/// The character that stands for an epsilon move in specification files and
/// regular expressions. It is never a member of an automaton's alphabet.
pub const EPSILON_MARKER: char = 'e';

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl Symbol {
    /// Map a specification-file character to a symbol, treating the epsilon marker as epsilon.
    pub fn from_marker(ch: char) -> Self {
        if ch == EPSILON_MARKER {
            Symbol::Epsilon
        } else {
            Symbol::Char(ch)
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(ch) => write!(f, "{}", ch),
        }
    }
}

/// Behaviour shared by the deterministic and nondeterministic automata.
///
/// State labels range over `0..=get_num_states()`. Specification files may number their states
/// from zero or from one, so every automaton keeps a slot for each label in that range.
pub trait FA {
    fn get_num_states(&self) -> usize;
    fn get_start_state(&self) -> usize;
    fn get_alphabet(&self) -> &[char];
    fn get_acceptor_states(&self) -> &BitVec<u8>;
    /// All outgoing transitions of a state, one entry per destination.
    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)>;

    fn is_accepting(&self, state_id: usize) -> bool {
        self.get_acceptor_states()
            .get(state_id)
            .map(|bit| *bit)
            .unwrap_or(false)
    }
}
