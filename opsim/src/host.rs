//! # Host interface
//! Machines do not own any storage besides their stack or registers. Everything
//! else is provided by the host running them through the [`Host`] trait:
//! - reading host variables, referenced as `V[n]` (or `$n` in register dialects)
//! - receiving `PRINT` snapshots
//! - receiving `CALL` targets
//!
//! Only the first one is required, the others log through [`log`] by default.

use alloc::{collections::BTreeMap, vec::Vec};
use core::fmt::Display;
use log::info;
use opasm::{Literal, Word};

pub trait Host {
    // Required methods
    /// Reads a host variable.
    fn read_variable(&mut self, id: u32) -> Word;

    // Provided methods
    /// Receives the machine state when a `PRINT` instruction runs.
    fn print(&mut self, snapshot: &dyn Display) {
        info!("{snapshot}")
    }
    /// Receives the target of a `CALL` instruction. Calls never transfer control.
    fn call(&mut self, label: &str) {
        info!("CALL {label}")
    }

    /// Resolves a decoded literal, reading host variables when needed.
    fn resolve(&mut self, literal: Literal) -> Word {
        match literal {
            Literal::Value(value) => value,
            Literal::Variable(id) => self.read_variable(id),
        }
    }
}

impl<H: Host + ?Sized> Host for &mut H {
    fn read_variable(&mut self, id: u32) -> Word {
        (**self).read_variable(id)
    }
    fn print(&mut self, snapshot: &dyn Display) {
        (**self).print(snapshot)
    }
    fn call(&mut self, label: &str) {
        (**self).call(label)
    }
    fn resolve(&mut self, literal: Literal) -> Word {
        (**self).resolve(literal)
    }
}

/// Host without variables: every variable reads as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoVariables;
impl Host for NoVariables {
    fn read_variable(&mut self, _id: u32) -> Word {
        Word::ZERO
    }
}

/// Variables indexed by id. Variables past the end read as zero.
impl Host for Vec<i64> {
    fn read_variable(&mut self, id: u32) -> Word {
        self.get(id as usize).copied().map_or(Word::ZERO, Word::Int)
    }
}

/// Sparse variables. Unset variables read as zero.
impl Host for BTreeMap<u32, i64> {
    fn read_variable(&mut self, id: u32) -> Word {
        self.get(&id).copied().map_or(Word::ZERO, Word::Int)
    }
}
