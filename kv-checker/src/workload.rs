//! Random CRUD workload.
//!
//! Keys come from a ten-key space (`"0"`..`"9"`) so that operations collide
//! often and exercise same-key semantics on the replicas.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::operation::{OpKind, Operation};

/// Number of distinct keys (single decimal digits).
pub const KEY_SPACE: u32 = 10;

/// Length of every generated value.
pub const VALUE_LEN: usize = 3;

/// Alphabet generated values are drawn from.
pub const VALUE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces one uniformly random [`Operation`] per call.
pub struct Workload<R = StdRng> {
    rng: R,
}

impl Workload<StdRng> {
    /// Reproducible stream for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Workload<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn next_operation(&mut self) -> Operation {
        let kind = OpKind::ALL[self.rng.gen_range(0..OpKind::ALL.len())];
        let key = self.key();
        match kind {
            OpKind::Create => Operation::create(key, self.value()),
            OpKind::Update => Operation::update(key, self.value()),
            OpKind::Read => Operation::read(key),
            OpKind::Delete => Operation::delete(key),
        }
    }

    fn key(&mut self) -> String {
        self.rng.gen_range(0..KEY_SPACE).to_string()
    }

    fn value(&mut self) -> String {
        (0..VALUE_LEN)
            .map(|_| VALUE_ALPHABET[self.rng.gen_range(0..VALUE_ALPHABET.len())] as char)
            .collect()
    }
}

impl<R: Rng> Iterator for Workload<R> {
    type Item = Operation;

    fn next(&mut self) -> Option<Operation> {
        Some(self.next_operation())
    }
}
