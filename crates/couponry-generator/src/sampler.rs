use couponry_core::Alphabet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Trait for sampling the random part of coupon codes.
///
/// Implementations are pure samplers that don't interact with storage;
/// uniqueness is checked by the caller.
pub trait CodeSampler: Send + Sync + 'static {
    /// The alphabet every sampled character is drawn from.
    fn alphabet(&self) -> Alphabet;

    /// Samples a code body of exactly `length` characters.
    fn sample(&self, length: usize) -> String;
}

enum Source {
    Thread,
    Seeded(Mutex<StdRng>),
}

/// Samples code bodies uniformly from an [`Alphabet`].
pub struct RandomCodeSampler {
    alphabet: Alphabet,
    source: Source,
}

impl RandomCodeSampler {
    /// Creates a sampler backed by the thread-local random generator.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            source: Source::Thread,
        }
    }

    /// Creates a reproducible sampler from a fixed seed.
    pub fn seeded(alphabet: Alphabet, seed: u64) -> Self {
        Self {
            alphabet,
            source: Source::Seeded(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for RandomCodeSampler {
    fn default() -> Self {
        Self::new(Alphabet::default())
    }
}

impl std::fmt::Debug for RandomCodeSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seeded = matches!(self.source, Source::Seeded(_));
        f.debug_struct("RandomCodeSampler")
            .field("alphabet", &self.alphabet)
            .field("seeded", &seeded)
            .finish()
    }
}

fn sample_with<R: Rng + ?Sized>(rng: &mut R, alphabet: &Alphabet, length: usize) -> String {
    let chars = alphabet.chars();
    (0..length)
        .map(|_| char::from(chars[rng.random_range(0..chars.len())]))
        .collect()
}

impl CodeSampler for RandomCodeSampler {
    fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    fn sample(&self, length: usize) -> String {
        match &self.source {
            Source::Thread => sample_with(&mut rand::rng(), &self.alphabet, length),
            Source::Seeded(rng) => {
                // a poisoned rng is still a valid rng
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                sample_with(&mut *rng, &self.alphabet, length)
            }
        }
    }
}
