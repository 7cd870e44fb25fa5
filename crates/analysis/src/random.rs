use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)` used to vary pacenote phrasing.
pub trait RandomSource: Send {
    fn next(&mut self) -> f64;
}

/// Entropy-backed source for production wiring.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn next(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of samples, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(values: &[f64]) -> Self {
        Self { values: values.to_vec(), pos: 0 }
    }

    /// Every draw returns `v`.
    pub fn constant(v: f64) -> Self {
        Self::new(&[v])
    }
}

impl RandomSource for ScriptedRandom {
    fn next(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_random_in_unit_interval() {
        let mut r = StdRandom::seeded(7);
        for _ in 0..1000 {
            let v = r.next();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_scripted_cycles() {
        let mut r = ScriptedRandom::new(&[0.1, 0.9]);
        assert_eq!(r.next(), 0.1);
        assert_eq!(r.next(), 0.9);
        assert_eq!(r.next(), 0.1);
    }
}
