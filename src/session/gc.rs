use rand::Rng;

/// Probabilistic trigger for the expiry sweep.
///
/// Scanning the whole collection on every request is wasteful, so the host
/// rolls this die once per activation: a uniform draw in
/// `[0, denominator]` fires the sweep only on hitting the denominator,
/// an expected once every `denominator + 1` activations.
#[derive(Debug, Clone, Copy)]
pub struct GcPolicy {
    denominator: u32,
}

impl GcPolicy {
    pub fn new(denominator: u32) -> Self {
        Self { denominator }
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Draw once; true means the sweep should run now.
    pub fn should_run<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_range(0..=self.denominator) == self.denominator
    }
}

impl Default for GcPolicy {
    fn default() -> Self {
        Self::new(500)
    }
}
