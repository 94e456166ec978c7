use rand::Rng;

/// Picks the spotlight project, never the same index twice in a row unless
/// there is only one project.
#[derive(Clone, Debug, Default)]
pub struct FeaturedPicker {
    previous: Option<usize>,
}

impl FeaturedPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    pub fn pick<R: Rng + ?Sized>(&mut self, len: usize, rng: &mut R) -> Option<usize> {
        let idx = match (len, self.previous) {
            (0, _) => return None,
            (1, _) => 0,
            (n, Some(prev)) if prev < n => {
                // draw from the n - 1 other slots, then step over `prev`
                let draw = rng.gen_range(0..n - 1);
                if draw >= prev {
                    draw + 1
                } else {
                    draw
                }
            }
            (n, _) => rng.gen_range(0..n),
        };
        self.previous = Some(idx);
        Some(idx)
    }
}
