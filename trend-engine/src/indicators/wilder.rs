/// Wilder smoothing (alpha = 1/period), seeded with the simple mean of the
/// first `period` inputs.
#[derive(Debug, Clone)]
pub(crate) struct Wilder {
    period: usize,
    seen: usize,
    seed_sum: f64,
    value: Option<f64>,
}

impl Wilder {
    pub(crate) fn new(period: usize) -> Self {
        Self {
            period,
            seen: 0,
            seed_sum: 0.0,
            value: None,
        }
    }

    pub(crate) fn next(&mut self, input: f64) -> Option<f64> {
        self.seen += 1;
        let period = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (period - 1.0) + input) / period),
            None => {
                self.seed_sum += input;
                if self.seen >= self.period {
                    Some(self.seed_sum / period)
                } else {
                    None
                }
            }
        };
        self.value
    }
}
