/// Energy values of one peer group, summarized for z-scoring.
pub struct Cohort {
    values: Vec<f64>,
}

impl Cohort {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Population variance (divides by N).
    pub fn variance(&self) -> f64 {
        if self.values.len() < 2 || self.is_uniform() {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq_diff: f64 = self.values.iter().map(|&x| (x - mean).powi(2)).sum();
        sum_sq_diff / self.values.len() as f64
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    // Rounding in the mean would otherwise leave identical members with a tiny non-zero deviation.
    fn is_uniform(&self) -> bool {
        match self.values.first() {
            Some(first) => self.values.iter().all(|v| v == first),
            None => true,
        }
    }
}

impl Default for Cohort {
    fn default() -> Self {
        Self::new()
    }
}
