/// Reports processing progress once per decile (0%, 10%, ..., 100%).
pub struct ProgressLog {
    label: String,
    total: usize,
    processed: usize,
    reported: [bool; 11],
}

impl ProgressLog {
    pub fn new(label: impl Into<String>) -> Self {
        ProgressLog {
            label: label.into(),
            total: 0,
            processed: 0,
            reported: [false; 11],
        }
    }

    /// Resets the log for a stream of roughly `total` records.
    pub fn init(&mut self, total: usize) {
        self.total = total;
        self.processed = 0;
        self.reported = [false; 11];
    }

    /// Records `n` more processed records and returns the deciles crossed
    /// for the first time, logging each of them.
    pub fn increment(&mut self, n: usize) -> Vec<usize> {
        self.processed += n;
        if self.total == 0 {
            return Vec::new();
        }

        // truncated like an integer percentage, capped since the total is an estimate
        let percent = (self.processed * 100 / self.total).min(100);

        let mut crossed = Vec::new();
        for (i, done) in self.reported.iter_mut().enumerate() {
            let decile = i * 10;
            if !*done && percent >= decile {
                *done = true;
                crossed.push(decile);
                info!("{}: [{}% Completed]", self.label, decile);
            }
        }
        crossed
    }

    #[cfg(test)]
    pub fn processed(&self) -> usize {
        self.processed
    }
}
