/// Aggregation options.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Nudge displayed retained earnings by the equation difference when the
    /// sheet does not balance. Cosmetic only: the unbalanced flag and the
    /// raw difference are reported either way.
    pub equation_correction: bool,
}

impl ReportOptions {
    pub fn with_equation_correction(mut self) -> Self {
        self.equation_correction = true;
        self
    }
}
