/// Per-call retrieval switches
///
/// Both flags only add `tracing` output; they never change the result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetrieveOptions {
    /// Log the posting lists each query field matched
    pub dump_entries: bool,
    /// Log every merge step
    pub dump_steps: bool,
}

impl RetrieveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dump_entries(mut self) -> Self {
        self.dump_entries = true;
        self
    }

    pub fn with_dump_steps(mut self) -> Self {
        self.dump_steps = true;
        self
    }
}
