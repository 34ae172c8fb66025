use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Per-call options.
pub struct Options {
    /// Passed through to the collaborator as is.
    ///
    /// Defaults to None, where the collaborator applies its own default.
    pub timeout: Option<Duration>,
    /// Provide every locally stored block linked from the requested ones as well.
    ///
    /// Only used by `provide`. Defaults to false.
    pub recursive: bool,
}

impl Options {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}
