/// Configuration options supplied to a [`super::BulkLoader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Page id given to the first page produced.
    pub first_page_id: u64,
    /// Whether a gap in vertex ids starts a new small page.
    ///
    /// When disabled, any gap between consecutive input ids is an error.
    pub split_on_gap: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            first_page_id: 0,
            split_on_gap: true,
        }
    }
}

impl LoaderOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id of the first produced page.
    pub fn first_page_id(mut self, page_id: u64) -> Self {
        self.first_page_id = page_id;
        self
    }

    /// Enables or disables page splits on vertex-id gaps.
    pub fn split_on_gap(mut self, enabled: bool) -> Self {
        self.split_on_gap = enabled;
        self
    }
}
