// Offset/limit pagination

/// Window over an ordered result set. `limit: None` means no upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u32,
    pub limit: Option<u32>,
}

impl Pagination {
    pub fn new(offset: u32, limit: Option<u32>) -> Self {
        Self { offset, limit }
    }

    /// Everything, from the start
    pub fn all() -> Self {
        Self::default()
    }

    /// Apply the window to an already ordered iterator
    pub fn apply<I: Iterator>(&self, iter: I) -> impl Iterator<Item = I::Item> {
        iter.skip(self.offset as usize)
            .take(self.limit.map_or(usize::MAX, |l| l as usize))
    }
}
