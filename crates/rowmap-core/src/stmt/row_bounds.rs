/// Paging window applied while reading a resultset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowBounds {
    /// Number of leading rows to skip
    pub offset: usize,

    /// Maximum number of rows to produce
    pub limit: usize,
}

impl RowBounds {
    pub const NO_ROW_OFFSET: usize = 0;
    pub const NO_ROW_LIMIT: usize = usize::MAX;

    /// No offset and no limit.
    pub const DEFAULT: RowBounds = RowBounds {
        offset: Self::NO_ROW_OFFSET,
        limit: Self::NO_ROW_LIMIT,
    };

    pub const fn new(offset: usize, limit: usize) -> RowBounds {
        RowBounds { offset, limit }
    }

    pub fn is_default(&self) -> bool {
        self.offset == Self::NO_ROW_OFFSET && self.limit == Self::NO_ROW_LIMIT
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        RowBounds::DEFAULT
    }
}
