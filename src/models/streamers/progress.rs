/// Outcome of one streamer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Rows pulled from the source.
    pub rows: usize,

    /// Row count reported back to the source through `set_row_count`, when
    /// the streamer had to discover it.
    pub source_rows: Option<usize>,
}
