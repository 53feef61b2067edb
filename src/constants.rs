// --- Constants for column storage ---

/// Dictionary code reserved for null (or not yet written) slots.
/// Pool entries are addressed by `code - 1`.
pub const NULL_CODE: u32 = 0;

/// Initial byte capacity reserved per string when pre-sizing a string arena.
pub const STRING_BYTES_HINT: usize = 8;

// --- Constants for the CSV source ---

/// Tokens read as null in nullable CSV columns unless overridden.
pub const DEFAULT_CSV_NULLS: &[&str] = &["", "NA", "null", "NULL"];
