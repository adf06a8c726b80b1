//! CLI Exit Code Registry
//!
//! Single source of truth for `rdesk` exit codes. Scripts rely on these.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (writing output failed)                     |
//! | 2    | Usage error (bad arguments, unreadable decisions file)    |
//! | 3    | Spreadsheet could not be read                             |
//! | 4    | Column mapping incomplete or names a missing header       |
//! | 5    | Catalog database unavailable                              |
//! | 6    | Settings file missing, malformed or invalid               |
//! | 7    | Apply finished with row errors and `--strict` was set     |
//!
//! Row-level failures never change the exit code on their own: they are part
//! of the apply result. Only `--strict` turns them into exit 7.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable `--decisions` file.
pub const EXIT_USAGE: u8 = 2;

/// The input spreadsheet is unreadable, empty or of an unknown format.
pub const EXIT_FILE_PARSE: u8 = 3;

/// No name column, no price column, or an override names a header that is
/// not in the file.
pub const EXIT_MAPPING: u8 = 4;

/// Catalog database could not be opened or read.
pub const EXIT_CATALOG: u8 = 5;

/// Settings file problem.
pub const EXIT_CONFIG: u8 = 6;

/// `import apply --strict` and at least one row ended in `error`.
pub const EXIT_ROW_ERRORS: u8 = 7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_FILE_PARSE,
            EXIT_MAPPING,
            EXIT_CATALOG,
            EXIT_CONFIG,
            EXIT_ROW_ERRORS,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
