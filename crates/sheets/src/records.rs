//! Header-keyed records, the shape every backend reads worksheets into.

use std::collections::HashMap;

pub(crate) type Record = HashMap<String, String>;

/// Zips every data row with the header row.
///
/// Short rows are padded with empty strings (the Sheets API omits trailing
/// empty cells); cells past the last header are dropped. Fully empty rows are
/// skipped.
pub(crate) fn records(headers: &[String], rows: impl IntoIterator<Item = Vec<String>>) -> Vec<Record> {
    rows.into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), row.get(idx).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}
