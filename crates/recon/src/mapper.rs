use serde::Serialize;

use crate::config::KeywordConfig;
use crate::error::MappingError;
use crate::model::{ColumnMapping, Field, ResolvedColumns};
use crate::similarity::{case_key, fold_key};

/// Best-effort mapping plus the fields it could not fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingGuess {
    pub mapping: ColumnMapping,
    /// Fields left unset. Advisory only: the operator fixes these in the
    /// mapping step.
    pub unmapped: Vec<Field>,
}

impl MappingGuess {
    pub fn is_complete(&self) -> bool {
        self.mapping.is_complete()
    }
}

/// Guess a header for each canonical field.
///
/// Fields set in `prior` are kept when their header still exists. For every
/// other field the ranked keywords are tried in order; the first header (in
/// header order) containing the first keyword that matches anything wins.
/// A header claimed by an earlier field is not reused.
pub fn guess_mapping(
    headers: &[String],
    prior: Option<&ColumnMapping>,
    keywords: &KeywordConfig,
) -> MappingGuess {
    let folded: Vec<String> = headers.iter().map(|h| fold_key(h)).collect();
    let mut claimed = vec![false; headers.len()];
    let mut mapping = ColumnMapping::default();

    if let Some(prior) = prior {
        for field in Field::ALL {
            if let Some(idx) = prior.get(field).and_then(|h| header_index(headers, h)) {
                if !claimed[idx] {
                    claimed[idx] = true;
                    mapping.set(field, Some(headers[idx].clone()));
                }
            }
        }
    }

    for field in Field::ALL {
        if mapping.get(field).is_some() {
            continue;
        }
        let hit = keywords.for_field(field).iter().find_map(|keyword| {
            let keyword = fold_key(keyword);
            if keyword.is_empty() {
                return None;
            }
            folded
                .iter()
                .enumerate()
                .find(|(idx, header)| !claimed[*idx] && header.contains(&keyword))
                .map(|(idx, _)| idx)
        });
        if let Some(idx) = hit {
            claimed[idx] = true;
            mapping.set(field, Some(headers[idx].clone()));
        }
    }

    let unmapped = Field::ALL
        .into_iter()
        .filter(|f| mapping.get(*f).is_none())
        .collect();

    MappingGuess { mapping, unmapped }
}

/// Resolve a mapping against the header row.
///
/// Fails when the name column or both price columns are unset, or when a set
/// field names a header the file does not have.
pub fn resolve(mapping: &ColumnMapping, headers: &[String]) -> Result<ResolvedColumns, MappingError> {
    let lookup = |field: Field| -> Result<Option<usize>, MappingError> {
        match mapping.get(field) {
            None => Ok(None),
            Some(header) => header_index(headers, header)
                .map(Some)
                .ok_or_else(|| MappingError::UnknownHeader {
                    field,
                    header: header.to_string(),
                }),
        }
    };

    let name = lookup(Field::Name)?.ok_or(MappingError::MissingNameColumn)?;
    let purchase = lookup(Field::Purchase)?;
    let sale = lookup(Field::Sale)?;
    if purchase.is_none() && sale.is_none() {
        return Err(MappingError::MissingPriceColumn);
    }
    let group = lookup(Field::Group)?;

    Ok(ResolvedColumns { name, purchase, sale, group })
}

/// Position of `header`: exact (trimmed) match first, then case-insensitive.
fn header_index(headers: &[String], header: &str) -> Option<usize> {
    let wanted = header.trim();
    headers
        .iter()
        .position(|h| h.trim() == wanted)
        .or_else(|| {
            let key = case_key(wanted);
            headers.iter().position(|h| case_key(h) == key)
        })
}
