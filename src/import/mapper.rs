use super::ImportError;

/// Accepted header spellings for each canonical transaction field.
/// Matching is case-insensitive on trimmed header cells.
#[derive(Debug, Clone)]
pub(crate) struct MappingConfig {
    pub(crate) date: Vec<String>,
    pub(crate) amount: Vec<String>,
    pub(crate) currency: Vec<String>,
    pub(crate) category: Vec<String>,
    pub(crate) subcategory: Vec<String>,
    pub(crate) notes: Vec<String>,
    pub(crate) kind: Vec<String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        // English and German spellings cover the bank exports seen so far.
        Self {
            date: aliases(&["date", "datum", "txn_date", "transaction date", "buchungstag"]),
            amount: aliases(&["amount", "betrag", "value", "summe"]),
            currency: aliases(&["currency", "währung", "waehrung", "ccy"]),
            category: aliases(&["category", "kategorie"]),
            subcategory: aliases(&["subcategory", "unterkategorie", "sub category"]),
            notes: aliases(&["notes", "note", "notiz", "description", "verwendungszweck", "memo"]),
            kind: aliases(&["type", "typ", "art"]),
        }
    }
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Positional mapping from CSV columns to canonical fields, produced once
/// per file from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub(crate) date: usize,
    pub(crate) amount: usize,
    pub(crate) currency: usize,
    pub(crate) category: usize,
    pub(crate) subcategory: Option<usize>,
    pub(crate) notes: Option<usize>,
    pub(crate) kind: Option<usize>,
}

impl ColumnMap {
    /// True when the file has no type column, in which case each row's type
    /// is derived from the amount sign: positive is income, negative is
    /// expense.
    pub(crate) fn derives_type(&self) -> bool {
        self.kind.is_none()
    }

    /// Highest column index the validator reads, plus one. Shorter rows are
    /// padded to this width.
    pub(crate) fn width(&self) -> usize {
        let required = self
            .date
            .max(self.amount)
            .max(self.currency)
            .max(self.category);
        let optional = self
            .subcategory
            .into_iter()
            .chain(self.notes)
            .chain(self.kind)
            .max()
            .unwrap_or(0);
        required.max(optional) + 1
    }
}

/// Map the header row to column positions. Pure: the same header and config
/// always produce the same map. The first matching column wins per field and
/// a column claims at most one field.
pub(crate) fn map_header(header: &[String], cfg: &MappingConfig) -> Result<ColumnMap, ImportError> {
    let normalized: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut claimed = vec![false; normalized.len()];

    let date = find_column(&normalized, &mut claimed, &cfg.date);
    let amount = find_column(&normalized, &mut claimed, &cfg.amount);
    let currency = find_column(&normalized, &mut claimed, &cfg.currency);
    let category = find_column(&normalized, &mut claimed, &cfg.category);
    let subcategory = find_column(&normalized, &mut claimed, &cfg.subcategory);
    let notes = find_column(&normalized, &mut claimed, &cfg.notes);
    let kind = find_column(&normalized, &mut claimed, &cfg.kind);

    let mut missing = Vec::new();
    if date.is_none() {
        missing.push("date".to_string());
    }
    if amount.is_none() {
        missing.push("amount".to_string());
    }
    if currency.is_none() {
        missing.push("currency".to_string());
    }
    if category.is_none() {
        missing.push("category".to_string());
    }

    let (Some(date), Some(amount), Some(currency), Some(category)) =
        (date, amount, currency, category)
    else {
        return Err(ImportError::UnmappableHeader { missing });
    };

    Ok(ColumnMap {
        date,
        amount,
        currency,
        category,
        subcategory,
        notes,
        kind,
    })
}

fn find_column(normalized: &[String], claimed: &mut [bool], aliases: &[String]) -> Option<usize> {
    let pos = normalized.iter().enumerate().position(|(i, cell)| {
        !claimed[i] && aliases.iter().any(|a| a.trim().to_lowercase() == *cell)
    })?;
    claimed[pos] = true;
    Some(pos)
}

#[cfg(test)]
#[path = "mapper_tests.rs"]
mod tests;
