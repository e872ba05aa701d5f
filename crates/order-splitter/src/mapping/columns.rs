use crate::error::SchemaError;

pub const SKU_KEYWORD: &str = "sku";
pub const VENDOR_KEYWORD: &str = "vendor";
pub const EMAIL_KEYWORD: &str = "email";

const ROLE_KEYWORDS: [&str; 3] = [SKU_KEYWORD, VENDOR_KEYWORD, EMAIL_KEYWORD];

/// Column positions of the mapping roles within the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub sku: usize,
    pub vendor: usize,
    pub email: Option<usize>,
}

/// Resolves the role columns from the header row.
///
/// A header matches a role when its trimmed, lowercased name contains the
/// role keyword. A header equal to the keyword beats substring matches. Among
/// several substring matches, headers naming another role as well
/// (`Vendor Email` for vendor) drop out. A column taken by an earlier role
/// (sku, then vendor, then email) is not reused.
pub fn resolve_columns(headers: &[String]) -> Result<ColumnSchema, SchemaError> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let sku = resolve_role(headers, &normalized, SKU_KEYWORD, &[])?.ok_or_else(|| {
        SchemaError::MissingColumn {
            keyword: SKU_KEYWORD,
            headers: trimmed(headers),
        }
    })?;

    let vendor = resolve_role(headers, &normalized, VENDOR_KEYWORD, &[sku])?.ok_or_else(|| {
        SchemaError::MissingColumn {
            keyword: VENDOR_KEYWORD,
            headers: trimmed(headers),
        }
    })?;

    let email = resolve_role(headers, &normalized, EMAIL_KEYWORD, &[sku, vendor])?;

    Ok(ColumnSchema { sku, vendor, email })
}

fn resolve_role(
    headers: &[String],
    normalized: &[String],
    keyword: &'static str,
    taken: &[usize],
) -> Result<Option<usize>, SchemaError> {
    let candidates: Vec<usize> = normalized
        .iter()
        .enumerate()
        .filter(|(i, name)| !taken.contains(i) && name.contains(keyword))
        .map(|(i, _)| i)
        .collect();

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        many => {
            let exact: Vec<usize> = many
                .iter()
                .copied()
                .filter(|&i| normalized[i] == keyword)
                .collect();
            if let [only] = exact.as_slice() {
                return Ok(Some(*only));
            }

            let single_role: Vec<usize> = many
                .iter()
                .copied()
                .filter(|&i| {
                    ROLE_KEYWORDS
                        .iter()
                        .all(|&other| other == keyword || !normalized[i].contains(other))
                })
                .collect();
            match single_role.as_slice() {
                [only] if exact.is_empty() => Ok(Some(*only)),
                _ => Err(SchemaError::AmbiguousColumn {
                    keyword,
                    candidates: many.iter().map(|&i| headers[i].trim().to_string()).collect(),
                }),
            }
        }
    }
}

fn trimmed(headers: &[String]) -> Vec<String> {
    headers.iter().map(|h| h.trim().to_string()).collect()
}
