use std::fmt;

use crate::error::TenantError;

pub const DATABASE_PREFIX: &str = "company_";

/// PostgreSQL silently truncates identifiers longer than NAMEDATALEN - 1 bytes.
const MAX_IDENTIFIER_BYTES: usize = 63;

/// Canonical name of a tenant's physical database, e.g. `company_mbs_tech`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatabaseName(String);

impl DatabaseName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier quoted for interpolation into DDL (`CREATE DATABASE ...`).
    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatabaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps a company name to its database name: `company_` + lower-cased name with
/// every run of whitespace collapsed to a single `_`.
///
/// Names that differ only in case or in whitespace run length map to the same
/// database ("MBS Tech" and "mbs   tech" are one tenant). Leading and trailing
/// runs are replaced too, so " Acme" becomes `company__acme`.
///
/// Whitespace means the ECMAScript `\s` set, not `char::is_whitespace`.
pub fn normalize(identifier: &str) -> Result<DatabaseName, TenantError> {
    if identifier.chars().all(is_separator) || identifier.contains('\0') {
        return Err(TenantError::InvalidTenantIdentifier(identifier.to_string()));
    }

    let mut name = String::with_capacity(DATABASE_PREFIX.len() + identifier.len());
    name.push_str(DATABASE_PREFIX);
    let mut in_whitespace = false;
    for c in identifier.chars() {
        if is_separator(c) {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
        } else {
            name.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }

    if name.len() > MAX_IDENTIFIER_BYTES {
        return Err(TenantError::InvalidTenantIdentifier(identifier.to_string()));
    }
    Ok(DatabaseName(name))
}

/// ECMAScript `\s`: Unicode White_Space minus U+0085 (NEL), plus U+FEFF (BOM).
fn is_separator(c: char) -> bool {
    match c {
        '\u{0085}' => false,
        '\u{feff}' => true,
        c => c.is_whitespace(),
    }
}

/// Double-quotes an identifier, doubling any embedded quote.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
