use mongodb::options::ConnectionString;

use super::Error;

/// Extracts the target database name from a connection string.
///
/// Parsing is delegated to the driver, so a name accepted here is one the
/// driver accepts too.
pub fn database_name(uri: &str) -> Result<String, Error> {
    let parsed = ConnectionString::parse(uri).map_err(|_| Error::InvalidUri(redact(uri)))?;

    parsed
        .default_database
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::MissingDatabase(redact(uri)))
}

/// Hides credentials from a connection string before it ends up in errors or logs.
pub fn redact(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_owned();
    };

    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => uri.to_owned(),
    }
}
