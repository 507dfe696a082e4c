//! Safe filename generation utilities

use regex::Regex;

/// Remove characters that are not allowed in file names on common platforms
/// and collapse whitespace runs into a single space
pub fn sanitize_filename(file_name: &str) -> Result<String, regex::Error> {
    // mac rejects `:` and `/`, linux `/`, windows `<>:"/\|?*`
    let invalid_chars = Regex::new(r#"[:/<>"\\|?*]"#)?;
    let whitespace = Regex::new(r"\s+")?;

    let stripped = invalid_chars.replace_all(file_name, "");
    Ok(whitespace.replace_all(&stripped, " ").into_owned())
}

/// Build the output file name for a stream.
///
/// A non-empty requested name is sanitized and used as-is, otherwise the
/// sanitized title plus `extension` is used.
pub fn output_file_name(
    requested: Option<&str>,
    title: &str,
    extension: &str,
) -> Result<String, regex::Error> {
    if let Some(requested) = requested {
        let sanitized = sanitize_filename(requested)?;
        if !sanitized.is_empty() {
            return Ok(sanitized);
        }
    }

    let mut name = sanitize_filename(title)?;
    name.push_str(extension);
    Ok(name)
}
