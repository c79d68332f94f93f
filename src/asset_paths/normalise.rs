/// Convert a DOS style path into a Unix style one by replacing every backslash.
///
/// Idempotent: the output never contains a backslash, so a second pass is a no-op.
pub fn unixify(path: &str) -> String {
    path.replace('\\', "/")
}

/// Characters a static URL may contain without quoting, besides ASCII alphanumerics.
const URL_SAFE: &[u8] = b"/~!*()'_.-";

/// Percent-encode a file path for use in a URL.
///
/// Backslashes are normalised first, then every byte outside the safe set is encoded.
pub fn filepath_to_uri(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in unixify(path).bytes() {
        if byte.is_ascii_alphanumeric() || URL_SAFE.contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
