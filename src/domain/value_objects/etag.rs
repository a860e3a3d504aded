/// Extended attribute that holds an object's entity tag.
pub const ETAG_ATTR: &str = "user.rgw.etag";

/// Maximum etag length returned in listings: the width of a hex MD5 digest.
pub const MAX_ETAG_LEN: usize = 32;

/// Decode a stored etag attribute, stopping at the first NUL and keeping at
/// most `max_len` bytes.
pub fn etag_from_attr(raw: &[u8], max_len: usize) -> String {
    let end = raw
        .iter()
        .position(|b| *b == 0)
        .unwrap_or(raw.len())
        .min(max_len);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
