//! Manifest parsing.
//!
//! A manifest is a newline-delimited list of `bucket,key` pairs, one object
//! per line.

use std::collections::BTreeSet;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Manifest is not valid UTF-8: {0}")]
    NotUtf8(String),

    #[error("Manifest line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
}

/// One object named by a manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub bucket: String,
    pub key: String,
}

/// Parse a manifest body.
///
/// A trailing newline does not produce an entry and `\r\n` endings are
/// accepted. Every other line must hold exactly one comma with a non-empty
/// bucket and key on either side.
pub fn parse_manifest(body: &[u8]) -> Result<Vec<ManifestEntry>, ManifestError> {
    let text = std::str::from_utf8(body).map_err(|e| ManifestError::NotUtf8(e.to_string()))?;

    text.lines()
        .enumerate()
        .map(|(idx, line)| parse_line(idx + 1, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Result<ManifestEntry, ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidLine {
        line: line_no,
        reason: reason.to_string(),
    };

    let mut parts = line.split(',');
    let (bucket, key) = match (parts.next(), parts.next(), parts.next()) {
        (Some(bucket), Some(key), None) => (bucket, key),
        _ => return Err(invalid("expected exactly one comma")),
    };

    if bucket.is_empty() {
        return Err(invalid("empty bucket"));
    }
    if key.is_empty() {
        return Err(invalid("empty key"));
    }

    Ok(ManifestEntry {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

/// Distinct buckets named by the entries, in sorted order.
pub fn distinct_buckets(entries: &[ManifestEntry]) -> BTreeSet<&str> {
    entries.iter().map(|e| e.bucket.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_lines() {
        let entries = parse_manifest(b"bucketA,obj1\nbucketA,obj2").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].bucket, "bucketA");
        assert_eq!(entries[1].key, "obj2");
    }

    #[test]
    fn test_trailing_newline_and_crlf() {
        let entries = parse_manifest(b"b1,k1\r\nb2,k2\r\n").unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    bucket: "b1".to_string(),
                    key: "k1".to_string()
                },
                ManifestEntry {
                    bucket: "b2".to_string(),
                    key: "k2".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_empty_manifest_has_no_entries() {
        assert!(parse_manifest(b"").unwrap().is_empty());
    }

    #[test]
    fn test_keys_are_not_decoded() {
        let entries = parse_manifest(b"b1,photos/2020/img%201.raw").unwrap();
        assert_eq!(entries[0].key, "photos/2020/img%201.raw");
    }

    #[test]
    fn test_line_without_comma_reports_line_number() {
        let err = parse_manifest(b"b1,k1\nb2k2\nb3,k3").unwrap_err();
        assert_eq!(
            err,
            ManifestError::InvalidLine {
                line: 2,
                reason: "expected exactly one comma".to_string()
            }
        );
    }

    #[test]
    fn test_line_with_two_commas_is_rejected() {
        let err = parse_manifest(b"b1,k1,extra").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidLine { line: 1, .. }));
    }

    #[test]
    fn test_blank_line_is_rejected() {
        let err = parse_manifest(b"b1,k1\n\nb2,k2").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidLine { line: 2, .. }));
    }

    #[test]
    fn test_empty_bucket_or_key_is_rejected() {
        assert!(matches!(
            parse_manifest(b",k1").unwrap_err(),
            ManifestError::InvalidLine { line: 1, ref reason } if reason == "empty bucket"
        ));
        assert!(matches!(
            parse_manifest(b"b1,").unwrap_err(),
            ManifestError::InvalidLine { line: 1, ref reason } if reason == "empty key"
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            parse_manifest(&[0xff, 0xfe, b',', b'k']),
            Err(ManifestError::NotUtf8(_))
        ));
    }

    #[test]
    fn test_distinct_buckets() {
        let entries = parse_manifest(b"b2,k1\nb1,k2\nb2,k3").unwrap();
        let buckets: Vec<&str> = distinct_buckets(&entries).into_iter().collect();
        assert_eq!(buckets, vec!["b1", "b2"]);
    }
}
