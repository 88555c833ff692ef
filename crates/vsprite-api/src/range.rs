//! HTTP `Range` header parsing for stream delivery.

/// An inclusive byte range resolved against an object of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a 206 response.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Parse a `Range` header value against an object of `size` bytes.
///
/// Supports the single-range forms `bytes=start-end`, `bytes=start-` and
/// the suffix form `bytes=-n`. Returns `Ok(None)` for values that are not
/// byte ranges at all (serve the full object) and `Err(())` for ranges
/// that cannot be satisfied.
pub fn parse_range(header: &str, size: u64) -> Result<Option<ByteRange>, ()> {
    let Some(spec) = header.strip_prefix("bytes=") else {
        return Ok(None);
    };

    // Multi-range requests are not supported; serve the first range only
    let spec = spec.split(',').next().unwrap_or("").trim();
    let Some((start_str, end_str)) = spec.split_once('-') else {
        return Err(());
    };

    if size == 0 {
        return Err(());
    }

    let (start, end) = if start_str.is_empty() {
        // Suffix form: last n bytes
        let n: u64 = end_str.parse().map_err(|_| ())?;
        if n == 0 {
            return Err(());
        }
        (size.saturating_sub(n), size - 1)
    } else {
        let start: u64 = start_str.parse().map_err(|_| ())?;
        let end: u64 = if end_str.is_empty() {
            size - 1
        } else {
            end_str.parse().map_err(|_| ())?
        };
        (start, end.min(size - 1))
    };

    if start >= size || start > end {
        return Err(());
    }

    Ok(Some(ByteRange { start, end }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range_on_5000_bytes() {
        let range = parse_range("bytes=0-999", 5000).unwrap().unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 999 });
        assert_eq!(range.len(), 1000);
        assert_eq!(range.content_range(5000), "bytes 0-999/5000");
    }

    #[test]
    fn test_open_ended_range() {
        let range = parse_range("bytes=4500-", 5000).unwrap().unwrap();
        assert_eq!(range, ByteRange { start: 4500, end: 4999 });
        assert_eq!(range.len(), 500);
    }

    #[test]
    fn test_suffix_range() {
        let range = parse_range("bytes=-100", 5000).unwrap().unwrap();
        assert_eq!(range, ByteRange { start: 4900, end: 4999 });

        // Suffix longer than the object clamps to the whole object
        let range = parse_range("bytes=-9999", 5000).unwrap().unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 4999 });
    }

    #[test]
    fn test_end_clamped_to_object() {
        let range = parse_range("bytes=0-99999", 5000).unwrap().unwrap();
        assert_eq!(range.end, 4999);
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        assert!(parse_range("bytes=5000-", 5000).is_err());
        assert!(parse_range("bytes=6000-7000", 5000).is_err());
        assert!(parse_range("bytes=100-50", 5000).is_err());
        assert!(parse_range("bytes=-0", 5000).is_err());
        assert!(parse_range("bytes=abc-def", 5000).is_err());
        assert!(parse_range("bytes=0-0", 0).is_err());
    }

    #[test]
    fn test_non_byte_units_ignored() {
        assert_eq!(parse_range("items=0-10", 5000).unwrap(), None);
    }

    #[test]
    fn test_first_of_multiple_ranges() {
        let range = parse_range("bytes=0-49,100-149", 5000).unwrap().unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 49 });
    }
}
