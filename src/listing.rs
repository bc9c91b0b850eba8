// listing.rs - Bucket listing decoder
// Purpose: Turn S3-style (ListBucketResult) and Azure-style (EnumerationResults)
//          listing documents into a capped list of object names
//
// Decoding never fails: anything that is not a complete document of the
// expected shape decodes to an empty list.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Prolog: optional byte order mark, XML declaration, then any mix of
    // comments and a DOCTYPE (internal subset included)
    static ref ROOT_ELEMENT: Regex = Regex::new(
        r"^\x{FEFF}?\s*(?:<\?[^>]*\?>\s*)?(?:(?:<!--(?s:.*?)-->|<!DOCTYPE(?:[^>\[]|\[(?s:.*?)\])*>)\s*)*<([A-Za-z_][\w.:-]*)[\s/>]"
    )
    .expect("valid root element regex");
    static ref S3_CONTENTS: Regex =
        Regex::new(r"(?s)<Contents(?:\s[^>]*)?>(.*?)</Contents>").expect("valid contents regex");
    static ref S3_KEY: Regex = Regex::new(r"(?s)<Key>(.*?)</Key>").expect("valid key regex");
    static ref AZURE_BLOBS: Regex =
        Regex::new(r"(?s)<Blobs(?:\s[^>]*)?>(.*?)</Blobs>").expect("valid blobs regex");
    static ref AZURE_BLOB: Regex =
        Regex::new(r"(?s)<Blob(?:\s[^>]*)?>(.*?)</Blob>").expect("valid blob regex");
    static ref AZURE_NAME: Regex = Regex::new(r"(?s)<Name>(.*?)</Name>").expect("valid name regex");
    static ref ENTITY: Regex =
        Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("valid entity regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    /// `ListBucketResult` documents (AWS, GCS XML API, Alibaba OSS, DO Spaces)
    S3,
    /// `EnumerationResults` documents (Azure Blob)
    Azure,
}

impl ListingFormat {
    fn root_element(self) -> &'static str {
        match self {
            ListingFormat::S3 => "ListBucketResult",
            ListingFormat::Azure => "EnumerationResults",
        }
    }

    /// Entry names in document order, at most `max_entries` of them
    pub fn decode(self, body: &str, max_entries: usize) -> Vec<String> {
        if max_entries == 0 || !self.is_complete_document(body) {
            return Vec::new();
        }

        match self {
            ListingFormat::S3 => S3_CONTENTS
                .captures_iter(body)
                .filter_map(|c| first_capture(&S3_KEY, c.get(1)?.as_str()))
                .take(max_entries)
                .collect(),
            ListingFormat::Azure => {
                let Some(blobs) = AZURE_BLOBS.captures(body).and_then(|c| c.get(1)) else {
                    return Vec::new();
                };
                AZURE_BLOB
                    .captures_iter(blobs.as_str())
                    .filter_map(|c| first_capture(&AZURE_NAME, c.get(1)?.as_str()))
                    .take(max_entries)
                    .collect()
            }
        }
    }

    fn is_complete_document(self, body: &str) -> bool {
        let root = self.root_element();
        let opened = ROOT_ELEMENT
            .captures(body)
            .and_then(|c| c.get(1))
            .is_some_and(|m| m.as_str() == root);

        opened && body.trim_end().ends_with(&format!("</{}>", root))
    }
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| unescape_xml(m.as_str().trim()))
}

/// Resolve the predefined XML entities and numeric character references
pub fn unescape_xml(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            match decoded {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const S3_LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>open-bucket</Name>
  <Prefix></Prefix>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>backup.sql</Key><Size>1024</Size></Contents>
  <Contents><Key>reports/q1 &amp; q2.pdf</Key><Size>2048</Size></Contents>
  <Contents>
    <Key>index.html</Key>
    <Size>12</Size>
  </Contents>
</ListBucketResult>"#;

    const AZURE_LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.blob.core.windows.net/" ContainerName="public">
  <Blobs>
    <Blob><Name>logo.png</Name><Properties><Content-Length>10</Content-Length></Properties></Blob>
    <Blob><Name>db/dump.bak</Name></Blob>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#;

    #[test]
    fn test_decode_s3_in_document_order() {
        let files = ListingFormat::S3.decode(S3_LISTING, 10);
        assert_eq!(files, vec!["backup.sql", "reports/q1 & q2.pdf", "index.html"]);
    }

    #[test]
    fn test_decode_respects_cap() {
        assert_eq!(ListingFormat::S3.decode(S3_LISTING, 2).len(), 2);
        assert!(ListingFormat::S3.decode(S3_LISTING, 0).is_empty());
        assert_eq!(ListingFormat::Azure.decode(AZURE_LISTING, 1), vec!["logo.png"]);
    }

    #[test]
    fn test_decode_azure() {
        let files = ListingFormat::Azure.decode(AZURE_LISTING, 10);
        assert_eq!(files, vec!["logo.png", "db/dump.bak"]);
    }

    #[test]
    fn test_malformed_input_is_empty() {
        let truncated = &S3_LISTING[..S3_LISTING.len() / 2];
        for body in [
            "",
            "not xml at all",
            "<html><body>Access Denied</body></html>",
            truncated,
            "<Error><Code>NoSuchBucket</Code></Error>",
            "\u{0}\u{1}<<<>>>",
        ] {
            assert!(ListingFormat::S3.decode(body, 10).is_empty(), "body: {body:?}");
            assert!(ListingFormat::Azure.decode(body, 10).is_empty(), "body: {body:?}");
        }
    }

    #[test]
    fn test_byte_order_mark_is_accepted() {
        let body = format!("\u{FEFF}{}", S3_LISTING);
        assert_eq!(ListingFormat::S3.decode(&body, 10).len(), 3);

        let body = format!("\u{FEFF}{}", AZURE_LISTING);
        assert_eq!(ListingFormat::Azure.decode(&body, 10), vec!["logo.png", "db/dump.bak"]);
    }

    #[test]
    fn test_doctype_prolog_is_accepted() {
        let body = r#"<?xml version="1.0"?>
<!DOCTYPE ListBucketResult>
<!-- generated -->
<ListBucketResult><Contents><Key>a.txt</Key></Contents></ListBucketResult>"#;
        assert_eq!(ListingFormat::S3.decode(body, 10), vec!["a.txt"]);

        let body = r#"<!DOCTYPE EnumerationResults [ <!ENTITY x "y"> ]><EnumerationResults><Blobs><Blob><Name>b.bin</Name></Blob></Blobs></EnumerationResults>"#;
        assert_eq!(ListingFormat::Azure.decode(body, 10), vec!["b.bin"]);

        // A DOCTYPE does not make a foreign root acceptable
        let body = "<!DOCTYPE html><html><body>ListBucketResult</body></html>";
        assert!(ListingFormat::S3.decode(body, 10).is_empty());
    }

    #[test]
    fn test_wrong_shape_is_empty() {
        assert!(ListingFormat::Azure.decode(S3_LISTING, 10).is_empty());
        assert!(ListingFormat::S3.decode(AZURE_LISTING, 10).is_empty());
    }

    #[test]
    fn test_empty_bucket() {
        let body = "<ListBucketResult><Name>empty</Name></ListBucketResult>";
        assert!(ListingFormat::S3.decode(body, 10).is_empty());
    }

    #[test]
    fn test_unescape_xml() {
        assert_eq!(unescape_xml("a&lt;b&gt;&quot;c&apos;&amp;"), "a<b>\"c'&");
        assert_eq!(unescape_xml("caf&#233; &#x41;"), "café A");
        assert_eq!(unescape_xml("&#xD800;"), "&#xD800;");
        assert_eq!(unescape_xml("&unknown;"), "&unknown;");
    }
}
