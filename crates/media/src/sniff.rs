//! Magic-byte MIME detection.
//!
//! Filenames are sender-controlled, so content decisions come from the byte
//! signature alone.

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::Result;

/// How much of the file head the sniffer reads. Every signature we care
/// about resolves well within this window.
pub const SNIFF_LEN: usize = 8192;

/// Reported when the signature matches nothing known.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Detect a MIME type from a payload's leading bytes.
pub fn sniff_bytes(head: &[u8]) -> Option<&'static str> {
    infer::get(head).map(|kind| kind.mime_type())
}

/// Detect the MIME type of a file on disk by reading its head.
pub async fn sniff_path(path: &Path) -> Result<Option<&'static str>> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut head = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < head.len() {
        let read = file.read(&mut head[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    head.truncate(filled);
    Ok(sniff_bytes(&head))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::jpeg(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46], Some("image/jpeg"))]
    #[case::png(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR", Some("image/png"))]
    #[case::gif(b"GIF89a\x01\x00\x01\x00", Some("image/gif"))]
    #[case::mp4(b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42mp41", Some("video/mp4"))]
    #[case::plain_text(b"just some text pretending to be a jpeg", None)]
    #[case::empty(b"", None)]
    fn sniffs_known_signatures(#[case] head: &[u8], #[case] expected: Option<&'static str>) {
        assert_eq!(sniff_bytes(head), expected);
    }

    #[tokio::test]
    async fn sniffs_from_disk() {
        let staged = crate::StagedFile::from_bytes(".gif", b"GIF87a\x01\x00\x01\x00")
            .await
            .unwrap();
        assert_eq!(sniff_path(staged.path()).await.unwrap(), Some("image/gif"));
    }
}
