use anyhow::{anyhow, Context};
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ProfileImage {
    /// No URL stored for this employee.
    None { message: String },
    Unavailable { warning: String },
    #[serde(rename_all = "camelCase")]
    Ok {
        mime: &'static str,
        byte_len: usize,
        data_base64: String,
    },
}

/// Identifies the image format from its leading bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some("image/svg+xml");
    }
    None
}

fn fetch_bytes(url: &str, timeout: Duration) -> anyhow::Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build http client")?;
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request to {} failed", url))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("image server answered {}", status));
    }
    let body = resp.bytes().context("failed to read image body")?;
    Ok(body.to_vec())
}

pub fn decode_image(bytes: Vec<u8>) -> anyhow::Result<ProfileImage> {
    let mime = sniff_image_mime(&bytes)
        .ok_or_else(|| anyhow!("response is not a known image format"))?;
    Ok(ProfileImage::Ok {
        mime,
        byte_len: bytes.len(),
        data_base64: general_purpose::STANDARD.encode(&bytes),
    })
}

/// Never fails: any fetch or decode problem degrades to `Unavailable`.
pub fn fetch_profile_image(url: &str, timeout: Duration) -> ProfileImage {
    let url = url.trim();
    if url.is_empty() {
        return ProfileImage::None {
            message: "No profile picture provided.".to_string(),
        };
    }
    match fetch_bytes(url, timeout).and_then(decode_image) {
        Ok(img) => img,
        Err(e) => {
            tracing::error!(url, error = %format!("{e:#}"), "failed to load profile picture");
            ProfileImage::Unavailable {
                warning: "Profile picture not available.".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_image_mime(b"\x89PNG\r\n\x1a\nrest"), Some("image/png"));
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(
            sniff_image_mime(b"  <?xml version=\"1.0\"?><svg xmlns=\"\"></svg>"),
            Some("image/svg+xml")
        );
        assert_eq!(sniff_image_mime(b"<html>not found</html>"), None);
        assert_eq!(sniff_image_mime(b""), None);
    }

    #[test]
    fn decode_encodes_payload() {
        let img = decode_image(b"GIF89a\x01\x00".to_vec()).expect("decode");
        match img {
            ProfileImage::Ok { mime, byte_len, data_base64 } => {
                assert_eq!(mime, "image/gif");
                assert_eq!(byte_len, 8);
                assert_eq!(
                    general_purpose::STANDARD.decode(data_base64).expect("b64"),
                    b"GIF89a\x01\x00".to_vec()
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(decode_image(b"plain text".to_vec()).is_err());
    }

    #[test]
    fn missing_or_unreachable_urls_degrade() {
        assert!(matches!(
            fetch_profile_image("  ", Duration::from_secs(1)),
            ProfileImage::None { .. }
        ));
        assert!(matches!(
            fetch_profile_image("not a url", Duration::from_secs(1)),
            ProfileImage::Unavailable { .. }
        ));
    }

    #[test]
    fn serializes_with_status_tag() {
        let v = serde_json::to_value(ProfileImage::Unavailable {
            warning: "w".to_string(),
        })
        .expect("json");
        assert_eq!(v["status"], "unavailable");
        assert_eq!(v["warning"], "w");
    }
}
