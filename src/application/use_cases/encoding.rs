// ============================================================
// ENCODING DETECTOR
// ============================================================
// Statistical byte-distribution guess normalized against a fixed
// whitelist of supported encodings; anything else escalates to the user

use crate::domain::error::{AppError, Result};
use crate::interfaces::interaction::{require_answer, InputRequest, Interaction};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use tracing::{info, warn};

/// Canonical names the importer supports, in dropdown order.
pub const SUPPORTED_ENCODINGS: [&str; 12] = [
    "utf8", "ibm866", "latin2", "latin3", "latin4", "cyrillic", "arabic", "greek", "hebrew",
    "logical", "latin6", "utf16",
];

/// Map a raw detector or user label to a canonical name. Hyphens and case
/// are stripped before lookup; unknown labels yield `None`.
pub fn canonical_encoding(label: &str) -> Option<&'static str> {
    let normalized: String = label
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_lowercase();
    match normalized.as_str() {
        "utf8" => Some("utf8"),
        "ibm866" | "866" => Some("ibm866"),
        "latin2" | "iso88592" => Some("latin2"),
        "latin3" | "iso88593" => Some("latin3"),
        "latin4" | "iso88594" => Some("latin4"),
        "cyrillic" | "iso88595" => Some("cyrillic"),
        "arabic" | "iso88596" => Some("arabic"),
        "greek" | "iso88597" => Some("greek"),
        "hebrew" | "iso88598" => Some("hebrew"),
        "logical" | "iso88598i" => Some("logical"),
        "latin6" | "iso885910" => Some("latin6"),
        "utf16" | "utf16le" | "utf16be" => Some("utf16"),
        _ => None,
    }
}

/// The decoder behind a canonical name.
pub fn encoding_for(canonical: &str) -> Option<&'static Encoding> {
    match canonical {
        "utf8" => Some(encoding_rs::UTF_8),
        "ibm866" => Some(encoding_rs::IBM866),
        "latin2" => Some(encoding_rs::ISO_8859_2),
        "latin3" => Some(encoding_rs::ISO_8859_3),
        "latin4" => Some(encoding_rs::ISO_8859_4),
        "cyrillic" => Some(encoding_rs::ISO_8859_5),
        "arabic" => Some(encoding_rs::ISO_8859_6),
        "greek" => Some(encoding_rs::ISO_8859_7),
        "hebrew" => Some(encoding_rs::ISO_8859_8),
        "logical" => Some(encoding_rs::ISO_8859_8_I),
        "latin6" => Some(encoding_rs::ISO_8859_10),
        "utf16" => Some(encoding_rs::UTF_16LE),
        _ => None,
    }
}

/// Best-guess canonical encoding of raw file bytes, or `None` if the
/// statistical guess falls outside the whitelist.
pub fn detect_encoding(bytes: &[u8]) -> Option<&'static str> {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);
    let canonical = canonical_encoding(guessed.name());
    match canonical {
        Some(name) => info!(encoding = name, raw = guessed.name(), "encoding detected"),
        None => warn!(raw = guessed.name(), "detected encoding is unsupported"),
    }
    canonical
}

/// Detect the encoding, escalating to a dropdown of supported names when the
/// guess is unsupported. Loops until the user's choice itself maps to a
/// canonical name; only a recognized canonical name is ever returned.
pub async fn resolve_encoding(bytes: &[u8], interaction: &dyn Interaction) -> Result<String> {
    if let Some(canonical) = detect_encoding(bytes) {
        return Ok(canonical.to_string());
    }
    interaction
        .show(
            "The file encoding could not be recognized. Please choose one.",
            true,
        )
        .await;
    loop {
        let options = SUPPORTED_ENCODINGS.iter().map(|e| e.to_string()).collect();
        let answer =
            require_answer(interaction, InputRequest::choice("encoding", options)).await?;
        if let Some(canonical) = canonical_encoding(&answer) {
            return Ok(canonical.to_string());
        }
        interaction
            .show(&format!("\"{}\" is not a supported encoding.", answer), true)
            .await;
    }
}

/// Decode raw bytes under a canonical encoding name.
pub fn decode_text(bytes: &[u8], canonical: &str) -> Result<String> {
    let encoding = encoding_for(canonical).ok_or_else(|| {
        AppError::ParseError(format!("Unsupported encoding \"{}\"", canonical))
    })?;
    let (text, _, _) = encoding.decode(bytes);
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::interaction::ScriptedInteraction;

    #[test]
    fn test_canonical_mapping_strips_hyphens_and_case() {
        assert_eq!(canonical_encoding("UTF-8"), Some("utf8"));
        assert_eq!(canonical_encoding("ISO-8859-2"), Some("latin2"));
        assert_eq!(canonical_encoding("ISO-8859-8-I"), Some("logical"));
        assert_eq!(canonical_encoding("UTF-16LE"), Some("utf16"));
        assert_eq!(canonical_encoding("windows-1252"), None);
    }

    #[test]
    fn test_every_supported_name_has_a_decoder() {
        for name in SUPPORTED_ENCODINGS {
            assert!(encoding_for(name).is_some(), "missing decoder for {}", name);
        }
    }

    #[test]
    fn test_detect_plain_ascii_as_utf8() {
        assert_eq!(detect_encoding(b"name,size\noak,12\n"), Some("utf8"));
    }

    #[test]
    fn test_decode_latin2() {
        // 0xB3 is LATIN SMALL LETTER L WITH STROKE in ISO-8859-2
        let text = decode_text(&[0xB3, 0x2C, 0x61], "latin2").unwrap();
        assert_eq!(text, "\u{0142},a");
    }

    #[tokio::test]
    async fn test_resolve_loops_until_supported_choice() {
        // Invalid UTF-8 with bytes typical of windows-1252 falls outside the
        // whitelist, so the user is asked.
        let bytes = [0x93u8, 0x94, 0x85, 0x91, 0x92, 0xFF, 0xFE, 0x00, 0x41];
        if detect_encoding(&bytes).is_some() {
            return;
        }
        let interaction = ScriptedInteraction::new(vec![
            Some("koi8-r".to_string()),
            Some("latin2".to_string()),
        ]);
        let resolved = resolve_encoding(&bytes, &interaction).await.unwrap();
        assert_eq!(resolved, "latin2");
    }
}
