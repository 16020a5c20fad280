//! Base64 payload decoding and digest/nonce validation.
//!
//! Hash-source bodies are decoded with the standard alphabet; the classifier
//! transliterates URL-safe characters before calling in here. Nonce payloads
//! are never rejected, only complained about.

use crate::values::HashAlgorithm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Errors from decoding or validating encoded payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The value is empty or not decodable standard base64.
    #[error("invalid base64-value: {0}")]
    InvalidBase64(String),
    /// The decoded digest length does not match the algorithm.
    #[error("invalid {algorithm} value: the digest must decode to {expected} bytes, found {actual}")]
    DigestLength {
        /// Algorithm the digest was declared with.
        algorithm: HashAlgorithm,
        /// Expected decoded length in bytes.
        expected: usize,
        /// Actual decoded length in bytes.
        actual: usize,
    },
}

/// Decodes a standard-alphabet base64 value.
///
/// # Errors
///
/// Returns [`EncodingError::InvalidBase64`] when the value is empty or not
/// valid padded base64.
pub fn decode_base64(value: &str) -> Result<Vec<u8>, EncodingError> {
    if value.is_empty() {
        return Err(EncodingError::InvalidBase64(value.to_string()));
    }
    STANDARD
        .decode(value)
        .map_err(|_| EncodingError::InvalidBase64(value.to_string()))
}

/// Checks a decoded digest against the algorithm's expected length.
///
/// # Errors
///
/// Returns [`EncodingError::DigestLength`] on a mismatch.
pub fn validate_digest(algorithm: HashAlgorithm, digest: &[u8]) -> Result<(), EncodingError> {
    let expected = algorithm.digest_len();
    if digest.len() == expected {
        Ok(())
    } else {
        Err(EncodingError::DigestLength {
            algorithm,
            expected,
            actual: digest.len(),
        })
    }
}

/// Fewest base64 characters that can carry 128 bits.
const MIN_NONCE_LENGTH: usize = 22;

/// Returns the complaints for a nonce payload. An empty list means the
/// payload is unobjectionable; complaints never invalidate the nonce.
pub fn nonce_warnings(payload: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if !is_base64_value(payload) {
        warnings.push(format!(
            "nonce value '{payload}' is not in the base64-value grammar"
        ));
    }
    if payload.len() < MIN_NONCE_LENGTH {
        warnings.push("nonce values should contain at least 128 bits of entropy".to_string());
    }
    warnings
}

/// base64-value grammar: one or more of ALPHA / DIGIT / `+` / `/` / `-` /
/// `_`, then at most two `=` of padding.
pub fn is_base64_value(value: &str) -> bool {
    let body = value.trim_end_matches('=');
    if value.len() - body.len() > 2 || body.is_empty() {
        return false;
    }
    body.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_standard_base64() {
        assert_eq!(decode_base64("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn decode_rejects_empty_and_garbage() {
        assert!(decode_base64("").is_err());
        assert!(decode_base64("not base64!").is_err());
        assert!(decode_base64("AAA").is_err());
    }

    #[test]
    fn transliterated_url_safe_value_decodes_to_same_bytes() {
        let bytes = [0xffu8; 6];
        let standard = STANDARD.encode(bytes);
        let url_safe = standard.replace('+', "-").replace('/', "_");
        let transliterated = url_safe.replace('-', "+").replace('_', "/");
        assert_eq!(decode_base64(&transliterated).unwrap(), bytes);
        assert_eq!(decode_base64(&standard).unwrap(), bytes);
    }

    #[test]
    fn digest_length_must_match_algorithm() {
        assert!(validate_digest(HashAlgorithm::Sha256, &[0u8; 32]).is_ok());
        let err = validate_digest(HashAlgorithm::Sha256, &[0u8; 20]).unwrap_err();
        assert_eq!(
            err,
            EncodingError::DigestLength {
                algorithm: HashAlgorithm::Sha256,
                expected: 32,
                actual: 20,
            }
        );
        assert!(validate_digest(HashAlgorithm::Sha512, &[0u8; 64]).is_ok());
    }

    #[test]
    fn base64_value_grammar() {
        assert!(is_base64_value("abc123"));
        assert!(is_base64_value("aGVsbG8="));
        assert!(is_base64_value("url-safe_chars"));
        assert!(!is_base64_value(""));
        assert!(!is_base64_value("==="));
        assert!(!is_base64_value("spaces here"));
    }

    #[test]
    fn short_nonce_draws_a_complaint() {
        let warnings = nonce_warnings("abc123");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("128 bits"));
    }

    #[test]
    fn long_valid_nonce_is_unobjectionable() {
        assert!(nonce_warnings("dGhpc2lzYXZlcnlsb25nbm9uY2U").is_empty());
    }

    #[test]
    fn malformed_nonce_draws_grammar_complaint() {
        let warnings = nonce_warnings("bad nonce!");
        assert!(warnings.iter().any(|w| w.contains("base64-value grammar")));
    }
}
