//! Codec for the `file:` references stored as dependency values.
//!
//! A reference looks like `{prefix}{name}-{version}.tgz`, for example
//! `file:../GooglePackages/com.google.firebase.app-11.0.0.tgz`.

use crate::settings::ARCHIVE_EXTENSION;

pub fn encode_reference(prefix: &str, name: &str, version: &str) -> String {
    format!("{}{}-{}{}", prefix, name, version, ARCHIVE_EXTENSION)
}

/// Recovers the version from a reference, or `None` if the reference does not
/// follow the pattern for this package.
pub fn decode_reference<'r>(prefix: &str, name: &str, reference: &'r str) -> Option<&'r str> {
    reference
        .strip_prefix(prefix)?
        .strip_prefix(name)?
        .strip_prefix('-')?
        .strip_suffix(ARCHIVE_EXTENSION)
        .filter(|version| !version.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "file:../GooglePackages/";

    #[test]
    fn test_encode_reference() {
        assert_eq!(
            encode_reference(PREFIX, "com.google.play.core", "1.8.0"),
            "file:../GooglePackages/com.google.play.core-1.8.0.tgz"
        );
    }

    #[test]
    fn test_decode_reference_inverts_encode() {
        for (name, version) in [
            ("com.google.play.core", "1.8.0"),
            ("com.example.pkg", "2.0.0-preview.1"),
            ("com.example.pkg", "10"),
        ] {
            let reference = encode_reference(PREFIX, name, version);
            assert_eq!(decode_reference(PREFIX, name, &reference), Some(version));
        }
    }

    #[test]
    fn test_decode_reference_rejects_foreign_values() {
        let name = "com.example.pkg";
        for reference in [
            "1.2.3",
            "https://github.com/example/pkg.git",
            "file:../GooglePackages/com.other.pkg-1.0.0.tgz",
            "file:../GooglePackages/com.example.pkg-1.0.0.zip",
            "file:../GooglePackages/com.example.pkg-.tgz",
            "file:../Elsewhere/com.example.pkg-1.0.0.tgz",
        ] {
            assert_eq!(decode_reference(PREFIX, name, reference), None, "{reference}");
        }
    }
}
