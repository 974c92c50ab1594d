//! Configuration enum types.

use serde::{Deserialize, Serialize};

/// Compression preference for scene files.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SceneCompression {
    /// Always write plain JSON
    Off,
    /// Always write gzip-compressed JSON
    On,
    /// Compress once the payload reaches `auto_compress_threshold_bytes`
    #[default]
    Auto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        compression: SceneCompression,
    }

    #[test]
    fn compression_parses_lowercase_names() {
        let parsed: Wrapper = toml::from_str("compression = \"on\"").unwrap();
        assert_eq!(parsed.compression, SceneCompression::On);
        assert!(toml::from_str::<Wrapper>("compression = \"sometimes\"").is_err());
    }
}
