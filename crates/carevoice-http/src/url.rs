//! Endpoint URL construction.

use url::Url;

use crate::error::HttpResult;

pub const TRANSCRIBE_PATH: &str = "api/transcribe";
pub const TTS_PATH: &str = "api/tts";
pub const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

/// Join `path` onto `base`, keeping any path prefix the base already has.
///
/// `http://host/care` + `api/tts` → `http://host/care/api/tts`.
pub fn endpoint(base: &str, path: &str) -> HttpResult<Url> {
    let base = base.trim();
    let mut root = Url::parse(base)?;
    if !root.path().ends_with('/') {
        let with_slash = format!("{}/", root.path());
        root.set_path(&with_slash);
    }
    Ok(root.join(path.trim_start_matches('/'))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_on_bare_host() {
        let url = endpoint("http://localhost:3000", TRANSCRIBE_PATH).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/transcribe");
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let url = endpoint("https://care.example/portal", TTS_PATH).unwrap();
        assert_eq!(url.as_str(), "https://care.example/portal/api/tts");

        let url = endpoint("https://care.example/portal/", "/api/tts").unwrap();
        assert_eq!(url.as_str(), "https://care.example/portal/api/tts");
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(endpoint("not a url", TTS_PATH).is_err());
    }
}
