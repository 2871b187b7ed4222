//! Auth pattern detection: token encode/decode,
//! session middleware markers, API-key header extraction, password-hash
//! library use, OAuth client imports.

use crate::core::errors::Result;
use crate::model::{DetectedPattern, SymbolTable};

use super::confidence_from_evidence;

const MAX_EVIDENCE: usize = 4;
const TOKEN_MARKERS: &[&str] = &["jwt.encode", "jwt.decode", "jwt.sign", "jwt.verify"];
const SESSION_MARKERS: &[&str] = &["session_middleware", "SessionMiddleware", "express-session", "flask_login"];
const API_KEY_MARKERS: &[&str] = &["X-API-Key", "x-api-key", "Authorization"];
const PASSWORD_HASH_MARKERS: &[&str] = &["bcrypt", "argon2", "scrypt", "pbkdf2"];
const OAUTH_IMPORT_MARKERS: &[&str] = &["oauth", "authlib", "passport", "oauthlib"];

/// Detects authentication/authorization idioms across common libraries.
pub struct AuthPatternDetector;

impl super::PatternDetector for AuthPatternDetector {
    fn pattern_type(&self) -> &'static str {
        "auth"
    }

    fn detect(
        &self,
        symbols: &SymbolTable,
        file_content: &str,
        file_path: &str,
        _language: &str,
    ) -> Result<Vec<DetectedPattern>> {
        let mut evidence = Vec::new();

        if let Some(marker) = TOKEN_MARKERS.iter().find(|m| file_content.contains(**m)) {
            evidence.push(format!("token encode/decode via `{marker}`"));
        }
        if let Some(marker) = SESSION_MARKERS.iter().find(|m| file_content.contains(**m)) {
            evidence.push(format!("session middleware marker `{marker}`"));
        }
        if let Some(marker) = API_KEY_MARKERS.iter().find(|m| file_content.contains(**m)) {
            evidence.push(format!("API-key/auth header extraction `{marker}`"));
        }
        if let Some(marker) = PASSWORD_HASH_MARKERS.iter().find(|m| file_content.to_ascii_lowercase().contains(m)) {
            evidence.push(format!("password-hash library use `{marker}`"));
        }
        if symbols
            .imports
            .iter()
            .any(|i| OAUTH_IMPORT_MARKERS.iter().any(|m| i.module.to_ascii_lowercase().contains(m)))
        {
            evidence.push("OAuth client import".to_string());
        }

        if evidence.is_empty() {
            return Ok(Vec::new());
        }

        let confidence = confidence_from_evidence(evidence.len(), MAX_EVIDENCE);
        Ok(vec![DetectedPattern {
            pattern_type: self.pattern_type().to_string(),
            file_path: file_path.to_string(),
            confidence,
            evidence,
            line_numbers: Vec::new(),
            metadata: Default::default(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternDetector;

    #[test]
    fn detects_bcrypt_usage() {
        let symbols = SymbolTable::default();
        let found = AuthPatternDetector
            .detect(&symbols, "hashed = bcrypt.hashpw(pw, salt)", "auth.py", "python")
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn no_markers_yields_nothing() {
        let symbols = SymbolTable::default();
        let found = AuthPatternDetector.detect(&symbols, "x = 1\n", "a.py", "python").unwrap();
        assert!(found.is_empty());
    }
}
