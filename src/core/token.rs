//! QR check-in tokens: extraction from scanned payloads, the per-terminal
//! cache and validation against the configured location token.

use crate::errors::{AppError, AppResult};
use crate::models::location::Location;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// No token has been configured for the location (or the business).
    Unconfigured,
    /// A token is configured but nothing was presented.
    Absent,
    Mismatched,
    /// The employee is restricted to other locations.
    NotAssigned,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TokenRejection::Unconfigured => "QR not configured, contact your administrator",
            TokenRejection::Absent => "scan the location QR code to clock in or out",
            TokenRejection::Mismatched => "the scanned QR code does not belong to this location",
            TokenRejection::NotAssigned => "you are not assigned to this location",
        };
        f.write_str(msg)
    }
}

impl From<TokenRejection> for AppError {
    fn from(r: TokenRejection) -> Self {
        AppError::TokenRejected(r)
    }
}

pub struct TokenValidator;

impl TokenValidator {
    /// Single-location check against the business-wide token.
    ///
    /// Comparison is exact: no trimming, no case folding.
    pub fn validate(configured: Option<&str>, presented: Option<&str>) -> Result<(), TokenRejection> {
        let configured = configured
            .filter(|t| !t.is_empty())
            .ok_or(TokenRejection::Unconfigured)?;
        let presented = presented
            .filter(|t| !t.is_empty())
            .ok_or(TokenRejection::Absent)?;

        if presented == configured {
            Ok(())
        } else {
            Err(TokenRejection::Mismatched)
        }
    }

    /// Multi-location check. An empty assignment set means "any location".
    pub fn validate_for_location(
        location: &Location,
        presented: Option<&str>,
        assignment: &[i64],
    ) -> Result<(), TokenRejection> {
        Self::validate(location.token(), presented)?;

        if !assignment.is_empty() && !assignment.contains(&location.id) {
            return Err(TokenRejection::NotAssigned);
        }
        Ok(())
    }

    /// Find the location a presented token belongs to.
    pub fn resolve_location<'a>(
        locations: &'a [Location],
        presented: Option<&str>,
        assignment: &[i64],
    ) -> Result<&'a Location, TokenRejection> {
        if !locations.iter().any(|l| l.token().is_some()) {
            return Err(TokenRejection::Unconfigured);
        }
        let presented = presented
            .filter(|t| !t.is_empty())
            .ok_or(TokenRejection::Absent)?;

        let loc = locations
            .iter()
            .find(|l| l.token() == Some(presented))
            .ok_or(TokenRejection::Mismatched)?;

        Self::validate_for_location(loc, Some(presented), assignment)?;
        Ok(loc)
    }
}

fn point_param() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        // `point` may live in the query or inside a `#/route?...` fragment
        Regex::new(r"[?&#]point=([^&#]*)").ok()
    })
    .as_ref()
}

/// Token carried by a scanned payload.
///
/// URLs yield their percent-decoded `point` parameter; anything else is taken
/// as the raw token. Blank input gives `None`.
pub fn extract_token(payload: &str) -> Option<String> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    let looks_like_url = payload.contains("://") || payload.starts_with("#/") || payload.starts_with('?');
    if looks_like_url {
        return point_param()?
            .captures(payload)
            .and_then(|c| c.get(1))
            .map(|m| decode_query_value(m.as_str()))
            .filter(|t| !t.is_empty());
    }

    Some(payload.to_string())
}

/// Form-style decoding of a query value: `+` is a space, `%XX` escapes are
/// UTF-8. A value that does not decode to UTF-8 is kept as scanned, so it
/// fails validation as a mismatch instead of matching a mangled token.
fn decode_query_value(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Check-in URL printed in the location QR code.
pub fn qr_url(base: &str, token: &str) -> String {
    format!(
        "{}/#/employee-main?point={}",
        base.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}

/// Last token seen on this terminal, kept in a small file.
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn cached(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim_end_matches(['\r', '\n']).to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn remember(&self, token: &str) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    /// The presented token (remembered for later calls), else the cached one.
    ///
    /// A presented token is remembered as soon as it is scanned, before it is
    /// validated, so a rejected scan also replaces the cached token.
    pub fn resolve(&self, presented: Option<String>) -> AppResult<Option<String>> {
        match presented {
            Some(t) => {
                self.remember(&t)?;
                Ok(Some(t))
            }
            None => Ok(self.cached()),
        }
    }

    pub fn forget(&self) -> AppResult<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: i64, token: Option<&str>) -> Location {
        Location {
            id,
            name: format!("L{id}"),
            qr_token: token.map(str::to_string),
        }
    }

    #[test]
    fn single_location_rules() {
        use TokenRejection::*;
        assert_eq!(TokenValidator::validate(None, Some("abc")), Err(Unconfigured));
        assert_eq!(TokenValidator::validate(Some(""), Some("abc")), Err(Unconfigured));
        assert_eq!(TokenValidator::validate(Some("abc"), None), Err(Absent));
        assert_eq!(TokenValidator::validate(Some("abc"), Some("abd")), Err(Mismatched));
        assert_eq!(TokenValidator::validate(Some("abc"), Some("ABC")), Err(Mismatched));
        assert_eq!(TokenValidator::validate(Some("abc"), Some("abc")), Ok(()));
    }

    #[test]
    fn assignment_restricts_locations() {
        let l = loc(2, Some("t2"));
        assert_eq!(TokenValidator::validate_for_location(&l, Some("t2"), &[]), Ok(()));
        assert_eq!(TokenValidator::validate_for_location(&l, Some("t2"), &[2, 5]), Ok(()));
        assert_eq!(
            TokenValidator::validate_for_location(&l, Some("t2"), &[1]),
            Err(TokenRejection::NotAssigned)
        );
    }

    #[test]
    fn resolve_finds_matching_location() {
        let locs = vec![loc(1, Some("aaa")), loc(2, Some("bbb")), loc(3, None)];
        let found = TokenValidator::resolve_location(&locs, Some("bbb"), &[]).unwrap();
        assert_eq!(found.id, 2);
        assert_eq!(
            TokenValidator::resolve_location(&locs, Some("ccc"), &[]).unwrap_err(),
            TokenRejection::Mismatched
        );
        assert_eq!(
            TokenValidator::resolve_location(&locs, Some("aaa"), &[2]).unwrap_err(),
            TokenRejection::NotAssigned
        );
        assert_eq!(
            TokenValidator::resolve_location(&[loc(1, None)], Some("aaa"), &[]).unwrap_err(),
            TokenRejection::Unconfigured
        );
    }

    #[test]
    fn extracts_point_from_fragment_route() {
        let url = "https://turnqr.app/#/employee-main?point=a%2Fb%20c&x=1";
        assert_eq!(extract_token(url).as_deref(), Some("a/b c"));
        assert_eq!(
            extract_token("https://turnqr.app/?point=xyz").as_deref(),
            Some("xyz")
        );
        assert_eq!(extract_token("https://turnqr.app/#/employee-main"), None);
        assert_eq!(extract_token("  raw-token  ").as_deref(), Some("raw-token"));
        assert_eq!(extract_token("   "), None);
    }

    #[test]
    fn query_value_decoding_is_form_style_and_never_lossy() {
        assert_eq!(extract_token("https://x/?point=a+b%2Bc").as_deref(), Some("a b+c"));
        // %FF is not UTF-8: the raw value is kept and will not match
        assert_eq!(extract_token("https://x/?point=ab%FF").as_deref(), Some("ab%FF"));
    }

    #[test]
    fn rejected_scan_still_replaces_the_cached_token() {
        let dir = std::env::temp_dir().join(format!("turnqr_cache_{}", std::process::id()));
        let cache = TokenCache::new(dir.join("point.token"));
        cache.remember("good").unwrap();

        let presented = cache.resolve(Some("bad".into())).unwrap();
        assert_eq!(
            TokenValidator::validate(Some("good"), presented.as_deref()),
            Err(TokenRejection::Mismatched)
        );
        assert_eq!(cache.cached().as_deref(), Some("bad"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn qr_url_round_trips_through_extraction() {
        let token = "9f1c/ä+?";
        let url = qr_url("https://bar.example/", token);
        assert!(url.starts_with("https://bar.example/#/employee-main?point="));
        assert_eq!(extract_token(&url).as_deref(), Some(token));
    }

    #[test]
    fn cache_falls_back_to_last_token() {
        let dir = std::env::temp_dir().join(format!("turnqr-token-{}", std::process::id()));
        let cache = TokenCache::new(dir.join("point"));
        let _ = cache.forget();

        assert_eq!(cache.resolve(None).unwrap(), None);
        assert_eq!(cache.resolve(Some("t1".into())).unwrap().as_deref(), Some("t1"));
        assert_eq!(cache.resolve(None).unwrap().as_deref(), Some("t1"));
        assert!(cache.forget().unwrap());
        assert_eq!(cache.cached(), None);
        let _ = fs::remove_dir_all(dir);
    }
}
