/// Where the CouchDB server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchTarget {
    /// External server to use, without trailing slash.
    pub url: Option<String>,
    /// `true` when no external server was given and the caller has to start
    /// and manage a local instance.
    pub run: bool,
}

/// Resolve the target from the external URL override (`COUCH_URL`).
/// An unset or empty override selects a locally managed instance.
#[must_use]
pub fn resolve_target(couch_url: Option<&str>) -> CouchTarget {
    match couch_url.filter(|url| !url.is_empty()) {
        Some(url) => CouchTarget {
            url: Some(url.strip_suffix('/').unwrap_or(url).to_string()),
            run: false,
        },
        None => CouchTarget {
            url: None,
            run: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_url_strips_trailing_slash() {
        assert_eq!(
            resolve_target(Some("http://example.com/")),
            CouchTarget {
                url: Some("http://example.com".to_string()),
                run: false,
            }
        );
    }

    #[test]
    fn external_url_without_slash_is_kept() {
        let target = resolve_target(Some("https://couch.example.com:6984/db"));
        assert_eq!(target.url.as_deref(), Some("https://couch.example.com:6984/db"));
        assert!(!target.run);
    }

    #[test]
    fn missing_url_runs_local_instance() {
        assert_eq!(
            resolve_target(None),
            CouchTarget {
                url: None,
                run: true,
            }
        );
    }

    #[test]
    fn empty_url_runs_local_instance() {
        assert!(resolve_target(Some("")).run);
    }
}
