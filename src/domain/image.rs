//! Image registry link parsing.

use std::fmt;

use super::error::DomainError;

/// Repository and tag resolved from a stored registry link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub repository: String,
    pub tag: String,
}

impl ImageReference {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Parse a registry link such as `https://registry.example.com/team/pwn:v1`.
    ///
    /// Any `scheme://` prefix is dropped and the remainder is split on the
    /// last colon, so registry ports survive in the repository part.
    pub fn parse(link: &str) -> Result<Self, DomainError> {
        let invalid = |reason| DomainError::InvalidImageReference {
            reference: link.to_string(),
            reason,
        };

        let trimmed = link.trim();
        let without_scheme = match trimmed.split_once("://") {
            Some((_, rest)) => rest,
            None => trimmed,
        };

        let (repository, tag) = without_scheme
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing tag"))?;

        if repository.is_empty() {
            return Err(invalid("empty repository"));
        }
        if tag.is_empty() {
            return Err(invalid("empty tag"));
        }
        // `registry:5000/repo` has no tag; the last colon belongs to the port.
        if tag.contains('/') {
            return Err(invalid("missing tag"));
        }

        Ok(Self::new(repository, tag))
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_splits_tag() {
        let image = ImageReference::parse("https://registry.gitlab.com/team/pwn:v1").unwrap();
        assert_eq!(image.repository, "registry.gitlab.com/team/pwn");
        assert_eq!(image.tag, "v1");
    }

    #[test]
    fn accepts_links_without_scheme() {
        let image = ImageReference::parse("team/pwn:latest").unwrap();
        assert_eq!(image, ImageReference::new("team/pwn", "latest"));
    }

    #[test]
    fn splits_on_last_colon() {
        let image = ImageReference::parse("http://registry:5000/team/pwn:2.1").unwrap();
        assert_eq!(image.repository, "registry:5000/team/pwn");
        assert_eq!(image.tag, "2.1");
    }

    #[test]
    fn port_without_tag_is_rejected() {
        let err = ImageReference::parse("registry:5000/team/pwn").unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidImageReference {
                reason: "missing tag",
                ..
            }
        ));
    }

    #[test]
    fn missing_parts_are_rejected() {
        assert!(ImageReference::parse("https://team/pwn").is_err());
        assert!(ImageReference::parse(":v1").is_err());
        assert!(ImageReference::parse("team/pwn:").is_err());
        assert!(ImageReference::parse("").is_err());
    }
}
