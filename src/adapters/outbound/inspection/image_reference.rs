use crate::shared::Result;
use std::fmt;

pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Host serving the Docker Hub registry API
const DOCKER_HUB_HOST: &str = "registry-1.docker.io";

const DEFAULT_TAG: &str = "latest";

/// Tag or digest part of an image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    Tag(String),
    /// Full digest including the algorithm (`sha256:...`)
    Digest(String),
}

/// A parsed `registry/repository:tag` or `registry/repository@digest` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    pub target: ReferenceTarget,
}

impl ImageReference {
    /// Parses an image reference the way `docker pull` does
    ///
    /// The first path component is a registry only if it contains a `.` or
    /// a `:`, or is `localhost`. Docker Hub images without a namespace get
    /// the `library/` prefix.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() || reference.chars().any(char::is_whitespace) {
            anyhow::bail!("Invalid image reference: '{}'", reference);
        }

        let (name, target) = match reference.split_once('@') {
            Some((name, digest)) => {
                let Some((algorithm, hex)) = digest.split_once(':') else {
                    anyhow::bail!("Invalid digest in image reference: '{}'", reference);
                };
                if algorithm.is_empty() || hex.is_empty() {
                    anyhow::bail!("Invalid digest in image reference: '{}'", reference);
                }
                (name, ReferenceTarget::Digest(digest.to_string()))
            }
            None => {
                // A ':' after the last '/' separates the tag; earlier ones are ports
                let last_slash = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
                match reference[last_slash..].rfind(':') {
                    Some(i) => {
                        let split = last_slash + i;
                        let tag = &reference[split + 1..];
                        if tag.is_empty() {
                            anyhow::bail!("Empty tag in image reference: '{}'", reference);
                        }
                        (&reference[..split], ReferenceTarget::Tag(tag.to_string()))
                    }
                    None => (reference, ReferenceTarget::Tag(DEFAULT_TAG.to_string())),
                }
            }
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first.to_string(), rest.to_string())
            }
            _ => (DEFAULT_REGISTRY.to_string(), name.to_string()),
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            anyhow::bail!("Invalid repository in image reference: '{}'", reference);
        }
        if repository.chars().any(|c| c.is_ascii_uppercase()) {
            anyhow::bail!("Repository names must be lower case: '{}'", reference);
        }

        let repository = if registry == DEFAULT_REGISTRY && !repository.contains('/') {
            format!("library/{}", repository)
        } else {
            repository
        };

        Ok(Self {
            registry,
            repository,
            target,
        })
    }

    /// Host name to talk to for the registry API
    pub fn api_host(&self) -> &str {
        if self.registry == DEFAULT_REGISTRY {
            DOCKER_HUB_HOST
        } else {
            &self.registry
        }
    }

    /// The tag or digest as used in `/v2/<repo>/manifests/<reference>`
    pub fn manifest_reference(&self) -> &str {
        match &self.target {
            ReferenceTarget::Tag(tag) => tag,
            ReferenceTarget::Digest(digest) => digest,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.target {
            ReferenceTarget::Tag(tag) => Some(tag),
            ReferenceTarget::Digest(_) => None,
        }
    }

    /// `registry/repository` without tag or digest
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    /// File name for an archive of this image (`alpine_3.19.tar`)
    pub fn archive_file_name(&self) -> String {
        let base = self.repository.rsplit('/').next().unwrap_or(&self.repository);
        let suffix = match &self.target {
            ReferenceTarget::Tag(tag) => tag.clone(),
            ReferenceTarget::Digest(digest) => {
                let hex = digest.split_once(':').map(|(_, h)| h).unwrap_or(digest);
                hex.chars().take(12).collect()
            }
        };
        format!("{}_{}.tar", base, suffix)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            ReferenceTarget::Tag(tag) => write!(f, "{}/{}:{}", self.registry, self.repository, tag),
            ReferenceTarget::Digest(digest) => {
                write!(f, "{}/{}@{}", self.registry, self.repository, digest)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_docker_hub_short_name() {
        let reference = ImageReference::parse("alpine").unwrap();
        assert_eq!(reference.registry, "docker.io");
        assert_eq!(reference.repository, "library/alpine");
        assert_eq!(reference.tag(), Some("latest"));
        assert_eq!(reference.api_host(), "registry-1.docker.io");
        assert_eq!(reference.to_string(), "docker.io/library/alpine:latest");
    }

    #[test]
    fn test_parse_registry_with_port_and_tag() {
        let reference = ImageReference::parse("localhost:5000/team/app:1.2").unwrap();
        assert_eq!(reference.registry, "localhost:5000");
        assert_eq!(reference.repository, "team/app");
        assert_eq!(reference.tag(), Some("1.2"));
        assert_eq!(reference.api_host(), "localhost:5000");
    }

    #[test]
    fn test_parse_digest_reference() {
        let digest = format!("sha256:{}", "a".repeat(64));
        let reference = ImageReference::parse(&format!("registry.k8s.io/pause@{}", digest)).unwrap();
        assert_eq!(reference.registry, "registry.k8s.io");
        assert_eq!(reference.repository, "pause");
        assert_eq!(reference.target, ReferenceTarget::Digest(digest.clone()));
        assert_eq!(reference.manifest_reference(), digest);
        assert_eq!(reference.archive_file_name(), "pause_aaaaaaaaaaaa.tar");
    }

    #[test]
    fn test_parse_namespaced_docker_hub() {
        let reference = ImageReference::parse("bitnami/redis:7").unwrap();
        assert_eq!(reference.repository, "bitnami/redis");
        assert_eq!(reference.name(), "docker.io/bitnami/redis");
        assert_eq!(reference.archive_file_name(), "redis_7.tar");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("alpine:").is_err());
        assert!(ImageReference::parse("Alpine").is_err());
        assert!(ImageReference::parse("alpine@sha256").is_err());
        assert!(ImageReference::parse("a b").is_err());
        assert!(ImageReference::parse("registry.io//app").is_err());
    }
}
