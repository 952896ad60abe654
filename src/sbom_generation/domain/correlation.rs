use super::ChecksumAlgorithm;
use std::fmt;

/// Outcome of comparing a claimed provenance digest with a computed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The strongest common algorithm agrees
    Verified,
    /// The strongest common algorithm disagrees (security relevant)
    Mismatch,
    /// No common algorithm, or the material matched no package
    Inconclusive,
    /// A sourced package that no statement claims (informational)
    Unclaimed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Verified => "VERIFIED",
            Verdict::Mismatch => "MISMATCH",
            Verdict::Inconclusive => "INCONCLUSIVE",
            Verdict::Unclaimed => "UNCLAIMED",
        };
        f.write_str(label)
    }
}

/// One correlated (package, material) pair, or an unpaired side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationEntry {
    pub verdict: Verdict,
    /// SPDX ID of the package, absent when the material matched nothing
    pub package_id: Option<String>,
    /// Material URI, absent for unclaimed packages
    pub material_uri: Option<String>,
    /// Builder of the statement the material came from
    pub builder_id: Option<String>,
    /// Algorithm that decided a Verified/Mismatch verdict
    pub algorithm: Option<ChecksumAlgorithm>,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl CorrelationEntry {
    pub fn unclaimed(package_id: &str) -> Self {
        Self {
            verdict: Verdict::Unclaimed,
            package_id: Some(package_id.to_string()),
            material_uri: None,
            builder_id: None,
            algorithm: None,
            expected: None,
            actual: None,
        }
    }
}

impl fmt::Display for CorrelationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} package={} material={}",
            self.verdict,
            self.package_id.as_deref().unwrap_or("-"),
            self.material_uri.as_deref().unwrap_or("-")
        )?;
        if let Some(algorithm) = self.algorithm {
            write!(f, " algorithm={}", algorithm)?;
        }
        if self.verdict == Verdict::Mismatch {
            write!(
                f,
                " expected={} actual={}",
                self.expected.as_deref().unwrap_or("-"),
                self.actual.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

/// CorrelationReport: every verdict of one correlation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationReport {
    entries: Vec<CorrelationEntry>,
}

impl CorrelationReport {
    pub fn new(entries: Vec<CorrelationEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CorrelationEntry] {
        &self.entries
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.entries.iter().filter(|e| e.verdict == verdict).count()
    }

    pub fn has_mismatch(&self) -> bool {
        self.count(Verdict::Mismatch) > 0
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &CorrelationEntry> {
        self.entries.iter().filter(|e| e.verdict == Verdict::Mismatch)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
