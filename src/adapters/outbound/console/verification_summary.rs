use crate::application::dto::ArtifactOutcome;
use crate::sbom_generation::domain::{CorrelationReport, Verdict};
use owo_colors::OwoColorize;
use std::fmt::Write;
use std::io::IsTerminal;

/// Renders per-artifact outcomes and correlation verdicts for the terminal
pub struct VerificationSummary;

impl VerificationSummary {
    /// Prints the summary to stderr, colored when stderr is a terminal
    pub fn print(outcomes: &[ArtifactOutcome], report: &CorrelationReport) {
        eprint!("{}", Self::render(outcomes, report, std::io::stderr().is_terminal()));
    }

    pub fn render(outcomes: &[ArtifactOutcome], report: &CorrelationReport, color: bool) -> String {
        let mut out = String::new();

        let failed: Vec<&ArtifactOutcome> = outcomes.iter().filter(|o| o.is_failed()).collect();
        if !failed.is_empty() {
            let _ = writeln!(out, "\n{}", paint("Failed artifacts:", Verdict::Mismatch, color));
            for outcome in failed {
                if let ArtifactOutcome::Failed { artifact, error } = outcome {
                    let first_line = error.lines().next().unwrap_or_default();
                    let _ = writeln!(out, "  ❌ {}: {}", artifact, first_line);
                }
            }
        }

        if report.is_empty() {
            return out;
        }

        let _ = writeln!(out, "\n🔐 Provenance correlation:");
        for entry in report.entries() {
            let _ = writeln!(out, "  {}", paint(&entry.to_string(), entry.verdict, color));
        }
        let _ = writeln!(
            out,
            "\n  {} verified, {} mismatch, {} inconclusive, {} unclaimed",
            report.count(Verdict::Verified),
            report.count(Verdict::Mismatch),
            report.count(Verdict::Inconclusive),
            report.count(Verdict::Unclaimed)
        );
        out
    }
}

fn paint(text: &str, verdict: Verdict, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match verdict {
        Verdict::Verified => text.green().to_string(),
        Verdict::Mismatch => text.red().bold().to_string(),
        Verdict::Inconclusive => text.yellow().to_string(),
        Verdict::Unclaimed => text.dimmed().to_string(),
    }
}
