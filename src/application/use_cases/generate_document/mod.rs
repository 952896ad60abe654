use crate::application::dto::{
    ArtifactOutcome, ArtifactSource, GenerateDocumentRequest, GenerateDocumentResponse,
};
use crate::application::use_cases::InspectArtifactUseCase;
use crate::ports::outbound::{ArtifactInspector, ProgressReporter, StatementReader};
use crate::sbom_generation::domain::{ArtifactPackage, Statement};
use crate::sbom_generation::services::{DigestCorrelator, GraphBuilder, MetadataGenerator};
use crate::shared::error::{is_fatal, SbomError};
use crate::shared::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// GenerateDocumentUseCase - Core use case for SPDX document generation
///
/// Inspects every requested artifact on a bounded pool of blocking tasks,
/// merges the results into one document in request order and correlates the
/// document with the provenance statements.
///
/// # Type Parameters
/// * `I` - ArtifactInspector implementation
/// * `SR` - StatementReader implementation
/// * `PR` - ProgressReporter implementation
pub struct GenerateDocumentUseCase<I, SR, PR> {
    inspector: I,
    statement_reader: SR,
    progress_reporter: PR,
}

impl<I, SR, PR> GenerateDocumentUseCase<I, SR, PR>
where
    I: ArtifactInspector + Clone + 'static,
    SR: StatementReader,
    PR: ProgressReporter,
{
    /// Creates a new GenerateDocumentUseCase with injected dependencies
    pub fn new(inspector: I, statement_reader: SR, progress_reporter: PR) -> Self {
        Self {
            inspector,
            statement_reader,
            progress_reporter,
        }
    }

    /// Executes the document generation use case
    ///
    /// A failing artifact is reported in the response and left out of the
    /// document; the other artifacts still make it in.
    ///
    /// # Errors
    /// - Provenance statements that cannot be loaded
    /// - Fatal graph errors ([`SbomError::Invariant`], [`SbomError::IdCollision`])
    pub async fn execute(&self, request: GenerateDocumentRequest) -> Result<GenerateDocumentResponse> {
        // Step 1: Load statements before any expensive inspection
        let statements = self.load_statements(&request)?;

        // Step 2: Document metadata
        let labels: Vec<String> = request.artifacts.iter().map(ToString::to_string).collect();
        let metadata = MetadataGenerator::generate_metadata(
            &request.resolved_name(),
            request.namespace.as_deref(),
            &labels,
            &request.creators,
            request.created,
        );

        // Step 3: Inspect and merge
        let mut builder = GraphBuilder::new(metadata);
        let outcomes = self.inspect_and_merge(&request, &mut builder).await?;

        // Step 4: Validate the graph
        let document = builder.finish()?;

        // Step 5: Correlate
        let correlation = DigestCorrelator::correlate(&document, &statements);

        let added = outcomes.iter().filter(|o| !o.is_failed()).count();
        self.progress_reporter.report_completion(&format!(
            "✅ SPDX document generated: {} of {} artifact(s), {} entities",
            added,
            outcomes.len(),
            document.entity_count()
        ));

        Ok(GenerateDocumentResponse::new(document, outcomes, correlation))
    }

    fn load_statements(&self, request: &GenerateDocumentRequest) -> Result<Vec<Statement>> {
        request
            .provenance
            .iter()
            .map(|path| {
                self.progress_reporter.report(&format!(
                    "📖 Loading provenance statement: {}",
                    path.display()
                ));
                let statement = self.statement_reader.load_statement(path)?;
                self.progress_reporter.report(&format!(
                    "✅ {} subject(s), {} material(s), built by {}",
                    statement.subjects().len(),
                    statement.materials().len(),
                    statement.builder_id()
                ));
                Ok(statement)
            })
            .collect()
    }

    /// Inspects artifacts concurrently and merges them in request order
    ///
    /// `buffered` yields results in input order, so the merge order does not
    /// depend on which inspection finishes first.
    async fn inspect_and_merge(
        &self,
        request: &GenerateDocumentRequest,
        builder: &mut GraphBuilder,
    ) -> Result<Vec<ArtifactOutcome>> {
        let total = request.artifacts.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        self.progress_reporter.report(&format!(
            "🔍 Inspecting {} artifact(s) with {} worker(s)...",
            total,
            request.workers.max(1)
        ));

        let inspect = Arc::new(InspectArtifactUseCase::new(
            self.inspector.clone(),
            request.options.clone(),
        ));

        let mut results = stream::iter(request.artifacts.iter().cloned())
            .map(|source| {
                let inspect = Arc::clone(&inspect);
                async move {
                    let label = source.to_string();
                    let result = run_inspection(inspect, source).await;
                    (label, result)
                }
            })
            .buffered(request.workers.max(1));

        let mut outcomes = Vec::with_capacity(total);
        while let Some((artifact, inspected)) = results.next().await {
            let merged = match inspected {
                Ok(package) => builder.add_artifact(package),
                Err(e) if is_fatal(&e) => Err(e),
                Err(e) => Err(SbomError::GraphBuild {
                    artifact: artifact.clone(),
                    source: e,
                }
                .into()),
            };

            match merged {
                Ok(spdx_id) => outcomes.push(ArtifactOutcome::Added { artifact, spdx_id }),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    let error = format!("{:#}", e);
                    self.progress_reporter
                        .report_error(&format!("Skipping {}: {}", artifact, error));
                    outcomes.push(ArtifactOutcome::Failed { artifact, error });
                }
            }
            self.progress_reporter.report_progress(
                outcomes.len(),
                total,
                outcomes.last().map(ArtifactOutcome::artifact),
            );
        }

        Ok(outcomes)
    }
}

/// Runs one inspection on the blocking pool
async fn run_inspection<I>(
    inspect: Arc<InspectArtifactUseCase<I>>,
    source: ArtifactSource,
) -> Result<ArtifactPackage>
where
    I: ArtifactInspector + 'static,
{
    match tokio::task::spawn_blocking(move || inspect.inspect(&source)).await {
        Ok(result) => result,
        Err(e) => anyhow::bail!("inspection task failed: {}", e),
    }
}
