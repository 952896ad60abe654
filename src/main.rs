mod cli;
mod config;

use cli::Args;
use config::{
    discover_config, load_config_from_path, validate_creator, ConfigFile, CONFIG_FILENAME,
};
use spdx_bom::adapters::outbound::console::{StderrProgressReporter, VerificationSummary};
use spdx_bom::adapters::outbound::filesystem::FileSystemReader;
use spdx_bom::adapters::outbound::inspection::ImageInspector;
use spdx_bom::application::dto::{
    ArtifactSource, GenerateDocumentRequest, OutputFormat, DEFAULT_WORKERS,
};
use spdx_bom::application::factories::{FormatterFactory, PresenterFactory};
use spdx_bom::application::use_cases::GenerateDocumentUseCase;
use spdx_bom::ports::outbound::{OutputPresenter, SpdxFormatter};
use spdx_bom::sbom_generation::services::MetadataGenerator;
use spdx_bom::shared::error::ExitCode;
use spdx_bom::shared::Result;
use std::process;
use std::str::FromStr;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Load config file (explicit path or auto-discovery)
    let config = match args.config.as_deref() {
        Some(path) => {
            let config = load_config_from_path(path)?;
            eprintln!("📄 Loaded config from: {}", path.display());
            config
        }
        None => match discover_config(&std::env::current_dir()?)? {
            Some(config) => {
                eprintln!("📄 Auto-discovered config file: {}", CONFIG_FILENAME);
                config
            }
            None => ConfigFile::default(),
        },
    };

    let format = resolve_format(&args, &config)?;
    let output = args.output.clone();
    let request = build_request(args, config)?;

    // Create adapters (Dependency Injection)
    let use_case = GenerateDocumentUseCase::new(
        ImageInspector::new(),
        FileSystemReader::new(),
        StderrProgressReporter::new(),
    );

    // Execute use case
    let response = use_case.execute(request).await?;

    // Format and present output
    eprintln!("{}", FormatterFactory::progress_message(format));
    let formatted = FormatterFactory::create(format).format(&response.document)?;
    let presenter = PresenterFactory::for_document(
        output.as_deref(),
        response.document.metadata().name(),
        format,
    );
    presenter.present(&formatted)?;
    eprintln!("✅ SPDX document written to {}", presenter.destination());

    VerificationSummary::print(&response.outcomes, &response.correlation);

    Ok(if response.is_verified() {
        ExitCode::Success
    } else {
        ExitCode::VerificationFailed
    })
}

/// CLI flag, then config file, then JSON
fn resolve_format(args: &Args, config: &ConfigFile) -> Result<OutputFormat> {
    if let Some(format) = args.format {
        return Ok(format);
    }
    match config.format.as_deref() {
        Some(format) => OutputFormat::from_str(format).map_err(anyhow::Error::msg),
        None => Ok(OutputFormat::default()),
    }
}

/// Merges CLI arguments over config file values
fn build_request(args: Args, config: ConfigFile) -> Result<GenerateDocumentRequest> {
    let created = MetadataGenerator::creation_time(
        std::env::var("SOURCE_DATE_EPOCH").ok().as_deref(),
    )?;

    let artifacts = args
        .image
        .into_iter()
        .map(ArtifactSource::Image)
        .chain(args.tarball.into_iter().map(ArtifactSource::Tarball))
        .collect();

    let mut request = GenerateDocumentRequest::new(artifacts, created);
    request.provenance = if args.provenance.is_empty() {
        config.provenance.unwrap_or_default()
    } else {
        args.provenance
    };
    request.document_name = args.name.or(config.document_name);
    request.namespace = args.namespace.or(config.namespace);
    request.workers = args.workers.or(config.workers).unwrap_or(DEFAULT_WORKERS);

    if let Some(creator) = args.creator.or(config.creator) {
        validate_creator(&creator)?;
        request.creators.push(creator);
    }

    request.options.analyze_layers = args.analyze_layers || config.analyze_layers.unwrap_or(false);
    request.options.provider_options = config.provider_options.unwrap_or_default();
    request.options.provider_options.extend(args.provider_options);

    Ok(request)
}
