use super::fetch_orchestrator::{FetchOrchestrator, Providers};
use crate::application::dto::{OutputFormat, SbomRequest, SbomResponse};
use crate::application::factories::FormatterFactory;
use crate::ports::outbound::{FeedReader, ManifestReader, ProgressEvent, ProgressSink};
use crate::sbom_generation::domain::{
    Coverage, CoverageDepth, DependencyDeclaration, DependencyOutcome, Insights, KnownUnknown,
    KnownUnknownCategory, PackageAnalysis, PackageManifest, ProjectInfo, ProjectManifest,
    SbomAggregate, SbomDocuments,
};
use crate::sbom_generation::services::{derive_outdated, FeedMerger, SbomGenerator};
use crate::shared::error::SbomError;
use crate::shared::Result;
use tokio::time::Instant;
use tracing::info;

/// GenerateSbomUseCase - Core use case for SBOM generation
///
/// Reads the manifests, fans the declarations out through a per-run
/// `FetchOrchestrator`, assembles the aggregate after every outcome has
/// settled, merges the optional feeds and renders the three documents.
///
/// # Type Parameters
/// * `MR` - ManifestReader implementation
/// * `FR` - FeedReader implementation
pub struct GenerateSbomUseCase<MR, FR> {
    manifest_reader: MR,
    feed_reader: FR,
    providers: Providers,
    progress: ProgressSink,
}

/// Which package and list an outcome belongs to
struct Slot {
    package: usize,
    is_dev: bool,
}

impl<MR, FR> GenerateSbomUseCase<MR, FR>
where
    MR: ManifestReader,
    FR: FeedReader,
{
    /// Creates a new GenerateSbomUseCase with injected dependencies
    pub fn new(manifest_reader: MR, feed_reader: FR, providers: Providers, progress: ProgressSink) -> Self {
        Self {
            manifest_reader,
            feed_reader,
            providers,
            progress,
        }
    }

    /// Executes the SBOM generation use case
    ///
    /// # Errors
    /// Fails only for invalid options, a missing or unparsable manifest,
    /// unreadable feeds or a top-level serialization failure. Provider
    /// failures never fail the run.
    pub async fn execute(&self, request: SbomRequest) -> Result<SbomResponse> {
        request
            .options
            .validate()
            .map_err(|message| SbomError::Validation { message })?;

        // Step 1: Manifests (fatal on failure, before any fetching)
        self.report(format!(
            "📖 Reading package.json from: {}",
            request.project_path.display()
        ));
        let root = PackageManifest {
            path: None,
            manifest: self.manifest_reader.read_manifest(&request.project_path)?,
        };
        let manifests = self.collect_manifests(&request, root.clone())?;
        let is_monorepo = manifests.iter().any(|m| m.path.is_some());

        // Step 2: Declarations, one flat batch so the concurrency bound is global
        let mut packages = Vec::new();
        let mut slots = Vec::new();
        let mut declarations: Vec<DependencyDeclaration> = Vec::new();
        let mut known_unknowns = Vec::new();

        for (index, member) in manifests.iter().enumerate() {
            let (valid, rejected) = member.manifest.declarations(request.options.include_dev_deps);
            for (name, range) in rejected {
                known_unknowns.push(KnownUnknown::new(
                    name,
                    range,
                    "package name is not a valid npm package name",
                    KnownUnknownCategory::Unknown,
                ));
            }
            for declaration in valid {
                slots.push(Slot {
                    package: index,
                    is_dev: declaration.is_dev(),
                });
                declarations.push(declaration);
            }
            packages.push(PackageAnalysis {
                name: member.manifest.name.clone(),
                version: member.manifest.version.clone(),
                path: member.path.clone(),
                ..Default::default()
            });
        }

        self.report(format!(
            "✅ Detected {} declared dependencies in {} package(s)",
            declarations.len(),
            packages.len()
        ));

        // Step 3: Fetch phase
        self.report("🔍 Fetching package metadata...".to_string());
        let orchestrator = FetchOrchestrator::new(self.providers.clone(), request.options.clone());
        let deadline = request.timeout.map(|timeout| Instant::now() + timeout);
        let outcomes = orchestrator
            .analyze(&declarations, deadline, &self.progress)
            .await;

        // Step 4: Barrier passed, every outcome is settled
        for (slot, outcome) in slots.into_iter().zip(outcomes) {
            match outcome {
                DependencyOutcome::Record(record) => {
                    let package = &mut packages[slot.package];
                    if slot.is_dev {
                        package.dev_dependencies.push(*record);
                    } else {
                        package.dependencies.push(*record);
                    }
                }
                DependencyOutcome::Unknown(unknown) => known_unknowns.push(unknown),
            }
        }

        let mut aggregate = self.assemble(&request, &root.manifest, is_monorepo, packages, known_unknowns);
        SbomGenerator::finalize(&mut aggregate)?;

        // Step 5: Optional feeds, merged without re-fetching
        if let Some(path) = &request.outdated_feed {
            self.report("📥 Merging outdated feed...".to_string());
            let feed = self.feed_reader.read_outdated(path)?;
            FeedMerger::apply_outdated(&mut aggregate, feed)?;
        }
        if let Some(path) = &request.audit_feed {
            self.report("📥 Merging audit feed...".to_string());
            let feed = self.feed_reader.read_audit(path)?;
            FeedMerger::apply_audit(&mut aggregate, &feed)?;
        }

        // Step 6: Documents
        aggregate.documents = Some(self.render(&request, &aggregate)?);

        info!(
            dependencies = aggregate.total_dependencies,
            known_unknowns = aggregate.known_unknowns.len(),
            peak_in_flight = orchestrator.peak_in_flight(),
            "analysis complete"
        );
        self.report(format!(
            "✅ Analyzed {} dependencies ({} known unknowns)",
            aggregate.total_dependencies,
            aggregate.known_unknowns.len()
        ));

        Ok(SbomResponse::new(aggregate))
    }

    fn report(&self, message: String) {
        self.progress.send(ProgressEvent::message(message));
    }

    /// The root manifest alone, or the workspace members. In a monorepo the
    /// root is kept as a package only when it declares dependencies itself.
    fn collect_manifests(&self, request: &SbomRequest, root: PackageManifest) -> Result<Vec<PackageManifest>> {
        let mut patterns: Vec<String> = root.manifest.workspace_patterns().to_vec();
        patterns.extend(request.workspaces.iter().cloned());
        if patterns.is_empty() {
            return Ok(vec![root]);
        }

        let members = self
            .manifest_reader
            .read_workspace_members(&request.project_path, &patterns)?;
        if members.is_empty() {
            return Ok(vec![root]);
        }

        self.report(format!("📦 Found {} workspace member(s)", members.len()));

        let root_declares = !root.manifest.dependencies.is_empty()
            || (request.options.include_dev_deps && !root.manifest.dev_dependencies.is_empty());
        let mut manifests = Vec::with_capacity(members.len() + 1);
        if root_declares {
            manifests.push(root);
        }
        manifests.extend(members);
        Ok(manifests)
    }

    fn assemble(
        &self,
        request: &SbomRequest,
        root: &ProjectManifest,
        is_monorepo: bool,
        packages: Vec<PackageAnalysis>,
        known_unknowns: Vec<KnownUnknown>,
    ) -> SbomAggregate {
        let metadata = SbomGenerator::generate_default_metadata();
        let coverage = Coverage {
            depth: if request.options.include_transitive_deps {
                CoverageDepth::Transitive
            } else {
                CoverageDepth::TopLevel
            },
            tool_name: metadata.tool_name().to_string(),
            tool_version: metadata.tool_version().to_string(),
            timestamp: metadata.generated_at(),
        };
        let outdated = Some(derive_outdated(&packages));

        SbomAggregate {
            metadata,
            project: ProjectInfo {
                name: root.name.clone().unwrap_or_default(),
                version: root.version.clone().unwrap_or_default(),
                license: root.license.clone(),
            },
            is_monorepo,
            packages,
            total_dependencies: 0,
            insights: Insights::default(),
            outdated,
            audit: None,
            coverage,
            known_unknowns,
            compliance: None,
            integrity_hash: None,
            documents: None,
        }
    }

    fn render(&self, request: &SbomRequest, aggregate: &SbomAggregate) -> Result<SbomDocuments> {
        let render = |format: OutputFormat| -> Result<String> {
            self.report(FormatterFactory::progress_message(format).to_string());
            match FormatterFactory::create(format, &request.options) {
                Some(formatter) => formatter.format(aggregate),
                None => Ok(String::new()),
            }
        };

        Ok(SbomDocuments {
            markdown: render(OutputFormat::Markdown)?,
            spdx: render(OutputFormat::Spdx)?,
            cyclonedx: render(OutputFormat::CycloneDx)?,
        })
    }
}
