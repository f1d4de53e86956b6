/// Use cases module containing application business logic orchestration
mod fetch_orchestrator;
mod generate_sbom;

pub use fetch_orchestrator::{FetchOrchestrator, Providers};
pub use generate_sbom::GenerateSbomUseCase;
