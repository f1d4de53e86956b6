/// Ports module defining interfaces for hexagonal architecture
///
/// The core drives every external system (filesystem, network, console)
/// through the outbound ports defined here.
pub mod outbound;
