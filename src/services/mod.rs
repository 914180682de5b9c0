/// Operator console operations.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Engine actor owning the scoreboard state.
pub mod engine_service;
/// Spreadsheet export.
pub mod export_service;
/// Health check service.
pub mod health_service;
/// CSV import of rosters and question banks.
pub mod import_service;
/// Read-only projections for audience views.
pub mod public_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Background persistence writer.
pub mod storage_supervisor;
