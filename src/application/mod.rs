// Application layer - use cases over the chart domain
pub mod chart_service;
pub mod clock;
pub mod document_repository;
pub mod sync_service;
