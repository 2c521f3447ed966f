// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod couch_repository;
