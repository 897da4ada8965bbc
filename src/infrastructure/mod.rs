// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod csv_source;
pub mod http_response;
pub mod json_mapper;
pub mod memo_cache;
pub mod synthetic_source;
