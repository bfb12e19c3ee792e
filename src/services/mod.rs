/// Success audio cue backends.
pub mod audio;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Press reporting and LED state for nodes.
pub mod node_service;
/// Round snapshot and forced reset.
pub mod round_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
