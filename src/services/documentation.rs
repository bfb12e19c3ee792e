use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the coordinator.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::node::report_press,
        crate::routes::node::led_state,
        crate::routes::round::current_round,
        crate::routes::round::force_reset,
        crate::routes::sse::public_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::node::PressResponse,
            crate::dto::node::LedStateResponse,
            crate::dto::node::ErrorResponse,
            crate::dto::round::RoundSnapshotResponse,
            crate::dto::sse::RoundOpenedEvent,
            crate::dto::sse::NodePressedEvent,
            crate::dto::sse::RoundDecidedEvent,
            crate::dto::sse::RoundResetEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "nodes", description = "Press reporting and LED state for button nodes"),
        (name = "round", description = "Round inspection and reset"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn led_color_is_documented_as_byte_array() {
        let doc: Value = serde_json::from_str(&ApiDoc::openapi().to_json().unwrap()).unwrap();
        let schemas = &doc["components"]["schemas"];
        let color = &schemas["LedStateResponse"]["properties"]["color"];
        let color = match color["$ref"].as_str() {
            Some(reference) => &schemas[reference.trim_start_matches("#/components/schemas/")],
            None => color,
        };
        assert_eq!(color["type"], "array");
        assert_eq!(color["items"]["type"], "integer");
    }
}
