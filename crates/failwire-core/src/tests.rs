//! Unit tests for failwire-core.

#[test]
fn test_crate_structure() {
    // Smoke test - verifies the module structure compiles
    use crate::{BufferedSink, ErrorPipeline, ErrorReply, PipelineConfig, RequestContext};
    use http::StatusCode;

    let _config = PipelineConfig::default();
    let _pipeline = ErrorPipeline::builder().build();
    let _ctx = RequestContext::new("CreateUser");
    let _reply = ErrorReply::empty(StatusCode::NOT_FOUND);
    let _sink = BufferedSink::new();
}
