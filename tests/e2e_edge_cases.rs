//! End-to-end integration tests for the plugin surface and its edge cases.
//!
//! Covers the init/reset lifecycle, fixed replies, interface versions,
//! upstream failures and malformed parameters.

use geom_reader::plugin::{BUILD_DATE, DEFAULT_METHOD, MAX_INTERFACE_VERSION, PLUGIN_VERSION};
use geom_reader::{
    Error, ErrorKind, FetchQuery, FetchResult, GeomReader, MemorySource, NameValueList,
    PluginCall, Value,
};
use pretty_assertions::assert_eq;

const SIGNAL: &str = "/magnetics/pickup";
const SHOT: i64 = 1234;

fn reader() -> GeomReader<MemorySource> {
    let reader = GeomReader::open_memory();
    reader
        .source()
        .insert_json(
            SIGNAL,
            SHOT,
            r#"{"name":"root","children":[{"name":"probe","atomics":[{"name":"gain","type":"double","data":0.5}]}]}"#,
        )
        .unwrap();
    reader
}

fn get_args(source: i64, key: &str) -> NameValueList {
    NameValueList::new()
        .with("host", "localhost")
        .with("port", 56565)
        .with("source", source)
        .with("signal", SIGNAL)
        .with("key", key)
}

// ============================================================================
// 1. Lifecycle
// ============================================================================

#[tokio::test]
async fn test_reset_before_init_is_noop() {
    let mut reader = reader();
    assert!(!reader.is_initialised());
    reader.reset();
    assert!(!reader.is_initialised());
}

#[tokio::test]
async fn test_first_call_initialises() {
    let mut reader = reader();
    reader.handle(&PluginCall::new("version")).await.unwrap();
    assert!(reader.is_initialised());
}

#[tokio::test]
async fn test_init_then_reset() {
    let mut reader = reader();
    let block = reader.handle(&PluginCall::new("initialise")).await.unwrap();
    assert!(block.is_empty());
    assert!(reader.is_initialised());

    let block = reader.handle(&PluginCall::new("reset")).await.unwrap();
    assert!(block.is_empty());
    assert!(!reader.is_initialised());
}

#[tokio::test]
async fn test_housekeeping_resets() {
    let mut reader = reader();
    reader.init();
    let block = reader.handle(&PluginCall::new("get").housekeeping()).await.unwrap();
    assert!(block.is_empty());
    assert!(!reader.is_initialised());
}

#[tokio::test]
async fn test_reinit_keeps_working() {
    let mut reader = reader();
    reader.init();
    reader.init();
    let call = PluginCall::new("get").with_args(get_args(SHOT, "probe.gain"));
    let block = reader.handle(&call).await.unwrap();
    assert_eq!(block.value(), Some(&Value::Double(0.5)));
}

// ============================================================================
// 2. Fixed replies
// ============================================================================

#[tokio::test]
async fn test_version_and_max_interface_version() {
    let mut reader = reader();
    let version = reader.handle(&PluginCall::new("version")).await.unwrap();
    assert_eq!(version.value(), Some(&Value::Int(PLUGIN_VERSION)));

    let max = reader.handle(&PluginCall::new("MaxInterfaceVersion")).await.unwrap();
    assert_eq!(max.value(), Some(&Value::Int(MAX_INTERFACE_VERSION as i32)));
}

#[tokio::test]
async fn test_text_replies() {
    let mut reader = reader();
    let help = reader.handle(&PluginCall::new("help")).await.unwrap();
    assert!(help.as_text().unwrap().contains("custom_passive"));
    assert_eq!(help.rank, 1);

    let date = reader.handle(&PluginCall::new("builddate")).await.unwrap();
    assert_eq!(date.as_text(), Some(BUILD_DATE));

    let method = reader.handle(&PluginCall::new("defaultmethod")).await.unwrap();
    assert_eq!(method.as_text(), Some(DEFAULT_METHOD));
}

// ============================================================================
// 3. Refused calls
// ============================================================================

#[tokio::test]
async fn test_unknown_function() {
    let mut reader = reader();
    let err = reader.handle(&PluginCall::new("frobnicate")).await.unwrap_err();
    assert!(matches!(err, Error::UnknownFunction(ref f) if f == "frobnicate"));
}

#[tokio::test]
async fn test_interface_version_too_new() {
    let mut reader = reader();
    let call = PluginCall::new("version").with_interface_version(MAX_INTERFACE_VERSION + 1);
    let err = reader.handle(&call).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedInterfaceVersion);
    assert!(!reader.is_initialised());
}

// ============================================================================
// 4. Upstream failures
// ============================================================================

#[tokio::test]
async fn test_unregistered_signal() {
    let mut reader = reader();
    let call = PluginCall::new("get").with_args(get_args(9999, "probe.gain"));
    let err = reader.handle(&call).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFetchFailed);
}

#[tokio::test]
async fn test_failed_status_wins() {
    let mut reader = reader();
    reader
        .source()
        .insert_result(FetchQuery::new(SIGNAL, 7), FetchResult::failed(-42, "server down"));
    let call = PluginCall::new("get").with_args(get_args(7, "probe.gain"));
    match reader.handle(&call).await.unwrap_err() {
        Error::UpstreamFetchFailed { code, message } => {
            assert_eq!(code, -42);
            assert_eq!(message, "server down");
        }
        other => panic!("expected UpstreamFetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_payload_not_a_tree() {
    let mut reader = reader();
    reader
        .source()
        .insert_result(FetchQuery::new(SIGNAL, 8), FetchResult::not_tree("scalar double"));
    let call = PluginCall::new("get").with_args(get_args(8, "probe.gain"));
    let err = reader.handle(&call).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamShapeMismatch);
}

// ============================================================================
// 5. Malformed parameters
// ============================================================================

#[tokio::test]
async fn test_missing_key() {
    let mut reader = reader();
    let args = NameValueList::new()
        .with("host", "localhost")
        .with("port", 56565)
        .with("source", SHOT)
        .with("signal", SIGNAL);
    let err = reader.handle(&PluginCall::new("get").with_args(args)).await.unwrap_err();
    assert!(matches!(err, Error::MissingParameter(ref p) if p == "key"));
}

#[tokio::test]
async fn test_bad_port() {
    let mut reader = reader();
    for port in ["sixty", "70000"] {
        let args = NameValueList::new()
            .with("host", "localhost")
            .with("port", port)
            .with("source", SHOT)
            .with("signal", SIGNAL)
            .with("key", "probe.gain");
        let err = reader.handle(&PluginCall::new("get").with_args(args)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "port"));
    }
}

#[tokio::test]
async fn test_negative_element() {
    let mut reader = reader();
    let args = get_args(SHOT, "probe.gain").with("element", -1).with("custom_passive", "");
    let err = reader.handle(&PluginCall::new("get").with_args(args)).await.unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "element"));
}

#[tokio::test]
async fn test_empty_key() {
    let mut reader = reader();
    let err = reader
        .handle(&PluginCall::new("get").with_args(get_args(SHOT, "")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyPath);
}
