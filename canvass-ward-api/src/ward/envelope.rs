use http::StatusCode;
use serde_json::Value;

/// The backend responded, but signaled failure in its envelope.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[error("{message}")]
pub struct DomainError {
    pub message: String,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Normalizes the heterogeneous WARD response conventions into one result.
///
/// The endpoints of the backend disagree on how success is signaled:
/// `{"status": "success"}`, `{"success": true}`, `{"ok": true}`,
/// `{"result": "ok"}` and an entirely empty body are all in use. All of
/// them are accepted here; `recognizes_success` is the single audit point
/// for that list. This function is total: any body, including non-JSON
/// text, degrades to a `DomainError` with a best-effort message.
pub fn parse(status: StatusCode, body: &str) -> Result<Value, DomainError> {

    let trimmed = body.trim();

    if trimmed.is_empty() {
        return if status.is_success() {
            Ok(Value::Null)
        } else {
            Err(DomainError::new(http_status_message(status)))
        };
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => {
            if recognizes_success(&value) {
                Ok(extract_payload(value))
            }
            else if recognizes_failure(&value) {
                Err(DomainError::new(failure_message(&value, status)))
            }
            else if status.is_success() {
                // Some read endpoints return bare rows without any envelope.
                Ok(extract_payload(value))
            }
            else {
                Err(DomainError::new(failure_message(&value, status)))
            }
        }
        Err(_) => {
            Err(DomainError::new(String::from(trimmed)))
        }
    }
}

fn recognizes_success(value: &Value) -> bool {
    value.get("status").and_then(Value::as_str) == Some("success")
        || value.get("success").and_then(Value::as_bool) == Some(true)
        || value.get("ok").and_then(Value::as_bool) == Some(true)
        || value.get("result").and_then(Value::as_str) == Some("ok")
}

fn recognizes_failure(value: &Value) -> bool {
    matches!(value.get("status").and_then(Value::as_str), Some("error") | Some("fail"))
        || value.get("success").and_then(Value::as_bool) == Some(false)
        || value.get("ok").and_then(Value::as_bool) == Some(false)
        || value.get("error").is_some()
}

fn failure_message(value: &Value, status: StatusCode) -> String {
    value.get("message").and_then(Value::as_str)
        .or_else(|| value.get("error").and_then(Value::as_str))
        .map(String::from)
        .unwrap_or_else(|| http_status_message(status))
}

fn extract_payload(mut value: Value) -> Value {
    match value.get_mut("data") {
        Some(data) => data.take(),
        None => value,
    }
}

fn http_status_message(status: StatusCode) -> String {
    format!("HTTP {status}")
}


#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::status_field(r#"{"status": "success", "data": [1, 2]}"#)]
    #[case::success_flag(r#"{"success": true, "data": [1, 2]}"#)]
    #[case::ok_flag(r#"{"ok": true, "data": [1, 2]}"#)]
    #[case::result_field(r#"{"result": "ok", "data": [1, 2]}"#)]
    fn should_recognize_every_success_convention(#[case] body: &str) -> anyhow::Result<()> {

        let result = parse(StatusCode::OK, body);
        assert_that!(result, ok(eq(json!([1, 2]))));

        Ok(())
    }

    #[test]
    fn should_treat_an_empty_body_as_success_without_payload() {

        let result = parse(StatusCode::OK, "");
        assert_that!(result, ok(eq(Value::Null)));

        let result = parse(StatusCode::NO_CONTENT, "  ");
        assert_that!(result, ok(eq(Value::Null)));
    }

    #[test]
    fn should_accept_bare_rows_without_an_envelope() {

        let result = parse(StatusCode::OK, r#"[{"id": 1}]"#);
        assert_that!(result, ok(eq(json!([{"id": 1}]))));
    }

    #[test]
    fn should_extract_the_backend_message_on_failure() {

        let result = parse(StatusCode::OK, r#"{"status": "error", "message": "already approved"}"#);
        assert_that!(result, err(eq(DomainError::new("already approved"))));

        let result = parse(StatusCode::BAD_REQUEST, r#"{"success": false, "error": "missing field 'id'"}"#);
        assert_that!(result, err(eq(DomainError::new("missing field 'id'"))));
    }

    #[test]
    fn should_fall_back_to_the_raw_text_for_non_json_bodies() {

        let result = parse(StatusCode::INTERNAL_SERVER_ERROR, "<html>Fatal error</html>");
        assert_that!(result, err(eq(DomainError::new("<html>Fatal error</html>"))));
    }

    #[test]
    fn should_synthesize_a_message_from_the_status_code() {

        let result = parse(StatusCode::NOT_FOUND, "");
        assert_that!(result, err(eq(DomainError::new("HTTP 404 Not Found"))));

        let result = parse(StatusCode::FORBIDDEN, r#"{"status": "fail"}"#);
        assert_that!(result, err(eq(DomainError::new("HTTP 403 Forbidden"))));
    }

    #[test]
    fn should_treat_json_without_markers_on_an_error_status_as_failure() {

        let result = parse(StatusCode::BAD_GATEWAY, r#"{"unexpected": "shape"}"#);
        assert_that!(result, err(eq(DomainError::new("HTTP 502 Bad Gateway"))));
    }
}
