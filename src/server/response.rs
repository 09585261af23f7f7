use crate::context::ResponseState;
use may_minihttp::Response;
use serde_json::Value;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Write the response state an action chain built on the context.
///
/// Headers set by actions are passed through; a Content-Type derived from
/// the body shape is added only when the chain did not set one.
pub fn write_response(res: &mut Response, state: &ResponseState) {
    res.status_code(state.status as usize, status_reason(state.status));

    for (name, value) in &state.headers {
        let header = format!("{name}: {value}").into_boxed_str();
        res.header(Box::leak(header));
    }

    if state.get_header("content-type").is_none() {
        match &state.body {
            Value::Null => {}
            Value::String(_) => {
                res.header("Content-Type: text/plain");
            }
            _ => {
                res.header("Content-Type: application/json");
            }
        }
    }

    match &state.body {
        Value::Null => {
            res.body_vec(Vec::new());
        }
        Value::String(s) => {
            res.body_vec(s.clone().into_bytes());
        }
        other => {
            res.body_vec(serde_json::to_vec(other).unwrap_or_default());
        }
    }
}

/// Write a JSON body with the given status.
pub fn write_json(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

/// Write a JSON error body with the given status.
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    write_json(res, status, body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(503), "Service Unavailable");
        assert_eq!(status_reason(999), "OK");
    }
}
