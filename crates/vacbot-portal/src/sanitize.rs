use serde_json::Value;

const SENSITIVE_KEYS: [&str; 11] = [
    "auth",
    "users",
    "user",
    "owner",
    "token",
    "userId",
    "userid",
    "accessToken",
    "uid",
    "email",
    "password",
];

/// Returns a copy of `data` safe for logging: values of credential-bearing
/// top-level keys are replaced with a marker. Non-object values pass through
/// untouched.
pub fn sanitize_data(data: &Value) -> Value {
    let map = match data.as_object() {
        Some(map) => map,
        None => return data.clone(),
    };

    let mut sanitized = map.clone();
    for key in SENSITIVE_KEYS {
        if let Some(value) = sanitized.get_mut(key) {
            *value = Value::String("[REMOVED]".to_string());
        }
    }
    Value::Object(sanitized)
}
