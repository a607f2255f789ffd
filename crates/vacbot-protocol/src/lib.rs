//! Wire types and envelope construction for the vacuum cloud portal.

use serde::Serialize;
use serde_json::{json, Value};

/// Wire name of the clean-log fetch command. It is the one command the
/// portal serves from a different endpoint with a flat request body.
pub const CLEAN_LOGS_NAME: &str = "GetCleanLogs";

pub const LOG_PATH: &str = "/lg/log.do";
pub const IOT_PATH: &str = "/iot/devmanager.do";

const DEVICE_TD: &str = "q";
const PAYLOAD_TYPE_JSON: &str = "j";

const HEADER_PRI: &str = "1";
const HEADER_TZM: i32 = 480;
const HEADER_VER: &str = "0.0.50";

const QUERY_CV: &str = "1.67.3";
const QUERY_T: &str = "a";
const QUERY_AV: &str = "1.3.1";

/// A command addressed to a vacuum, decided into its wire shape at
/// construction time.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Fetches the cleaning history from the portal's log endpoint.
    GetCleanLogs,
    /// Any other device operation, relayed through the IoT endpoint.
    Device(DeviceCommand),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceCommand {
    pub name: String,
    pub args: Vec<Value>,
}

impl Command {
    pub fn device(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Device(DeviceCommand {
            name: name.into(),
            args,
        })
    }

    pub fn get_clean_logs() -> Self {
        Self::GetCleanLogs
    }

    pub fn clean(mode: &str) -> Self {
        Self::device("clean", vec![Value::String(mode.to_string())])
    }

    pub fn charge() -> Self {
        Self::device("charge", Vec::new())
    }

    pub fn play_sound() -> Self {
        Self::device("playSound", Vec::new())
    }

    pub fn get_battery() -> Self {
        Self::device("getBattery", Vec::new())
    }

    /// The `td` query value this command travels under.
    pub fn td(&self) -> &str {
        match self {
            Self::GetCleanLogs => CLEAN_LOGS_NAME,
            Self::Device(_) => DEVICE_TD,
        }
    }
}

/// Identifying triple for one vacuum registered on the portal.
#[derive(Clone, Debug, PartialEq)]
pub struct Vacuum {
    pub did: String,
    pub resource: String,
    pub class: String,
}

impl Vacuum {
    pub fn new(did: impl Into<String>, resource: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            resource: resource.into(),
            class: class.into(),
        }
    }
}

/// Portal authentication payload, embedded verbatim under the `auth` key of
/// every request body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestAuth {
    #[serde(rename = "with")]
    pub with_kind: String,
    pub userid: String,
    pub realm: String,
    pub token: String,
    pub resource: String,
}

impl RequestAuth {
    pub fn new(
        userid: impl Into<String>,
        realm: impl Into<String>,
        token: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            with_kind: "users".to_string(),
            userid: userid.into(),
            realm: realm.into(),
            token: token.into(),
            resource: resource.into(),
        }
    }
}

/// One fully built portal exchange: the JSON body, the base endpoint URL,
/// and the endpoint URL with its query string.
#[derive(Clone, Debug, PartialEq)]
pub struct PortalRequest {
    pub body: Value,
    pub base_url: String,
    pub url: String,
}

/// Builds the request body and URLs for one command. Pure; `now` is the
/// wall-clock time in seconds (fractional) the caller captured for this
/// call.
pub fn build_request(
    portal_url: &str,
    command: &Command,
    vacuum: &Vacuum,
    auth: &RequestAuth,
    now: f64,
) -> PortalRequest {
    let (body, path, query_prefix) = match command {
        Command::GetCleanLogs => {
            let body = json!({
                "auth": auth,
                "td": CLEAN_LOGS_NAME,
                "did": vacuum.did,
                "resource": vacuum.resource,
            });
            (body, LOG_PATH, String::new())
        }
        Command::Device(device) => {
            let mut payload = json!({
                "header": {
                    "pri": HEADER_PRI,
                    "ts": now,
                    "tzm": HEADER_TZM,
                    "ver": HEADER_VER,
                }
            });
            // An empty argument list must leave `body` out entirely; the
            // portal treats a present-but-empty body differently.
            if !device.args.is_empty() {
                payload["body"] = json!({ "data": device.args });
            }

            let body = json!({
                "auth": auth,
                "cmdName": device.name,
                "payload": payload,
                "payloadType": PAYLOAD_TYPE_JSON,
                "td": DEVICE_TD,
                "toId": vacuum.did,
                "toRes": vacuum.resource,
                "toType": vacuum.class,
            });
            let prefix = format!("mid={}&did={}&", vacuum.class, vacuum.did);
            (body, IOT_PATH, prefix)
        }
    };

    let base_url = format!("{}{}", portal_url, path);
    let url = format!(
        "{}?{}td={}&u={}&cv={}&t={}&av={}",
        base_url,
        query_prefix,
        command.td(),
        auth.userid,
        QUERY_CV,
        QUERY_T,
        QUERY_AV
    );

    PortalRequest { body, base_url, url }
}

/// Root URL of the vendor portal for a continent code.
pub fn portal_url(continent: &str) -> String {
    format!("https://portal-{}.ecouser.net/api", continent)
}
