//! HTTP client for the Keep notes API.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ChangeSet, Credentials, RemoteBody, RemoteClient, RemoteError, RemoteNote, RemoteResult,
};
use crate::models::{Note, NoteId};
use crate::text::{excerpt, non_empty};

pub const DEFAULT_AUTH_URL: &str = "https://android.clients.google.com/auth";
pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/notes/v1";

const OAUTH_SCOPES: &str =
    "oauth2:https://www.googleapis.com/auth/memento https://www.googleapis.com/auth/reminders";
const KEEP_APP: &str = "com.google.android.keep";
const KEEP_CLIENT_SIG: &str = "38918a453d07199354f8b19af05ec6562ced5788";
const NODE_KIND: &str = "notes#node";
const NODE_TYPE_NOTE: &str = "NOTE";
const NODE_TYPE_LIST_ITEM: &str = "LIST_ITEM";
const ROOT_PARENT_ID: &str = "root";
const ERROR_EXCERPT_CHARS: usize = 180;

/// Auth and API endpoints of the note service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepEndpoints {
    pub auth_url: String,
    pub api_url: String,
}

impl Default for KeepEndpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl KeepEndpoints {
    pub fn new(auth_url: impl Into<String>, api_url: impl Into<String>) -> RemoteResult<Self> {
        Ok(Self {
            auth_url: normalize_endpoint(auth_url.into(), "auth URL")?,
            api_url: normalize_endpoint(api_url.into(), "API URL")?,
        })
    }
}

pub struct KeepApiClient {
    endpoints: KeepEndpoints,
    client: Client,
    android_id: String,
    session_id: String,
    token: Option<String>,
}

impl KeepApiClient {
    pub fn new(endpoints: KeepEndpoints) -> RemoteResult<Self> {
        let device = Uuid::now_v7().simple().to_string();
        Ok(Self {
            endpoints,
            client: Client::builder().build()?,
            android_id: device[device.len() - 16..].to_string(),
            session_id: format!("s--{}--{}", Utc::now().timestamp_millis(), &device[..10]),
            token: None,
        })
    }
}

#[async_trait]
impl RemoteClient for KeepApiClient {
    async fn authenticate(&mut self, credentials: &Credentials) -> RemoteResult<()> {
        let params = [
            ("accountType", "HOSTED_OR_GOOGLE"),
            ("Email", credentials.username.as_str()),
            ("Passwd", credentials.password.as_str()),
            ("has_permission", "1"),
            ("service", OAUTH_SCOPES),
            ("source", "android"),
            ("androidId", self.android_id.as_str()),
            ("app", KEEP_APP),
            ("client_sig", KEEP_CLIENT_SIG),
            ("device_country", "us"),
            ("operatorCountry", "us"),
            ("lang", "en"),
            ("sdk_version", "17"),
        ];

        let response = self
            .client
            .post(&self.endpoints.auth_url)
            .form(&params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let fields = parse_auth_fields(&body);

        if let Some(code) = fields.get("Error") {
            return Err(RemoteError::Login(code.clone()));
        }
        if !status.is_success() {
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        let token = fields
            .get("Auth")
            .and_then(|token| non_empty(Some(token.clone())))
            .ok_or_else(|| {
                RemoteError::InvalidPayload("auth response did not include a token".to_string())
            })?;
        self.token = Some(token);
        Ok(())
    }

    async fn changes(&mut self, since: Option<&str>, outgoing: &[Note]) -> RemoteResult<ChangeSet> {
        let token = self.token.as_deref().ok_or(RemoteError::NotAuthenticated)?;

        let request = ChangesRequest {
            nodes: outgoing.iter().flat_map(note_to_nodes).collect(),
            client_timestamp: Utc::now(),
            request_header: RequestHeader::new(&self.session_id),
            target_version: since.map(str::to_string),
        };

        let response = self
            .client
            .post(format!("{}/changes", self.endpoints.api_url))
            .header("Authorization", format!("OAuth {token}"))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        let payload = response.json::<ChangesResponse>().await?;
        Ok(payload.into())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangesRequest {
    nodes: Vec<WireNode>,
    client_timestamp: DateTime<Utc>,
    request_header: RequestHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_version: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestHeader {
    client_session_id: String,
    client_platform: &'static str,
    client_version: ClientVersion,
    capabilities: Vec<Capability>,
}

impl RequestHeader {
    fn new(session_id: &str) -> Self {
        Self {
            client_session_id: session_id.to_string(),
            client_platform: "ANDROID",
            client_version: ClientVersion {
                major: "9",
                minor: "9",
                build: "9",
                revision: "9",
            },
            capabilities: ["NC", "PI", "LB", "AN", "SH", "DR", "TR", "IN", "SNB", "MI", "CO"]
                .into_iter()
                .map(|kind| Capability { kind })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClientVersion {
    major: &'static str,
    minor: &'static str,
    build: &'static str,
    revision: &'static str,
}

#[derive(Debug, Serialize)]
struct Capability {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangesResponse {
    to_version: String,
    #[serde(default)]
    nodes: Vec<WireNode>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNode {
    id: String,
    #[serde(default = "default_node_kind")]
    kind: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    timestamps: WireTimestamps,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct WireTimestamps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trashed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deleted: Option<DateTime<Utc>>,
}

fn default_node_kind() -> String {
    NODE_KIND.to_string()
}

/// The service marks unset trash/delete times with the epoch.
fn is_set(timestamp: Option<&DateTime<Utc>>) -> bool {
    timestamp.is_some_and(|value| value.timestamp_millis() > 0)
}

fn millis(timestamp: Option<&DateTime<Utc>>) -> i64 {
    timestamp.map_or(0, DateTime::timestamp_millis)
}

fn from_millis(value: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value).unwrap_or(DateTime::UNIX_EPOCH)
}

fn note_to_nodes(note: &Note) -> [WireNode; 2] {
    let created = Some(from_millis(note.created_at));
    let updated = Some(from_millis(note.updated_at));
    let trashed = Some(if note.trashed {
        from_millis(note.updated_at)
    } else {
        DateTime::UNIX_EPOCH
    });

    [
        WireNode {
            id: note.id.to_string(),
            kind: default_node_kind(),
            node_type: NODE_TYPE_NOTE.to_string(),
            parent_id: ROOT_PARENT_ID.to_string(),
            title: note.title.clone(),
            text: String::new(),
            timestamps: WireTimestamps {
                created,
                updated,
                trashed,
                deleted: None,
            },
        },
        WireNode {
            id: note.body_id.to_string(),
            kind: default_node_kind(),
            node_type: NODE_TYPE_LIST_ITEM.to_string(),
            parent_id: note.id.to_string(),
            title: String::new(),
            text: note.text.clone(),
            timestamps: WireTimestamps {
                created,
                updated,
                trashed: None,
                deleted: None,
            },
        },
    ]
}

impl From<ChangesResponse> for ChangeSet {
    fn from(value: ChangesResponse) -> Self {
        let mut change_set = Self {
            to_version: value.to_version,
            truncated: value.truncated,
            ..Self::default()
        };

        for node in value.nodes {
            let deleted = is_set(node.timestamps.deleted.as_ref());
            match node.node_type.as_str() {
                NODE_TYPE_NOTE if deleted => change_set.deleted.push(NoteId::from(node.id.as_str())),
                NODE_TYPE_NOTE => change_set.notes.push(RemoteNote {
                    id: NoteId::from(node.id.as_str()),
                    title: node.title,
                    created_at: millis(node.timestamps.created.as_ref()),
                    updated_at: millis(node.timestamps.updated.as_ref()),
                    trashed: is_set(node.timestamps.trashed.as_ref()),
                }),
                NODE_TYPE_LIST_ITEM if !deleted => change_set.bodies.push(RemoteBody {
                    note_id: NoteId::from(node.parent_id.as_str()),
                    body_id: NoteId::from(node.id.as_str()),
                    text: node.text,
                }),
                other => tracing::trace!("Ignoring {} node {}", other, node.id),
            }
        }

        change_set
    }
}

fn parse_auth_fields(body: &str) -> HashMap<String, String> {
    body.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = excerpt(body, ERROR_EXCERPT_CHARS);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String, label: &str) -> RemoteResult<String> {
    let endpoint = non_empty(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration(format!("{label} must not be empty"))
    })?;
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(format!(
            "{label} must include http:// or https://"
        )))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn endpoints_reject_invalid_values() {
        assert!(KeepEndpoints::new("", DEFAULT_API_URL).is_err());
        let error = KeepEndpoints::new(DEFAULT_AUTH_URL, "www.googleapis.com")
            .err()
            .unwrap();
        assert!(error.to_string().contains("http:// or https://"));
    }

    #[test]
    fn endpoints_trim_trailing_slash() {
        let endpoints =
            KeepEndpoints::new(" https://auth.example.com/ ", "https://api.example.com/v1/")
                .unwrap();
        assert_eq!(endpoints.auth_url, "https://auth.example.com");
        assert_eq!(endpoints.api_url, "https://api.example.com/v1");
    }

    #[test]
    fn parse_auth_fields_reads_error_code() {
        let fields = parse_auth_fields("Error=NeedsBrowser\nUrl=https://accounts.example.com\n");
        assert_eq!(fields.get("Error").map(String::as_str), Some("NeedsBrowser"));
        assert_eq!(
            fields.get("Url").map(String::as_str),
            Some("https://accounts.example.com")
        );
    }

    #[test]
    fn note_is_sent_as_note_and_list_item() {
        let note = Note::new("Groceries", "milk");
        let [header, body] = note_to_nodes(&note);

        assert_eq!(header.node_type, NODE_TYPE_NOTE);
        assert_eq!(header.parent_id, ROOT_PARENT_ID);
        assert_eq!(header.title, "Groceries");
        assert!(!is_set(header.timestamps.trashed.as_ref()));

        assert_eq!(body.node_type, NODE_TYPE_LIST_ITEM);
        assert_eq!(body.id, note.body_id.to_string());
        assert_eq!(body.parent_id, note.id.to_string());
        assert_eq!(body.text, "milk");
    }

    #[test]
    fn changes_response_maps_nodes() {
        let payload = r#"{
            "toVersion": "v2",
            "truncated": true,
            "nodes": [
                {"id": "n1", "type": "NOTE", "parentId": "root", "title": "Todo",
                 "timestamps": {"created": "2024-01-01T00:00:00Z", "updated": "2024-01-02T00:00:00Z",
                                "trashed": "1970-01-01T00:00:00Z"}},
                {"id": "b1", "type": "LIST_ITEM", "parentId": "n1", "text": "call mom"},
                {"id": "n2", "type": "NOTE", "parentId": "root",
                 "timestamps": {"deleted": "2024-01-03T00:00:00Z"}},
                {"id": "l1", "type": "LABEL"}
            ]
        }"#;
        let response: ChangesResponse = serde_json::from_str(payload).unwrap();
        let change_set = ChangeSet::from(response);

        assert_eq!(change_set.to_version, "v2");
        assert!(change_set.truncated);
        assert_eq!(change_set.notes.len(), 1);
        assert_eq!(change_set.notes[0].title, "Todo");
        assert!(!change_set.notes[0].trashed);
        assert_eq!(change_set.notes[0].created_at, 1_704_067_200_000);
        assert_eq!(
            change_set.bodies,
            vec![RemoteBody {
                note_id: NoteId::from("n1"),
                body_id: NoteId::from("b1"),
                text: "call mom".to_string(),
            }]
        );
        assert_eq!(change_set.deleted, vec![NoteId::from("n2")]);
    }

    #[test]
    fn parse_api_error_prefers_message() {
        let message = parse_api_error(
            StatusCode::FORBIDDEN,
            r#"{"error": {"message": "Insufficient permission"}}"#,
        );
        assert_eq!(message, "Insufficient permission (403)");
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[tokio::test]
    async fn changes_require_authentication() {
        let mut client = KeepApiClient::new(KeepEndpoints::default()).unwrap();
        let error = client.changes(None, &[]).await.unwrap_err();
        assert!(matches!(error, RemoteError::NotAuthenticated));
    }
}
