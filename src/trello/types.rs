use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Trello card.
///
/// Only the fields the reports read are typed; everything else Trello returns is
/// kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_list: Option<String>,
    #[serde(default)]
    pub closed: bool,
    /// ISO-8601 timestamp, or null when the card has no due date
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub id_members: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Trello list (column on a board)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct List {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for `POST /cards`.
///
/// Caller-supplied fields are carried as raw JSON so Trello sees exactly what
/// the agent sent, mistyped or not.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub id_list: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    pub desc: Value,
}

/// Request body for `PUT /cards/{id}` when moving a card
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_list: Option<Value>,
}

/// Request body for `POST /cards/{id}/idMembers`
#[derive(Debug, Clone, Serialize)]
pub struct AddMemberRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}
