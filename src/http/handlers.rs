use super::filter;
use super::AppState;
use crate::hooks::{
    AssigneeChange, CommitReceived, HashtagChange, PreUpload, RefReceived, ValidationError,
};
use crate::model::account::AccountId;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

#[derive(Debug, serde::Serialize)]
pub struct Ack {
    pub status: &'static str,
}

impl Ack {
    fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ReceivePack {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub commit: String,
}

pub async fn receive_pack(
    State(state): State<AppState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ReceivePack>,
) -> Result<Json<Ack>, ValidationError> {
    let principal = filter::principal(&headers);
    let commit = CommitReceived {
        project: project.clone(),
        ref_name: payload.ref_name.clone(),
        commit: payload.commit,
    };
    state.validator.on_commit_received(&principal, &commit).await?;
    let operation = RefReceived {
        project,
        ref_name: payload.ref_name,
    };
    state.validator.on_ref_operation(&principal, &operation).await?;
    Ok(Json(Ack::ok()))
}

#[derive(Debug, serde::Deserialize)]
pub struct UploadPack {
    #[serde(default)]
    pub wants: Vec<String>,
}

pub async fn upload_pack(
    State(state): State<AppState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UploadPack>,
) -> Result<Json<Ack>, ValidationError> {
    let principal = filter::principal(&headers);
    let upload = PreUpload {
        project,
        wants: payload.wants,
    };
    state.validator.on_pre_upload(&principal, &upload).await?;
    Ok(Json(Ack::ok()))
}

#[derive(Debug, serde::Deserialize)]
pub struct SetAssignee {
    pub assignee: String,
}

pub async fn set_assignee(
    State(state): State<AppState>,
    Path(change): Path<u64>,
    headers: HeaderMap,
    Json(payload): Json<SetAssignee>,
) -> Result<Json<Ack>, ValidationError> {
    let principal = filter::principal(&headers);
    let event = AssigneeChange {
        change,
        assignee: AccountId::new(payload.assignee),
    };
    state.validator.validate_assignee(&principal, &event).await?;
    Ok(Json(Ack::ok()))
}

#[derive(Debug, serde::Deserialize)]
pub struct EditHashtags {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

pub async fn edit_hashtags(
    State(state): State<AppState>,
    Path(change): Path<u64>,
    headers: HeaderMap,
    Json(payload): Json<EditHashtags>,
) -> Result<Json<Ack>, ValidationError> {
    let principal = filter::principal(&headers);
    let event = HashtagChange {
        change,
        to_add: payload.add,
        to_remove: payload.remove,
    };
    state.validator.validate_hashtags(&principal, &event).await?;
    Ok(Json(Ack::ok()))
}
