//! CRUD surface over a [`SlideRepository`].
//!
//! One request kind maps to one repository operation. Required fields are
//! validated before the repository is touched; outcomes are reported with
//! HTTP-style status codes so any transport can relay them unchanged.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SlideError};
use crate::state::data::{required, SlideId, SlideRecord};
use crate::state::library::SlideRepository;

/// A caller's request, with fields exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideRequest {
    List,
    Create {
        image_path: Option<String>,
        description: Option<String>,
    },
    Update {
        id: Option<String>,
        image_path: Option<String>,
        description: Option<String>,
    },
    Delete {
        id: Option<String>,
    },
}

/// Outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    BadRequest,
    NotFound,
    InternalError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Created)
    }
}

impl From<&SlideError> for Status {
    fn from(err: &SlideError) -> Self {
        match err.status() {
            400 => Status::BadRequest,
            404 => Status::NotFound,
            _ => Status::InternalError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideResponse {
    pub status: Status,
    /// JSON body, if the operation produces one
    pub body: Option<String>,
}

impl SlideResponse {
    fn empty(status: Status) -> Self {
        Self { status, body: None }
    }

    fn json<T: Serialize>(status: Status, value: &T) -> Result<Self> {
        Ok(Self {
            status,
            body: Some(serde_json::to_string(value)?),
        })
    }

    fn error(err: &SlideError) -> Self {
        let body = serde_json::json!({ "error": err.to_string() }).to_string();
        Self {
            status: Status::from(err),
            body: Some(body),
        }
    }
}

/// Run `request` against `repo`.
pub fn handle<R: SlideRepository>(repo: &mut R, request: SlideRequest) -> SlideResponse {
    match dispatch(repo, request) {
        Ok(response) => response,
        Err(err) => {
            if err.is_client_error() {
                debug!("Rejected slide request: {err}");
            } else {
                warn!("Slide request failed: {err}");
            }
            SlideResponse::error(&err)
        }
    }
}

fn dispatch<R: SlideRepository>(repo: &mut R, request: SlideRequest) -> Result<SlideResponse> {
    match request {
        SlideRequest::List => SlideResponse::json(Status::Ok, &repo.list_slides()?),
        SlideRequest::Create {
            image_path,
            description,
        } => {
            let record = SlideRecord::from_fields(image_path.as_deref(), description.as_deref())?;
            let id = repo.create_slide(&record)?;
            SlideResponse::json(
                Status::Created,
                &serde_json::json!({
                    "id": id,
                    "imagePath": record.image_path,
                    "description": record.description,
                }),
            )
        }
        SlideRequest::Update {
            id,
            image_path,
            description,
        } => {
            let raw_id = required("id", id.as_deref())?;
            let record = SlideRecord::from_fields(image_path.as_deref(), description.as_deref())?;
            repo.update_slide(raw_id.parse::<SlideId>()?, &record)?;
            Ok(SlideResponse::empty(Status::Ok))
        }
        SlideRequest::Delete { id } => {
            let raw_id = required("id", id.as_deref())?;
            repo.delete_slide(raw_id.parse::<SlideId>()?)?;
            Ok(SlideResponse::empty(Status::Ok))
        }
    }
}
