use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    /// Admin or teacher user id
    pub author_id: String,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    All,
    Students,
    Teachers,
}

impl Audience {
    pub fn as_str(&self) -> &str {
        match self {
            Audience::All => "all",
            Audience::Students => "students",
            Audience::Teachers => "teachers",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnnouncementDetail {
    pub id: String,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Announcement> for AnnouncementDetail {
    fn from(a: Announcement) -> Self {
        AnnouncementDetail {
            id: a.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: a.title,
            body: a.body,
            audience: a.audience,
            author_id: a.author_id,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: String,

    #[validate(length(min = 1, max = 5000))]
    pub body: String,

    pub audience: Audience,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAnnouncementRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub body: Option<String>,
    pub audience: Option<Audience>,
}
