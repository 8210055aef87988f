use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::models::announcement::{
    Announcement, AnnouncementDetail, Audience, CreateAnnouncementRequest,
    UpdateAnnouncementRequest,
};
use crate::utils::time::chrono_to_bson;

pub struct AnnouncementService {
    mongo: Database,
}

impl AnnouncementService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create(
        &self,
        req: CreateAnnouncementRequest,
        author_id: &str,
    ) -> Result<AnnouncementDetail> {
        let announcements = self.mongo.collection::<Announcement>("announcements");

        let now = Utc::now();
        let announcement = Announcement {
            id: None,
            title: req.title,
            body: req.body,
            audience: req.audience,
            author_id: author_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        let insert_result = announcements
            .insert_one(&announcement)
            .await
            .context("Failed to insert announcement")?;

        let announcement_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted announcement ID"))?;

        let created = announcements
            .find_one(doc! { "_id": announcement_id })
            .await
            .context("Failed to fetch created announcement")?
            .ok_or_else(|| anyhow!("Announcement not found after creation"))?;

        Ok(AnnouncementDetail::from(created))
    }

    /// Announcements visible to an audience, newest first
    pub async fn list_for_audience(&self, audience: Audience) -> Result<Vec<AnnouncementDetail>> {
        let announcements = self.mongo.collection::<Announcement>("announcements");

        let filter = match audience {
            Audience::All => doc! {},
            other => doc! { "audience": { "$in": ["all", other.as_str()] } },
        };

        let mut cursor = announcements
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .limit(100)
            .await
            .context("Failed to query announcements")?;

        let mut rows = Vec::new();
        while let Some(announcement) = cursor
            .try_next()
            .await
            .context("Announcement cursor error")?
        {
            rows.push(AnnouncementDetail::from(announcement));
        }

        Ok(rows)
    }

    pub async fn update(
        &self,
        announcement_id: &str,
        req: UpdateAnnouncementRequest,
    ) -> Result<AnnouncementDetail> {
        let announcements = self.mongo.collection::<Announcement>("announcements");
        let object_id =
            ObjectId::parse_str(announcement_id).context("Invalid announcement ID format")?;

        let mut update_doc = doc! {
            "$set": {
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };

        if let Some(title) = req.title {
            update_doc.get_document_mut("$set")?.insert("title", title);
        }
        if let Some(body) = req.body {
            update_doc.get_document_mut("$set")?.insert("body", body);
        }
        if let Some(audience) = req.audience {
            update_doc
                .get_document_mut("$set")?
                .insert("audience", audience.as_str());
        }

        let result = announcements
            .update_one(doc! { "_id": object_id }, update_doc)
            .await
            .context("Failed to update announcement")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Announcement not found"));
        }

        let updated = announcements
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to fetch updated announcement")?
            .ok_or_else(|| anyhow!("Announcement not found"))?;

        Ok(AnnouncementDetail::from(updated))
    }

    pub async fn delete(&self, announcement_id: &str) -> Result<()> {
        let announcements = self.mongo.collection::<Announcement>("announcements");
        let object_id =
            ObjectId::parse_str(announcement_id).context("Invalid announcement ID format")?;

        let result = announcements
            .delete_one(doc! { "_id": object_id })
            .await
            .context("Failed to delete announcement")?;

        if result.deleted_count == 0 {
            return Err(anyhow!("Announcement not found"));
        }

        Ok(())
    }
}
