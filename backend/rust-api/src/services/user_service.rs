use anyhow::{anyhow, Context, Result};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Regex};
use mongodb::Database;

use crate::models::user::{
    CreateUserRequest, ListUsersQuery, UpdateUserRequest, User, UserProfile,
};
use crate::utils::db::is_duplicate_key_error;
use crate::utils::time::chrono_to_bson;

pub struct UserService {
    mongo: Database,
}

impl UserService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Create a user (admin)
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<UserProfile> {
        let users = self.mongo.collection::<User>("users");

        let password_hash = hash(&req.password, DEFAULT_COST).context("Failed to hash password")?;

        let now = Utc::now();
        let user = User {
            id: None,
            email: req.email.clone(),
            password_hash,
            name: req.name,
            role: req.role.unwrap_or_default(),
            student_id: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let insert_result = users.insert_one(&user).await.map_err(|e| {
            let context = if is_duplicate_key_error(&e) {
                "User with this email already exists".to_string()
            } else {
                "Failed to insert user".to_string()
            };
            anyhow::Error::new(e).context(context)
        })?;

        let user_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted user ID"))?;

        let created = users
            .find_one(doc! { "_id": user_id })
            .await
            .context("Failed to fetch created user")?
            .ok_or_else(|| anyhow!("User not found after creation"))?;

        Ok(UserProfile::from(created))
    }

    pub async fn list_users(&self, query: ListUsersQuery) -> Result<Vec<UserProfile>> {
        let users = self.mongo.collection::<User>("users");

        let mut filter = doc! {};
        if let Some(role) = query.role {
            filter.insert("role", role);
        }
        if let Some(search) = query.search {
            let regex = Regex {
                pattern: search,
                options: "i".to_string(),
            };
            filter.insert(
                "$or",
                vec![doc! { "email": &regex }, doc! { "name": &regex }],
            );
        }

        let limit = query.limit.unwrap_or(50).min(200) as i64;
        let offset = query.offset.unwrap_or(0) as u64;

        let mut cursor = users
            .find(filter)
            .sort(doc! { "email": 1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query users")?;

        let mut rows = Vec::new();
        while let Some(user) = cursor.try_next().await.context("User cursor error")? {
            rows.push(UserProfile::from(user));
        }

        Ok(rows)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserProfile> {
        let users = self.mongo.collection::<User>("users");
        let object_id = ObjectId::parse_str(user_id).context("Invalid user ID format")?;

        let user = users
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("User not found"))?;

        Ok(UserProfile::from(user))
    }

    pub async fn update_user(&self, user_id: &str, req: UpdateUserRequest) -> Result<UserProfile> {
        let users = self.mongo.collection::<User>("users");
        let object_id = ObjectId::parse_str(user_id).context("Invalid user ID format")?;

        let mut update_doc = doc! {
            "$set": {
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };

        if let Some(name) = req.name {
            update_doc.get_document_mut("$set")?.insert("name", name);
        }
        if let Some(role) = req.role {
            update_doc
                .get_document_mut("$set")?
                .insert("role", role.as_str());
        }

        let result = users
            .update_one(doc! { "_id": object_id }, update_doc)
            .await
            .context("Failed to update user")?;

        if result.matched_count == 0 {
            return Err(anyhow!("User not found"));
        }

        self.get_user(user_id).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let users = self.mongo.collection::<User>("users");
        let object_id = ObjectId::parse_str(user_id).context("Invalid user ID format")?;

        let result = users
            .delete_one(doc! { "_id": object_id })
            .await
            .context("Failed to delete user")?;

        if result.deleted_count == 0 {
            return Err(anyhow!("User not found"));
        }

        Ok(())
    }
}
