use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Regex};
use mongodb::Database;

use crate::models::student::{
    CreateStudentRequest, ListStudentsQuery, Student, StudentProfile, UpdateStudentRequest,
};
use crate::services::registration::{next_registration_number, scheme_from_config};
use crate::utils::db::is_duplicate_key_error;
use crate::utils::time::chrono_to_bson;

pub struct StudentService {
    mongo: Database,
    registration_scheme: String,
}

impl StudentService {
    pub fn new(mongo: Database, registration_scheme: String) -> Self {
        Self {
            mongo,
            registration_scheme,
        }
    }

    /// Create a student, assigning the next registration number.
    ///
    /// Two concurrent callers can derive the same number; the unique index
    /// rejects the loser and the error is surfaced as a conflict for the
    /// caller to retry.
    pub async fn create_student(&self, req: CreateStudentRequest) -> Result<StudentProfile> {
        let students = self.mongo.collection::<Student>("students");

        let scheme = scheme_from_config(&self.registration_scheme, Utc::now().year());
        let registration_number = next_registration_number(&students, scheme).await?;

        let class_id = match &req.class_id {
            Some(id) => Some(ObjectId::parse_str(id).context("Invalid class ID format")?),
            None => None,
        };

        let now = Utc::now();
        let student = Student {
            id: None,
            full_name: req.full_name,
            registration_number: registration_number.clone(),
            date_of_birth: req.date_of_birth,
            guardian_name: req.guardian_name,
            phone: req.phone,
            email: req.email,
            class_id,
            created_at: now,
            updated_at: now,
        };

        let insert_result = students.insert_one(&student).await.map_err(|e| {
            let context = if is_duplicate_key_error(&e) {
                format!(
                    "Registration number {} was taken by a concurrent admission, please retry",
                    registration_number
                )
            } else {
                "Failed to insert student".to_string()
            };
            anyhow::Error::new(e).context(context)
        })?;

        let student_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted student ID"))?;

        let created = students
            .find_one(doc! { "_id": student_id })
            .await
            .context("Failed to fetch created student")?
            .ok_or_else(|| anyhow!("Student not found after creation"))?;

        tracing::info!(
            "Student created: {} ({})",
            created.full_name,
            created.registration_number
        );

        Ok(StudentProfile::from(created))
    }

    pub async fn get_student(&self, student_id: &str) -> Result<StudentProfile> {
        Ok(StudentProfile::from(self.get_record(student_id).await?))
    }

    pub async fn get_record(&self, student_id: &str) -> Result<Student> {
        let students = self.mongo.collection::<Student>("students");
        let object_id = ObjectId::parse_str(student_id).context("Invalid student ID format")?;

        students
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query student")?
            .ok_or_else(|| anyhow!("Student not found"))
    }

    pub async fn find_by_registration_number(&self, registration_number: &str) -> Result<Student> {
        let students = self.mongo.collection::<Student>("students");

        students
            .find_one(doc! { "registration_number": registration_number })
            .await
            .context("Failed to query student")?
            .ok_or_else(|| anyhow!("Student not found"))
    }

    pub async fn list_students(&self, query: ListStudentsQuery) -> Result<Vec<StudentProfile>> {
        let students = self.mongo.collection::<Student>("students");

        let mut filter = doc! {};
        if let Some(class_id) = query.class_id {
            let object_id = ObjectId::parse_str(&class_id).context("Invalid class ID format")?;
            filter.insert("class_id", object_id);
        }
        if let Some(search) = query.search {
            let regex = Regex {
                pattern: search,
                options: "i".to_string(),
            };
            filter.insert(
                "$or",
                vec![
                    doc! { "full_name": &regex },
                    doc! { "registration_number": &regex },
                ],
            );
        }

        let limit = query.limit.unwrap_or(50).min(200) as i64;
        let offset = query.offset.unwrap_or(0) as u64;

        let mut cursor = students
            .find(filter)
            .sort(doc! { "registration_number": 1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query students")?;

        let mut rows = Vec::new();
        while let Some(student) = cursor.try_next().await.context("Student cursor error")? {
            rows.push(StudentProfile::from(student));
        }

        Ok(rows)
    }

    pub async fn update_student(
        &self,
        student_id: &str,
        req: UpdateStudentRequest,
    ) -> Result<StudentProfile> {
        let students = self.mongo.collection::<Student>("students");
        let object_id = ObjectId::parse_str(student_id).context("Invalid student ID format")?;

        let mut update_doc = doc! {
            "$set": {
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };

        if let Some(full_name) = req.full_name {
            update_doc
                .get_document_mut("$set")?
                .insert("full_name", full_name);
        }
        if let Some(guardian_name) = req.guardian_name {
            update_doc
                .get_document_mut("$set")?
                .insert("guardian_name", guardian_name);
        }
        if let Some(phone) = req.phone {
            update_doc.get_document_mut("$set")?.insert("phone", phone);
        }
        if let Some(email) = req.email {
            update_doc.get_document_mut("$set")?.insert("email", email);
        }
        if let Some(class_id) = req.class_id {
            let class_object_id =
                ObjectId::parse_str(&class_id).context("Invalid class ID format")?;
            update_doc
                .get_document_mut("$set")?
                .insert("class_id", class_object_id);
        }

        let result = students
            .update_one(doc! { "_id": object_id }, update_doc)
            .await
            .context("Failed to update student")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Student not found"));
        }

        self.get_student(student_id).await
    }

    pub async fn delete_student(&self, student_id: &str) -> Result<()> {
        let students = self.mongo.collection::<Student>("students");
        let object_id = ObjectId::parse_str(student_id).context("Invalid student ID format")?;

        let result = students
            .delete_one(doc! { "_id": object_id })
            .await
            .context("Failed to delete student")?;

        if result.deleted_count == 0 {
            return Err(anyhow!("Student not found"));
        }

        Ok(())
    }
}
