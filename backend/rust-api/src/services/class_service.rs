use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::models::class::{
    ClassSummary, CreateClassRequest, RosterResponse, SchoolClass, UpdateClassRequest,
};
use crate::models::student::{Student, StudentProfile};
use crate::utils::time::chrono_to_bson;

pub struct ClassService {
    mongo: Database,
}

impl ClassService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create_class(&self, req: CreateClassRequest) -> Result<ClassSummary> {
        let classes = self.mongo.collection::<SchoolClass>("classes");

        let teacher_id = match &req.teacher_id {
            Some(id) => Some(ObjectId::parse_str(id).context("Invalid teacher ID format")?),
            None => None,
        };

        let now = Utc::now();
        let class = SchoolClass {
            id: None,
            name: req.name,
            academic_year: req.academic_year,
            teacher_id,
            student_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let insert_result = classes
            .insert_one(&class)
            .await
            .context("Failed to insert class")?;

        let class_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted class ID"))?;

        let created = classes
            .find_one(doc! { "_id": class_id })
            .await
            .context("Failed to fetch created class")?
            .ok_or_else(|| anyhow!("Class not found after creation"))?;

        Ok(ClassSummary::from(created))
    }

    pub async fn get_class(&self, class_id: &str) -> Result<SchoolClass> {
        let classes = self.mongo.collection::<SchoolClass>("classes");
        let object_id = ObjectId::parse_str(class_id).context("Invalid class ID format")?;

        classes
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query class")?
            .ok_or_else(|| anyhow!("Class not found"))
    }

    pub async fn list_classes(&self) -> Result<Vec<ClassSummary>> {
        let classes = self.mongo.collection::<SchoolClass>("classes");

        let mut cursor = classes
            .find(doc! {})
            .sort(doc! { "academic_year": -1, "name": 1 })
            .await
            .context("Failed to query classes")?;

        let mut rows = Vec::new();
        while let Some(class) = cursor.try_next().await.context("Class cursor error")? {
            rows.push(ClassSummary::from(class));
        }

        Ok(rows)
    }

    /// Classes assigned to a teacher
    pub async fn list_for_teacher(&self, teacher_id: &str) -> Result<Vec<ClassSummary>> {
        let classes = self.mongo.collection::<SchoolClass>("classes");
        let object_id = ObjectId::parse_str(teacher_id).context("Invalid teacher ID format")?;

        let mut cursor = classes
            .find(doc! { "teacher_id": object_id })
            .sort(doc! { "academic_year": -1, "name": 1 })
            .await
            .context("Failed to query classes")?;

        let mut rows = Vec::new();
        while let Some(class) = cursor.try_next().await.context("Class cursor error")? {
            rows.push(ClassSummary::from(class));
        }

        Ok(rows)
    }

    pub async fn update_class(
        &self,
        class_id: &str,
        req: UpdateClassRequest,
    ) -> Result<ClassSummary> {
        let classes = self.mongo.collection::<SchoolClass>("classes");
        let object_id = ObjectId::parse_str(class_id).context("Invalid class ID format")?;

        let mut update_doc = doc! {
            "$set": {
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };

        if let Some(name) = req.name {
            update_doc.get_document_mut("$set")?.insert("name", name);
        }
        if let Some(teacher_id) = req.teacher_id {
            let teacher_object_id =
                ObjectId::parse_str(&teacher_id).context("Invalid teacher ID format")?;
            update_doc
                .get_document_mut("$set")?
                .insert("teacher_id", teacher_object_id);
        }

        let result = classes
            .update_one(doc! { "_id": object_id }, update_doc)
            .await
            .context("Failed to update class")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Class not found"));
        }

        let updated = self.get_class(class_id).await?;
        Ok(ClassSummary::from(updated))
    }

    pub async fn delete_class(&self, class_id: &str) -> Result<()> {
        let classes = self.mongo.collection::<SchoolClass>("classes");
        let object_id = ObjectId::parse_str(class_id).context("Invalid class ID format")?;

        let result = classes
            .delete_one(doc! { "_id": object_id })
            .await
            .context("Failed to delete class")?;

        if result.deleted_count == 0 {
            return Err(anyhow!("Class not found"));
        }

        // Detach roster members
        let students = self.mongo.collection::<Student>("students");
        students
            .update_many(
                doc! { "class_id": object_id },
                doc! { "$unset": { "class_id": "" } },
            )
            .await
            .context("Failed to detach students from deleted class")?;

        Ok(())
    }

    /// Add students to the roster, keeping each student's own class link in
    /// step with the class document
    pub async fn add_students(&self, class_id: &str, student_ids: &[String]) -> Result<RosterResponse> {
        let classes = self.mongo.collection::<SchoolClass>("classes");
        let students = self.mongo.collection::<Student>("students");
        let class_object_id = ObjectId::parse_str(class_id).context("Invalid class ID format")?;

        // All referenced students must exist
        let mut object_ids = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            let object_id =
                ObjectId::parse_str(student_id).context("Invalid student ID format")?;
            students
                .find_one(doc! { "_id": object_id })
                .await
                .context("Failed to query student")?
                .ok_or_else(|| anyhow!("Student {} not found", student_id))?;
            object_ids.push(object_id);
        }

        let result = classes
            .update_one(
                doc! { "_id": class_object_id },
                doc! {
                    "$addToSet": { "student_ids": { "$each": object_ids.clone() } },
                    "$set": { "updatedAt": chrono_to_bson(Utc::now()) },
                },
            )
            .await
            .context("Failed to update roster")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Class not found"));
        }

        students
            .update_many(
                doc! { "_id": { "$in": object_ids.clone() } },
                doc! { "$set": {
                    "class_id": class_object_id,
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await
            .context("Failed to link students to class")?;

        self.roster(class_id).await
    }

    pub async fn remove_students(
        &self,
        class_id: &str,
        student_ids: &[String],
    ) -> Result<RosterResponse> {
        let classes = self.mongo.collection::<SchoolClass>("classes");
        let students = self.mongo.collection::<Student>("students");
        let class_object_id = ObjectId::parse_str(class_id).context("Invalid class ID format")?;

        let mut object_ids = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            object_ids.push(ObjectId::parse_str(student_id).context("Invalid student ID format")?);
        }

        let result = classes
            .update_one(
                doc! { "_id": class_object_id },
                doc! {
                    "$pull": { "student_ids": { "$in": object_ids.clone() } },
                    "$set": { "updatedAt": chrono_to_bson(Utc::now()) },
                },
            )
            .await
            .context("Failed to update roster")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Class not found"));
        }

        students
            .update_many(
                doc! { "_id": { "$in": object_ids.clone() }, "class_id": class_object_id },
                doc! { "$unset": { "class_id": "" } },
            )
            .await
            .context("Failed to unlink students from class")?;

        self.roster(class_id).await
    }

    pub async fn roster(&self, class_id: &str) -> Result<RosterResponse> {
        let class = self.get_class(class_id).await?;
        let students = self.mongo.collection::<Student>("students");

        let mut roster = Vec::new();
        if !class.student_ids.is_empty() {
            let mut cursor = students
                .find(doc! { "_id": { "$in": class.student_ids.clone() } })
                .sort(doc! { "registration_number": 1 })
                .await
                .context("Failed to query roster")?;

            while let Some(student) = cursor.try_next().await.context("Roster cursor error")? {
                roster.push(StudentProfile::from(student));
            }
        }

        Ok(RosterResponse {
            class: ClassSummary::from(class),
            students: roster,
        })
    }
}
