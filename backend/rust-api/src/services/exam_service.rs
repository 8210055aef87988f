use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ReplaceOptions;
use mongodb::Database;

use crate::metrics::record_mark;
use crate::models::exam::{
    validate_transition, CategoryDetail, CategoryStatus, CreateCategoryRequest,
    CreateSubjectRequest, ExamCategory, LifecycleError, Subject, SubjectDetail,
    UpdateCategoryRequest, DEFAULT_PASSING_PERCENT,
};
use crate::models::result::{
    BulkMarkError, BulkMarksRequest, BulkMarksResponse, EnterMarkRequest, ResultRow,
    ResultsResponse, SubjectResult,
};
use crate::models::student::Student;
use crate::services::grading::{grade_exam_mark, mark_in_range};
use crate::utils::time::chrono_to_bson;

pub struct ExamService {
    mongo: Database,
}

impl ExamService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    // ---- categories ----

    pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<CategoryDetail> {
        let categories = self.mongo.collection::<ExamCategory>("exam_categories");

        let now = Utc::now();
        let category = ExamCategory {
            id: None,
            name: req.name,
            academic_year: req.academic_year,
            status: CategoryStatus::Draft,
            passing_percent: req.passing_percent.unwrap_or(DEFAULT_PASSING_PERCENT),
            created_at: now,
            updated_at: now,
        };

        let insert_result = categories
            .insert_one(&category)
            .await
            .context("Failed to insert exam category")?;

        let category_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted category ID"))?;

        let created = categories
            .find_one(doc! { "_id": category_id })
            .await
            .context("Failed to fetch created category")?
            .ok_or_else(|| anyhow!("Category not found after creation"))?;

        Ok(CategoryDetail::from(created))
    }

    pub async fn get_category(&self, category_id: &str) -> Result<ExamCategory> {
        let categories = self.mongo.collection::<ExamCategory>("exam_categories");
        let object_id = ObjectId::parse_str(category_id).context("Invalid category ID format")?;

        categories
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query category")?
            .ok_or_else(|| anyhow!("Category not found"))
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryDetail>> {
        let categories = self.mongo.collection::<ExamCategory>("exam_categories");

        let mut cursor = categories
            .find(doc! {})
            .sort(doc! { "academic_year": -1, "createdAt": -1 })
            .await
            .context("Failed to query categories")?;

        let mut rows = Vec::new();
        while let Some(category) = cursor.try_next().await.context("Category cursor error")? {
            rows.push(CategoryDetail::from(category));
        }

        Ok(rows)
    }

    /// Advance the lifecycle one step. Transitions are validated against the
    /// forward-only state machine; violations surface as 400 state errors.
    pub async fn transition_category(
        &self,
        category_id: &str,
        to: CategoryStatus,
    ) -> Result<CategoryDetail> {
        let categories = self.mongo.collection::<ExamCategory>("exam_categories");
        let category = self.get_category(category_id).await?;

        validate_transition(category.status, to)?;

        let object_id = ObjectId::parse_str(category_id).context("Invalid category ID format")?;
        categories
            .update_one(
                doc! { "_id": object_id, "status": category.status.as_str() },
                doc! { "$set": {
                    "status": to.as_str(),
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await
            .context("Failed to update category status")?;

        let updated = self.get_category(category_id).await?;

        if to == CategoryStatus::Published {
            tracing::info!("Category {} published, results now public", category_id);
        }

        Ok(CategoryDetail::from(updated))
    }

    /// Rename or retune a category. Only draft categories may change; once
    /// open, the definition is frozen.
    pub async fn update_category(
        &self,
        category_id: &str,
        req: UpdateCategoryRequest,
    ) -> Result<CategoryDetail> {
        let categories = self.mongo.collection::<ExamCategory>("exam_categories");
        let category = self.get_category(category_id).await?;
        if category.status != CategoryStatus::Draft {
            return Err(anyhow!(
                "Category can only be edited while in draft, it is already {}",
                category.status.as_str()
            ));
        }

        let mut update_doc = doc! {
            "$set": {
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };
        if let Some(name) = req.name {
            update_doc.get_document_mut("$set")?.insert("name", name);
        }
        if let Some(passing_percent) = req.passing_percent {
            update_doc
                .get_document_mut("$set")?
                .insert("passing_percent", passing_percent);
        }

        let object_id = ObjectId::parse_str(category_id).context("Invalid category ID format")?;
        categories
            .update_one(doc! { "_id": object_id }, update_doc)
            .await
            .context("Failed to update category")?;

        let updated = self.get_category(category_id).await?;
        Ok(CategoryDetail::from(updated))
    }

    /// Delete a draft category together with its subjects
    pub async fn delete_category(&self, category_id: &str) -> Result<()> {
        let categories = self.mongo.collection::<ExamCategory>("exam_categories");
        let category = self.get_category(category_id).await?;
        if category.status != CategoryStatus::Draft {
            return Err(anyhow!(
                "Category can only be deleted while in draft, it is already {}",
                category.status.as_str()
            ));
        }

        let object_id = ObjectId::parse_str(category_id).context("Invalid category ID format")?;
        self.mongo
            .collection::<Subject>("subjects")
            .delete_many(doc! { "category_id": object_id })
            .await
            .context("Failed to delete category subjects")?;
        categories
            .delete_one(doc! { "_id": object_id })
            .await
            .context("Failed to delete category")?;

        Ok(())
    }

    // ---- subjects ----

    pub async fn create_subject(
        &self,
        category_id: &str,
        req: CreateSubjectRequest,
    ) -> Result<SubjectDetail> {
        let category = self.get_category(category_id).await?;
        let category_object_id = category
            .id
            .ok_or_else(|| anyhow!("Stored category is missing an id"))?;

        // Passing marks default to the category's percentage of the max
        let passing_marks = req
            .passing_marks
            .unwrap_or(category.passing_percent / 100.0 * req.max_marks);
        if !mark_in_range(passing_marks, req.max_marks) {
            return Err(anyhow!(
                "passing_marks {} is out of range [0, {}]",
                passing_marks,
                req.max_marks
            ));
        }

        let subjects = self.mongo.collection::<Subject>("subjects");
        let now = Utc::now();
        let subject = Subject {
            id: None,
            category_id: category_object_id,
            name: req.name,
            max_marks: req.max_marks,
            passing_marks,
            created_at: now,
            updated_at: now,
        };

        let insert_result = subjects
            .insert_one(&subject)
            .await
            .context("Failed to insert subject")?;

        let subject_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted subject ID"))?;

        let created = subjects
            .find_one(doc! { "_id": subject_id })
            .await
            .context("Failed to fetch created subject")?
            .ok_or_else(|| anyhow!("Subject not found after creation"))?;

        Ok(SubjectDetail::from(created))
    }

    pub async fn get_subject(&self, subject_id: &str) -> Result<Subject> {
        let subjects = self.mongo.collection::<Subject>("subjects");
        let object_id = ObjectId::parse_str(subject_id).context("Invalid subject ID format")?;

        subjects
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query subject")?
            .ok_or_else(|| anyhow!("Subject not found"))
    }

    pub async fn list_subjects(&self, category_id: &str) -> Result<Vec<SubjectDetail>> {
        let subjects = self.mongo.collection::<Subject>("subjects");
        let object_id = ObjectId::parse_str(category_id).context("Invalid category ID format")?;

        let mut cursor = subjects
            .find(doc! { "category_id": object_id })
            .sort(doc! { "name": 1 })
            .await
            .context("Failed to query subjects")?;

        let mut rows = Vec::new();
        while let Some(subject) = cursor.try_next().await.context("Subject cursor error")? {
            rows.push(SubjectDetail::from(subject));
        }

        Ok(rows)
    }

    /// Delete a subject while its category is still in draft
    pub async fn delete_subject(&self, subject_id: &str) -> Result<()> {
        let subject = self.get_subject(subject_id).await?;
        let category = self.get_category(&subject.category_id.to_hex()).await?;
        if category.status != CategoryStatus::Draft {
            return Err(anyhow!(
                "Subject can only be deleted while the category is in draft, it is already {}",
                category.status.as_str()
            ));
        }

        let object_id = ObjectId::parse_str(subject_id).context("Invalid subject ID format")?;
        self.mongo
            .collection::<Subject>("subjects")
            .delete_one(doc! { "_id": object_id })
            .await
            .context("Failed to delete subject")?;

        Ok(())
    }

    // ---- mark entry ----

    /// Enter a single mark. The category must be in its scoring window; the
    /// write is an upsert keyed by the composite id, so re-submission
    /// overwrites the previous mark for the same (student, category,
    /// subject).
    pub async fn enter_mark(
        &self,
        req: EnterMarkRequest,
        recorded_by: &str,
    ) -> Result<SubjectResult> {
        let category = self.get_category(&req.category_id).await?;
        if !category.status.allows_mark_entry() {
            return Err(LifecycleError::MarkEntryClosed(
                category.status.as_str().to_string(),
            )
            .into());
        }

        let subject = self.get_subject(&req.subject_id).await?;
        let subject_category_id = subject.category_id.to_hex();
        if subject_category_id != req.category_id {
            return Err(anyhow!("Subject does not belong to the given category"));
        }

        // Referenced student must exist
        let students = self.mongo.collection::<Student>("students");
        let student_object_id =
            ObjectId::parse_str(&req.student_id).context("Invalid student ID format")?;
        students
            .find_one(doc! { "_id": student_object_id })
            .await
            .context("Failed to query student")?
            .ok_or_else(|| anyhow!("Student not found"))?;

        if !mark_in_range(req.marks_obtained, subject.max_marks) {
            return Err(anyhow!(
                "marks_obtained {} is out of range [0, {}]",
                req.marks_obtained,
                subject.max_marks
            ));
        }

        let result = self
            .save_mark(
                &req.student_id,
                &req.category_id,
                &req.subject_id,
                req.marks_obtained,
                &subject,
                recorded_by,
            )
            .await?;

        record_mark(result.passed);
        Ok(result)
    }

    /// Enter marks for many students in one call. Out-of-range and unknown
    /// students are collected per-item; the valid entries are still saved.
    pub async fn enter_marks_bulk(
        &self,
        req: BulkMarksRequest,
        recorded_by: &str,
    ) -> Result<BulkMarksResponse> {
        let category = self.get_category(&req.category_id).await?;
        if !category.status.allows_mark_entry() {
            return Err(LifecycleError::MarkEntryClosed(
                category.status.as_str().to_string(),
            )
            .into());
        }

        let subject = self.get_subject(&req.subject_id).await?;
        if subject.category_id.to_hex() != req.category_id {
            return Err(anyhow!("Subject does not belong to the given category"));
        }

        let students = self.mongo.collection::<Student>("students");
        let mut saved = 0;
        let mut errors = Vec::new();

        for entry in req.entries {
            if !mark_in_range(entry.marks_obtained, subject.max_marks) {
                errors.push(BulkMarkError {
                    student_id: entry.student_id,
                    message: format!(
                        "marks_obtained {} is out of range [0, {}]",
                        entry.marks_obtained, subject.max_marks
                    ),
                });
                continue;
            }

            let student_object_id = match ObjectId::parse_str(&entry.student_id) {
                Ok(id) => id,
                Err(_) => {
                    errors.push(BulkMarkError {
                        student_id: entry.student_id,
                        message: "Invalid student ID format".to_string(),
                    });
                    continue;
                }
            };

            let known = students
                .find_one(doc! { "_id": student_object_id })
                .await
                .context("Failed to query student")?;
            if known.is_none() {
                errors.push(BulkMarkError {
                    student_id: entry.student_id,
                    message: "Student not found".to_string(),
                });
                continue;
            }

            let result = self
                .save_mark(
                    &entry.student_id,
                    &req.category_id,
                    &req.subject_id,
                    entry.marks_obtained,
                    &subject,
                    recorded_by,
                )
                .await?;
            record_mark(result.passed);
            saved += 1;
        }

        tracing::info!(
            "Bulk mark entry for subject {}: {} saved, {} rejected",
            req.subject_id,
            saved,
            errors.len()
        );

        Ok(BulkMarksResponse { saved, errors })
    }

    async fn save_mark(
        &self,
        student_id: &str,
        category_id: &str,
        subject_id: &str,
        marks_obtained: f64,
        subject: &Subject,
        recorded_by: &str,
    ) -> Result<SubjectResult> {
        let results = self.mongo.collection::<SubjectResult>("subject_results");
        let result_id = SubjectResult::composite_id(student_id, category_id, subject_id);

        let breakdown = grade_exam_mark(marks_obtained, subject.max_marks, subject.passing_marks);

        let now = Utc::now();
        let existing = results
            .find_one(doc! { "_id": &result_id })
            .await
            .context("Failed to query existing result")?;

        let result = SubjectResult {
            id: result_id.clone(),
            student_id: student_id.to_string(),
            category_id: category_id.to_string(),
            subject_id: subject_id.to_string(),
            marks_obtained,
            max_marks: subject.max_marks,
            percentage: breakdown.percentage,
            grade: breakdown.grade.to_string(),
            passed: breakdown.passed,
            recorded_by: recorded_by.to_string(),
            created_at: existing.map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        };

        results
            .replace_one(doc! { "_id": &result_id }, &result)
            .with_options(ReplaceOptions::builder().upsert(true).build())
            .await
            .context("Failed to upsert result")?;

        Ok(result)
    }

    // ---- result retrieval ----

    /// Results of one student in one category, joined with subject names
    pub async fn student_results(
        &self,
        student: &Student,
        category_id: &str,
    ) -> Result<ResultsResponse> {
        let category = self.get_category(category_id).await?;
        let student_id = student
            .id
            .map(|id| id.to_hex())
            .ok_or_else(|| anyhow!("Stored student is missing an id"))?;

        let subjects = self.list_subjects(category_id).await?;

        let results = self.mongo.collection::<SubjectResult>("subject_results");
        let mut rows = Vec::new();
        for subject in subjects {
            let result_id = SubjectResult::composite_id(&student_id, category_id, &subject.id);
            if let Some(result) = results
                .find_one(doc! { "_id": &result_id })
                .await
                .context("Failed to query result")?
            {
                rows.push(ResultRow {
                    subject_id: subject.id,
                    subject_name: subject.name,
                    marks_obtained: result.marks_obtained,
                    max_marks: result.max_marks,
                    percentage: result.percentage,
                    grade: result.grade,
                    passed: result.passed,
                });
            }
        }

        Ok(ResultsResponse {
            student_id,
            registration_number: student.registration_number.clone(),
            category_id: category_id.to_string(),
            category_name: category.name,
            rows,
        })
    }

    /// Public lookup: only published categories are visible
    pub async fn published_results(
        &self,
        student: &Student,
        category_id: &str,
    ) -> Result<ResultsResponse> {
        let category = self.get_category(category_id).await?;
        if category.status != CategoryStatus::Published {
            return Err(
                LifecycleError::NotPublished(category.status.as_str().to_string()).into(),
            );
        }

        self.student_results(student, category_id).await
    }
}
