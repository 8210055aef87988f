use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use rand::{distr::Alphanumeric, Rng};

use crate::models::admission::{
    AdmissionApplication, ApplicationDetail, ApplicationStatus, ApplyRequest,
    ListApplicationsQuery, ApprovalResponse,
};
use crate::models::student::CreateStudentRequest;
use crate::models::user::{User, UserRole};
use crate::services::auth_service::AuthService;
use crate::services::student_service::StudentService;
use crate::utils::time::chrono_to_bson;

pub struct AdmissionService {
    mongo: Database,
    registration_scheme: String,
}

impl AdmissionService {
    pub fn new(mongo: Database, registration_scheme: String) -> Self {
        Self {
            mongo,
            registration_scheme,
        }
    }

    /// Submit a new application (public endpoint)
    pub async fn apply(&self, req: ApplyRequest) -> Result<ApplicationDetail> {
        let applications = self
            .mongo
            .collection::<AdmissionApplication>("admission_applications");

        let desired_class_id = match &req.desired_class_id {
            Some(id) => Some(ObjectId::parse_str(id).context("Invalid class ID format")?),
            None => None,
        };

        let now = Utc::now();
        let application = AdmissionApplication {
            id: None,
            applicant_name: req.applicant_name,
            date_of_birth: req.date_of_birth,
            guardian_name: req.guardian_name,
            phone: req.phone,
            email: req.email,
            desired_class_id,
            status: ApplicationStatus::Pending,
            decided_by: None,
            decision_note: None,
            created_at: now,
            updated_at: now,
        };

        let insert_result = applications
            .insert_one(&application)
            .await
            .context("Failed to insert application")?;

        let application_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted application ID"))?;

        let created = applications
            .find_one(doc! { "_id": application_id })
            .await
            .context("Failed to fetch created application")?
            .ok_or_else(|| anyhow!("Application not found after creation"))?;

        tracing::info!("Admission application received: {}", application_id);

        Ok(ApplicationDetail::from(created))
    }

    pub async fn list(&self, query: ListApplicationsQuery) -> Result<Vec<ApplicationDetail>> {
        let applications = self
            .mongo
            .collection::<AdmissionApplication>("admission_applications");

        let mut filter = doc! {};
        if let Some(status) = query.status {
            filter.insert("status", status);
        }

        let limit = query.limit.unwrap_or(50).min(200) as i64;
        let offset = query.offset.unwrap_or(0) as u64;

        let mut cursor = applications
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query applications")?;

        let mut rows = Vec::new();
        while let Some(application) = cursor
            .try_next()
            .await
            .context("Application cursor error")?
        {
            rows.push(ApplicationDetail::from(application));
        }

        Ok(rows)
    }

    pub async fn get(&self, application_id: &str) -> Result<AdmissionApplication> {
        let applications = self
            .mongo
            .collection::<AdmissionApplication>("admission_applications");
        let object_id =
            ObjectId::parse_str(application_id).context("Invalid application ID format")?;

        applications
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query application")?
            .ok_or_else(|| anyhow!("Application not found"))
    }

    /// Approve a pending application: create the student (assigning a
    /// registration number) and a student login with a generated password.
    pub async fn approve(
        &self,
        application_id: &str,
        admin_id: &str,
        auth_service: &AuthService,
    ) -> Result<ApprovalResponse> {
        let applications = self
            .mongo
            .collection::<AdmissionApplication>("admission_applications");

        let application = self.get(application_id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(anyhow!(
                "Application is already {}",
                application.status.as_str()
            ));
        }

        let student_service =
            StudentService::new(self.mongo.clone(), self.registration_scheme.clone());
        let student = student_service
            .create_student(CreateStudentRequest {
                full_name: application.applicant_name.clone(),
                date_of_birth: application.date_of_birth.clone(),
                guardian_name: application.guardian_name.clone(),
                phone: application.phone.clone(),
                email: application.email.clone(),
                class_id: application.desired_class_id.map(|id| id.to_hex()),
            })
            .await?;

        // Create a login when the applicant left an email
        let (login_email, initial_password) = if let Some(email) = application.email.clone() {
            let initial_password: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(12)
                .map(char::from)
                .collect();

            let users = self.mongo.collection::<User>("users");
            let now = Utc::now();
            let user = User {
                id: None,
                email: email.clone(),
                password_hash: auth_service.hash_password(&initial_password)?,
                name: application.applicant_name.clone(),
                role: UserRole::Student,
                student_id: Some(
                    ObjectId::parse_str(&student.id).context("Invalid created student ID")?,
                ),
                created_at: now,
                updated_at: now,
                last_login_at: None,
            };
            users
                .insert_one(&user)
                .await
                .context("Failed to create student login")?;

            (Some(email), Some(initial_password))
        } else {
            (None, None)
        };

        let object_id =
            ObjectId::parse_str(application_id).context("Invalid application ID format")?;
        applications
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": {
                    "status": ApplicationStatus::Approved.as_str(),
                    "decided_by": admin_id,
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await
            .context("Failed to mark application approved")?;

        tracing::info!(
            "Application {} approved, student {} created",
            application_id,
            student.registration_number
        );

        Ok(ApprovalResponse {
            application_id: application_id.to_string(),
            student,
            login_email,
            initial_password,
        })
    }

    /// Reject a pending application
    pub async fn reject(
        &self,
        application_id: &str,
        admin_id: &str,
        note: Option<String>,
    ) -> Result<ApplicationDetail> {
        let applications = self
            .mongo
            .collection::<AdmissionApplication>("admission_applications");

        let application = self.get(application_id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(anyhow!(
                "Application is already {}",
                application.status.as_str()
            ));
        }

        let object_id =
            ObjectId::parse_str(application_id).context("Invalid application ID format")?;
        let mut set_doc = doc! {
            "status": ApplicationStatus::Rejected.as_str(),
            "decided_by": admin_id,
            "updatedAt": chrono_to_bson(Utc::now()),
        };
        if let Some(note) = note {
            set_doc.insert("decision_note", note);
        }

        applications
            .update_one(doc! { "_id": object_id }, doc! { "$set": set_doc })
            .await
            .context("Failed to mark application rejected")?;

        let updated = self.get(application_id).await?;
        Ok(ApplicationDetail::from(updated))
    }
}
