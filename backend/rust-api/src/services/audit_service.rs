use anyhow::{Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Database};

use crate::models::audit_log::{AuditEventType, AuditLog, AuditLogEntry, AuditLogQuery};

/// Parameters for audit event logging
#[derive(Debug, Default)]
pub struct AuditEventParams {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub subject_id: Option<String>,
    pub details: Option<String>,
    pub error_message: Option<String>,
}

/// Service for audit logging
pub struct AuditService {
    mongo: Database,
}

impl AuditService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Log an audit event. Failures are the caller's business to ignore:
    /// audit writes must never fail the request they describe.
    pub async fn log_event(
        &self,
        event_type: AuditEventType,
        success: bool,
        params: AuditEventParams,
    ) -> Result<()> {
        let audit_log = AuditLog {
            id: None,
            event_type,
            user_id: params.user_id,
            email: params.email,
            success,
            subject_id: params.subject_id,
            details: params.details,
            error_message: params.error_message,
            created_at: Utc::now(),
        };

        let collection = self.mongo.collection::<AuditLog>("audit_log");
        collection
            .insert_one(audit_log)
            .await
            .context("Failed to insert audit log")?;

        Ok(())
    }

    pub async fn log_login_success(&self, user_id: &str, email: &str) -> Result<()> {
        self.log_event(
            AuditEventType::Login,
            true,
            AuditEventParams {
                user_id: Some(user_id.to_string()),
                email: Some(email.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn log_login_failed(&self, email: &str, error: &str) -> Result<()> {
        self.log_event(
            AuditEventType::LoginFailed,
            false,
            AuditEventParams {
                email: Some(email.to_string()),
                error_message: Some(error.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn log_admission_decided(
        &self,
        admin_id: &str,
        application_id: &str,
        approved: bool,
    ) -> Result<()> {
        let event_type = if approved {
            AuditEventType::AdmissionApproved
        } else {
            AuditEventType::AdmissionRejected
        };
        self.log_event(
            event_type,
            true,
            AuditEventParams {
                user_id: Some(admin_id.to_string()),
                subject_id: Some(application_id.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn log_category_transition(
        &self,
        admin_id: &str,
        category_id: &str,
        from: &str,
        to: &str,
    ) -> Result<()> {
        self.log_event(
            AuditEventType::CategoryTransition,
            true,
            AuditEventParams {
                user_id: Some(admin_id.to_string()),
                subject_id: Some(category_id.to_string()),
                details: Some(format!("{} -> {}", from, to)),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn log_book_event(
        &self,
        event_type: AuditEventType,
        admin_id: &str,
        book_id: &str,
        student_id: &str,
    ) -> Result<()> {
        self.log_event(
            event_type,
            true,
            AuditEventParams {
                user_id: Some(admin_id.to_string()),
                subject_id: Some(book_id.to_string()),
                details: Some(format!("student {}", student_id)),
                ..Default::default()
            },
        )
        .await
    }

    /// List audit events, newest first
    pub async fn list(&self, query: AuditLogQuery) -> Result<Vec<AuditLogEntry>> {
        let collection = self.mongo.collection::<AuditLog>("audit_log");

        let mut filter = doc! {};
        if let Some(event_type) = query.event_type {
            filter.insert("event_type", event_type);
        }
        if let Some(user_id) = query.user_id {
            filter.insert("user_id", user_id);
        }
        if let Some(success) = query.success {
            filter.insert("success", success);
        }

        let limit = query.limit.unwrap_or(50).min(200) as i64;
        let offset = query.offset.unwrap_or(0) as u64;

        let mut cursor = collection
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query audit log")?;

        let mut entries = Vec::new();
        while let Some(log) = cursor
            .try_next()
            .await
            .context("Audit log cursor error")?
        {
            entries.push(AuditLogEntry::from(log));
        }

        Ok(entries)
    }
}
