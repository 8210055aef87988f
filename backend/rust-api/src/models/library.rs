use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;

/// Book stored in "books". Copy counts are adjusted atomically on issue and
/// return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub copies_total: i32,
    pub copies_available: i32,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub copies_total: i32,
    pub copies_available: i32,
}

impl From<Book> for BookDetail {
    fn from(book: Book) -> Self {
        BookDetail {
            id: book.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            copies_total: book.copies_total,
            copies_available: book.copies_available,
        }
    }
}

/// Open loan stored in "book_loans".
///
/// `_id` is "{student}:{book}" while the loan is open; the document is
/// removed on return, so a student can borrow the same title again later but
/// never hold two copies at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLoan {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub book_id: String,
    #[serde(rename = "issuedAt", with = "bson_datetime_as_chrono")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "dueAt", with = "bson_datetime_as_chrono")]
    pub due_at: DateTime<Utc>,
}

impl BookLoan {
    pub fn composite_id(student_id: &str, book_id: &str) -> String {
        format!("{}:{}", student_id, book_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 120))]
    pub author: String,

    #[validate(length(min = 10, max = 17))]
    pub isbn: Option<String>,

    #[validate(range(min = 1, message = "copies_total must be positive"))]
    pub copies_total: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub author: Option<String>,
    #[validate(length(min = 10, max = 17))]
    pub isbn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueBookRequest {
    pub student_id: String,
    /// Loan period; defaults to 14 days
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnBookRequest {
    pub student_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    pub search: Option<String>, // search by title or author
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
