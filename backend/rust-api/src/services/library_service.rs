use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Regex};
use mongodb::Database;

use crate::metrics::record_book_loan;
use crate::models::library::{
    Book, BookDetail, BookLoan, CreateBookRequest, ListBooksQuery, UpdateBookRequest,
};
use crate::models::student::Student;
use crate::utils::db::is_duplicate_key_error;
use crate::utils::time::chrono_to_bson;

const DEFAULT_LOAN_DAYS: i64 = 14;

pub struct LibraryService {
    mongo: Database,
}

impl LibraryService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create_book(&self, req: CreateBookRequest) -> Result<BookDetail> {
        let books = self.mongo.collection::<Book>("books");

        let now = Utc::now();
        let book = Book {
            id: None,
            title: req.title,
            author: req.author,
            isbn: req.isbn,
            copies_total: req.copies_total,
            copies_available: req.copies_total,
            created_at: now,
            updated_at: now,
        };

        let insert_result = books
            .insert_one(&book)
            .await
            .context("Failed to insert book")?;

        let book_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted book ID"))?;

        let created = books
            .find_one(doc! { "_id": book_id })
            .await
            .context("Failed to fetch created book")?
            .ok_or_else(|| anyhow!("Book not found after creation"))?;

        Ok(BookDetail::from(created))
    }

    pub async fn get_book(&self, book_id: &str) -> Result<Book> {
        let books = self.mongo.collection::<Book>("books");
        let object_id = ObjectId::parse_str(book_id).context("Invalid book ID format")?;

        books
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query book")?
            .ok_or_else(|| anyhow!("Book not found"))
    }

    pub async fn list_books(&self, query: ListBooksQuery) -> Result<Vec<BookDetail>> {
        let books = self.mongo.collection::<Book>("books");

        let mut filter = doc! {};
        if let Some(search) = query.search {
            let regex = Regex {
                pattern: search,
                options: "i".to_string(),
            };
            filter.insert(
                "$or",
                vec![doc! { "title": &regex }, doc! { "author": &regex }],
            );
        }

        let limit = query.limit.unwrap_or(50).min(200) as i64;
        let offset = query.offset.unwrap_or(0) as u64;

        let mut cursor = books
            .find(filter)
            .sort(doc! { "title": 1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query books")?;

        let mut rows = Vec::new();
        while let Some(book) = cursor.try_next().await.context("Book cursor error")? {
            rows.push(BookDetail::from(book));
        }

        Ok(rows)
    }

    pub async fn update_book(&self, book_id: &str, req: UpdateBookRequest) -> Result<BookDetail> {
        let books = self.mongo.collection::<Book>("books");
        let object_id = ObjectId::parse_str(book_id).context("Invalid book ID format")?;

        let mut update_doc = doc! {
            "$set": {
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };

        if let Some(title) = req.title {
            update_doc.get_document_mut("$set")?.insert("title", title);
        }
        if let Some(author) = req.author {
            update_doc
                .get_document_mut("$set")?
                .insert("author", author);
        }
        if let Some(isbn) = req.isbn {
            update_doc.get_document_mut("$set")?.insert("isbn", isbn);
        }

        let result = books
            .update_one(doc! { "_id": object_id }, update_doc)
            .await
            .context("Failed to update book")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Book not found"));
        }

        let updated = self.get_book(book_id).await?;
        Ok(BookDetail::from(updated))
    }

    pub async fn delete_book(&self, book_id: &str) -> Result<()> {
        let books = self.mongo.collection::<Book>("books");
        let object_id = ObjectId::parse_str(book_id).context("Invalid book ID format")?;

        let result = books
            .delete_one(doc! { "_id": object_id })
            .await
            .context("Failed to delete book")?;

        if result.deleted_count == 0 {
            return Err(anyhow!("Book not found"));
        }

        Ok(())
    }

    /// Issue a copy to a student.
    ///
    /// The copy count is decremented with a guarded atomic update, so two
    /// concurrent issues cannot oversubscribe the last copy; the open-loan
    /// insert on the composite `_id` stops a student holding two copies of
    /// the same title. A failed insert rolls the count back.
    pub async fn issue_book(
        &self,
        book_id: &str,
        student_id: &str,
        days: Option<i64>,
    ) -> Result<BookLoan> {
        let books = self.mongo.collection::<Book>("books");
        let loans = self.mongo.collection::<BookLoan>("book_loans");
        let book_object_id = ObjectId::parse_str(book_id).context("Invalid book ID format")?;

        // Referenced student must exist
        let students = self.mongo.collection::<Student>("students");
        let student_object_id =
            ObjectId::parse_str(student_id).context("Invalid student ID format")?;
        students
            .find_one(doc! { "_id": student_object_id })
            .await
            .context("Failed to query student")?
            .ok_or_else(|| anyhow!("Student not found"))?;

        let claimed = books
            .find_one_and_update(
                doc! { "_id": book_object_id, "copies_available": { "$gt": 0 } },
                doc! {
                    "$inc": { "copies_available": -1 },
                    "$set": { "updatedAt": chrono_to_bson(Utc::now()) },
                },
            )
            .await
            .context("Failed to claim a copy")?;

        if claimed.is_none() {
            // Distinguish "no such book" from "no copies left"
            self.get_book(book_id).await?;
            return Err(anyhow!("No copies of this book are available"));
        }

        let issued_at = Utc::now();
        let loan = BookLoan {
            id: BookLoan::composite_id(student_id, book_id),
            student_id: student_id.to_string(),
            book_id: book_id.to_string(),
            issued_at,
            due_at: issued_at + Duration::days(days.unwrap_or(DEFAULT_LOAN_DAYS)),
        };

        if let Err(e) = loans.insert_one(&loan).await {
            // Give the claimed copy back before reporting
            books
                .update_one(
                    doc! { "_id": book_object_id },
                    doc! { "$inc": { "copies_available": 1 } },
                )
                .await
                .context("Failed to release claimed copy")?;

            let context = if is_duplicate_key_error(&e) {
                "Student already has this book on loan".to_string()
            } else {
                "Failed to insert loan".to_string()
            };
            return Err(anyhow::Error::new(e).context(context));
        }

        record_book_loan("issue");
        Ok(loan)
    }

    /// Return a copy: remove the open loan and release the copy. The loan
    /// history lives in the audit log.
    pub async fn return_book(&self, book_id: &str, student_id: &str) -> Result<()> {
        let books = self.mongo.collection::<Book>("books");
        let loans = self.mongo.collection::<BookLoan>("book_loans");
        let book_object_id = ObjectId::parse_str(book_id).context("Invalid book ID format")?;

        let loan_id = BookLoan::composite_id(student_id, book_id);
        let removed = loans
            .find_one_and_delete(doc! { "_id": &loan_id })
            .await
            .context("Failed to close loan")?;

        if removed.is_none() {
            return Err(anyhow!("Loan not found"));
        }

        books
            .update_one(
                doc! { "_id": book_object_id },
                doc! {
                    "$inc": { "copies_available": 1 },
                    "$set": { "updatedAt": chrono_to_bson(Utc::now()) },
                },
            )
            .await
            .context("Failed to release returned copy")?;

        record_book_loan("return");
        Ok(())
    }

    /// Open loans of one student
    pub async fn student_loans(&self, student_id: &str) -> Result<Vec<BookLoan>> {
        let loans = self.mongo.collection::<BookLoan>("book_loans");

        let mut cursor = loans
            .find(doc! { "student_id": student_id })
            .sort(doc! { "issuedAt": -1 })
            .await
            .context("Failed to query loans")?;

        let mut rows = Vec::new();
        while let Some(loan) = cursor.try_next().await.context("Loan cursor error")? {
            rows.push(loan);
        }

        Ok(rows)
    }
}
