use mongodb::error::{Error, ErrorKind, WriteFailure};

/// MongoDB duplicate-key write error (code 11000). Inserts that race on a
/// unique index surface this; callers map it to a 409 conflict.
pub fn is_duplicate_key_error(err: &Error) -> bool {
    if let ErrorKind::Write(WriteFailure::WriteError(ref we)) = *err.kind {
        return we.code == 11000;
    }
    false
}
