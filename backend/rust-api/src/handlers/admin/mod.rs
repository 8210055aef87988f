mod admissions;
mod announcements;
mod audit;
mod classes;
mod exams;
mod library;
mod students;
mod users;

pub use admissions::*;
pub use announcements::*;
pub use audit::*;
pub use classes::*;
pub use exams::*;
pub use library::*;
pub use students::*;
pub use users::*;
