pub mod bill;
pub mod course;
pub mod identity;
pub mod notice;
pub mod routine;
pub mod semester;

pub use bill::{Bill, BillItem, BillListing, BillStatus, Money, NewBillItem, NewBillRequest};
pub use course::{Course, CourseField, TeacherSlot};
pub use identity::Identity;
pub use notice::{NewNoticeRequest, Notice};
pub use routine::{RoutineGrid, Slot, Weekday};
pub use semester::{Semester, UnknownSemester};
