pub mod bill_board;
pub mod course_editor;
pub mod navigation;
pub mod notice_board;
pub mod routine_editor;
pub mod session;

pub use bill_board::{BillBoard, BillDraft};
pub use course_editor::{CourseEditor, SaveReport};
pub use navigation::{MenuItem, Screen, dashboard_menu};
pub use notice_board::NoticeBoard;
pub use routine_editor::{Picker, RngPicker, RoutineEditor};
pub use session::{Authenticator, Credentials, FixedCredentialAuthenticator, Session, SessionGate};
