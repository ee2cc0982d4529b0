pub mod capture;
pub mod controller;
pub mod notice;
pub mod phase;
pub mod status;
pub mod view;

pub use capture::CapturedFrame;
pub use controller::{ControllerSettings, EnrollmentController};
pub use notice::{Notice, NoticeKind, Notices};
pub use phase::{CommandOutcome, Phase};
pub use status::EnrollmentStatus;
pub use view::FaceSectionView;
