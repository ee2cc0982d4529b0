pub mod client;
pub mod protocol;

pub use client::ServiceClient;

use crate::common::Result;
use crate::core::status::EnrollmentStatus;

/// The three biometric endpoints the enrollment controller talks to.
pub trait EnrollmentApi {
    fn face_status(&self) -> Result<EnrollmentStatus>;

    /// Uploads a `data:image/jpeg;base64,...` URL. Returns the server's message.
    fn register_face(&self, image_data: &str) -> Result<String>;

    /// Returns the server's confirmation detail.
    fn delete_face(&self) -> Result<String>;
}
