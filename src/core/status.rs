use chrono::{DateTime, NaiveDateTime, Utc};
use crate::common::{EnrollError, Result};
use crate::service::protocol::FaceStatusResponse;

/// The server's enrollment record, as last fetched.
///
/// `enrolled_at` is present exactly when a face is registered; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentStatus {
    has_face_registered: bool,
    enrolled_at: Option<DateTime<Utc>>,
    last_verified_at: Option<DateTime<Utc>>,
}

impl EnrollmentStatus {
    pub fn registered(enrolled_at: DateTime<Utc>, last_verified_at: Option<DateTime<Utc>>) -> Self {
        Self {
            has_face_registered: true,
            enrolled_at: Some(enrolled_at),
            last_verified_at,
        }
    }

    pub fn not_registered() -> Self {
        Self {
            has_face_registered: false,
            enrolled_at: None,
            last_verified_at: None,
        }
    }

    pub fn has_face_registered(&self) -> bool {
        self.has_face_registered
    }

    pub fn enrolled_at(&self) -> Option<DateTime<Utc>> {
        self.enrolled_at
    }

    pub fn last_verified_at(&self) -> Option<DateTime<Utc>> {
        self.last_verified_at
    }
}

impl TryFrom<FaceStatusResponse> for EnrollmentStatus {
    type Error = EnrollError;

    fn try_from(wire: FaceStatusResponse) -> Result<Self> {
        let enrolled_at = wire.enrolled_at.as_deref().map(parse_timestamp).transpose()?;
        let last_verified_at = wire.last_verified_at.as_deref().map(parse_timestamp).transpose()?;

        match (wire.has_face_registered, enrolled_at) {
            (true, Some(enrolled_at)) => Ok(Self::registered(enrolled_at, last_verified_at)),
            (false, None) if last_verified_at.is_none() => Ok(Self::not_registered()),
            (true, None) => Err(EnrollError::Protocol(
                "face reported as registered without an enrollment time".into(),
            )),
            (false, _) => Err(EnrollError::Protocol(
                "enrollment timestamps present for an unregistered face".into(),
            )),
        }
    }
}

/// Accepts RFC 3339 and the backend's naive `isoformat()` output (read as UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| EnrollError::Protocol(format!("invalid timestamp {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wire(registered: bool, enrolled: Option<&str>, verified: Option<&str>) -> FaceStatusResponse {
        FaceStatusResponse {
            has_face_registered: registered,
            enrolled_at: enrolled.map(str::to_string),
            last_verified_at: verified.map(str::to_string),
        }
    }

    #[test]
    fn parses_naive_backend_timestamps_as_utc() {
        let ts = parse_timestamp("2024-03-05T14:30:00.123456").unwrap();
        assert_eq!(ts.date_naive(), Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap().date_naive());
        assert_eq!(ts.timestamp(), Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap().timestamp());
    }

    #[test]
    fn parses_offset_timestamps() {
        let ts = parse_timestamp("2024-03-05T08:30:00-06:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap());
    }

    #[test]
    fn registered_status_requires_enrollment_time() {
        let status = EnrollmentStatus::try_from(wire(true, Some("2024-01-01T10:00:00"), None)).unwrap();
        assert!(status.has_face_registered());
        assert!(status.enrolled_at().is_some());
        assert!(status.last_verified_at().is_none());

        let err = EnrollmentStatus::try_from(wire(true, None, None)).unwrap_err();
        assert!(matches!(err, EnrollError::Protocol(_)));
    }

    #[test]
    fn unregistered_status_rejects_timestamps() {
        assert_eq!(
            EnrollmentStatus::try_from(wire(false, None, None)).unwrap(),
            EnrollmentStatus::not_registered()
        );
        assert!(EnrollmentStatus::try_from(wire(false, Some("2024-01-01T10:00:00"), None)).is_err());
        assert!(EnrollmentStatus::try_from(wire(false, None, Some("2024-01-01T10:00:00"))).is_err());
    }

    #[test]
    fn garbage_timestamp_is_a_protocol_error() {
        assert!(EnrollmentStatus::try_from(wire(true, Some("yesterday"), None)).is_err());
    }
}
