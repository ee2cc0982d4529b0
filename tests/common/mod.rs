#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use face_enroll::camera::{CameraBackend, VideoConstraints, VideoStream};
use face_enroll::core::{ControllerSettings, EnrollmentController, EnrollmentStatus};
use face_enroll::{EnrollError, EnrollmentApi, Result};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Camera double; every stream it hands out shares its track counter with the test.
#[derive(Clone, Default)]
pub struct FakeCamera {
    pub deny: Rc<Cell<bool>>,
    pub fail_grab: Rc<Cell<bool>>,
    pub acquisitions: Rc<Cell<usize>>,
    pub streams: Rc<RefCell<Vec<Rc<Cell<usize>>>>>,
    pub last_constraints: Rc<RefCell<Option<VideoConstraints>>>,
    pub size: (u32, u32),
}

impl FakeCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self { size: (width, height), ..Default::default() }
    }

    pub fn live_streams(&self) -> usize {
        self.streams.borrow().iter().filter(|t| t.get() > 0).count()
    }

    pub fn tracks_of(&self, index: usize) -> usize {
        self.streams.borrow()[index].get()
    }
}

pub struct FakeStream {
    tracks: Rc<Cell<usize>>,
    fail_grab: Rc<Cell<bool>>,
    size: (u32, u32),
}

impl CameraBackend for FakeCamera {
    type Stream = FakeStream;

    fn acquire(&mut self, constraints: &VideoConstraints) -> Result<FakeStream> {
        self.acquisitions.set(self.acquisitions.get() + 1);
        *self.last_constraints.borrow_mut() = Some(constraints.clone());
        if self.deny.get() {
            return Err(EnrollError::Camera("Permission denied opening /dev/video0".into()));
        }
        let tracks = Rc::new(Cell::new(1));
        self.streams.borrow_mut().push(tracks.clone());
        Ok(FakeStream { tracks, fail_grab: self.fail_grab.clone(), size: self.size })
    }
}

impl VideoStream for FakeStream {
    fn frame_size(&self) -> (u32, u32) {
        self.size
    }

    fn grab_frame(&mut self) -> Result<DynamicImage> {
        if self.tracks.get() == 0 {
            return Err(EnrollError::Camera("stream stopped".into()));
        }
        if self.fail_grab.get() {
            return Err(EnrollError::Camera("device unplugged".into()));
        }
        let (w, h) = self.size;
        Ok(DynamicImage::ImageRgb8(ImageBuffer::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 200])
        })))
    }

    fn live_tracks(&self) -> usize {
        self.tracks.get()
    }

    fn stop(&mut self) {
        self.tracks.set(0);
    }
}

#[derive(Default)]
pub struct ApiState {
    pub registered: bool,
    pub upload_error: Option<(u16, String)>,
    pub delete_error: Option<(u16, String)>,
    pub status_error: bool,
    pub status_calls: usize,
    pub uploads: Vec<String>,
    pub delete_calls: usize,
}

/// In-memory backend that follows the biometric endpoint contract.
#[derive(Clone, Default)]
pub struct FakeApi {
    pub state: Rc<RefCell<ApiState>>,
}

impl FakeApi {
    pub fn registered() -> Self {
        let api = Self::default();
        api.state.borrow_mut().registered = true;
        api
    }
}

impl EnrollmentApi for FakeApi {
    fn face_status(&self) -> Result<EnrollmentStatus> {
        let mut state = self.state.borrow_mut();
        state.status_calls += 1;
        if state.status_error {
            return Err(EnrollError::Server { status: 500, detail: "Failed to load face status".into() });
        }
        Ok(if state.registered {
            EnrollmentStatus::registered(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(), None)
        } else {
            EnrollmentStatus::not_registered()
        })
    }

    fn register_face(&self, image_data: &str) -> Result<String> {
        let mut state = self.state.borrow_mut();
        state.uploads.push(image_data.to_string());
        if let Some((status, detail)) = state.upload_error.clone() {
            return Err(EnrollError::Server { status, detail });
        }
        state.registered = true;
        Ok("Face registered successfully".to_string())
    }

    fn delete_face(&self) -> Result<String> {
        let mut state = self.state.borrow_mut();
        state.delete_calls += 1;
        if let Some((status, detail)) = state.delete_error.clone() {
            return Err(EnrollError::Server { status, detail });
        }
        if !state.registered {
            return Err(EnrollError::Server { status: 404, detail: "No face registration found".into() });
        }
        state.registered = false;
        Ok("Face registration deleted".to_string())
    }
}

pub fn controller(api: &FakeApi, camera: &FakeCamera) -> EnrollmentController<FakeApi, FakeCamera> {
    let mut controller = EnrollmentController::new(api.clone(), camera.clone(), ControllerSettings::default());
    controller.enter_section();
    controller
}
