//! Image capture: turns a picked file or a camera frame into a validated
//! [`ImagePayload`].
//!
//! The camera side is expressed through the [`CaptureDevice`] capability so the
//! same acquire / capture / release sequence runs against the browser's media
//! devices in the frontend and against fakes in tests.

use std::future::Future;
use std::str::FromStr;

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Upper bound on an uploaded image, inclusive.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Filename given to frames grabbed from a camera.
pub const CAMERA_FILENAME: &str = "camera-capture.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
pub enum ImageMime {
    #[strum(serialize = "image/jpeg")]
    Jpeg,
    #[strum(serialize = "image/png")]
    Png,
    #[strum(serialize = "image/webp")]
    Webp,
}

impl ImageMime {
    /// Parses a `Content-Type` style string, ignoring case and parameters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let essence = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        ImageMime::from_str(&essence).map_err(|_| ValidationError::UnsupportedType(raw.to_string()))
    }

    /// Value for an `<input type="file" accept=...>` attribute.
    pub fn accept_attribute() -> String {
        ImageMime::iter()
            .map(|mime| mime.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ValidationError {
    #[error("Unsupported image type `{0}`. Please upload a JPEG, PNG, or WebP image")]
    UnsupportedType(String),
    #[error("Image is {size} bytes; the limit is 5 MB")]
    TooLarge { size: usize },
    #[error("Camera access denied. Please grant camera permissions in your browser settings")]
    PermissionDenied,
    #[error("Camera capture is not supported on this device")]
    Unsupported,
    #[error("Camera failure: {0}")]
    Device(String),
}

impl ValidationError {
    /// Stable machine-readable tag, e.g. `too_large`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// A validated image, ready to be sent for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    mime: ImageMime,
    filename: String,
}

impl ImagePayload {
    /// File-picker path: the type is checked before the size.
    pub fn from_file(
        bytes: Vec<u8>,
        mime: &str,
        filename: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let mime = ImageMime::parse(mime)?;
        Self::new(bytes, mime, filename.into())
    }

    fn new(bytes: Vec<u8>, mime: ImageMime, filename: String) -> Result<Self, ValidationError> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ValidationError::TooLarge { size: bytes.len() });
        }
        Ok(Self {
            bytes,
            mime,
            filename,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_parts(self) -> (Vec<u8>, ImageMime, String) {
        (self.bytes, self.mime, self.filename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Environment,
    User,
}

impl Facing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Environment => "environment",
            Facing::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// Platform camera capability.
///
/// `release` must stop every track of the stream; [`CameraSession`] guarantees
/// it is called exactly once per acquired stream.
pub trait CaptureDevice {
    type Stream;

    fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> impl Future<Output = Result<Self::Stream, ValidationError>>;

    /// Grabs one frame and returns it JPEG-encoded.
    fn capture_frame(&self, stream: &Self::Stream) -> Result<Vec<u8>, ValidationError>;

    fn release(&self, stream: Self::Stream);
}

/// An open camera stream. Dropping the session releases the stream, so
/// cancelling, capturing and tearing down the owning view all free the device.
pub struct CameraSession<D: CaptureDevice> {
    device: D,
    stream: Option<D::Stream>,
}

impl<D: CaptureDevice> CameraSession<D> {
    pub async fn open(device: D, constraints: &CameraConstraints) -> Result<Self, ValidationError> {
        let stream = device.acquire(constraints).await?;
        Ok(Self {
            device,
            stream: Some(stream),
        })
    }

    pub fn stream(&self) -> Option<&D::Stream> {
        self.stream.as_ref()
    }

    /// Captures a single frame and releases the stream, whatever the outcome.
    pub fn capture(mut self) -> Result<ImagePayload, ValidationError> {
        let frame = match self.stream.as_ref() {
            Some(stream) => self.device.capture_frame(stream),
            None => Err(ValidationError::Device("camera stream already released".into())),
        };
        self.release();
        ImagePayload::new(frame?, ImageMime::Jpeg, CAMERA_FILENAME.to_string())
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.device.release(stream);
        }
    }
}

impl<D: CaptureDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}

/// One-shot camera capture for targets without a live preview.
pub async fn capture_from_camera<D: CaptureDevice>(
    device: D,
    constraints: &CameraConstraints,
) -> Result<ImagePayload, ValidationError> {
    CameraSession::open(device, constraints).await?.capture()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        acquired: Cell<u32>,
        released: Cell<u32>,
    }

    impl Counters {
        fn live_streams(&self) -> u32 {
            self.acquired.get() - self.released.get()
        }
    }

    enum Behaviour {
        Ok(Vec<u8>),
        Deny,
        NoApi,
        FrameFails,
    }

    struct FakeCamera {
        counters: Rc<Counters>,
        behaviour: Behaviour,
    }

    impl FakeCamera {
        fn new(behaviour: Behaviour) -> (Self, Rc<Counters>) {
            let counters = Rc::new(Counters::default());
            (
                Self {
                    counters: counters.clone(),
                    behaviour,
                },
                counters,
            )
        }
    }

    impl CaptureDevice for FakeCamera {
        type Stream = u32;

        async fn acquire(&self, constraints: &CameraConstraints) -> Result<u32, ValidationError> {
            assert_eq!(constraints.facing, Facing::Environment);
            match self.behaviour {
                Behaviour::Deny => Err(ValidationError::PermissionDenied),
                Behaviour::NoApi => Err(ValidationError::Unsupported),
                _ => {
                    self.counters.acquired.set(self.counters.acquired.get() + 1);
                    Ok(7)
                }
            }
        }

        fn capture_frame(&self, stream: &u32) -> Result<Vec<u8>, ValidationError> {
            assert_eq!(*stream, 7);
            match &self.behaviour {
                Behaviour::Ok(frame) => Ok(frame.clone()),
                _ => Err(ValidationError::Device("no frame".into())),
            }
        }

        fn release(&self, _stream: u32) {
            self.counters.released.set(self.counters.released.get() + 1);
        }
    }

    #[test]
    fn test_rejects_types_outside_allow_list() {
        for mime in ["image/gif", "image/bmp", "application/pdf", "text/plain", "", "image/jpg"] {
            let err = ImagePayload::from_file(vec![1, 2, 3], mime, "leaf").unwrap_err();
            assert_eq!(err, ValidationError::UnsupportedType(mime.to_string()));
            assert_eq!(err.kind(), "unsupported_type");
        }
    }

    #[test]
    fn test_type_checked_before_size() {
        let err = ImagePayload::from_file(vec![0; MAX_IMAGE_BYTES + 1], "image/gif", "big.gif").unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType(_)));
    }

    #[test]
    fn test_accepts_allow_list_with_parameters_and_case() {
        let payload = ImagePayload::from_file(vec![1], "IMAGE/PNG; charset=binary", "leaf.png").unwrap();
        assert_eq!(payload.mime(), ImageMime::Png);
        assert_eq!(payload.mime().as_ref(), "image/png");
        assert_eq!(payload.filename(), "leaf.png");
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(ImagePayload::from_file(vec![0; MAX_IMAGE_BYTES], "image/webp", "ok.webp").is_ok());

        let err = ImagePayload::from_file(vec![0; MAX_IMAGE_BYTES + 1], "image/jpeg", "big.jpg").unwrap_err();
        assert_eq!(err, ValidationError::TooLarge { size: MAX_IMAGE_BYTES + 1 });
        assert_eq!(err.kind(), "too_large");
    }

    #[test]
    fn test_accept_attribute_lists_allow_list() {
        assert_eq!(ImageMime::accept_attribute(), "image/jpeg,image/png,image/webp");
    }

    #[test]
    fn test_camera_capture_releases_stream() {
        let (camera, counters) = FakeCamera::new(Behaviour::Ok(vec![0xFF, 0xD8, 0xFF]));
        let payload = block_on(capture_from_camera(camera, &CameraConstraints::default())).unwrap();

        assert_eq!(payload.mime(), ImageMime::Jpeg);
        assert_eq!(payload.filename(), CAMERA_FILENAME);
        assert_eq!(payload.bytes(), &[0xFF, 0xD8, 0xFF]);
        assert_eq!(counters.acquired.get(), 1);
        assert_eq!(counters.live_streams(), 0);
    }

    #[test]
    fn test_permission_denied_leaves_nothing_acquired() {
        let (camera, counters) = FakeCamera::new(Behaviour::Deny);
        let err = block_on(capture_from_camera(camera, &CameraConstraints::default())).unwrap_err();

        assert_eq!(err, ValidationError::PermissionDenied);
        assert_eq!(counters.acquired.get(), 0);
        assert_eq!(counters.released.get(), 0);
    }

    #[test]
    fn test_missing_camera_api_is_unsupported() {
        let (camera, _) = FakeCamera::new(Behaviour::NoApi);
        let err = block_on(CameraSession::open(camera, &CameraConstraints::default())).err();
        assert_eq!(err, Some(ValidationError::Unsupported));
    }

    #[test]
    fn test_failed_frame_still_releases() {
        let (camera, counters) = FakeCamera::new(Behaviour::FrameFails);
        let session = block_on(CameraSession::open(camera, &CameraConstraints::default())).unwrap();
        assert!(session.stream().is_some());

        let err = session.capture().unwrap_err();
        assert!(matches!(err, ValidationError::Device(_)));
        assert_eq!(counters.live_streams(), 0);
    }

    #[test]
    fn test_oversized_frame_rejected_after_release() {
        let (camera, counters) = FakeCamera::new(Behaviour::Ok(vec![0; MAX_IMAGE_BYTES + 10]));
        let err = block_on(capture_from_camera(camera, &CameraConstraints::default())).unwrap_err();

        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert_eq!(counters.live_streams(), 0);
    }

    #[test]
    fn test_cancel_and_drop_release_once() {
        let (camera, counters) = FakeCamera::new(Behaviour::Ok(vec![1]));
        let session = block_on(CameraSession::open(camera, &CameraConstraints::default())).unwrap();
        session.cancel();
        assert_eq!(counters.released.get(), 1);

        let (camera, counters) = FakeCamera::new(Behaviour::Ok(vec![1]));
        {
            let _session = block_on(CameraSession::open(camera, &CameraConstraints::default())).unwrap();
            assert_eq!(counters.live_streams(), 1);
        }
        assert_eq!(counters.released.get(), 1);
    }
}
