use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use js_sys::{Object, Reflect};
use shared::ValidationError;
use shared::capture::{CameraConstraints, CaptureDevice};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, DomException, HtmlCanvasElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack,
};
use yew::NodeRef;

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Camera backed by `navigator.mediaDevices`, previewed in the `<video>`
/// behind `video`.
#[derive(Clone, PartialEq)]
pub struct BrowserCamera {
    video: NodeRef,
}

impl BrowserCamera {
    pub fn new(video: NodeRef) -> Self {
        Self { video }
    }

    fn video(&self) -> Option<HtmlVideoElement> {
        self.video.cast::<HtmlVideoElement>()
    }
}

/// Maps a `getUserMedia` rejection onto the capture error taxonomy.
pub fn error_from_dom(name: &str, message: &str) -> ValidationError {
    match name {
        "NotAllowedError" | "SecurityError" | "PermissionDeniedError" => {
            ValidationError::PermissionDenied
        }
        "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
            ValidationError::Unsupported
        }
        _ => ValidationError::Device(if message.is_empty() { name.to_string() } else { message.to_string() }),
    }
}

fn js_error(err: JsValue) -> ValidationError {
    match err.dyn_ref::<DomException>() {
        Some(dom) => error_from_dom(&dom.name(), &dom.message()),
        None => ValidationError::Device(err.as_string().unwrap_or_else(|| format!("{:?}", err))),
    }
}

fn video_constraints(constraints: &CameraConstraints) -> Result<JsValue, JsValue> {
    let ideal = |value: u32| -> Result<JsValue, JsValue> {
        let obj = Object::new();
        Reflect::set(&obj, &"ideal".into(), &value.into())?;
        Ok(obj.into())
    };
    let video = Object::new();
    Reflect::set(&video, &"facingMode".into(), &constraints.facing.as_str().into())?;
    Reflect::set(&video, &"width".into(), &ideal(constraints.ideal_width)?)?;
    Reflect::set(&video, &"height".into(), &ideal(constraints.ideal_height)?)?;
    Ok(video.into())
}

/// Strips the data-URL prefix and decodes the JPEG bytes.
pub fn decode_jpeg_data_url(data_url: &str) -> Result<Vec<u8>, ValidationError> {
    let encoded = data_url
        .strip_prefix(JPEG_DATA_URL_PREFIX)
        .ok_or_else(|| ValidationError::Device("canvas did not produce a JPEG frame".into()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| ValidationError::Device(format!("invalid frame encoding: {}", e)))
}

impl CaptureDevice for BrowserCamera {
    type Stream = MediaStream;

    async fn acquire(&self, constraints: &CameraConstraints) -> Result<MediaStream, ValidationError> {
        let window = web_sys::window().ok_or(ValidationError::Unsupported)?;
        let devices = window.navigator().media_devices().map_err(|_| ValidationError::Unsupported)?;
        if JsValue::from(devices.clone()).is_undefined() {
            return Err(ValidationError::Unsupported);
        }

        let request = MediaStreamConstraints::new();
        request.set_audio(&JsValue::FALSE);
        request.set_video(&video_constraints(constraints).map_err(js_error)?);

        let promise = devices
            .get_user_media_with_constraints(&request)
            .map_err(js_error)?;
        let stream: MediaStream = JsFuture::from(promise).await.map_err(js_error)?.unchecked_into();

        if let Some(video) = self.video() {
            video.set_src_object(Some(&stream));
            if let Ok(playing) = video.play() {
                if let Err(e) = JsFuture::from(playing).await {
                    log::warn!("Camera preview did not start: {:?}", e);
                }
            }
        }
        log::info!("Camera stream acquired ({})", constraints.facing.as_str());
        Ok(stream)
    }

    fn capture_frame(&self, _stream: &MediaStream) -> Result<Vec<u8>, ValidationError> {
        let video = self
            .video()
            .ok_or_else(|| ValidationError::Device("camera preview is not mounted".into()))?;
        let (width, height) = (video.video_width(), video.video_height());
        if width == 0 || height == 0 {
            return Err(ValidationError::Device("camera is not ready yet".into()));
        }

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ValidationError::Device("no document".into()))?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| ValidationError::Device("canvas unavailable".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(js_error)?
            .ok_or_else(|| ValidationError::Device("2d context unavailable".into()))?
            .dyn_into()
            .map_err(|_| ValidationError::Device("2d context unavailable".into()))?;
        context
            .draw_image_with_html_video_element(&video, 0.0, 0.0)
            .map_err(js_error)?;

        let data_url = canvas.to_data_url_with_type("image/jpeg").map_err(js_error)?;
        decode_jpeg_data_url(&data_url)
    }

    fn release(&self, stream: MediaStream) {
        for track in stream.get_tracks().iter() {
            track.unchecked_into::<MediaStreamTrack>().stop();
        }
        if let Some(video) = self.video() {
            video.set_src_object(None);
        }
        log::info!("Camera stream released");
    }
}
