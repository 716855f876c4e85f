mod api;
mod camera;
mod components;

use camera::BrowserCamera;
use components::auth_form::AuthForm;
use components::encyclopedia::Encyclopedia;
use components::header::render_header;
use components::preview_area::{render_camera, render_preview_area};
use components::results::render_results;
use components::upload_section::render_upload_section;
use components::utils::{payload_data_url, render_error_message};
use gloo_file::{Blob, File as GlooFile, ObjectUrl};
use shared::capture::{CameraConstraints, CameraSession, MAX_IMAGE_BYTES};
use shared::{DiagnosisResult, HandoffSlot, ImageMime, ImagePayload, UserInfo, ValidationError};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Diagnose,
    Result,
    Encyclopedia,
    Auth,
}

pub enum Msg {
    // Session
    SessionLoaded(Option<UserInfo>),
    SignedIn(UserInfo),
    Logout,
    LoggedOut,
    RestoreLatest(DiagnosisResult),
    Navigate(View),

    // Capture
    FileChosen(GlooFile),
    ImageReady(ImagePayload),
    ClearImage,
    OpenCamera,
    CameraOpened(Result<CameraSession<BrowserCamera>, ValidationError>),
    CaptureFrame,
    CancelCamera,

    // Diagnosis
    Diagnose,
    DiagnosisDone(DiagnosisResult),

    // UI state
    SetError(Option<String>),
    SetDragging(bool),
}

pub struct Model {
    view: View,
    user: Option<UserInfo>,
    checking_session: bool,
    image: Option<ImagePayload>,
    preview_url: Option<ObjectUrl>,
    camera: Option<CameraSession<BrowserCamera>>,
    camera_starting: bool,
    video_ref: NodeRef,
    handoff: HandoffSlot,
    loading: bool,
    error: Option<String>,
    is_dragging: bool,
}

impl Model {
    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }

    fn needs_session(view: View) -> bool {
        matches!(view, View::Diagnose | View::Result)
    }
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        ctx.link().send_future(async {
            match api::current_user().await {
                Ok(user) => Msg::SessionLoaded(user),
                Err(e) => {
                    log::warn!("Session check failed: {}", e);
                    Msg::SessionLoaded(None)
                }
            }
        });

        Self {
            view: View::Diagnose,
            user: None,
            checking_session: true,
            image: None,
            preview_url: None,
            camera: None,
            camera_starting: false,
            video_ref: NodeRef::default(),
            handoff: HandoffSlot::new(),
            loading: false,
            error: None,
            is_dragging: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            // Session
            Msg::SessionLoaded(user) => self.handle_session_loaded(ctx, user),
            Msg::SignedIn(user) => {
                self.view = View::Diagnose;
                self.handle_session_loaded(ctx, Some(user))
            }
            Msg::Logout => {
                ctx.link().send_future(async {
                    if let Err(e) = api::logout().await {
                        log::warn!("Logout request failed: {}", e);
                    }
                    Msg::LoggedOut
                });
                false
            }
            Msg::LoggedOut => {
                self.user = None;
                self.handoff.clear();
                self.clear_image();
                self.close_camera();
                self.view = View::Auth;
                true
            }
            Msg::RestoreLatest(result) => {
                if self.handoff.is_empty() {
                    self.handoff.set(result);
                }
                true
            }
            Msg::Navigate(view) => {
                if view != View::Diagnose {
                    self.close_camera();
                }
                self.view = view;
                self.error = None;
                true
            }

            // Capture
            Msg::FileChosen(file) => self.handle_file_chosen(ctx, file),
            Msg::ImageReady(payload) => {
                self.preview_url = Some(ObjectUrl::from(Blob::new_with_options(
                    payload.bytes(),
                    Some(payload.mime().as_ref()),
                )));
                self.image = Some(payload);
                self.error = None;
                true
            }
            Msg::ClearImage => {
                self.clear_image();
                true
            }
            Msg::OpenCamera => self.handle_open_camera(ctx),
            Msg::CameraOpened(outcome) => self.handle_camera_opened(outcome),
            Msg::CaptureFrame => self.handle_capture_frame(ctx),
            Msg::CancelCamera => {
                self.close_camera();
                true
            }

            // Diagnosis
            Msg::Diagnose => self.handle_diagnose(ctx),
            Msg::DiagnosisDone(result) => self.handle_diagnosis_done(result),

            // UI state
            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header(self, ctx) }

                <main class="main-content">
                    { self.render_main(ctx) }
                </main>

                <footer class="app-footer">
                    <p>{"PlantDoc | Fullstack Rust WASM"}</p>
                </footer>
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.close_camera();
    }
}

// Handler methods
impl Model {
    fn handle_session_loaded(&mut self, ctx: &Context<Self>, user: Option<UserInfo>) -> bool {
        self.checking_session = false;
        match user {
            Some(user) => {
                log::info!("Session active for {}", user.email);
                self.user = Some(user);
                ctx.link().send_future_batch(async {
                    match api::latest_diagnosis().await {
                        Ok(latest) => latest.map(Msg::RestoreLatest),
                        Err(e) => {
                            log::warn!("Could not restore last diagnosis: {}", e);
                            None
                        }
                    }
                });
            }
            None => self.user = None,
        }
        true
    }

    fn handle_file_chosen(&mut self, ctx: &Context<Self>, file: GlooFile) -> bool {
        // Cheap checks first so oversized files are never read into memory.
        let mime = file.raw_mime_type();
        if let Err(e) = ImageMime::parse(&mime) {
            self.error = Some(e.to_string());
            return true;
        }
        if file.size() > MAX_IMAGE_BYTES as u64 {
            self.error = Some(ValidationError::TooLarge { size: file.size() as usize }.to_string());
            return true;
        }

        ctx.link().send_future(async move {
            match gloo_file::futures::read_as_bytes(&file).await {
                Ok(bytes) => match ImagePayload::from_file(bytes, &mime, file.name()) {
                    Ok(payload) => Msg::ImageReady(payload),
                    Err(e) => Msg::SetError(Some(e.to_string())),
                },
                Err(e) => Msg::SetError(Some(format!("Could not read {}: {}", file.name(), e))),
            }
        });
        false
    }

    fn handle_open_camera(&mut self, ctx: &Context<Self>) -> bool {
        if self.camera.is_some() || self.camera_starting {
            return false;
        }
        self.camera_starting = true;
        self.error = None;

        let device = BrowserCamera::new(self.video_ref.clone());
        let link = ctx.link().clone();
        spawn_local(async move {
            let outcome = CameraSession::open(device, &CameraConstraints::default()).await;
            link.send_message(Msg::CameraOpened(outcome));
        });
        true
    }

    fn handle_camera_opened(&mut self, outcome: Result<CameraSession<BrowserCamera>, ValidationError>) -> bool {
        self.camera_starting = false;
        match outcome {
            // The user left the capture view while permission was pending.
            Ok(session) if self.view != View::Diagnose => session.cancel(),
            Ok(session) => self.camera = Some(session),
            Err(e) => {
                log::warn!("Camera unavailable: {}", e);
                self.error = Some(e.to_string());
            }
        }
        true
    }

    fn handle_capture_frame(&mut self, ctx: &Context<Self>) -> bool {
        let Some(session) = self.camera.take() else {
            return false;
        };
        match session.capture() {
            Ok(payload) => ctx.link().send_message(Msg::ImageReady(payload)),
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }

    fn handle_diagnose(&mut self, ctx: &Context<Self>) -> bool {
        if self.loading {
            return false;
        }
        let Some(payload) = self.image.clone() else {
            self.error = Some("Please select or capture an image first.".into());
            return true;
        };
        self.loading = true;
        self.error = None;

        ctx.link().send_future(async move {
            match api::diagnose(&payload).await {
                Ok(mut result) => {
                    if result.uploaded_image.trim().is_empty() {
                        result.uploaded_image = payload_data_url(&payload);
                    }
                    Msg::DiagnosisDone(result)
                }
                Err(e) => {
                    log::error!("Diagnosis failed: {}", e);
                    Msg::SetError(Some(e))
                }
            }
        });
        true
    }

    fn handle_diagnosis_done(&mut self, result: DiagnosisResult) -> bool {
        log::info!("Diagnosis ready: {}", result.headline());
        self.handoff.set(result);
        self.loading = false;
        self.clear_image();
        self.view = View::Result;
        true
    }

    fn clear_image(&mut self) {
        self.image = None;
        self.preview_url = None;
    }

    fn close_camera(&mut self) {
        if let Some(session) = self.camera.take() {
            session.cancel();
        }
    }

    fn render_main(&self, ctx: &Context<Self>) -> Html {
        if self.checking_session {
            return html! { <p class="loading"><i class="fa-solid fa-spinner fa-spin"></i>{" Loading..."}</p> };
        }

        let view = if self.user.is_none() && Self::needs_session(self.view) {
            View::Auth
        } else {
            self.view
        };

        match view {
            View::Auth => html! {
                <AuthForm on_signed_in={ctx.link().callback(Msg::SignedIn)} />
            },
            View::Encyclopedia => html! { <Encyclopedia /> },
            View::Result => render_results(self, ctx),
            View::Diagnose => html! {
                <>
                    { render_upload_section(self, ctx) }
                    { render_camera(self, ctx) }
                    { render_error_message(self.error.as_deref()) }
                    { render_preview_area(self, ctx) }
                </>
            },
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("PlantDoc starting...");
    yew::Renderer::<Model>::new().render();
}
