use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gloo_timers::callback::Timeout;
use shared::ImagePayload;
use std::cell::RefCell;
use std::rc::Rc;
use yew::prelude::*;

/// Collapses bursts of clicks into one call after `duration` ms.
pub fn debounce<F>(duration: u32, callback: F) -> Callback<MouseEvent>
where
    F: Fn() + Clone + 'static,
{
    let timeout = Rc::new(RefCell::new(None::<Timeout>));

    Callback::from(move |_| {
        let mut timeout_ref = timeout.borrow_mut();

        if let Some(old_timeout) = timeout_ref.take() {
            old_timeout.cancel();
        }

        let inner_callback = callback.clone();
        *timeout_ref = Some(Timeout::new(duration, move || inner_callback()));
    })
}

/// Inline `data:` URL for an image the result page can show without the
/// original file.
pub fn payload_data_url(payload: &ImagePayload) -> String {
    format!(
        "data:{};base64,{}",
        payload.mime(),
        STANDARD.encode(payload.bytes())
    )
}

pub fn render_error_message(error: Option<&str>) -> Html {
    match error {
        Some(error_msg) => html! {
            <div class="error-message" role="alert">
                <i class="fa-solid fa-circle-exclamation"></i>
                <p>{ error_msg }</p>
            </div>
        },
        None => html! {},
    }
}
