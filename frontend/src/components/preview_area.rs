use super::super::{Model, Msg};
use super::utils::debounce;
use yew::prelude::*;

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.0} KB", (bytes as f64 / 1024.0).ceil())
    }
}

/// Live camera preview. The `<video>` stays mounted so a stream can attach to
/// it as soon as it is granted.
pub fn render_camera(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let active = model.camera_active();
    html! {
        <div class={classes!("camera-container", (!active).then_some("hidden"))}>
            <video
                ref={model.video_ref.clone()}
                class="camera-preview"
                autoplay=true
                muted=true
                playsinline=true
            />
            if active {
                <div class="button-container">
                    <button class="analyze-btn" onclick={link.callback(|_| Msg::CaptureFrame)}>
                        <i class="fa-solid fa-circle-dot"></i>{" Capture"}
                    </button>
                    <button
                        class="analyze-btn"
                        style="background-color: var(--clear-color);"
                        onclick={link.callback(|_| Msg::CancelCamera)}
                    >
                        <i class="fa-solid fa-xmark"></i>{" Cancel"}
                    </button>
                </div>
            }
            if model.camera_starting {
                <p class="camera-status"><i class="fa-solid fa-spinner fa-spin"></i>{" Starting camera..."}</p>
            }
        </div>
    }
}

pub fn render_preview_area(model: &Model, ctx: &Context<Model>) -> Html {
    let Some(image) = &model.image else {
        return html! {};
    };
    let link = ctx.link().clone();
    let preview_src = model.preview_url.as_ref().map(|url| url.to_string());

    html! {
        <div id="preview-container">
            <div class="selected-image-preview">
                if let Some(src) = preview_src {
                    <img src={src} alt="Selected leaf" />
                }
                <p class="preview-caption">
                    { format!("{} · {}", image.filename(), format_size(image.len())) }
                </p>
            </div>
            <div class="button-container">
                <button
                    id="clear-btn"
                    class="analyze-btn"
                    style="background-color: var(--clear-color);"
                    disabled={model.loading}
                    onclick={link.callback(|_| Msg::ClearImage)}
                >
                    <i class="fa-solid fa-trash"></i>{" Clear"}
                </button>
                <button
                    id="diagnose-btn"
                    class="analyze-btn"
                    disabled={model.loading}
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::Diagnose)
                    })}
                >
                    {
                        if model.loading {
                            html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Diagnosing..."}</> }
                        } else {
                            html! { <><i class="fa-solid fa-magnifying-glass"></i>{" Diagnose"}</> }
                        }
                    }
                </button>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "1 KB");
        assert_eq!(format_size(200 * 1024), "200 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
    }
}
