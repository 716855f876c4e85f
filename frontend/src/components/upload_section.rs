use super::super::{Model, Msg};
use super::utils::debounce;
use gloo_file::File as GlooFile;
use shared::ImageMime;
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, FileList, HtmlInputElement};
use yew::prelude::*;

const FILE_INPUT_ID: &str = "file-input";

fn first_file(file_list: Option<FileList>) -> Option<GlooFile> {
    file_list.and_then(|files| files.item(0)).map(GlooFile::from)
}

fn open_file_picker() {
    let input = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(FILE_INPUT_ID))
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok());
    if let Some(input) = input {
        input.click();
    }
}

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let busy = model.loading || model.camera_active();

    let handle_change = link.batch_callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let file = first_file(input.files());
        input.set_value("");
        file.map(Msg::FileChosen)
    });

    let handle_drag_over = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(true)
    });

    let handle_drag_leave = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(false)
    });

    let handle_drop = link.batch_callback(|e: DragEvent| {
        e.prevent_default();
        let file = first_file(e.data_transfer().and_then(|dt| dt.files()));
        vec![Some(Msg::SetDragging(false)), file.map(Msg::FileChosen)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
    });

    html! {
        <div class="upload-section">
            <input
                type="file"
                id={FILE_INPUT_ID}
                accept={ImageMime::accept_attribute()}
                style="display: none;"
                onchange={handle_change}
            />

            <div class="button-container">
                <button
                    id="upload-button"
                    class="analyze-btn"
                    disabled={busy}
                    onclick={debounce(300, open_file_picker)}
                >
                    <i class="fa-solid fa-upload"></i>{" Choose Photo"}
                </button>
                <button
                    id="camera-button"
                    class="analyze-btn"
                    disabled={busy || model.camera_starting}
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::OpenCamera)
                    })}
                >
                    <i class="fa-solid fa-camera"></i>{" Use Camera"}
                </button>
            </div>

            <div
                id="drop-zone"
                class={classes!("upload-area", model.is_dragging.then_some("drag-over"))}
                ondragover={handle_drag_over}
                ondragleave={handle_drag_leave}
                ondrop={handle_drop}
                onclick={debounce(300, open_file_picker)}
            >
                <div class="upload-placeholder">
                    <i class="fa-solid fa-cloud-arrow-up"></i>
                    <p>{"Drag & drop a leaf photo here, or click"}</p>
                    <p class="file-types">{"Supported formats: JPG, PNG, WEBP (max 5 MB)"}</p>
                </div>
            </div>
        </div>
    }
}
