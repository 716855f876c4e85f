use crate::api;
use shared::{LoginRequest, SignupRequest, UserInfo};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct AuthFormProps {
    pub on_signed_in: Callback<UserInfo>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Login,
    Signup,
}

fn bind(state: &UseStateHandle<String>) -> Callback<InputEvent> {
    let state = state.clone();
    Callback::from(move |e: InputEvent| {
        state.set(e.target_unchecked_into::<HtmlInputElement>().value());
    })
}

#[function_component(AuthForm)]
pub fn auth_form(props: &AuthFormProps) -> Html {
    let mode = use_state(|| Mode::Login);
    let email = use_state(String::new);
    let password = use_state(String::new);
    let name = use_state(String::new);
    let error = use_state(|| None::<String>);
    let submitting = use_state(|| false);

    let onsubmit = {
        let mode = mode.clone();
        let email = email.clone();
        let password = password.clone();
        let name = name.clone();
        let error = error.clone();
        let submitting = submitting.clone();
        let on_signed_in = props.on_signed_in.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *submitting {
                return;
            }
            submitting.set(true);
            error.set(None);

            let mode = *mode;
            let email = (*email).clone();
            let password = (*password).clone();
            let name = (*name).clone();
            let error = error.clone();
            let submitting = submitting.clone();
            let on_signed_in = on_signed_in.clone();
            spawn_local(async move {
                let outcome = match mode {
                    Mode::Login => api::login(&LoginRequest { email, password }).await,
                    Mode::Signup => api::signup(&SignupRequest { email, password, name }).await,
                };
                submitting.set(false);
                match outcome {
                    Ok(user) => {
                        log::info!("Signed in as {}", user.email);
                        on_signed_in.emit(user);
                    }
                    Err(e) => error.set(Some(e)),
                }
            });
        })
    };

    let toggle = {
        let mode = mode.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            error.set(None);
            mode.set(match *mode {
                Mode::Login => Mode::Signup,
                Mode::Signup => Mode::Login,
            });
        })
    };

    let signing_up = *mode == Mode::Signup;

    html! {
        <div class="auth-container">
            <h2>{ if signing_up { "Create an account" } else { "Sign in" } }</h2>
            <form class="auth-form" {onsubmit}>
                if signing_up {
                    <label>
                        {"Name"}
                        <input type="text" value={(*name).clone()} oninput={bind(&name)} minlength="2" required=true />
                    </label>
                }
                <label>
                    {"Email"}
                    <input type="email" value={(*email).clone()} oninput={bind(&email)} required=true />
                </label>
                <label>
                    {"Password"}
                    <input
                        type="password"
                        value={(*password).clone()}
                        oninput={bind(&password)}
                        minlength={if signing_up { "6" } else { "1" }}
                        required=true
                    />
                </label>
                if let Some(message) = &*error {
                    <p class="error-message">{ message }</p>
                }
                <button class="analyze-btn" type="submit" disabled={*submitting}>
                    { if signing_up { "Sign up" } else { "Sign in" } }
                </button>
            </form>
            <button class="link-button" onclick={toggle}>
                { if signing_up { "Already have an account? Sign in" } else { "New here? Create an account" } }
            </button>
        </div>
    }
}
