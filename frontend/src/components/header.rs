use super::super::{Model, Msg, View};
use yew::prelude::*;

fn nav_button(model: &Model, ctx: &Context<Model>, view: View, icon: &str, label: &str) -> Html {
    let active = model.view == view;
    html! {
        <button
            class={classes!("nav-link", active.then_some("active"))}
            onclick={ctx.link().callback(move |_| Msg::Navigate(view))}
        >
            <i class={classes!("fa-solid", icon.to_string())}></i>{ format!(" {}", label) }
        </button>
    }
}

pub fn render_header(model: &Model, ctx: &Context<Model>) -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-leaf"></i>{" PlantDoc"}</h1>
            <p class="subtitle">{"Snap a leaf, get a diagnosis"}</p>
            <nav class="app-nav">
                { nav_button(model, ctx, View::Diagnose, "fa-camera", "Diagnose") }
                { nav_button(model, ctx, View::Result, "fa-notes-medical", "Result") }
                { nav_button(model, ctx, View::Encyclopedia, "fa-book", "Encyclopedia") }
                {
                    match &model.user {
                        Some(user) => html! {
                            <div class="user-info">
                                <span class="user-name">{ &user.name }</span>
                                <button class="logout-button" onclick={ctx.link().callback(|_| Msg::Logout)}>
                                    <i class="fa-solid fa-sign-out-alt"></i>{" Logout"}
                                </button>
                            </div>
                        },
                        None => nav_button(model, ctx, View::Auth, "fa-right-to-bracket", "Sign in"),
                    }
                }
            </nav>
        </header>
    }
}
