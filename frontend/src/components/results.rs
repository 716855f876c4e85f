use super::super::{Model, Msg, View};
use shared::presentation::{present, PredictionRow, ResultCard, ResultView};
use yew::prelude::*;

fn render_prediction(row: &PredictionRow) -> Html {
    html! {
        <div class="result-item">
            <div class="result-label">{ &row.label }</div>
            <div class="result-bar-container">
                <div class="result-bar" style={format!("width: {}%", row.width)}></div>
            </div>
            <div class="result-value">{ &row.confidence_label }</div>
        </div>
    }
}

fn render_field(label: &str, value: &str) -> Html {
    html! {
        <div class="result-field">
            <h4>{ label }</h4>
            <p>{ value.to_string() }</p>
        </div>
    }
}

fn render_card(card: &ResultCard, ctx: &Context<Model>) -> Html {
    html! {
        <div class="results-container">
            <div class="result-header">
                <img class="result-image" src={card.image_src.clone()} alt="Diagnosed leaf" />
                <h2><i class="fa-solid fa-seedling"></i>{ format!(" {}", card.headline) }</h2>
                <div class="confidence-meter">
                    <div class="meter-label">{"Confidence:"}</div>
                    <div class="meter">
                        <div class="meter-fill" style={format!("width: {}%", card.confidence_width)}></div>
                    </div>
                    <div class="meter-value">{ &card.confidence_label }</div>
                </div>
            </div>
            <div class="detailed-results">
                { render_field("Traditional name", &card.plant_name_traditional) }
                { render_field("Model prediction", &card.plant_name_cnn) }
                { render_field("Location", &card.location) }
                { render_field("Diseases treated", &card.diseases_treated) }
                { render_field("Preparation methods", &card.preparation_methods) }
                if !card.predictions.is_empty() {
                    <h3>{"Top predictions"}</h3>
                    <div class="result-bars">
                        { for card.predictions.iter().map(render_prediction) }
                    </div>
                }
            </div>
            <button class="analyze-btn" onclick={ctx.link().callback(|_| Msg::Navigate(View::Diagnose))}>
                <i class="fa-solid fa-rotate"></i>{" Diagnose another plant"}
            </button>
        </div>
    }
}

pub fn render_results(model: &Model, ctx: &Context<Model>) -> Html {
    match present(model.handoff.get()) {
        ResultView::Ready(card) => render_card(&card, ctx),
        ResultView::Empty { title, message, call_to_action } => html! {
            <div class="no-results-message">
                <h2>{ title }</h2>
                <p>{ message }</p>
                <button class="analyze-btn" onclick={ctx.link().callback(|_| Msg::Navigate(View::Diagnose))}>
                    { call_to_action }
                </button>
            </div>
        },
    }
}
