use crate::api;
use gloo_timers::callback::Timeout;
use shared::species::{PlantRecord, SpeciesPage};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

const SEARCH_DEBOUNCE_MS: u32 = 500;

#[derive(Clone, PartialEq)]
struct SearchKey {
    term: String,
    page: u32,
}

/// Only the most recent search may update the page. A cleared search box has
/// no current search.
fn is_current(latest: Option<&SearchKey>, key: &SearchKey) -> bool {
    latest == Some(key)
}

fn render_plant(plant: &PlantRecord) -> Html {
    html! {
        <div class="plant-card" key={plant.id.to_string()}>
            if let Some(url) = &plant.image_url {
                <img class="plant-image" src={url.clone()} alt={plant.common_name.clone()} />
            }
            <h3>{ &plant.common_name }</h3>
            <p class="scientific-name"><em>{ &plant.scientific_name }</em></p>
            <ul class="plant-facts">
                <li><strong>{"Cycle: "}</strong>{ &plant.cycle }</li>
                <li><strong>{"Watering: "}</strong>{ &plant.watering }</li>
                <li><strong>{"Sunlight: "}</strong>{ &plant.sunlight }</li>
                <li><strong>{"Growth rate: "}</strong>{ &plant.growth_rate }</li>
                <li><strong>{"Maintenance: "}</strong>{ &plant.maintenance }</li>
                if plant.poisonous {
                    <li class="poisonous"><i class="fa-solid fa-skull-crossbones"></i>{" Poisonous to humans"}</li>
                }
            </ul>
            if let Some(description) = &plant.description {
                <p class="plant-description">{ description }</p>
            }
        </div>
    }
}

/// Plant search backed by the species proxy.
#[function_component(Encyclopedia)]
pub fn encyclopedia() -> Html {
    let input = use_state(String::new);
    let key = use_state(|| SearchKey { term: String::new(), page: 1 });
    let page = use_state(|| None::<SpeciesPage>);
    let loading = use_state(|| false);
    let error = use_state(|| None::<String>);
    let pending = use_mut_ref(|| None::<Timeout>);
    let latest = use_mut_ref(|| None::<SearchKey>);

    {
        let page = page.clone();
        let loading = loading.clone();
        let error = error.clone();
        use_effect_with((*key).clone(), move |key| {
            let key = key.clone();
            if key.term.is_empty() {
                *latest.borrow_mut() = None;
                page.set(None);
                error.set(None);
                loading.set(false);
            } else {
                *latest.borrow_mut() = Some(key.clone());
                loading.set(true);
                spawn_local(async move {
                    let outcome = api::search_species(&key.term, key.page).await;
                    // A newer search has been issued; drop this answer.
                    if !is_current(latest.borrow().as_ref(), &key) {
                        return;
                    }
                    match outcome {
                        Ok(result) => {
                            page.set(Some(result));
                            error.set(None);
                        }
                        Err(e) => {
                            log::error!("Species search failed: {}", e);
                            error.set(Some(e));
                        }
                    }
                    loading.set(false);
                });
            }
            || ()
        });
    }

    let oninput = {
        let input = input.clone();
        let key = key.clone();
        Callback::from(move |e: InputEvent| {
            let value = e.target_unchecked_into::<HtmlInputElement>().value();
            input.set(value.clone());
            let key = key.clone();
            *pending.borrow_mut() = Some(Timeout::new(SEARCH_DEBOUNCE_MS, move || {
                key.set(SearchKey { term: value.trim().to_string(), page: 1 });
            }));
        })
    };

    let go_to = |target: u32| {
        let key = key.clone();
        Callback::from(move |_: MouseEvent| {
            key.set(SearchKey { term: key.term.clone(), page: target });
        })
    };

    html! {
        <div class="encyclopedia">
            <div class="search-bar">
                <i class="fa-solid fa-magnifying-glass"></i>
                <input
                    type="search"
                    placeholder="Search plants by name..."
                    value={(*input).clone()}
                    {oninput}
                />
            </div>

            if *loading {
                <p class="loading"><i class="fa-solid fa-spinner fa-spin"></i>{" Searching..."}</p>
            }
            if let Some(message) = &*error {
                <div class="error-message"><p>{ message }</p></div>
            }

            if let Some(result) = &*page {
                if result.plants.is_empty() {
                    <p class="no-results-message">{"No plants found."}</p>
                } else {
                    <div class="plant-grid">
                        { for result.plants.iter().map(render_plant) }
                    </div>
                }
                <div class="pagination">
                    <button
                        disabled={!result.pagination.has_prev || *loading}
                        onclick={go_to(result.pagination.current_page.saturating_sub(1))}
                    >
                        {"Previous"}
                    </button>
                    <span>{ format!("Page {} of {}", result.pagination.current_page, result.pagination.total_pages) }</span>
                    <button
                        disabled={!result.pagination.has_next || *loading}
                        onclick={go_to(result.pagination.current_page + 1)}
                    >
                        {"Next"}
                    </button>
                </div>
            }
        </div>
    }
}
