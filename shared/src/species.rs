use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: i64,
    pub common_name: String,
    pub scientific_name: String,
    pub image_url: Option<String>,
    pub cycle: String,
    pub watering: String,
    pub sunlight: String,
    pub growth_rate: String,
    pub maintenance: String,
    pub poisonous: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        Self {
            current_page,
            total_pages,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesPage {
    pub plants: Vec<PlantRecord>,
    pub pagination: Pagination,
}
