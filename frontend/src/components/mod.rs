pub mod auth_form;
pub mod encyclopedia;
pub mod header;
pub mod preview_area;
pub mod results;
pub mod upload_section;
pub mod utils;
