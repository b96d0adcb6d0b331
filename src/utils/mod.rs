pub mod constants;
pub mod query;

pub use constants::*;
pub use query::{
    clean_tax_code, extract_tax_code_from_url, is_tax_code_query, is_valid_tax_code,
    sanitize_query,
};
