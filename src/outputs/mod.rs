//! Output generation.
//!
//! - [`csv`]: writes the final article set as a flat CSV file
//!
//! ```text
//! title,url,publish_date,author,summary
//! Storm Hits Florida,https://www.miamiherald.com/news/a1.html,2026-10-13,,
//! ```

pub mod csv;
