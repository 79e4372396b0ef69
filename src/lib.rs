//! Monthly car sales report: summarises a JSON sales export, renders it as a PDF
//! and emails the result.

pub mod builder;
pub mod config;
pub mod elements;
pub mod fonts;
pub mod mail;
pub mod model;
pub mod number;
pub mod pipeline;
pub mod richtext;
pub mod sales;
pub mod summary;
pub mod table;
