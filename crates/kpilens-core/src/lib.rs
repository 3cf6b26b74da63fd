pub mod config;
pub mod daterange;
pub mod error;
pub mod family;
pub mod fragment;
pub mod kpi;
pub mod merge;
pub mod query;
pub mod upstream;
