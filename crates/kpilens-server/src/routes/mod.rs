pub mod health;
pub mod kpis;
