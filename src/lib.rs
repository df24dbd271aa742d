pub mod config;
pub mod corpus;
pub mod ghazal;
pub mod glossary;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod stages;
pub mod textutil;
