pub mod audit;
pub mod config;
pub mod db;
pub mod domain;
pub mod dto;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod notifier;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
