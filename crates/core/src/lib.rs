//! Generic persistence contracts for the course-enrollment platform.
//!
//! This crate has no internal dependencies. It defines what an entity,
//! repository and mapper look like, and builds the generic CRUD and
//! revision services on top of those traits. Concrete entities and the
//! PostgreSQL implementation live in `enroll-db`.

pub mod audit;
pub mod config;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod pagination;
pub mod patch;
pub mod repository;
pub mod revision;
pub mod service;
pub mod types;
pub mod validation;
