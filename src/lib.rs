//! Staging, merge and export engine for a person/staff/organisation
//! masterlist workbook and its profile photo folder.

pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod usecase;
