//! Unified application error type.
//! Every layer (db, core, export, cli) returns AppError so that the binary
//! can report any failure the same way and never panic on user input.

use crate::core::token::TokenRejection;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Store (backend failures)
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // ---------------------------
    // Validation failures
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("{0}")]
    Validation(String),

    // ---------------------------
    // QR check-in
    // ---------------------------
    #[error("Check-in rejected: {0}")]
    TokenRejected(TokenRejection),

    // ---------------------------
    // Not found
    // ---------------------------
    #[error("Session #{0} not found")]
    SessionNotFound(i64),

    #[error("Employee '{0}' not found")]
    EmployeeNotFound(String),

    #[error("Location #{0} not found")]
    LocationNotFound(i64),

    // ---------------------------
    // Invariants / concurrent updates
    // ---------------------------
    #[error("Employee '{0}' already has an open session")]
    OpenSessionConflict(String),

    #[error("Settings were modified by someone else (expected {expected}, found {found})")]
    SettingsConflict { expected: String, found: String },

    #[error("Employee '{0}' still owns sessions; deactivate instead of deleting")]
    EmployeeHasSessions(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),
}

pub type AppResult<T> = Result<T, AppError>;
