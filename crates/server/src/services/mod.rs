//! Application services: authentication, chat relay, receipts, OCR.

pub mod auth;
pub mod chat;
pub mod email;
pub mod ocr;
