pub mod conversion_service;
pub mod loan_service;
