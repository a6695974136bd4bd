pub mod lead_manager_use_case;
pub mod notification_service;
pub mod ports;
