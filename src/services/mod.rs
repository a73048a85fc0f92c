pub mod audit;
pub mod contribution_service;
pub mod conversion_service;
pub mod referral_service;
