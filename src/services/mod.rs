pub mod distance_service;
pub mod nearby_pharmacy_service;
pub mod prescription_dispatch_service;
pub mod routing_service;
