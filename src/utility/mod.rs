pub mod bind;
pub mod ip_detector;
