pub mod password;
pub mod response;
