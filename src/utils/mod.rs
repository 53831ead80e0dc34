pub mod jwt_secret;
pub mod mock_ai;
pub mod password;
