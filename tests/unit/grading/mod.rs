pub mod normalize_test;
pub mod validator_test;
