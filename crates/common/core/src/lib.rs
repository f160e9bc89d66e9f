pub mod constants;
pub mod containers;
pub mod definition;
pub mod duty;
pub mod eligibility;
pub mod errors;
pub mod pubkey;
pub mod signed;
pub mod unsigned;

pub use definition::{DutyDefinition, DutyDefinitionSet};
pub use duty::{Duty, DutyType};
pub use errors::CoreError;
pub use pubkey::PubKey;
pub use signed::SignedData;
pub use unsigned::{UnsignedData, UnsignedDataSet};
