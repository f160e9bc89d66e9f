pub mod beacon_mock;
pub mod random;

pub use beacon_mock::BeaconMock;
