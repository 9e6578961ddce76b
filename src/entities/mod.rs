pub mod gift;
pub mod ownership_record;

pub use gift::Entity as Gift;
pub use ownership_record::Entity as OwnershipRecord;
