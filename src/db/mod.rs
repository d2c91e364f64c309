pub mod memory;
pub mod mongo;
pub mod stores;

pub use memory::InMemoryStore;
pub use mongo::{DatabaseHealth, MongoStore};
pub use stores::{
    parse_object_id, AdminStore, DoctorStore, PostStore, StoreError, StoreResult, TokenStore,
};
