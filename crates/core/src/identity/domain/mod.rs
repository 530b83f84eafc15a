pub mod confirmed_name_cache;
pub mod identity_stabilizer;
