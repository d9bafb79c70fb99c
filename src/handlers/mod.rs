// handlers/mod.rs - Two-tier handler layout
//
// public:    no authentication (registration, login, image files, liveness)
// protected: behind the access or refresh guard (/api/*)
pub mod protected;
pub mod public;
