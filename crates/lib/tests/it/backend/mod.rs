//! Backend integration tests
